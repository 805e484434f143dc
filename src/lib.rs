//! # Triage
//!
//! Declarative mapping and validation of inbound JSON and XML payloads:
//! declare the attributes you require, where each lives inside the payload,
//! and the rules it must satisfy; construction parses the payload, walks
//! each declared location, coerces what it finds, and hands back a typed,
//! queryable instance.
//!
//! ## Overview
//!
//! A [`MappingSchema`] is built once per declaring type: an ordered set of
//! required attributes, each bound to a [`PathExpr`] location (defaulting to
//! the attribute's own name) under an optional schema-wide root prefix.
//! Missing locations never raise — they surface as ordinary validation
//! failures. Attributes whose declared kind is itself schema-bearing are
//! validated recursively, and an optional on-invalid callback fires exactly
//! once per top-level failure.
//!
//! ## Example
//!
//! ```rust
//! use triage::{Format, Instance, Kind, MappingSchema};
//!
//! let schema = MappingSchema::builder()
//!     .root("['ocean']['sea_floor']")
//!     .requires("foo", Kind::Str)
//!     .at("['bar']")
//!     .build()
//!     .unwrap();
//!
//! let payload = r#"{"ocean":{"sea_floor":{"bar":"boo"}}}"#;
//! let report = Instance::new(schema, Format::Json, payload).unwrap();
//!
//! assert_eq!(report.get("foo").and_then(|a| a.as_str()), Some("boo"));
//! assert!(report.is_valid(true));
//! ```

pub mod coerce;
pub mod decode;
pub mod error;
pub mod instance;
pub mod path;
pub mod resolve;
pub mod schema;

pub use coerce::{Attr, Kind};
pub use decode::{DecodeError, Format, Payload};
pub use error::{FieldError, FieldErrors};
pub use instance::Instance;
pub use path::{Accessor, PathExpr, PathSyntaxError};
pub use resolve::resolve;
pub use schema::rules::Rules;
pub use schema::{AttrDecl, MappingSchema, MappingSchemaBuilder, OnInvalid, SchemaBuildError};

/// Type alias for rule-run results using FieldErrors.
pub type RuleResult = stillwater::Validation<(), FieldErrors>;
