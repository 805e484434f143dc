//! Mapped instances: construction, attribute mapping, and the validation
//! cascade.
//!
//! An [`Instance`] owns the parsed payload tree and an ordered map of coerced
//! attribute values, both populated once at construction and never
//! reassigned. Validity is recomputed fresh on every query; nothing mutates
//! after construction, so recomputation is cheap and always consistent.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use stillwater::prelude::*;
use stillwater::Validation;

use crate::coerce::{self, Attr};
use crate::decode::{self, DecodeError, Format, Payload};
use crate::error::{FieldError, FieldErrors};
use crate::resolve::resolve;
use crate::schema::MappingSchema;
use crate::RuleResult;

/// A validated, typed view over one payload.
///
/// # Example
///
/// ```rust
/// use triage::{Format, Instance, Kind, MappingSchema};
///
/// let schema = MappingSchema::builder()
///     .requires("foo", Kind::Str)
///     .build()
///     .unwrap();
///
/// let report = Instance::new(schema.clone(), Format::Json, r#"{"foo":"bar"}"#).unwrap();
/// assert_eq!(report.get("foo").and_then(|a| a.as_str()), Some("bar"));
/// assert!(report.is_valid(true));
///
/// let incomplete = Instance::new(schema, Format::Json, r#"{"foo":null}"#).unwrap();
/// assert!(incomplete.is_invalid(true));
/// ```
#[derive(Debug, Clone)]
pub struct Instance {
    schema: Arc<MappingSchema>,
    tree: Value,
    attrs: IndexMap<String, Attr>,
}

impl Instance {
    /// Constructs an instance from a payload in the given format.
    ///
    /// A raw string payload is decoded for `format`; a pre-parsed tree
    /// payload skips decoding, and the format becomes advisory. Decoding
    /// failures (empty payload, malformed input) are fatal to this
    /// construction call; there are no retry semantics.
    pub fn new(
        schema: Arc<MappingSchema>,
        format: Format,
        payload: impl Into<Payload>,
    ) -> Result<Self, DecodeError> {
        let tree = match payload.into() {
            Payload::Tree(tree) => tree,
            Payload::Raw(raw) => decode::decode(&raw, format)?,
        };
        Ok(Self::from_tree(schema, tree))
    }

    /// Constructs an instance from an already-parsed tree.
    pub fn from_tree(schema: Arc<MappingSchema>, tree: Value) -> Self {
        let attrs = map_attrs(&schema, &tree);
        Self {
            schema,
            tree,
            attrs,
        }
    }

    /// Returns the coerced value of a declared attribute.
    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attrs.get(name)
    }

    /// The payload tree this instance was mapped from.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// The schema this instance was constructed against.
    pub fn schema(&self) -> &Arc<MappingSchema> {
        &self.schema
    }

    /// Computes instance validity.
    ///
    /// With no nested-validatable attributes this is exactly the field-level
    /// rule aggregate. With at least one, the instance is valid iff every
    /// nested-validatable attribute holds a valid instance — the instance's
    /// own field rules are not consulted in that case. That asymmetry is
    /// long-standing upstream behavior and is kept deliberately; see the
    /// cascade tests.
    ///
    /// When the outcome is invalid and `invoke_callback` is true, the
    /// schema's on-invalid callback (if any) fires exactly once with the
    /// payload tree and this instance's field-level errors. Nested instances
    /// are validated with callbacks suppressed; only the top-level caller's
    /// callback fires.
    pub fn is_valid(&self, invoke_callback: bool) -> bool {
        let own = self.check_fields();
        let valid = if self.schema.nested_attrs().is_empty() {
            own.is_success()
        } else {
            self.schema.nested_attrs().iter().all(|&idx| {
                let decl = &self.schema.attrs()[idx];
                match self.attrs.get(decl.name()) {
                    Some(Attr::Nested(Some(nested))) => nested.is_valid(false),
                    // missing subtree: nothing to cascade into, so invalid
                    _ => false,
                }
            })
        };

        if !valid && invoke_callback {
            if let Some(callback) = self.schema.on_invalid() {
                let errors = match &own {
                    Validation::Failure(errors) => errors.iter().cloned().collect::<Vec<_>>(),
                    Validation::Success(()) => Vec::new(),
                };
                callback(&self.tree, &errors);
            }
        }

        valid
    }

    /// The negation of [`is_valid`](Self::is_valid), evaluated via one call
    /// so the callback cannot fire twice.
    pub fn is_invalid(&self, invoke_callback: bool) -> bool {
        !self.is_valid(invoke_callback)
    }

    /// The instance's own field-level failures, computed on demand.
    pub fn errors(&self) -> Vec<FieldError> {
        match self.check_fields() {
            Validation::Success(()) => Vec::new(),
            Validation::Failure(errors) => errors.into_vec(),
        }
    }

    /// Runs every declared attribute's rules, combining all failures.
    fn check_fields(&self) -> RuleResult {
        let mut failures: Option<FieldErrors> = None;
        for decl in self.schema.attrs() {
            if let Some(value) = self.attrs.get(decl.name()) {
                if let Validation::Failure(errors) = decl.rules().run(decl.name(), value) {
                    failures = Some(match failures {
                        Some(acc) => acc.combine(errors),
                        None => errors,
                    });
                }
            }
        }
        match failures {
            None => Validation::Success(()),
            Some(errors) => Validation::Failure(errors),
        }
    }
}

/// Resolves and coerces every declared attribute, in declaration order.
fn map_attrs(schema: &MappingSchema, tree: &Value) -> IndexMap<String, Attr> {
    let mut attrs = IndexMap::with_capacity(schema.attrs().len());
    for decl in schema.attrs() {
        let effective = schema.root().join(decl.path());
        let located = resolve(tree, &effective);
        attrs.insert(decl.name().to_string(), coerce::coerce(located, decl.kind()));
    }
    attrs
}
