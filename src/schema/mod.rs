//! Static mapping schemas: per-type attribute declarations.
//!
//! A [`MappingSchema`] is the write-once metadata a declaring type carries:
//! an ordered list of required attributes, each with a location path, a
//! target kind, and a rule set, plus an optional shared root prefix and an
//! optional on-invalid callback. It is built once through
//! [`MappingSchema::builder`] and shared read-only (an `Arc`) by every
//! instance constructed against it.

pub mod rules;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::coerce::Kind;
use crate::error::FieldError;
use crate::path::{PathExpr, PathSyntaxError};

use self::rules::Rules;

/// Callback fired at most once per top-level validation failure, receiving
/// the payload tree and the accumulated field-level errors.
pub type OnInvalid = Arc<dyn Fn(&Value, &[FieldError]) + Send + Sync>;

/// Errors raised while building a schema.
///
/// These are definition-time configuration errors: they surface from
/// [`MappingSchemaBuilder::build`] before any instance is ever constructed.
#[derive(Debug, Error)]
pub enum SchemaBuildError {
    /// An attribute's `at` location did not parse.
    #[error("invalid path expression for attribute '{attribute}': {source}")]
    AttrPath {
        attribute: String,
        #[source]
        source: PathSyntaxError,
    },
    /// The shared root path did not parse.
    #[error("invalid root path expression: {source}")]
    RootPath {
        #[source]
        source: PathSyntaxError,
    },
    /// The same attribute name was declared twice.
    #[error("attribute '{0}' declared more than once")]
    DuplicateAttribute(String),
    /// `.at()` or `.rules()` was called before any attribute was declared.
    #[error("'{0}' modifier declared before any attribute")]
    DanglingModifier(&'static str),
}

/// One declared attribute: name, target kind, location, and rules.
pub struct AttrDecl {
    name: String,
    kind: Kind,
    path: PathExpr,
    rules: Rules,
    nested: bool,
}

impl AttrDecl {
    /// The attribute name, also its default location key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared target kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The attribute's own path, before root prefixing.
    pub fn path(&self) -> &PathExpr {
        &self.path
    }

    /// The attribute's rule set.
    pub(crate) fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Whether the attribute participates in the validation cascade.
    ///
    /// Classified once at build time: true iff the target kind is a direct
    /// `Nested` (sequence kinds never cascade).
    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

/// Static, immutable attribute schema for one declaring type.
pub struct MappingSchema {
    root: PathExpr,
    attrs: Vec<AttrDecl>,
    nested_attrs: Vec<usize>,
    on_invalid: Option<OnInvalid>,
}

impl MappingSchema {
    /// Starts a new schema declaration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use triage::{Kind, MappingSchema, Rules};
    ///
    /// let schema = MappingSchema::builder()
    ///     .root("['ocean']['sea_floor']")
    ///     .requires("foo", Kind::Str)
    ///     .at("['bar']")
    ///     .requires("tag", Kind::Str)
    ///     .rules(Rules::new().pattern(r"^gold").unwrap())
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(schema.attrs().len(), 2);
    /// ```
    pub fn builder() -> MappingSchemaBuilder {
        MappingSchemaBuilder {
            root: None,
            attrs: Vec::new(),
            on_invalid: None,
            dangling: None,
        }
    }

    /// The ordered attribute declarations.
    pub fn attrs(&self) -> &[AttrDecl] {
        &self.attrs
    }

    /// Looks up a declaration by attribute name.
    pub fn attr(&self, name: &str) -> Option<&AttrDecl> {
        self.attrs.iter().find(|decl| decl.name == name)
    }

    /// The shared root prefix applied before every attribute's own path.
    pub fn root(&self) -> &PathExpr {
        &self.root
    }

    /// Indices of the nested-validatable attributes, cached at build time.
    pub(crate) fn nested_attrs(&self) -> &[usize] {
        &self.nested_attrs
    }

    /// The registered on-invalid callback, if any.
    pub(crate) fn on_invalid(&self) -> Option<&OnInvalid> {
        self.on_invalid.as_ref()
    }
}

impl fmt::Debug for MappingSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSchema")
            .field("root", &self.root.to_string())
            .field(
                "attrs",
                &self.attrs.iter().map(|a| &a.name).collect::<Vec<_>>(),
            )
            .field("on_invalid", &self.on_invalid.is_some())
            .finish()
    }
}

/// Raw declaration gathered by the builder before paths are parsed.
struct PendingAttr {
    name: String,
    kind: Kind,
    at: Option<String>,
    rules: Rules,
}

/// Builder collecting declarations; all paths are parsed and classification
/// is computed in [`build`](MappingSchemaBuilder::build), so malformed syntax
/// fails fast at definition time.
pub struct MappingSchemaBuilder {
    root: Option<String>,
    attrs: Vec<PendingAttr>,
    on_invalid: Option<OnInvalid>,
    dangling: Option<&'static str>,
}

impl MappingSchemaBuilder {
    /// Declares the shared root prefix (default: the tree root).
    pub fn root(mut self, path: impl Into<String>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Declares a required attribute with the default rule set (presence).
    ///
    /// Its default location is the single key accessor named after the
    /// attribute; use [`at`](Self::at) to override.
    pub fn requires(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.attrs.push(PendingAttr {
            name: name.into(),
            kind,
            at: None,
            rules: Rules::new(),
        });
        self
    }

    /// Overrides the location of the most recently declared attribute.
    ///
    /// An empty path addresses the tree root, which supports "the payload IS
    /// the array attribute" schemas.
    pub fn at(mut self, path: impl Into<String>) -> Self {
        match self.attrs.last_mut() {
            Some(attr) => attr.at = Some(path.into()),
            None => self.dangling = Some("at"),
        }
        self
    }

    /// Replaces the rule set of the most recently declared attribute.
    pub fn rules(mut self, rules: Rules) -> Self {
        match self.attrs.last_mut() {
            Some(attr) => attr.rules = rules,
            None => self.dangling = Some("rules"),
        }
        self
    }

    /// Registers the at-most-one on-invalid callback.
    pub fn on_invalid(mut self, callback: impl Fn(&Value, &[FieldError]) + Send + Sync + 'static) -> Self {
        self.on_invalid = Some(Arc::new(callback));
        self
    }

    /// Parses every declared path, classifies nested attributes, and returns
    /// the finished schema as a shared handle.
    pub fn build(self) -> Result<Arc<MappingSchema>, SchemaBuildError> {
        if let Some(modifier) = self.dangling {
            return Err(SchemaBuildError::DanglingModifier(modifier));
        }

        let root = match self.root {
            Some(raw) => PathExpr::parse(&raw)
                .map_err(|source| SchemaBuildError::RootPath { source })?,
            None => PathExpr::root(),
        };

        let mut attrs = Vec::with_capacity(self.attrs.len());
        let mut nested_attrs = Vec::new();
        for pending in self.attrs {
            if attrs.iter().any(|decl: &AttrDecl| decl.name == pending.name) {
                return Err(SchemaBuildError::DuplicateAttribute(pending.name));
            }
            let path = match &pending.at {
                Some(raw) => {
                    PathExpr::parse(raw).map_err(|source| SchemaBuildError::AttrPath {
                        attribute: pending.name.clone(),
                        source,
                    })?
                }
                None => PathExpr::from_key(&pending.name),
            };
            let nested = pending.kind.is_nested();
            if nested {
                nested_attrs.push(attrs.len());
            }
            attrs.push(AttrDecl {
                name: pending.name,
                kind: pending.kind,
                path,
                rules: pending.rules,
                nested,
            });
        }

        Ok(Arc::new(MappingSchema {
            root,
            attrs,
            nested_attrs,
            on_invalid: self.on_invalid,
        }))
    }
}
