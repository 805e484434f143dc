//! Coercion of located tree values into typed attribute values.
//!
//! Coercion never fails: an absent location, a null, or a value that cannot
//! be converted all land as `None` inside the attribute, where the presence
//! rule reports them as ordinary validation failures.

use std::sync::Arc;

use serde_json::Value;

use crate::instance::Instance;
use crate::schema::MappingSchema;

/// The declared target kind of an attribute.
#[derive(Debug, Clone)]
pub enum Kind {
    /// A string attribute; numbers and booleans coerce to their text form.
    Str,
    /// An integer attribute; numeric strings and whole floats coerce.
    Int,
    /// A float attribute.
    Float,
    /// A boolean attribute.
    Bool,
    /// The located tree value, verbatim.
    Raw,
    /// A sequence of the given element kind, coerced elementwise.
    Seq(Box<Kind>),
    /// A nested schema-bearing attribute, mapped and validated recursively.
    Nested(Arc<MappingSchema>),
}

impl Kind {
    /// Creates a sequence kind with the given element kind.
    pub fn seq(inner: Kind) -> Self {
        Kind::Seq(Box::new(inner))
    }

    /// Creates a nested kind from a schema handle.
    pub fn nested(schema: Arc<MappingSchema>) -> Self {
        Kind::Nested(schema)
    }

    /// Whether this kind participates in the validation cascade.
    ///
    /// Only a direct `Nested` does; a `Seq` never does, even when its element
    /// kind is `Nested`.
    pub(crate) fn is_nested(&self) -> bool {
        matches!(self, Kind::Nested(_))
    }
}

/// A coerced attribute value.
///
/// Each variant mirrors a [`Kind`]; `None` inside a variant means the
/// location was absent, null, or its value could not be coerced.
#[derive(Debug, Clone)]
pub enum Attr {
    Str(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Raw(Option<Value>),
    Seq(Option<Vec<Attr>>),
    Nested(Option<Box<Instance>>),
}

impl Attr {
    /// Returns the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attr::Str(value) => value.as_deref(),
            _ => None,
        }
    }

    /// Returns the integer value, if present.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attr::Int(value) => *value,
            _ => None,
        }
    }

    /// Returns the float value, if present.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Attr::Float(value) => *value,
            _ => None,
        }
    }

    /// Returns the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Attr::Bool(value) => *value,
            _ => None,
        }
    }

    /// Returns the verbatim tree value, if present.
    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Attr::Raw(value) => value.as_ref(),
            _ => None,
        }
    }

    /// Returns the sequence elements, if present.
    pub fn as_seq(&self) -> Option<&[Attr]> {
        match self {
            Attr::Seq(value) => value.as_deref(),
            _ => None,
        }
    }

    /// Returns the nested instance, if present.
    pub fn as_nested(&self) -> Option<&Instance> {
        match self {
            Attr::Nested(value) => value.as_deref(),
            _ => None,
        }
    }

    /// Whether the presence rule considers this value missing.
    ///
    /// Absent/uncoercible values, empty or whitespace-only strings, and empty
    /// sequences are blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Attr::Str(value) => value.as_deref().map_or(true, |s| s.trim().is_empty()),
            Attr::Int(value) => value.is_none(),
            Attr::Float(value) => value.is_none(),
            Attr::Bool(value) => value.is_none(),
            Attr::Raw(value) => value.is_none(),
            Attr::Seq(value) => value.as_deref().map_or(true, |items| items.is_empty()),
            Attr::Nested(value) => value.is_none(),
        }
    }
}

/// Coerces a located tree value into the declared kind.
pub(crate) fn coerce(value: Option<&Value>, kind: &Kind) -> Attr {
    match kind {
        Kind::Str => Attr::Str(value.and_then(coerce_str)),
        Kind::Int => Attr::Int(value.and_then(coerce_int)),
        Kind::Float => Attr::Float(value.and_then(coerce_float)),
        Kind::Bool => Attr::Bool(value.and_then(coerce_bool)),
        Kind::Raw => Attr::Raw(value.filter(|v| !v.is_null()).cloned()),
        Kind::Seq(inner) => Attr::Seq(value.and_then(Value::as_array).map(|items| {
            items
                .iter()
                .map(|item| coerce(Some(item), inner))
                .collect()
        })),
        Kind::Nested(schema) => Attr::Nested(match value {
            Some(subtree @ Value::Object(_)) => Some(Box::new(Instance::from_tree(
                Arc::clone(schema),
                subtree.clone(),
            ))),
            _ => None,
        }),
    }
}

fn coerce_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                // `as` saturates, so out-of-range floats must be screened out.
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MappingSchema;
    use serde_json::json;

    #[test]
    fn test_str_from_string() {
        let attr = coerce(Some(&json!("bar")), &Kind::Str);
        assert_eq!(attr.as_str(), Some("bar"));
    }

    #[test]
    fn test_str_from_number_and_bool() {
        assert_eq!(coerce(Some(&json!(42)), &Kind::Str).as_str(), Some("42"));
        assert_eq!(
            coerce(Some(&json!(true)), &Kind::Str).as_str(),
            Some("true")
        );
    }

    #[test]
    fn test_str_from_null_and_absent() {
        assert!(coerce(Some(&json!(null)), &Kind::Str).is_blank());
        assert!(coerce(None, &Kind::Str).is_blank());
    }

    #[test]
    fn test_int_from_number() {
        assert_eq!(coerce(Some(&json!(7)), &Kind::Int).as_int(), Some(7));
        assert_eq!(coerce(Some(&json!(7.0)), &Kind::Int).as_int(), Some(7));
        assert_eq!(coerce(Some(&json!(7.5)), &Kind::Int).as_int(), None);
    }

    #[test]
    fn test_int_out_of_range_float_uncoercible() {
        assert_eq!(coerce(Some(&json!(1e300)), &Kind::Int).as_int(), None);
        assert_eq!(coerce(Some(&json!(-1e300)), &Kind::Int).as_int(), None);
        assert_eq!(coerce(Some(&json!(1e18)), &Kind::Int).as_int(), Some(1_000_000_000_000_000_000));
    }

    #[test]
    fn test_int_from_string() {
        // XML text values arrive as strings
        assert_eq!(coerce(Some(&json!("1")), &Kind::Int).as_int(), Some(1));
        assert_eq!(coerce(Some(&json!(" 12 ")), &Kind::Int).as_int(), Some(12));
        assert_eq!(coerce(Some(&json!("nope")), &Kind::Int).as_int(), None);
    }

    #[test]
    fn test_float_and_bool() {
        assert_eq!(
            coerce(Some(&json!(1.5)), &Kind::Float).as_float(),
            Some(1.5)
        );
        assert_eq!(
            coerce(Some(&json!("2.25")), &Kind::Float).as_float(),
            Some(2.25)
        );
        assert_eq!(
            coerce(Some(&json!(true)), &Kind::Bool).as_bool(),
            Some(true)
        );
        assert_eq!(
            coerce(Some(&json!("false")), &Kind::Bool).as_bool(),
            Some(false)
        );
    }

    #[test]
    fn test_raw_keeps_value_verbatim() {
        let value = json!({"a": [1, 2]});
        let attr = coerce(Some(&value), &Kind::Raw);
        assert_eq!(attr.as_raw(), Some(&value));
        assert!(coerce(Some(&json!(null)), &Kind::Raw).is_blank());
    }

    #[test]
    fn test_seq_elementwise() {
        let value = json!(["1", "2", "3"]);
        let attr = coerce(Some(&value), &Kind::seq(Kind::Int));
        let items = attr.as_seq().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_int(), Some(1));
        assert_eq!(items[2].as_int(), Some(3));
    }

    #[test]
    fn test_seq_from_non_array_is_blank() {
        assert!(coerce(Some(&json!("x")), &Kind::seq(Kind::Str)).is_blank());
        assert!(coerce(Some(&json!([])), &Kind::seq(Kind::Str)).is_blank());
    }

    #[test]
    fn test_nested_from_object() {
        let schema = MappingSchema::builder()
            .requires("foo", Kind::Str)
            .build()
            .unwrap();
        let attr = coerce(Some(&json!({"foo": "bar"})), &Kind::nested(schema));
        let instance = attr.as_nested().unwrap();
        assert_eq!(
            instance.get("foo").and_then(Attr::as_str),
            Some("bar")
        );
    }

    #[test]
    fn test_nested_from_non_object_is_blank() {
        let schema = MappingSchema::builder()
            .requires("foo", Kind::Str)
            .build()
            .unwrap();
        assert!(coerce(Some(&json!("scalar")), &Kind::nested(schema.clone())).is_blank());
        assert!(coerce(None, &Kind::nested(schema)).is_blank());
    }

    #[test]
    fn test_blank_strings() {
        assert!(coerce(Some(&json!("")), &Kind::Str).is_blank());
        assert!(coerce(Some(&json!("  ")), &Kind::Str).is_blank());
        assert!(!coerce(Some(&json!("x")), &Kind::Str).is_blank());
    }
}
