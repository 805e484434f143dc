//! Pure resolution of path expressions against payload trees.
//!
//! Resolution is total: for any tree and path it yields either a reference to
//! the located value or [`None`] (the well-defined Absent). Structural
//! mismatches are never errors here; a missing value becomes a validation
//! failure downstream, not a resolution-time crash.

use serde_json::Value;

use crate::path::{Accessor, PathExpr};

/// Resolves a path expression against a tree.
///
/// Walks the accessors in order: a [`Accessor::Key`] descends into a map, an
/// [`Accessor::Index`] descends into a sequence. A missing key, out-of-range
/// index, or accessor/value type mismatch yields `None`.
///
/// An empty path returns the tree itself; in particular, when the whole
/// payload is a bare sequence, an empty path hands it back verbatim so the
/// payload itself can serve as an array attribute.
///
/// # Example
///
/// ```rust
/// use triage::{resolve, PathExpr};
/// use serde_json::json;
///
/// let tree = json!({"ocean": {"sea_floor": {"bar": "boo"}}});
/// let path: PathExpr = "['ocean']['sea_floor']['bar']".parse().unwrap();
/// assert_eq!(resolve(&tree, &path), Some(&json!("boo")));
///
/// let missing: PathExpr = "['ocean']['surface']".parse().unwrap();
/// assert_eq!(resolve(&tree, &missing), None);
/// ```
pub fn resolve<'a>(tree: &'a Value, path: &PathExpr) -> Option<&'a Value> {
    let mut current = tree;
    for accessor in path.accessors() {
        current = match (current, accessor) {
            (Value::Object(map), Accessor::Key(key)) => map.get(key)?,
            (Value::Array(items), Accessor::Index(idx)) => items.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}
