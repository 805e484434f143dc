//! Path expressions for locating values in deserialized payload trees.
//!
//! This module provides [`PathExpr`] and [`Accessor`] types for addressing
//! values in nested JSON/XML-derived structures, plus a parser for the
//! bracketed chain syntax used in schema declarations.

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

/// A single step of a path expression.
///
/// Paths are built from accessors that represent either map-key access or
/// sequence-index access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// A map key access (e.g., `['user']`, `[:email]`)
    Key(String),
    /// A sequence index access (e.g., `[0]`, `[42]`)
    Index(usize),
}

impl Accessor {
    /// Creates a new key accessor.
    pub fn key(name: impl Into<String>) -> Self {
        Accessor::Key(name.into())
    }

    /// Creates a new index accessor.
    pub fn index(idx: usize) -> Self {
        Accessor::Index(idx)
    }
}

/// Error raised when a path expression string does not parse.
///
/// Path syntax errors are schema-definition-time failures: they surface from
/// the schema builder before any instance is ever constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathSyntaxError {
    /// A character other than `[` appeared where an accessor should start.
    #[error("expected '[' at offset {offset}")]
    ExpectedOpen { offset: usize },
    /// An accessor was opened but never closed with `]`.
    #[error("unterminated accessor starting at offset {offset}")]
    Unterminated { offset: usize },
    /// A quoted key was opened but the closing quote is missing.
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
    /// An accessor contained nothing (e.g., `[]` or `[:]`).
    #[error("empty accessor starting at offset {offset}")]
    EmptyAccessor { offset: usize },
    /// An index accessor held digits that do not form a valid index.
    #[error("invalid index '{index}'")]
    InvalidIndex { index: String },
    /// An accessor started with a character that is not a quote, `:`, or digit.
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
}

/// An ordered sequence of accessors locating a value within a payload tree.
///
/// Two surface syntaxes denote the same accessor sequence: quoted-string
/// chains and symbol chains. An empty expression addresses the tree root.
///
/// # Example
///
/// ```rust
/// use triage::{Accessor, PathExpr};
///
/// let quoted: PathExpr = "['foo']['bar']".parse().unwrap();
/// let symbols: PathExpr = "[:foo][:bar]".parse().unwrap();
/// assert_eq!(quoted, symbols);
///
/// let indexed: PathExpr = "['items'][0]".parse().unwrap();
/// let segments: Vec<_> = indexed.accessors().collect();
/// assert_eq!(segments[1], &Accessor::Index(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathExpr {
    accessors: Vec<Accessor>,
}

impl PathExpr {
    /// Creates an empty path addressing the tree root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path consisting of a single key accessor.
    ///
    /// This is the default location for a declared attribute with no
    /// explicit `at` override.
    pub fn from_key(name: impl Into<String>) -> Self {
        Self {
            accessors: vec![Accessor::Key(name.into())],
        }
    }

    /// Creates a path consisting of a single index accessor.
    pub fn from_index(idx: usize) -> Self {
        Self {
            accessors: vec![Accessor::Index(idx)],
        }
    }

    /// Parses the bracketed chain syntax into an accessor sequence.
    ///
    /// Accepts quoted keys (`['foo']`, `["foo"]`), symbol keys (`[:foo]`),
    /// and integer indices (`[0]`). Whitespace around and inside brackets is
    /// tolerated. An empty (or all-whitespace) input is the root path.
    pub fn parse(input: &str) -> Result<Self, PathSyntaxError> {
        let bytes = input.as_bytes();
        let mut accessors = Vec::new();
        let mut i = 0;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            if bytes[i] != b'[' {
                return Err(PathSyntaxError::ExpectedOpen { offset: i });
            }
            let open = i;
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(PathSyntaxError::Unterminated { offset: open });
            }
            match bytes[i] {
                quote @ (b'\'' | b'"') => {
                    let quote_at = i;
                    i += 1;
                    let start = i;
                    while i < bytes.len() && bytes[i] != quote {
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return Err(PathSyntaxError::UnterminatedString { offset: quote_at });
                    }
                    accessors.push(Accessor::Key(input[start..i].to_string()));
                    i += 1;
                }
                b':' => {
                    i += 1;
                    let start = i;
                    while i < bytes.len() && bytes[i] != b']' && !bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    if i == start {
                        return Err(PathSyntaxError::EmptyAccessor { offset: open });
                    }
                    accessors.push(Accessor::Key(input[start..i].to_string()));
                }
                b'0'..=b'9' => {
                    let start = i;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    let digits = &input[start..i];
                    let idx = digits
                        .parse::<usize>()
                        .map_err(|_| PathSyntaxError::InvalidIndex {
                            index: digits.to_string(),
                        })?;
                    accessors.push(Accessor::Index(idx));
                }
                b']' => return Err(PathSyntaxError::EmptyAccessor { offset: open }),
                other => {
                    let found = input[i..].chars().next().unwrap_or(other as char);
                    return Err(PathSyntaxError::UnexpectedChar { found, offset: i });
                }
            }
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() || bytes[i] != b']' {
                return Err(PathSyntaxError::Unterminated { offset: open });
            }
            i += 1;
        }

        Ok(Self { accessors })
    }

    /// Returns a new path with a key accessor appended.
    ///
    /// This method does not modify the original path; it returns a new one.
    pub fn push_key(&self, name: impl Into<String>) -> Self {
        let mut accessors = self.accessors.clone();
        accessors.push(Accessor::Key(name.into()));
        Self { accessors }
    }

    /// Returns a new path with an index accessor appended.
    ///
    /// This method does not modify the original path; it returns a new one.
    pub fn push_index(&self, idx: usize) -> Self {
        let mut accessors = self.accessors.clone();
        accessors.push(Accessor::Index(idx));
        Self { accessors }
    }

    /// Returns the concatenation `self ++ other`.
    ///
    /// Used to prefix an attribute's own path with the schema-wide root.
    pub fn join(&self, other: &PathExpr) -> Self {
        let mut accessors = self.accessors.clone();
        accessors.extend(other.accessors.iter().cloned());
        Self { accessors }
    }

    /// Returns true if this is the root path (no accessors).
    pub fn is_root(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Returns the number of accessors in this path.
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Returns true if this path has no accessors.
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Returns an iterator over the accessors in order.
    pub fn accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.iter()
    }
}

impl Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for accessor in &self.accessors {
            match accessor {
                Accessor::Key(name) => write!(f, "['{}']", name)?,
                Accessor::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for PathExpr {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
