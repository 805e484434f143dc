//! Deserialization front-end turning raw payloads into trees.
//!
//! Raw payload strings are decoded into a [`serde_json::Value`] tree for the
//! declared wire [`Format`]. Payloads that arrive pre-parsed skip decoding
//! (and format checking) entirely.

mod xml;

use std::fmt::{self, Display};
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// Supported wire formats for raw payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
}

impl Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Xml => write!(f, "xml"),
        }
    }
}

impl FromStr for Format {
    type Err = DecodeError;

    /// Parses a format name, case-insensitively, with or without a leading
    /// `:`. Anything outside the supported set fails with
    /// [`DecodeError::UnknownFormat`].
    ///
    /// ```rust
    /// use triage::{DecodeError, Format};
    ///
    /// assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
    /// assert_eq!(":xml".parse::<Format>().unwrap(), Format::Xml);
    /// assert!(matches!(
    ///     "yaml".parse::<Format>(),
    ///     Err(DecodeError::UnknownFormat(_))
    /// ));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches(':');
        if name.eq_ignore_ascii_case("json") {
            Ok(Format::Json)
        } else if name.eq_ignore_ascii_case("xml") {
            Ok(Format::Xml)
        } else {
            Err(DecodeError::UnknownFormat(name.to_string()))
        }
    }
}

/// Errors raised while turning a raw payload into a tree.
///
/// All of these are construction-time, fatal-to-this-instance failures with
/// no retry semantics; the caller must supply valid input and reconstruct.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// An empty payload string was supplied where content was required.
    #[error("no payload data supplied")]
    MissingData,
    /// The requested format is not in the supported set.
    #[error("unknown serialization format '{0}'")]
    UnknownFormat(String),
    /// The payload was not well-formed JSON.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload was not well-formed XML.
    #[error("malformed XML payload: {0}")]
    Xml(String),
}

/// A payload handed to instance construction: either a raw string in some
/// wire format, or an already-parsed tree.
#[derive(Debug, Clone)]
pub enum Payload {
    Raw(String),
    Tree(Value),
}

impl From<&str> for Payload {
    fn from(raw: &str) -> Self {
        Payload::Raw(raw.to_string())
    }
}

impl From<String> for Payload {
    fn from(raw: String) -> Self {
        Payload::Raw(raw)
    }
}

impl From<Value> for Payload {
    fn from(tree: Value) -> Self {
        Payload::Tree(tree)
    }
}

/// Decodes a raw payload string into a tree for the given format.
///
/// An empty string fails with [`DecodeError::MissingData`] regardless of
/// format. JSON is parsed with `serde_json`; XML is converted into the same
/// tree shape (elements become keys, text becomes strings, repeated sibling
/// elements become arrays).
pub fn decode(raw: &str, format: Format) -> Result<Value, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::MissingData);
    }
    match format {
        Format::Json => Ok(serde_json::from_str(raw)?),
        Format::Xml => xml::to_tree(raw),
    }
}
