//! XML to tree conversion.
//!
//! Converts an XML document into the same tree shape the JSON decoder
//! produces: an element holding only text becomes a string, an empty element
//! becomes null, an element with children (or attributes) becomes an object,
//! and repeated sibling elements collapse into an array. The result is
//! wrapped in a single-key object named after the root element, so
//! `<foo>bar</foo>` decodes to `{"foo": "bar"}`.

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use super::DecodeError;

/// An element currently being assembled.
struct Elem {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<(String, Value)>,
    text: String,
}

impl Elem {
    fn open(start: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DecodeError::Xml(e.to_string()))?;
            if attr.key.as_ref() == b"xmlns" || attr.key.as_ref().starts_with(b"xmlns:") {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| DecodeError::Xml(e.to_string()))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Collapses the element into its tree value.
    fn close(self) -> (String, Value) {
        if self.children.is_empty() && self.attrs.is_empty() {
            let text = self.text.trim();
            let value = if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            };
            return (self.name, value);
        }

        // Attributes first, then children; repeated names become arrays.
        let mut map = Map::new();
        for (key, value) in self.attrs {
            map.insert(key, Value::String(value));
        }
        for (key, value) in self.children {
            match map.get_mut(&key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(key, value);
                }
            }
        }
        (self.name, Value::Object(map))
    }
}

fn attach(
    child: (String, Value),
    stack: &mut Vec<Elem>,
    root: &mut Option<(String, Value)>,
) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(child),
        // quick-xml does not enforce the single-root rule, so we do.
        None if root.is_some() => {
            return Err(DecodeError::Xml("multiple root elements".to_string()));
        }
        None => *root = Some(child),
    }
    Ok(())
}

/// Converts a raw XML document into a tree.
pub(super) fn to_tree(raw: &str) -> Result<Value, DecodeError> {
    let mut reader = Reader::from_str(raw);
    let mut stack: Vec<Elem> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| DecodeError::Xml(e.to_string()))?
        {
            Event::Start(start) => stack.push(Elem::open(&start)?),
            Event::Empty(start) => {
                let elem = Elem::open(&start)?;
                attach(elem.close(), &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let elem = stack
                    .pop()
                    .ok_or_else(|| DecodeError::Xml("unbalanced closing tag".to_string()))?;
                attach(elem.close(), &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let decoded = text.decode().map_err(|e| DecodeError::Xml(e.to_string()))?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(&decoded),
                    // Insignificant whitespace between elements is fine;
                    // anything else at document level is malformed.
                    None if decoded.trim().is_empty() => {}
                    None => {
                        return Err(DecodeError::Xml("text outside root element".to_string()));
                    }
                }
            }
            Event::CData(cdata) => {
                let top = stack
                    .last_mut()
                    .ok_or_else(|| DecodeError::Xml("CDATA outside root element".to_string()))?;
                let decoded = std::str::from_utf8(cdata.as_ref())
                    .map_err(|e| DecodeError::Xml(e.to_string()))?;
                top.text.push_str(decoded);
            }
            Event::GeneralRef(entity) => {
                let top = stack.last_mut().ok_or_else(|| {
                    DecodeError::Xml("entity reference outside root element".to_string())
                })?;
                let raw = entity
                    .decode()
                    .map_err(|e| DecodeError::Xml(e.to_string()))?;
                top.text.push_str(&resolve_entity(&raw)?);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::Xml("unclosed element".to_string()));
    }
    let (name, value) = root.ok_or_else(|| DecodeError::Xml("no root element".to_string()))?;
    let mut map = Map::new();
    map.insert(name, value);
    Ok(Value::Object(map))
}

/// Resolves a general entity reference to its text.
fn resolve_entity(raw: &str) -> Result<String, DecodeError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.to_string());
    }
    if let Some(rest) = raw.strip_prefix('#') {
        let code = if let Some(hex) = rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            u32::from_str_radix(hex, 16)
                .map_err(|_| DecodeError::Xml(format!("invalid hex entity: #{rest}")))?
        } else {
            rest.parse::<u32>()
                .map_err(|_| DecodeError::Xml(format!("invalid decimal entity: #{rest}")))?
        };
        let ch = char::from_u32(code)
            .ok_or_else(|| DecodeError::Xml(format!("invalid character code: {code}")))?;
        return Ok(ch.to_string());
    }
    Err(DecodeError::Xml(format!("unknown entity reference '&{raw};'")))
}
