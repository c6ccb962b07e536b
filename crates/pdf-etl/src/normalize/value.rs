//! Tagged raw values produced by the page extractor
//!
//! Raw values mirror whatever the document contains: scalars, nested lists
//! and maps, binary payloads, and opaque handles such as object references.

use std::collections::BTreeMap;
use std::fmt;

/// A raw value taken from a document before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number (may be non-finite)
    Float(f64),
    /// Text
    Str(String),
    /// Binary payload
    Bytes(Vec<u8>),
    /// Ordered sequence
    List(Vec<RawValue>),
    /// String-keyed mapping
    Map(BTreeMap<String, RawValue>),
    /// Anything else, kept as a kind tag and its textual form
    Opaque { kind: &'static str, repr: String },
}

impl RawValue {
    /// Build an opaque value
    pub fn opaque(kind: &'static str, repr: impl Into<String>) -> Self {
        Self::Opaque {
            kind,
            repr: repr.into(),
        }
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Textual form of a scalar (string, number, boolean)
    ///
    /// Integral floats keep a trailing `.0` so `2.0` and `2` stay distinct.
    /// Booleans are capitalized (`True`, `False`). Returns `None` for null,
    /// binary, nested and opaque values.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            RawValue::Str(s) => Some(s.clone()),
            RawValue::Int(i) => Some(i.to_string()),
            RawValue::Float(f) => Some(format_float(*f)),
            RawValue::Bool(b) => Some(bool_text(*b).to_string()),
            _ => None,
        }
    }

    /// Text used when a value is rendered into an index field
    ///
    /// Nulls render empty; nested values render as their display form.
    pub fn render(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            other => other
                .scalar_text()
                .unwrap_or_else(|| other.to_string()),
        }
    }

    /// Borrow the map entries, if this is a map
    pub fn as_map(&self) -> Option<&BTreeMap<String, RawValue>> {
        match self {
            RawValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

pub(crate) fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Bool(b) => f.write_str(bool_text(*b)),
            RawValue::Int(i) => write!(f, "{}", i),
            RawValue::Float(x) => write!(f, "{}", format_float(*x)),
            RawValue::Str(s) => write!(f, "{}", s),
            RawValue::Bytes(b) => write!(f, "<binary {} bytes>", b.len()),
            RawValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            RawValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            RawValue::Opaque { repr, .. } => write!(f, "{}", repr),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Str(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Str(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Int(i)
    }
}

impl From<u32> for RawValue {
    fn from(i: u32) -> Self {
        RawValue::Int(i64::from(i))
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Convert a lopdf object without following references
impl From<&lopdf::Object> for RawValue {
    fn from(object: &lopdf::Object) -> Self {
        use lopdf::Object;

        match object {
            Object::Null => RawValue::Null,
            Object::Boolean(b) => RawValue::Bool(*b),
            Object::Integer(i) => RawValue::Int(*i),
            Object::Real(r) => RawValue::Float(f64::from(*r)),
            Object::Name(name) => {
                RawValue::opaque("name", format!("/{}", String::from_utf8_lossy(name)))
            }
            Object::String(bytes, _) => RawValue::Str(decode_pdf_string(bytes)),
            Object::Array(items) => RawValue::List(items.iter().map(RawValue::from).collect()),
            Object::Dictionary(dict) => RawValue::Map(dictionary_entries(dict)),
            Object::Stream(stream) => {
                let mut map = dictionary_entries(&stream.dict);
                map.insert("stream".to_string(), RawValue::Bytes(stream.content.clone()));
                RawValue::Map(map)
            }
            Object::Reference((id, generation)) => {
                RawValue::opaque("reference", format!("{} {} R", id, generation))
            }
        }
    }
}

pub(crate) fn dictionary_entries(dict: &lopdf::Dictionary) -> BTreeMap<String, RawValue> {
    dict.iter()
        .map(|(key, value)| (String::from_utf8_lossy(key).into_owned(), RawValue::from(value)))
        .collect()
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte-wise)
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}
