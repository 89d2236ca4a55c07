use std::fmt::{self, Write};

use indexmap::IndexMap;

/// A value exchanged between the host and the sandbox.
///
/// Inputs, saved variables, tool arguments, tool return values and submitted
/// outputs all travel as `Object`s. The type owns its data and has no tie to
/// any particular interpreter heap, so it can be cloned into every fresh
/// namespace without sharing.
///
/// # JSON Serialization
///
/// The derived serde impls use the externally tagged format (`{"Int": 42}`).
/// For natural JSON (`42`, `"text"`, `[1, 2]`) use [`Object::to_json_value`]
/// and [`Object::from_json_value`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Object {
    /// Python's `None` singleton.
    #[serde(alias = "none", alias = "NoneType")]
    None,
    /// Python boolean.
    #[serde(alias = "bool")]
    Bool(bool),
    /// Python integer (64-bit signed).
    #[serde(alias = "int")]
    Int(i64),
    /// Python float.
    #[serde(alias = "float")]
    Float(f64),
    /// Python string.
    #[serde(alias = "str")]
    String(String),
    /// Python bytes.
    #[serde(alias = "bytes")]
    Bytes(Vec<u8>),
    /// Python list.
    #[serde(alias = "list")]
    List(Vec<Self>),
    /// Python tuple.
    #[serde(alias = "tuple")]
    Tuple(Vec<Self>),
    /// Python dict, insertion ordered.
    #[serde(alias = "dict")]
    Dict(DictPairs),
    /// Fallback for sandbox values with no direct mapping, holding their `repr()`.
    ///
    /// Output-only: sandboxes may produce it, but it cannot be turned back into
    /// the original value.
    Repr(String),
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            _ => self.repr_fmt(f),
        }
    }
}

impl Object {
    /// Creates a new `Object::Dict` from anything convertible to `DictPairs`.
    #[must_use]
    pub fn dict(dict: impl Into<DictPairs>) -> Self {
        Self::Dict(dict.into())
    }

    /// Returns the Python `repr()` string for this value.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut s = String::new();
        // writing into a String cannot fail
        let _ = self.repr_fmt(&mut s);
        s
    }

    /// Converts this value to natural JSON.
    ///
    /// - `None` → `null`, `Bool` → bool, `Int`/`Float` → number (NaN/inf → `null`)
    /// - `String` → string, `List` → array
    /// - `Dict` → object (non-string keys use their repr)
    /// - `Tuple` → `{"$tuple": [...]}`, `Bytes` → `{"$bytes": [...]}`, `Repr` → `{"$repr": "..."}`
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::{Value as JV, json};
        match self {
            Self::None => JV::Null,
            Self::Bool(b) => JV::Bool(*b),
            Self::Int(i) => json!(i),
            Self::Float(f) => {
                if f.is_finite() {
                    json!(f)
                } else {
                    JV::Null
                }
            }
            Self::String(s) => JV::String(s.clone()),
            Self::Bytes(b) => json!({"$bytes": b}),
            Self::List(items) => JV::Array(items.iter().map(Self::to_json_value).collect()),
            Self::Tuple(items) => json!({"$tuple": items.iter().map(Self::to_json_value).collect::<Vec<_>>()}),
            Self::Dict(pairs) => {
                let map: serde_json::Map<String, JV> = pairs
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Self::String(s) => s.clone(),
                            other => other.py_repr(),
                        };
                        (key, v.to_json_value())
                    })
                    .collect();
                JV::Object(map)
            }
            Self::Repr(s) => json!({"$repr": s}),
        }
    }

    /// Converts natural JSON into an `Object`.
    ///
    /// Objects become `Dict`s with string keys; numbers that fit `i64` become
    /// `Int`, everything else numeric becomes `Float`.
    #[must_use]
    pub fn from_json_value(value: serde_json::Value) -> Self {
        use serde_json::Value as JV;
        match value {
            JV::Null => Self::None,
            JV::Bool(b) => Self::Bool(b),
            JV::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JV::String(s) => Self::String(s),
            JV::Array(items) => Self::List(items.into_iter().map(Self::from_json_value).collect()),
            JV::Object(map) => Self::Dict(
                map.into_iter()
                    .map(|(k, v)| (Self::String(k), Self::from_json_value(v)))
                    .collect(),
            ),
        }
    }

    fn repr_fmt(&self, f: &mut impl Write) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => {
                if v.is_nan() {
                    return f.write_str("nan");
                }
                if v.is_infinite() {
                    return f.write_str(if *v > 0.0 { "inf" } else { "-inf" });
                }
                let magnitude = v.abs();
                if magnitude > 0.0 && !(1e-4..1e16).contains(&magnitude) {
                    return float_exponent_fmt(*v, f);
                }
                let s = v.to_string();
                f.write_str(&s)?;
                if !s.contains('.') {
                    f.write_str(".0")?;
                }
                Ok(())
            }
            Self::String(s) => string_repr_fmt(s, f),
            Self::Bytes(b) => bytes_repr_fmt(b, f),
            Self::List(items) => {
                f.write_char('[')?;
                seq_repr_fmt(items, f)?;
                f.write_char(']')
            }
            Self::Tuple(items) => {
                f.write_char('(')?;
                seq_repr_fmt(items, f)?;
                if items.len() == 1 {
                    f.write_char(',')?;
                }
                f.write_char(')')
            }
            Self::Dict(pairs) => {
                f.write_char('{')?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    k.repr_fmt(f)?;
                    f.write_str(": ")?;
                    v.repr_fmt(f)?;
                }
                f.write_char('}')
            }
            Self::Repr(s) => f.write_str(s),
        }
    }

    /// Returns `true` if this value is truthy under Python's rules.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Bytes(b) => !b.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Dict(d) => !d.is_empty(),
            Self::Repr(_) => true,
        }
    }

    /// Returns the Python type name for this value (e.g. `"int"`, `"str"`).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Repr(_) => "repr",
        }
    }

    /// Returns the Python `len()` of sized values, `None` for scalars.
    #[must_use]
    pub fn py_len(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Bytes(b) => Some(b.len()),
            Self::List(items) | Self::Tuple(items) => Some(items.len()),
            Self::Dict(d) => Some(d.len()),
            _ => None,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // bitwise so that equality stays reflexive for NaN
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) | (Self::Repr(a), Self::Repr(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Object {}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Object {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Error returned when an `Object` cannot be converted to the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, got {actual}")]
pub struct ConversionError {
    /// The type name that was expected (e.g. "int", "str").
    pub expected: &'static str,
    /// The actual type name of the `Object`.
    pub actual: &'static str,
}

impl ConversionError {
    #[must_use]
    pub fn new(expected: &'static str, actual: &'static str) -> Self {
        Self { expected, actual }
    }
}

impl TryFrom<&Object> for i64 {
    type Error = ConversionError;

    fn try_from(value: &Object) -> Result<Self, Self::Error> {
        match value {
            Object::Int(i) => Ok(*i),
            _ => Err(ConversionError::new("int", value.type_name())),
        }
    }
}

/// Int values widen to f64, as in Python.
impl TryFrom<&Object> for f64 {
    type Error = ConversionError;

    fn try_from(value: &Object) -> Result<Self, Self::Error> {
        match value {
            Object::Float(f) => Ok(*f),
            Object::Int(i) => Ok(*i as Self),
            _ => Err(ConversionError::new("float", value.type_name())),
        }
    }
}

impl TryFrom<&Object> for String {
    type Error = ConversionError;

    fn try_from(value: &Object) -> Result<Self, Self::Error> {
        match value {
            Object::String(s) => Ok(s.clone()),
            _ => Err(ConversionError::new("str", value.type_name())),
        }
    }
}

/// Strict: only `Bool` converts, truthiness is [`Object::is_truthy`].
impl TryFrom<&Object> for bool {
    type Error = ConversionError;

    fn try_from(value: &Object) -> Result<Self, Self::Error> {
        match value {
            Object::Bool(b) => Ok(*b),
            _ => Err(ConversionError::new("bool", value.type_name())),
        }
    }
}

/// Key-value pairs of a Python dict, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DictPairs(Vec<(Object, Object)>);

impl DictPairs {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Object, Object)> {
        self.0.iter()
    }

    /// Looks up a value by string key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Object> {
        self.0
            .iter()
            .find(|(k, _)| matches!(k, Object::String(s) if s == key))
            .map(|(_, v)| v)
    }
}

impl From<Vec<(Object, Object)>> for DictPairs {
    fn from(pairs: Vec<(Object, Object)>) -> Self {
        Self(pairs)
    }
}

impl From<IndexMap<String, Object>> for DictPairs {
    fn from(map: IndexMap<String, Object>) -> Self {
        map.into_iter().map(|(k, v)| (Object::String(k), v)).collect()
    }
}

impl IntoIterator for DictPairs {
    type Item = (Object, Object);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DictPairs {
    type Item = &'a (Object, Object);
    type IntoIter = std::slice::Iter<'a, (Object, Object)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Object, Object)> for DictPairs {
    fn from_iter<T: IntoIterator<Item = (Object, Object)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn seq_repr_fmt(items: &[Object], f: &mut impl Write) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.repr_fmt(f)?;
    }
    Ok(())
}

/// Writes a float in Python's exponent form: signed exponent, at least two digits.
fn float_exponent_fmt(v: f64, f: &mut impl Write) -> fmt::Result {
    let s = format!("{v:e}");
    let (mantissa, exponent) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    write!(f, "{mantissa}e{sign}{digits:0>2}")
}

/// Writes a CPython-compatible repr of a string.
///
/// Single quotes are used unless the string contains a single quote and no
/// double quote.
fn string_repr_fmt(s: &str, f: &mut impl Write) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

fn bytes_repr_fmt(bytes: &[u8], f: &mut impl Write) -> fmt::Result {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') { '"' } else { '\'' };
    f.write_char('b')?;
    f.write_char(quote)?;
    for &byte in bytes {
        match byte {
            b'\\' => f.write_str("\\\\")?,
            b'\t' => f.write_str("\\t")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\'' if quote == '\'' => f.write_str("\\'")?,
            b'"' if quote == '"' => f.write_str("\\\"")?,
            0x20..=0x7e => f.write_char(byte as char)?,
            _ => write!(f, "\\x{byte:02x}")?,
        }
    }
    f.write_char(quote)
}
