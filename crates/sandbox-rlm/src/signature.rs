//! Task signatures: the named, typed inputs and outputs of a run.
//!
//! Parsed from the compact form `"inventory, today -> expiring_soon: list[str]"`.
//! Inputs and outputs are separated by `->`, fields by top-level commas, and
//! a field's type follows a colon (`str` when omitted).

use std::{fmt, io, str::FromStr};

use serde::Serialize;
use serde_json::{Value as JV, json, ser::Formatter};

/// Errors from parsing a signature or field type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature must contain exactly one '->': {0:?}")]
    MissingArrow(String),
    #[error("signature has no {0} fields")]
    EmptySide(&'static str),
    #[error("invalid field name {0:?}")]
    InvalidName(String),
    #[error("duplicate field name '{0}'")]
    DuplicateField(String),
    #[error("invalid field type {0:?}")]
    InvalidType(String),
    #[error("unbalanced brackets or quotes in {0:?}")]
    Unbalanced(String),
}

/// Type annotation of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
    List(Box<FieldType>),
    Dict(Box<FieldType>, Box<FieldType>),
    /// One of a fixed set of string values.
    Literal(Vec<String>),
    /// Any other type, kept by name (e.g. `REPLHistory`).
    Named(String),
}

impl FieldType {
    /// Returns the JSON schema the model's value for this type must follow.
    #[must_use]
    pub fn json_schema(&self) -> JV {
        match self {
            Self::Str => json!({"type": "string"}),
            Self::Int => json!({"type": "integer"}),
            Self::Float => json!({"type": "number"}),
            Self::Bool => json!({"type": "boolean"}),
            Self::List(item) => json!({"items": item.json_schema(), "type": "array"}),
            Self::Dict(_, value) => json!({"additionalProperties": value.json_schema(), "type": "object"}),
            Self::Literal(values) => json!({"enum": values, "type": "string"}),
            Self::Named(name) => json!({"title": name}),
        }
    }

    /// Returns the constraint appended to an output field's description, if any.
    ///
    /// Plain strings need no note.
    #[must_use]
    pub fn output_note(&self) -> Option<String> {
        match self {
            Self::Str => None,
            Self::Bool => Some("must be True or False".to_owned()),
            Self::Int => Some("must be a single int value".to_owned()),
            Self::Float => Some("must be a single float value".to_owned()),
            Self::Literal(values) => Some(format!(
                "must exactly match (no extra characters) one of: {}",
                values.join("; ")
            )),
            Self::Named(name) => Some(format!("must be a value of type {name}")),
            Self::List(_) | Self::Dict(..) => Some(format!(
                "must adhere to the JSON schema: {}",
                spaced_json(&self.json_schema())
            )),
        }
    }
}

/// One-line JSON with `", "` and `": "` separators, the layout Python's `json.dumps` prints.
fn spaced_json(value: &JV) -> String {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => f.write_str("str"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::List(item) => write!(f, "list[{item}]"),
            Self::Dict(key, value) => write!(f, "dict[{key}, {value}]"),
            Self::Literal(values) => {
                f.write_str("Literal[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{value}'")?;
                }
                f.write_str("]")
            }
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for FieldType {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || SignatureError::InvalidType(s.to_owned());
        let Some(open) = s.find('[') else {
            return match s {
                "str" => Ok(Self::Str),
                "int" => Ok(Self::Int),
                "float" => Ok(Self::Float),
                "bool" => Ok(Self::Bool),
                "list" => Ok(Self::List(Box::new(Self::Named("Any".to_owned())))),
                "dict" => Ok(Self::Dict(
                    Box::new(Self::Str),
                    Box::new(Self::Named("Any".to_owned())),
                )),
                _ if is_dotted_identifier(s) => Ok(Self::Named(s.to_owned())),
                _ => Err(invalid()),
            };
        };
        let inner = s[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
        let params = split_top_level(inner)?;
        match (&s[..open], params.as_slice()) {
            ("list" | "List", [item]) => Ok(Self::List(Box::new(item.parse()?))),
            ("dict" | "Dict", [key, value]) => Ok(Self::Dict(Box::new(key.parse()?), Box::new(value.parse()?))),
            ("Literal", values) if !values.is_empty() => values
                .iter()
                .map(|value| unquote(value).map(str::to_owned).ok_or_else(invalid))
                .collect::<Result<_, _>>()
                .map(Self::Literal),
            _ => Err(invalid()),
        }
    }
}

/// One named, typed field of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    /// Description shown to the model, if any.
    pub desc: Option<String>,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            desc: None,
        }
    }

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Renders the output-field line used in the instructions: the name in
    /// braces, followed by the type's note if it has one.
    #[must_use]
    pub fn describe_output(&self) -> String {
        match self.ty.output_note() {
            Some(note) => format!("{{{}}}        # note: the value you produce {note}", self.name),
            None => format!("{{{}}}", self.name),
        }
    }

    fn parse(spec: &str) -> Result<Self, SignatureError> {
        let (name, ty) = match spec.split_once(':') {
            Some((name, ty)) => (name.trim(), ty.parse()?),
            None => (spec.trim(), FieldType::Str),
        };
        if !is_identifier(name) {
            return Err(SignatureError::InvalidName(name.to_owned()));
        }
        Ok(Self::new(name, ty))
    }
}

/// Inputs, outputs and instructions of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    instructions: Option<String>,
    inputs: Vec<Field>,
    outputs: Vec<Field>,
}

impl Signature {
    #[must_use]
    pub fn new(inputs: Vec<Field>, outputs: Vec<Field>) -> Self {
        Self {
            instructions: None,
            inputs,
            outputs,
        }
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = (!instructions.trim().is_empty()).then_some(instructions);
        self
    }

    /// Returns the task instructions.
    ///
    /// Without explicit ones this is the generic
    /// ``"Given the fields `a`, `b`, produce the fields `c`."``
    #[must_use]
    pub fn instructions(&self) -> String {
        if let Some(instructions) = &self.instructions {
            return instructions.clone();
        }
        format!(
            "Given the fields {}, produce the fields {}.",
            backticked(&self.inputs),
            backticked(&self.outputs)
        )
    }

    #[must_use]
    pub fn inputs(&self) -> &[Field] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[Field] {
        &self.outputs
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|f| f.name.as_str())
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|f| f.name.as_str())
    }

    #[must_use]
    pub fn append_input(mut self, field: Field) -> Self {
        self.inputs.push(field);
        self
    }

    #[must_use]
    pub fn prepend_input(mut self, field: Field) -> Self {
        self.inputs.insert(0, field);
        self
    }

    #[must_use]
    pub fn append_output(mut self, field: Field) -> Self {
        self.outputs.push(field);
        self
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sides = s.split("->");
        let (Some(inputs), Some(outputs), None) = (sides.next(), sides.next(), sides.next()) else {
            return Err(SignatureError::MissingArrow(s.to_owned()));
        };
        let inputs = parse_fields(inputs, "input")?;
        let outputs = parse_fields(outputs, "output")?;

        let mut seen = std::collections::HashSet::new();
        for field in inputs.iter().chain(&outputs) {
            if !seen.insert(field.name.as_str()) {
                return Err(SignatureError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self::new(inputs, outputs))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |fields: &[Field]| {
            fields
                .iter()
                .map(|field| format!("{}: {}", field.name, field.ty))
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "{} -> {}", side(&self.inputs), side(&self.outputs))
    }
}

fn parse_fields(side: &str, which: &'static str) -> Result<Vec<Field>, SignatureError> {
    if side.trim().is_empty() {
        return Err(SignatureError::EmptySide(which));
    }
    split_top_level(side)?.into_iter().map(Field::parse).collect()
}

/// Splits on commas outside brackets and quotes, trimming each part.
fn split_top_level(s: &str) -> Result<Vec<&str>, SignatureError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SignatureError::Unbalanced(s.to_owned()))?;
            }
            (None, ',') if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(SignatureError::Unbalanced(s.to_owned()));
    }
    parts.push(s[start..].trim());
    Ok(parts)
}

fn unquote(s: &str) -> Option<&str> {
    let s = s.trim();
    s.strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')))
}

/// Returns true for a Python identifier made of ASCII letters, digits and `_`.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_dotted_identifier(s: &str) -> bool {
    s.split('.').all(is_identifier)
}

fn backticked(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("`{}`", f.name))
        .collect::<Vec<_>>()
        .join(", ")
}
