//! Host functions callable from sandboxed code.

use std::fmt;

use indexmap::IndexMap;

use crate::Object;

/// Arguments of one host-function call, with keyword names already checked to be strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    /// Positional arguments in call order.
    pub args: Vec<Object>,
    /// Keyword arguments in call order.
    pub kwargs: Vec<(String, Object)>,
}

impl CallArgs {
    #[must_use]
    pub fn new(args: Vec<Object>, kwargs: Vec<(String, Object)>) -> Self {
        Self { args, kwargs }
    }

    /// Converts the raw call reported by a sandbox.
    ///
    /// # Errors
    /// Returns `ToolError::Arguments` if a keyword name is not a string.
    pub fn from_raw(function: &str, args: Vec<Object>, kwargs: Vec<(Object, Object)>) -> Result<Self, ToolError> {
        let kwargs = kwargs
            .into_iter()
            .map(|(key, value)| match key {
                Object::String(name) => Ok((name, value)),
                other => Err(ToolError::arguments(
                    function,
                    format!("keywords must be strings, not '{}'", other.type_name()),
                )),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { args, kwargs })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    #[must_use]
    pub fn positional(&self, index: usize) -> Option<&Object> {
        self.args.get(index)
    }

    /// Looks up a keyword argument by name.
    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Object> {
        self.kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// Failure of a host function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// The arguments could not be bound to the function's parameters.
    #[error("{function}() {message}")]
    Arguments { function: String, message: String },
    /// `SAVE` was asked to store a name that is bound to a callable.
    #[error("cannot save '{0}': the name is bound to a callable")]
    ReservedName(String),
    /// The function itself failed.
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn arguments(function: &str, message: impl Into<String>) -> Self {
        Self::Arguments {
            function: function.to_owned(),
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A host function exposed to sandboxed code.
///
/// Implemented for any `FnMut(CallArgs) -> Result<Object, ToolError>`, so
/// closures can be registered directly.
pub trait Tool {
    fn call(&mut self, args: CallArgs) -> Result<Object, ToolError>;
}

impl<F> Tool for F
where
    F: FnMut(CallArgs) -> Result<Object, ToolError>,
{
    fn call(&mut self, args: CallArgs) -> Result<Object, ToolError> {
        self(args)
    }
}

/// Host functions registered with an interpreter, by name.
///
/// Tools can be added at any time before an execution; the set of names the
/// sandbox sees is taken from the registry when each execution starts.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under `name`, returning the tool it replaced.
    pub fn register(&mut self, name: impl Into<String>, tool: impl Tool + 'static) -> Option<Box<dyn Tool>> {
        self.tools.insert(name.into(), Box::new(tool))
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Tool>> {
        self.tools.shift_remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Calls the tool registered as `name`, or returns `None` if there is none.
    pub fn call(&mut self, name: &str, args: CallArgs) -> Option<Result<Object, ToolError>> {
        self.tools.get_mut(name).map(|tool| tool.call(args))
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tools.keys()).finish()
    }
}

/// Documentation of a tool, rendered into the model's instructions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    /// Name the tool is called by in sandboxed code.
    pub name: String,
    /// Parameters in call order.
    #[serde(default)]
    pub params: Vec<ToolParam>,
    /// One-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One documented tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolParam {
    pub name: String,
    /// Type name as shown to the model; `Any` when left out.
    #[serde(rename = "type", default = "any_type")]
    pub type_name: String,
}

fn any_type() -> String {
    "Any".to_owned()
}

impl ToolSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            description: None,
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.params.push(ToolParam {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
