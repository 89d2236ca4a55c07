//! The front the reasoning loop talks to: task signature, config, tools and interpreter.

use std::collections::HashSet;

use crate::{
    CodeInterpreter, Namespace, RlmConfig, ReplHistory, Sandbox, SandboxInterpreter, Signature, Signatures, Tool,
    ToolSpec,
    history::{self, DEFAULT_PREVIEW_CHARS},
    instructions::build_signatures,
    signature::is_identifier,
};

/// Names user tools may not take: the sandbox callables and the loop's own functions.
pub const RESERVED_TOOL_NAMES: [&str; 6] = ["SAVE", "CLEAR", "SUBMIT", "llm_query", "llm_query_batched", "print"];

/// Errors setting up a [`SandboxRlm`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RlmError {
    #[error("invalid tool name {0:?}: must be a valid Python identifier")]
    InvalidToolName(String),
    #[error("tool name '{0}' conflicts with a built-in sandbox function")]
    ReservedToolName(String),
    #[error("duplicate tool name '{0}'")]
    DuplicateToolName(String),
    #[error("tool '{0}' is not declared in the config")]
    UndeclaredTool(String),
}

/// A task prepared for a sandboxed reasoning run.
///
/// Owns the interpreter the loop executes snippets with. The loop itself,
/// model calls included, lives outside this crate.
#[derive(Debug)]
pub struct SandboxRlm<I> {
    signature: Signature,
    config: RlmConfig,
    interpreter: I,
}

impl<S: Sandbox> SandboxRlm<SandboxInterpreter<S>> {
    /// Wraps `sandbox` in a [`SandboxInterpreter`] configured from `config`.
    pub fn new(signature: Signature, config: RlmConfig, sandbox: S) -> Result<Self, RlmError> {
        let interpreter = SandboxInterpreter::new(sandbox)
            .with_type_check(config.type_check)
            .with_type_check_stubs(config.type_check_stubs.clone())
            .with_limits(config.limits.clone());
        Self::with_interpreter(signature, config, interpreter)
    }
}

impl<I: CodeInterpreter> SandboxRlm<I> {
    /// Uses a caller-supplied interpreter.
    ///
    /// Validates the config's tool names and points positional `SUBMIT`
    /// arguments at the signature's outputs.
    pub fn with_interpreter(signature: Signature, config: RlmConfig, mut interpreter: I) -> Result<Self, RlmError> {
        validate_tool_names(config.tools.iter().map(|tool| tool.name.as_str()))?;
        interpreter.set_output_fields(signature.output_names().map(str::to_owned).collect());
        tracing::debug!(
            %signature,
            tools = config.tools.len(),
            implemented = config.tools.iter().filter(|spec| interpreter.tools().contains(&spec.name)).count(),
            "prepared sandboxed run"
        );
        Ok(Self {
            signature,
            config,
            interpreter,
        })
    }

    /// Documents and registers a user tool.
    ///
    /// A spec of the same name declared in the config, but not yet backed by
    /// an implementation, is replaced by `spec`. A name that already has an
    /// implementation is a duplicate.
    pub fn register_tool(&mut self, spec: ToolSpec, tool: impl Tool + 'static) -> Result<(), RlmError> {
        validate_tool_names(
            self.config
                .tools
                .iter()
                .map(|tool| tool.name.as_str())
                .filter(|name| *name != spec.name)
                .chain([spec.name.as_str()]),
        )?;
        if self.interpreter.tools().contains(&spec.name) {
            return Err(RlmError::DuplicateToolName(spec.name));
        }
        self.interpreter.tools_mut().register(spec.name.clone(), tool);
        match self.config.tools.iter_mut().find(|declared| declared.name == spec.name) {
            Some(declared) => *declared = spec,
            None => self.config.tools.push(spec),
        }
        Ok(())
    }

    /// Attaches an implementation to a tool declared in the config.
    pub fn implement_tool(&mut self, name: &str, tool: impl Tool + 'static) -> Result<(), RlmError> {
        let spec = self
            .config
            .tools
            .iter()
            .find(|declared| declared.name == name)
            .cloned()
            .ok_or_else(|| RlmError::UndeclaredTool(name.to_owned()))?;
        self.register_tool(spec, tool)
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn config(&self) -> &RlmConfig {
        &self.config
    }

    /// Every documented tool spec, implemented or not.
    #[must_use]
    pub fn tools(&self) -> &[ToolSpec] {
        &self.config.tools
    }

    /// Declared tools that have no implementation yet, and so are not advertised.
    pub fn unimplemented_tools(&self) -> impl Iterator<Item = &ToolSpec> {
        let registry = self.interpreter.tools();
        self.config.tools.iter().filter(move |spec| !registry.contains(&spec.name))
    }

    #[must_use]
    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut I {
        &mut self.interpreter
    }

    #[must_use]
    pub fn into_interpreter(self) -> I {
        self.interpreter
    }

    /// Builds the action and extract signatures for the current tools.
    ///
    /// Only tools the sandbox can call are documented.
    #[must_use]
    pub fn build_signatures(&self) -> Signatures {
        let (callable, missing): (Vec<ToolSpec>, Vec<ToolSpec>) = self
            .config
            .tools
            .iter()
            .cloned()
            .partition(|spec| self.interpreter.tools().contains(&spec.name));
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|spec| spec.name.as_str()).collect();
            tracing::warn!(?names, "leaving declared tools without an implementation out of the instructions");
        }
        build_signatures(&self.signature, &self.config, &callable)
    }

    /// Renders the `variables_info` input for `inputs`.
    #[must_use]
    #[expect(clippy::unused_self, reason = "kept beside the other per-step renderings")]
    pub fn variables_info(&self, inputs: &Namespace) -> String {
        history::variables_info(inputs, DEFAULT_PREVIEW_CHARS)
    }

    /// Renders the `repl_history` input, truncating outputs per the config.
    #[must_use]
    pub fn format_history(&self, history: &ReplHistory) -> String {
        history.format(self.config.max_output_chars)
    }
}

fn validate_tool_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), RlmError> {
    let mut seen = HashSet::new();
    for name in names {
        if !is_identifier(name) {
            return Err(RlmError::InvalidToolName(name.to_owned()));
        }
        if RESERVED_TOOL_NAMES.contains(&name) {
            return Err(RlmError::ReservedToolName(name.to_owned()));
        }
        if !seen.insert(name) {
            return Err(RlmError::DuplicateToolName(name.to_owned()));
        }
    }
    Ok(())
}
