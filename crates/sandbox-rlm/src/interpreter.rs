//! Runs model-written snippets in the sandbox with saved state and tools injected.

use indexmap::IndexMap;

use crate::{
    CallArgs, CollectStringPrint, InterpreterError, Namespace, Object, Program, ResourceLimits, RunProgress, Sandbox,
    SavedState, Snapshot, ToolRegistry,
    callables::{self, BUILTIN_CALLABLES, CLEAR, SAVE, SUBMIT},
};

/// Outputs passed to `SUBMIT`, keyed by output field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalOutput {
    fields: IndexMap<String, Object>,
}

impl FinalOutput {
    #[must_use]
    pub fn new(fields: IndexMap<String, Object>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Object> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Object)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, Object> {
        self.fields
    }
}

/// Result of one successful execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutput {
    /// The snippet ran to completion. Holds what it printed, `None` if nothing.
    Output(Option<String>),
    /// The snippet called `SUBMIT`; the run is over.
    Final(FinalOutput),
}

/// The interpreter seam the reasoning loop drives.
///
/// The loop registers its own tools (sub-model queries and the like) through
/// [`CodeInterpreter::tools_mut`], calls [`CodeInterpreter::start`] once per
/// run and then [`CodeInterpreter::execute`] once per step.
pub trait CodeInterpreter {
    fn tools(&self) -> &ToolRegistry;

    fn tools_mut(&mut self) -> &mut ToolRegistry;

    /// Sets the output field names that positional `SUBMIT` arguments bind to.
    fn set_output_fields(&mut self, fields: Vec<String>);

    /// Begins a new session, discarding anything saved by a previous one.
    fn start(&mut self);

    /// Executes one snippet.
    ///
    /// `variables` are the run's inputs; they are injected on every call
    /// together with the saved state. A name bound to a host function is
    /// never injected as a variable; the saved value stays in the state.
    fn execute(&mut self, code: &str, variables: Option<&Namespace>) -> Result<ExecuteOutput, InterpreterError>;

    fn shutdown(&mut self) {}
}

/// [`CodeInterpreter`] backed by a [`Sandbox`], adding `SAVE`/`CLEAR` persistence.
///
/// Each execution runs in a namespace built fresh from the inputs and the
/// saved state. Only explicit `SAVE` calls persist anything; nothing is
/// captured from the namespace after a run.
#[derive(Debug)]
pub struct SandboxInterpreter<S> {
    sandbox: S,
    tools: ToolRegistry,
    state: SavedState,
    type_check: bool,
    type_check_stubs: Option<String>,
    limits: Option<ResourceLimits>,
    output_fields: Vec<String>,
}

impl<S: Sandbox> SandboxInterpreter<S> {
    /// Creates an interpreter with type checking on, no tools and no limits.
    #[must_use]
    pub fn new(sandbox: S) -> Self {
        Self {
            sandbox,
            tools: ToolRegistry::new(),
            state: SavedState::new(),
            type_check: true,
            type_check_stubs: None,
            limits: None,
            output_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn with_type_check(mut self, type_check: bool) -> Self {
        self.type_check = type_check;
        self
    }

    /// Sets code prepended to each snippet when type checking, used as stubs.
    #[must_use]
    pub fn with_type_check_stubs(mut self, stubs: Option<String>) -> Self {
        self.type_check_stubs = stubs;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: Option<ResourceLimits>) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn saved_state(&self) -> &SavedState {
        &self.state
    }

    #[must_use]
    pub fn output_fields(&self) -> &[String] {
        &self.output_fields
    }

    #[must_use]
    pub fn sandbox(&self) -> &S {
        &self.sandbox
    }

    pub fn sandbox_mut(&mut self) -> &mut S {
        &mut self.sandbox
    }

    /// Names resolved to host functions: the built-in callables, then the tools.
    fn external_functions(&self) -> Vec<String> {
        BUILTIN_CALLABLES
            .iter()
            .map(|name| (*name).to_owned())
            .chain(
                self.tools
                    .names()
                    .filter(|name| !BUILTIN_CALLABLES.contains(name))
                    .map(str::to_owned),
            )
            .collect()
    }

    /// Runs the host side of one paused call, other than `SUBMIT`.
    fn dispatch(&mut self, function_name: &str, args: CallArgs) -> Result<Object, InterpreterError> {
        let result = match function_name {
            SAVE => {
                let tools = &self.tools;
                callables::save(&mut self.state, args, |name| {
                    BUILTIN_CALLABLES.contains(&name) || tools.contains(name)
                })
            }
            CLEAR => callables::clear(&mut self.state, args),
            _ => match self.tools.call(function_name, args) {
                Some(result) => result,
                None => return Err(InterpreterError::Execution(format!("Unknown function: {function_name}"))),
            },
        };
        result.map_err(|error| {
            tracing::warn!(%function_name, %error, "host function failed");
            InterpreterError::Execution(format!("Tool {function_name} failed: {error}"))
        })
    }
}

impl<S: Sandbox> CodeInterpreter for SandboxInterpreter<S> {
    fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    fn set_output_fields(&mut self, fields: Vec<String>) {
        self.output_fields = fields;
    }

    fn start(&mut self) {
        tracing::info!(discarded = self.state.len(), "starting interpreter session");
        self.state.reset();
    }

    fn execute(&mut self, code: &str, variables: Option<&Namespace>) -> Result<ExecuteOutput, InterpreterError> {
        let external_functions = self.external_functions();
        let mut namespace = self.state.namespace(variables);
        namespace.retain(|name, _| {
            let bound = external_functions.contains(name);
            if bound {
                tracing::warn!(%name, "not injecting variable: the name is bound to a callable");
            }
            !bound
        });
        let (input_names, inputs): (Vec<String>, Vec<Object>) = namespace.into_iter().unzip();
        let program = Program {
            code,
            input_names: &input_names,
            external_functions: &external_functions,
            type_check: self.type_check,
            type_check_stubs: self.type_check_stubs.as_deref(),
        };
        tracing::debug!(
            inputs = ?input_names,
            saved = self.state.len(),
            functions = external_functions.len(),
            "starting execution"
        );

        let mut printer = CollectStringPrint::new();
        let mut progress = self
            .sandbox
            .start(program, inputs, self.limits.as_ref(), &mut printer)?;
        loop {
            match progress {
                RunProgress::Complete(_) => break,
                RunProgress::FunctionCall {
                    function_name,
                    args,
                    kwargs,
                    call_id,
                    state,
                } => {
                    tracing::debug!(%function_name, call_id, "host function call");
                    let args = CallArgs::from_raw(&function_name, args, kwargs)
                        .map_err(|error| InterpreterError::Execution(format!("Tool {function_name} failed: {error}")))?;
                    if function_name == SUBMIT {
                        let fields = callables::submit(args, &self.output_fields);
                        tracing::debug!(fields = ?fields.keys().collect::<Vec<_>>(), "submitted");
                        return Ok(ExecuteOutput::Final(FinalOutput::new(fields)));
                    }
                    let return_value = self.dispatch(&function_name, args)?;
                    progress = state.resume(return_value, &mut printer)?;
                }
                RunProgress::ResolveFutures(pending) => {
                    tracing::warn!(?pending, "sandbox blocked on async futures");
                    return Err(InterpreterError::Execution("Async futures not supported".to_owned()));
                }
            }
        }

        let stdout = printer.into_output();
        Ok(ExecuteOutput::Output((!stdout.is_empty()).then_some(stdout)))
    }
}
