//! Interface to the restricted code-execution sandbox.
//!
//! The sandbox itself lives outside this crate. What it must offer is a fresh
//! namespace for every execution, seeded from the inputs it is given, and a
//! pause/resume protocol for calls to host-provided functions: execution stops
//! at each such call, the host computes a return value, and the sandbox
//! continues from where it stopped.

use crate::{Object, PrintWriter, ResourceError, ResourceLimits};

/// One snippet of code plus everything the sandbox needs to compile it.
#[derive(Debug, Clone, Copy)]
pub struct Program<'a> {
    /// Source code to execute.
    pub code: &'a str,
    /// Names bound as inputs, in the same order as the `inputs` passed to
    /// [`Sandbox::start`].
    pub input_names: &'a [String],
    /// Names that resolve to host functions. Calling one pauses execution
    /// with [`RunProgress::FunctionCall`].
    pub external_functions: &'a [String],
    /// Whether the sandbox should type-check the code before running it.
    pub type_check: bool,
    /// Extra source prepended when type checking, used as stubs.
    pub type_check_stubs: Option<&'a str>,
}

/// Errors reported by a sandbox implementation, by pipeline stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SandboxError {
    /// The code could not be parsed.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// Type checking was requested and failed.
    #[error("type error: {0}")]
    Typing(String),
    /// The code raised an exception while running.
    #[error("{0}")]
    Runtime(String),
    /// A resource limit was exceeded while running.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Progress of one execution.
#[derive(Debug)]
pub enum RunProgress<S> {
    /// Execution paused at a call to a host function.
    FunctionCall {
        /// The name of the function being called.
        function_name: String,
        /// Positional arguments.
        args: Vec<Object>,
        /// Keyword arguments as (key, value) pairs.
        kwargs: Vec<(Object, Object)>,
        /// Identifier of this call within the execution.
        call_id: u32,
        /// State to resume with the call's return value.
        state: S,
    },
    /// All work is blocked on pending async host calls.
    ResolveFutures(Vec<u32>),
    /// Execution finished with the value of the last expression.
    Complete(Object),
}

/// A sandbox that runs each program in a fresh namespace.
///
/// Nothing from one `start` is visible to the next; values that should
/// survive must be passed in again through `inputs`.
pub trait Sandbox {
    /// Paused execution state returned with [`RunProgress::FunctionCall`].
    type Snapshot: Snapshot;

    /// Compiles `program` and runs it until it completes or calls a host function.
    ///
    /// `inputs` are bound to `program.input_names` position by position.
    fn start(
        &mut self,
        program: Program<'_>,
        inputs: Vec<Object>,
        limits: Option<&ResourceLimits>,
        print: &mut dyn PrintWriter,
    ) -> Result<RunProgress<Self::Snapshot>, SandboxError>;
}

/// A paused execution, waiting for the return value of a host function.
pub trait Snapshot: Sized {
    /// Resumes execution with `return_value` as the result of the pending call.
    fn resume(self, return_value: Object, print: &mut dyn PrintWriter) -> Result<RunProgress<Self>, SandboxError>;
}
