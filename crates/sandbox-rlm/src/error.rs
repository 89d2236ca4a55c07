use crate::SandboxError;

/// Error returned to the orchestrator by [`CodeInterpreter::execute`](crate::CodeInterpreter::execute).
///
/// The orchestrator decides what to do with it: typically the message goes
/// back to the model as feedback for its next step. Nothing here is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpreterError {
    /// The snippet could not be parsed.
    #[error("SyntaxError: {0}")]
    Syntax(String),
    /// Anything else: type check failure, runtime exception, exceeded limit,
    /// unknown or failing host function.
    #[error("{0}")]
    Execution(String),
}

impl From<SandboxError> for InterpreterError {
    fn from(error: SandboxError) -> Self {
        match error {
            SandboxError::Syntax(message) => Self::Syntax(message),
            SandboxError::Typing(message) | SandboxError::Runtime(message) => Self::Execution(message),
            SandboxError::Resource(error) => Self::Execution(error.to_string()),
        }
    }
}
