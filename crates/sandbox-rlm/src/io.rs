use std::borrow::Cow;

/// Sink for the `print()` output of sandboxed code.
///
/// Sandbox implementations call this for everything a snippet prints. The
/// interpreter hands each execution a fresh [`CollectStringPrint`] and returns
/// what it gathered to the orchestrator.
pub trait PrintWriter {
    /// Called once for each formatted argument passed to `print()`.
    ///
    /// Writes only the argument's text; separators and the trailing newline
    /// are emitted through [`PrintWriter::stdout_push`].
    fn stdout_write(&mut self, output: Cow<'_, str>);

    /// Adds a single character to stdout, generally a separator or newline.
    fn stdout_push(&mut self, end: char);
}

/// A `PrintWriter` that collects all output into a string.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) {
        self.0.push_str(&output);
    }

    fn stdout_push(&mut self, end: char) {
        self.0.push(end);
    }
}

/// `PrintWriter` that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: Cow<'_, str>) {}

    fn stdout_push(&mut self, _end: char) {}
}
