//! Text the reasoning loop feeds back to the model each step.

use std::fmt::Write;

use crate::{Namespace, Object};

/// Characters of a variable's value shown in its preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Metadata about one input variable, rendered into `variables_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: String,
    pub type_name: &'static str,
    /// Length in characters of the value's string form.
    pub total_length: usize,
    pub preview: String,
}

impl VariableInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, value: &Object, preview_chars: usize) -> Self {
        let text = value.to_string();
        let total_length = text.chars().count();
        let preview = if total_length > preview_chars {
            text.chars().take(preview_chars).collect::<String>() + "..."
        } else {
            text
        };
        Self {
            name: name.into(),
            type_name: value.type_name(),
            total_length,
            preview,
        }
    }

    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "Variable: `{}` (access it in your code)\nType: {}\nTotal length: {} characters\nPreview:\n```\n{}\n```",
            self.name, self.type_name, self.total_length, self.preview
        )
    }
}

/// Renders metadata for every variable in `inputs`, separated by blank lines.
#[must_use]
pub fn variables_info(inputs: &Namespace, preview_chars: usize) -> String {
    inputs
        .iter()
        .map(|(name, value)| VariableInfo::new(name, value, preview_chars).format())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One step of the loop: what the model thought, ran and saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplEntry {
    pub reasoning: String,
    pub code: String,
    pub output: String,
}

impl ReplEntry {
    fn format(&self, index: usize, max_output_chars: usize) -> String {
        let total = self.output.chars().count();
        let output = if total > max_output_chars {
            let truncated = self.output.chars().take(max_output_chars).collect::<String>();
            format!("{truncated}\n... (truncated to {max_output_chars}/{total} chars)")
        } else {
            self.output.clone()
        };

        let mut formatted = String::new();
        let _ = writeln!(formatted, "=== Step {} ===", index + 1);
        if !self.reasoning.is_empty() {
            let _ = writeln!(formatted, "Reasoning: {}", self.reasoning);
        }
        let _ = writeln!(formatted, "Code:\n```python\n{}\n```", self.code);
        let _ = write!(formatted, "Output ({total} chars):\n{output}");
        formatted
    }
}

/// Ordered record of every step taken so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplHistory {
    entries: Vec<ReplEntry>,
}

impl ReplHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reasoning: impl Into<String>, code: impl Into<String>, output: impl Into<String>) {
        self.entries.push(ReplEntry {
            reasoning: reasoning.into(),
            code: code.into(),
            output: output.into(),
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[ReplEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the history, keeping at most `max_output_chars` of each step's output.
    #[must_use]
    pub fn format(&self, max_output_chars: usize) -> String {
        if self.entries.is_empty() {
            return "You have not interacted with the REPL environment yet.".to_owned();
        }
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.format(index, max_output_chars))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
