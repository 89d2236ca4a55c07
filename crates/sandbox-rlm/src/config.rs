use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{ResourceLimits, ToolSpec};

/// Default number of reasoning steps before the loop must extract an answer.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;
/// Default budget of sub-model queries per run.
pub const DEFAULT_MAX_LLM_CALLS: usize = 50;
/// Default number of characters of each step's output kept in the history.
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 100_000;

/// Errors loading an [`RlmConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of a sandboxed reasoning run.
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```toml
/// max_iterations = 10
/// type_check = true
///
/// [limits]
/// max_duration_secs = 2.5
///
/// [[tools]]
/// name = "search"
/// description = "Search the corpus"
/// params = [{ name = "query", type = "str" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RlmConfig {
    /// Maximum number of reasoning steps. Read by the external loop; this
    /// crate only carries it so one file configures both.
    pub max_iterations: usize,
    /// Sub-model query budget, announced to the model in its instructions.
    pub max_llm_calls: usize,
    /// Characters of each step's output kept when rendering the history.
    pub max_output_chars: usize,
    /// Step-by-step logging in the external loop. Carried, not read, here.
    pub verbose: bool,
    /// Ask the sandbox to type-check each snippet before running it.
    pub type_check: bool,
    /// Code prepended when type checking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_check_stubs: Option<String>,
    /// Resource limits forwarded to the sandbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceLimits>,
    /// Documentation of the user tools, rendered into the instructions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

impl Default for RlmConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_llm_calls: DEFAULT_MAX_LLM_CALLS,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            verbose: false,
            type_check: false,
            type_check_stubs: None,
            limits: None,
            tools: Vec::new(),
        }
    }
}

impl RlmConfig {
    /// Parses a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }
}
