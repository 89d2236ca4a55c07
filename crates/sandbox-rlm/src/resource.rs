use std::time::Duration;

/// Error a sandbox reports when a resource limit is exceeded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    /// Maximum number of allocations exceeded.
    #[error("allocation limit exceeded: {count} > {limit}")]
    Allocation { limit: usize, count: usize },
    /// Maximum instruction operations exceeded.
    #[error("operation limit exceeded: {count} > {limit}")]
    Operation { limit: usize, count: usize },
    /// Maximum execution time exceeded.
    #[error("time limit exceeded: {elapsed:?} > {limit:?}")]
    Time { limit: Duration, elapsed: Duration },
    /// Maximum memory usage exceeded.
    #[error("memory limit exceeded: {used} bytes > {limit} bytes")]
    Memory { limit: usize, used: usize },
    /// Maximum recursion depth exceeded.
    #[error("maximum recursion depth exceeded")]
    Recursion { limit: usize, depth: usize },
}

/// Resource limits handed to the sandbox for every execution.
///
/// This layer never enforces them itself; they are forwarded untouched. All
/// limits are optional, `None` disables a limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum number of VM operations per execution step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_operations: Option<usize>,
    /// Maximum number of heap allocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_allocations: Option<usize>,
    /// Maximum execution time, written as fractional seconds in config files.
    #[serde(rename = "max_duration_secs", with = "opt_secs", skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<Duration>,
    /// Maximum heap memory in bytes (approximate).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_memory: Option<usize>,
    /// Run garbage collection every N allocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_interval: Option<usize>,
    /// Maximum recursion depth (function call stack depth).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_recursion_depth: Option<usize>,
}

/// Recommended maximum recursion depth if not otherwise specified.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

impl ResourceLimits {
    /// Creates limits with everything disabled except recursion, which is capped
    /// at [`DEFAULT_MAX_RECURSION_DEPTH`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_recursion_depth: Some(DEFAULT_MAX_RECURSION_DEPTH),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn max_allocations(mut self, limit: usize) -> Self {
        self.max_allocations = Some(limit);
        self
    }

    #[must_use]
    pub fn max_operations(mut self, limit: usize) -> Self {
        self.max_operations = Some(limit);
        self
    }

    #[must_use]
    pub fn max_duration(mut self, limit: Duration) -> Self {
        self.max_duration = Some(limit);
        self
    }

    /// Sets the maximum memory usage in bytes.
    #[must_use]
    pub fn max_memory(mut self, limit: usize) -> Self {
        self.max_memory = Some(limit);
        self
    }

    /// Sets the garbage collection interval (run GC every N allocations).
    #[must_use]
    pub fn gc_interval(mut self, interval: usize) -> Self {
        self.gc_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn max_recursion_depth(mut self, limit: Option<usize>) -> Self {
        self.max_recursion_depth = limit;
        self
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}
