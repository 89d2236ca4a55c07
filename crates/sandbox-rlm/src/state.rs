//! Variables persisted across executions by `SAVE` and `CLEAR`.

use indexmap::IndexMap;

use crate::Object;

/// Name bindings injected into one execution.
pub type Namespace = IndexMap<String, Object>;

/// The session's saved variables.
///
/// Owned by exactly one interpreter; created empty, only ever changed by
/// [`SavedState::save`] and [`SavedState::clear`]. Entries are never evicted
/// implicitly. Iteration follows first-insertion order, so injected namespaces
/// are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedState {
    entries: IndexMap<String, Object>,
}

impl SavedState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes every pair into the state, overwriting existing names.
    ///
    /// Returns the acknowledgment handed back to sandboxed code,
    /// `"Saved: a, b"` (just `"Saved: "` when called with no pairs).
    pub fn save(&mut self, pairs: impl IntoIterator<Item = (String, Object)>) -> String {
        let mut names = Vec::new();
        for (name, value) in pairs {
            names.push(name.clone());
            self.entries.insert(name, value);
        }
        tracing::debug!(?names, total = self.entries.len(), "saved variables");
        format!("Saved: {}", names.join(", "))
    }

    /// Removes the given names, or everything when `names` is empty.
    ///
    /// Names that are not saved are ignored. Returns the acknowledgment handed
    /// back to sandboxed code.
    pub fn clear(&mut self, names: &[String]) -> String {
        if names.is_empty() {
            self.entries.clear();
            tracing::debug!("cleared all saved variables");
            return "Cleared all saved state".to_owned();
        }
        for name in names {
            // shift_remove keeps the order of the remaining entries
            self.entries.shift_remove(name);
        }
        tracing::debug!(?names, total = self.entries.len(), "cleared variables");
        format!("Cleared: {}", names.join(", "))
    }

    /// Removes every entry. Used when a new session starts.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Builds a fresh namespace: `variables` first, saved entries on top.
    ///
    /// A saved value shadows an input variable of the same name. The result is
    /// a copy, so nothing the sandbox does to it reaches the saved state.
    #[must_use]
    pub fn namespace(&self, variables: Option<&Namespace>) -> Namespace {
        let mut namespace = variables.cloned().unwrap_or_default();
        for (name, value) in &self.entries {
            namespace.insert(name.clone(), value.clone());
        }
        namespace
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Object> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Object)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
