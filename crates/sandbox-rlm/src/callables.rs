//! The callables every execution gets besides the registered tools.
//!
//! `SAVE` and `CLEAR` operate on the session's [`SavedState`]; `SUBMIT` ends
//! the run with the final outputs.

use indexmap::IndexMap;

use crate::{CallArgs, Object, SavedState, ToolError};

/// Persists keyword arguments across executions: `SAVE(name=value, ...)`.
pub const SAVE: &str = "SAVE";
/// Removes saved variables: `CLEAR(name, ...)`, or all of them with `CLEAR()`.
pub const CLEAR: &str = "CLEAR";
/// Ends the run with the final outputs: `SUBMIT(field=value, ...)`.
pub const SUBMIT: &str = "SUBMIT";

/// Names bound in every execution in addition to the registered tools.
pub const BUILTIN_CALLABLES: [&str; 3] = [SAVE, CLEAR, SUBMIT];

/// Binds a `SAVE` call and applies it to `state`.
///
/// Only keyword arguments are accepted. Every name is checked against
/// `is_callable` before anything is written, so a rejected call leaves the
/// state untouched.
pub(crate) fn save(
    state: &mut SavedState,
    args: CallArgs,
    is_callable: impl Fn(&str) -> bool,
) -> Result<Object, ToolError> {
    if !args.args.is_empty() {
        return Err(ToolError::arguments(
            SAVE,
            format!("takes 0 positional arguments but {} were given", args.args.len()),
        ));
    }
    if let Some((name, _)) = args.kwargs.iter().find(|(name, _)| is_callable(name)) {
        return Err(ToolError::ReservedName(name.clone()));
    }
    Ok(Object::String(state.save(args.kwargs)))
}

/// Binds a `CLEAR` call and applies it to `state`.
///
/// Only positional string arguments are accepted.
pub(crate) fn clear(state: &mut SavedState, args: CallArgs) -> Result<Object, ToolError> {
    if let Some((name, _)) = args.kwargs.first() {
        return Err(ToolError::arguments(
            CLEAR,
            format!("got an unexpected keyword argument '{name}'"),
        ));
    }
    let names = args
        .args
        .into_iter()
        .map(|arg| match arg {
            Object::String(name) => Ok(name),
            other => Err(ToolError::arguments(
                CLEAR,
                format!("names must be str, not '{}'", other.type_name()),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Object::String(state.clear(&names)))
}

/// Binds a `SUBMIT` call to the task's output fields.
///
/// Keyword arguments are taken as given. Positional arguments fill the output
/// fields in declaration order but never replace a keyword of the same name;
/// extra positional arguments are dropped.
pub(crate) fn submit(args: CallArgs, output_fields: &[String]) -> IndexMap<String, Object> {
    let mut fields: IndexMap<String, Object> = args.kwargs.into_iter().collect();
    for (name, value) in output_fields.iter().zip(args.args) {
        fields.entry(name.clone()).or_insert(value);
    }
    fields
}
