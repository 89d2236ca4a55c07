#![doc = include_str!("../../../README.md")]
mod callables;
mod config;
mod error;
mod history;
mod instructions;
mod interpreter;
mod io;
mod object;
mod resource;
mod rlm;
mod sandbox;
mod signature;
mod state;
mod tools;

pub use crate::{
    callables::{BUILTIN_CALLABLES, CLEAR, SAVE, SUBMIT},
    config::{ConfigError, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_LLM_CALLS, DEFAULT_MAX_OUTPUT_CHARS, RlmConfig},
    error::InterpreterError,
    history::{DEFAULT_PREVIEW_CHARS, ReplEntry, ReplHistory, VariableInfo, variables_info},
    instructions::{Signatures, action_instructions, build_signatures, format_tool_docs},
    interpreter::{CodeInterpreter, ExecuteOutput, FinalOutput, SandboxInterpreter},
    io::{CollectStringPrint, NoPrint, PrintWriter},
    object::{ConversionError, DictPairs, Object},
    resource::{DEFAULT_MAX_RECURSION_DEPTH, ResourceError, ResourceLimits},
    rlm::{RESERVED_TOOL_NAMES, RlmError, SandboxRlm},
    sandbox::{Program, RunProgress, Sandbox, SandboxError, Snapshot},
    signature::{Field, FieldType, Signature, SignatureError},
    state::{Namespace, SavedState},
    tools::{CallArgs, Tool, ToolError, ToolParam, ToolRegistry, ToolSpec},
};
