//! Instructions telling the model how to work inside the restricted sandbox.
//!
//! Everything here is rebuilt on each call from the task signature, the
//! config and the current tool list; nothing is cached.

use crate::{Field, FieldType, RlmConfig, Signature, ToolSpec};

const EXTRACT_INSTRUCTIONS: &str = "Based on the REPL trajectory, extract the final outputs now.

Review your trajectory to see what information you gathered and what values you computed, then provide the final outputs.";

/// The two signatures the reasoning loop works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signatures {
    /// Produces the next reasoning step and code snippet.
    pub action: Signature,
    /// Extracts the final outputs from the trajectory when the loop runs out of steps.
    pub extract: Signature,
}

/// Renders the sandbox-specific action instructions for `signature`.
///
/// Describes the inputs, the expected outputs, the callables available in the
/// sandbox (`llm_query`, `llm_query_batched`, `print`, `SAVE`, `CLEAR`,
/// `SUBMIT`) and the environment's limits: builtins only, no imports, no
/// class definitions.
#[must_use]
pub fn action_instructions(signature: &Signature, max_llm_calls: usize) -> String {
    let inputs = signature
        .input_names()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let final_output_names = signature.output_names().collect::<Vec<_>>().join(", ");
    let output_fields = signature
        .outputs()
        .iter()
        .map(|field| format!("- {}", field.describe_output()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are tasked with producing the following outputs given the inputs {inputs}:
{output_fields}

You have access to a restricted Python sandbox. Write Python code and it will be executed. You will see the output, then write more code based on what you learned. This is an iterative process.

Available:
- Variables: {inputs} (your input data, re-injected every iteration)
- `llm_query(prompt)` - query a sub-LLM (~500K char capacity) for semantic analysis
- `llm_query_batched(prompts)` - query multiple prompts concurrently (much faster for multiple queries)
- `print()` - ALWAYS print to see results
- `SAVE(name=value, ...)` - persist variables across iterations (re-injected automatically next iteration)
- `CLEAR(name1, name2, ...)` or `CLEAR()` - remove saved variables (all if no args)
- `SUBMIT({final_output_names})` - submit final output when done
- Builtins only. NO imports available (no re, collections, math, os, sys, etc.). NO class definitions.

IMPORTANT: This is ITERATIVE. Each code block you write will execute, you'll see the output, then you decide what to do next. Do NOT try to solve everything in one step.

1. EXPLORE FIRST - Look at your data before processing it. Print samples, check types/lengths, understand the structure.
2. ITERATE - Write small code snippets, observe outputs, then decide next steps. Use `SAVE()` to persist intermediate results across iterations.
3. VERIFY BEFORE SUBMITTING - If results seem wrong (zeros, empty, unexpected), reconsider your approach.
4. USE llm_query FOR SEMANTICS - String matching finds WHERE things are; llm_query understands WHAT things mean.
5. MINIMIZE RETYPING (INPUTS & OUTPUTS) - When values are long, precise, or error-prone (IDs, numbers, code, quotes), re-access them via input variables and parse/compute in code instead of retyping.
6. SUBMIT ONLY AFTER SEEING OUTPUTS - SUBMIT ends the current run immediately. If you need to inspect printed output, run it in one step, review the result, then call SUBMIT in a later step.

You have max {max_llm_calls} sub-LLM calls. When done, call SUBMIT() with your output."
    )
}

/// Documents user tools for the model, one line per tool.
///
/// Returns an empty string when there are no tools.
#[must_use]
pub fn format_tool_docs(tools: &[ToolSpec]) -> String {
    if tools.is_empty() {
        return String::new();
    }
    let mut lines = vec!["\nAdditional tools available (use these instead of standard library equivalents):".to_owned()];
    for tool in tools {
        let params = tool
            .params
            .iter()
            .map(|param| format!("{}: {}", param.name, param.type_name))
            .collect::<Vec<_>>()
            .join(", ");
        let description = tool.description.as_deref().unwrap_or("No description");
        lines.push(format!("- `{}({params})` - {description}", tool.name));
    }
    lines.join("\n")
}

/// Builds the action and extract signatures for a sandboxed run of `signature`.
#[must_use]
pub fn build_signatures(signature: &Signature, config: &RlmConfig, tools: &[ToolSpec]) -> Signatures {
    let task_instructions = format!("{}\n\n", signature.instructions());

    let action = Signature::new(Vec::new(), Vec::new())
        .with_instructions(format!(
            "{task_instructions}{}{}",
            action_instructions(signature, config.max_llm_calls),
            format_tool_docs(tools)
        ))
        .append_input(variables_info_field())
        .append_input(
            Field::new("repl_history", FieldType::Named("REPLHistory".to_owned()))
                .with_desc("Previous REPL code executions and their outputs"),
        )
        .append_input(
            Field::new("iteration", FieldType::Str)
                .with_desc("Current iteration number (1-indexed) out of max_iterations"),
        )
        .append_output(
            Field::new("reasoning", FieldType::Str)
                .with_desc("Think step-by-step: what do you know? What remains? Plan your next action."),
        )
        .append_output(
            Field::new("code", FieldType::Str)
                .with_desc("Python code to execute. Use markdown code block format: ```python\\n<code>\\n```"),
        );

    let extract = Signature::new(Vec::new(), signature.outputs().to_vec())
        .with_instructions(format!(
            "The trajectory was generated with the following objective: \n{task_instructions}\n{EXTRACT_INSTRUCTIONS}"
        ))
        .prepend_input(
            Field::new("repl_history", FieldType::Named("REPLHistory".to_owned()))
                .with_desc("Your REPL interactions so far"),
        )
        .prepend_input(variables_info_field());

    Signatures { action, extract }
}

fn variables_info_field() -> Field {
    Field::new("variables_info", FieldType::Str).with_desc("Metadata about the variables available in the REPL")
}
