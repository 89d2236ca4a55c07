//! Integration tests for signature parsing and the rendered instructions.

use pretty_assertions::assert_eq;
use sandbox_rlm::{
    Field, FieldType, RlmConfig, Signature, SignatureError, ToolSpec, action_instructions, build_signatures,
    format_tool_docs,
};

fn parse(s: &str) -> Signature {
    s.parse().unwrap()
}

fn names<'a>(iter: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    iter.collect()
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn parse_untyped_fields_default_to_str() {
    let sig = parse("question -> answer");
    assert_eq!(sig.inputs(), &[Field::new("question", FieldType::Str)]);
    assert_eq!(sig.outputs(), &[Field::new("answer", FieldType::Str)]);
}

#[test]
fn parse_typed_fields() {
    let sig = parse("inventory: list[dict[str, int]], today -> expiring_soon: list[str], count: int");
    assert_eq!(names(sig.input_names()), vec!["inventory", "today"]);
    assert_eq!(names(sig.output_names()), vec!["expiring_soon", "count"]);
    assert_eq!(
        sig.inputs()[0].ty,
        FieldType::List(Box::new(FieldType::Dict(Box::new(FieldType::Str), Box::new(FieldType::Int))))
    );
    assert_eq!(sig.outputs()[1].ty, FieldType::Int);
}

#[test]
fn parse_literal_and_named_types() {
    let sig = parse("text -> label: Literal['pos', \"neg\"], extra: pathlib.Path");
    assert_eq!(
        sig.outputs()[0].ty,
        FieldType::Literal(vec!["pos".to_owned(), "neg".to_owned()])
    );
    assert_eq!(sig.outputs()[1].ty, FieldType::Named("pathlib.Path".to_owned()));
}

#[test]
fn display_round_trips_the_compact_form() {
    let text = "inventory: list[str], today: str -> expiring_soon: dict[str, float]";
    assert_eq!(parse(text).to_string(), text);
}

#[test]
fn parse_errors() {
    let err = |s: &str| s.parse::<Signature>().unwrap_err();
    assert_eq!(err("question, answer"), SignatureError::MissingArrow("question, answer".to_owned()));
    assert_eq!(err("a -> b -> c"), SignatureError::MissingArrow("a -> b -> c".to_owned()));
    assert_eq!(err(" -> answer"), SignatureError::EmptySide("input"));
    assert_eq!(err("question -> "), SignatureError::EmptySide("output"));
    assert_eq!(err("question -> 2fast"), SignatureError::InvalidName("2fast".to_owned()));
    assert_eq!(err("a, -> b"), SignatureError::InvalidName(String::new()));
    assert_eq!(err("a -> a"), SignatureError::DuplicateField("a".to_owned()));
    assert_eq!(err("a: list[str -> b"), SignatureError::Unbalanced("a: list[str ".to_owned()));
    assert_eq!(err("a: list[str, int] -> b"), SignatureError::InvalidType("list[str, int]".to_owned()));
}

#[test]
fn instructions_default_to_a_field_summary() {
    let sig = parse("a, b -> c");
    assert_eq!(sig.instructions(), "Given the fields `a`, `b`, produce the fields `c`.");
    let sig = sig.with_instructions("Sum the numbers.");
    assert_eq!(sig.instructions(), "Sum the numbers.");
    let sig = sig.with_instructions("   ");
    assert_eq!(sig.instructions(), "Given the fields `a`, `b`, produce the fields `c`.");
}

// ============================================================================
// Output notes
// ============================================================================

#[test]
fn output_field_descriptions() {
    let sig = parse("x -> s, n: int, f: float, ok: bool, tags: list[str], label: Literal['a', 'b']");
    let lines: Vec<String> = sig.outputs().iter().map(Field::describe_output).collect();
    assert_eq!(
        lines,
        vec![
            "{s}".to_owned(),
            "{n}        # note: the value you produce must be a single int value".to_owned(),
            "{f}        # note: the value you produce must be a single float value".to_owned(),
            "{ok}        # note: the value you produce must be True or False".to_owned(),
            r#"{tags}        # note: the value you produce must adhere to the JSON schema: {"items": {"type": "string"}, "type": "array"}"#.to_owned(),
            "{label}        # note: the value you produce must exactly match (no extra characters) one of: a; b".to_owned(),
        ]
    );
}

#[test]
fn nested_schemas_use_spaced_separators() {
    let note = FieldType::Dict(Box::new(FieldType::Str), Box::new(FieldType::List(Box::new(FieldType::Int))))
        .output_note()
        .unwrap();
    assert!(note.starts_with("must adhere to the JSON schema: {"));
    assert!(note.contains(r#"{"items": {"type": "integer"}, "type": "array"}"#));
    assert!(!note.contains(r#"":{"#));
    assert!(!note.contains(r#"},""#));
}

// ============================================================================
// Instructions
// ============================================================================

#[test]
fn action_instructions_describe_the_sandbox() {
    let sig = parse("inventory, today -> expiring_soon: list[str]");
    let text = action_instructions(&sig, 7);
    assert!(text.starts_with(
        "You are tasked with producing the following outputs given the inputs `inventory`, `today`:\n- {expiring_soon}"
    ));
    assert!(text.contains("- Variables: `inventory`, `today` (your input data, re-injected every iteration)"));
    assert!(text.contains("- `SAVE(name=value, ...)` - persist variables across iterations"));
    assert!(text.contains("- `CLEAR(name1, name2, ...)` or `CLEAR()` - remove saved variables (all if no args)"));
    assert!(text.contains("- `SUBMIT(expiring_soon)` - submit final output when done"));
    assert!(text.contains("NO imports available"));
    assert!(text.contains("NO class definitions."));
    assert!(text.ends_with("You have max 7 sub-LLM calls. When done, call SUBMIT() with your output."));
}

#[test]
fn tool_docs_are_empty_without_tools() {
    assert_eq!(format_tool_docs(&[]), "");
}

#[test]
fn tool_docs_list_each_tool() {
    let tools = vec![
        ToolSpec::new("search")
            .param("query", "str")
            .param("limit", "int")
            .description("Search the corpus"),
        ToolSpec::new("now"),
    ];
    assert_eq!(
        format_tool_docs(&tools),
        "\nAdditional tools available (use these instead of standard library equivalents):\n\
         - `search(query: str, limit: int)` - Search the corpus\n\
         - `now()` - No description"
    );
}

#[test]
fn action_signature_layout() {
    let sig = parse("question -> answer").with_instructions("Answer carefully.");
    let tools = vec![ToolSpec::new("lookup").param("key", "str")];
    let sigs = build_signatures(&sig, &RlmConfig::default(), &tools);

    assert_eq!(names(sigs.action.input_names()), vec!["variables_info", "repl_history", "iteration"]);
    assert_eq!(names(sigs.action.output_names()), vec!["reasoning", "code"]);
    assert_eq!(
        sigs.action.inputs()[1].ty,
        FieldType::Named("REPLHistory".to_owned())
    );

    let instructions = sigs.action.instructions();
    assert!(instructions.starts_with("Answer carefully.\n\nYou are tasked with producing"));
    assert!(instructions.contains("You have max 50 sub-LLM calls."));
    assert!(instructions.ends_with("- `lookup(key: str)` - No description"));
}

#[test]
fn extract_signature_layout() {
    let sig = parse("question -> answer, sources: list[str]");
    let sigs = build_signatures(&sig, &RlmConfig::default(), &[]);

    assert_eq!(names(sigs.extract.input_names()), vec!["variables_info", "repl_history"]);
    assert_eq!(sigs.extract.outputs(), sig.outputs());
    assert_eq!(
        sigs.extract.instructions(),
        "The trajectory was generated with the following objective: \n\
         Given the fields `question`, produce the fields `answer`, `sources`.\n\n\n\
         Based on the REPL trajectory, extract the final outputs now.\n\n\
         Review your trajectory to see what information you gathered and what values you computed, \
         then provide the final outputs."
    );
}

#[test]
fn signatures_follow_config_and_tools() {
    let sig = parse("q -> a");
    let config = RlmConfig {
        max_llm_calls: 3,
        ..RlmConfig::default()
    };
    let without = build_signatures(&sig, &config, &[]);
    let with = build_signatures(&sig, &config, &[ToolSpec::new("fetch")]);
    assert!(without.action.instructions().contains("You have max 3 sub-LLM calls."));
    assert!(!without.action.instructions().contains("Additional tools available"));
    assert!(with.action.instructions().contains("- `fetch()` - No description"));
}
