use quirk_compiler::{
    compile_to_ast, compile_to_ir, CompileError, ForHeaderPosition, SemanticErrorKind,
    SyntaxErrorKind, MAX_NESTING_DEPTH,
};

// ── Syntax errors ────────────────────────────────────────────────────────
// Each test verifies that an invalid program is rejected with the right kind.

#[test]
fn unmatched_closing_brace() {
    assert_syntax_error("int x = 1; }", SyntaxErrorKind::UnmatchedBrace);
}

#[test]
fn unclosed_block() {
    assert_syntax_error("int x = 1; if (x == 1) { out(x);", SyntaxErrorKind::UnclosedBlock);
}

#[test]
fn missing_identifier() {
    assert_syntax_error("int = 5;", SyntaxErrorKind::MissingIdentifier);
}

#[test]
fn missing_assignment() {
    assert_syntax_error("float f 1.5;", SyntaxErrorKind::MissingAssignment);
}

#[test]
fn literal_type_mismatch() {
    assert_syntax_error("string s = 5;", SyntaxErrorKind::LiteralTypeMismatch);
    assert_syntax_error("bool b = \"yes\";", SyntaxErrorKind::LiteralTypeMismatch);
    assert_syntax_error("int n = 1.5;", SyntaxErrorKind::LiteralTypeMismatch);
}

#[test]
fn float_accepts_integral_literal() {
    assert!(compile_to_ast("float f = 2;").is_ok());
}

#[test]
fn condition_needs_paren() {
    assert_syntax_error("int x = 1; if x == 1 { }", SyntaxErrorKind::ExpectedParen);
}

#[test]
fn incomplete_condition() {
    assert_syntax_error("int x = 1; if (x ==) { }", SyntaxErrorKind::IncompleteCondition);
    assert_syntax_error("int x = 1; while (x < 2", SyntaxErrorKind::IncompleteCondition);
}

#[test]
fn else_without_if() {
    assert_syntax_error("else { }", SyntaxErrorKind::DanglingElse);
    assert_syntax_error(
        "int x = 1; out(x); else if (x == 1) { }",
        SyntaxErrorKind::DanglingElse,
    );
    assert_syntax_error(
        "int x = 1; if (x == 1) { } else { } else { }",
        SyntaxErrorKind::DanglingElse,
    );
}

#[test]
fn else_needs_brace() {
    assert_syntax_error(
        "int x = 1; if (x == 1) { } else out(x);",
        SyntaxErrorKind::ExpectedBrace,
    );
}

#[test]
fn out_argument_must_be_operand() {
    assert_syntax_error("out(==);", SyntaxErrorKind::InvalidOutArgument);
    assert_syntax_error("out(1;", SyntaxErrorKind::ExpectedParen);
}

#[test]
fn unknown_statement_start() {
    assert_syntax_error("x = 1;", SyntaxErrorKind::UnexpectedToken);
    assert_syntax_error("function", SyntaxErrorKind::UnexpectedToken);
}

#[test]
fn nesting_limit() {
    let nested_ifs = |depth: usize| {
        format!(
            "int x = 1;\n{}{}",
            "if (x == 1) {\n".repeat(depth),
            "}\n".repeat(depth)
        )
    };

    let ir = compile_to_ir(&nested_ifs(MAX_NESTING_DEPTH)).unwrap();
    assert!(ir.find_label("merge1").is_some());

    assert_syntax_error(&nested_ifs(MAX_NESTING_DEPTH + 1), SyntaxErrorKind::NestingTooDeep);
    assert_syntax_error(&nested_ifs(500), SyntaxErrorKind::NestingTooDeep);
    assert_syntax_error(&"{".repeat(20_000), SyntaxErrorKind::NestingTooDeep);

    let err = compile_to_ast(&nested_ifs(MAX_NESTING_DEPTH + 1)).unwrap_err();
    assert_eq!(err.position(), Some((MAX_NESTING_DEPTH + 2, 13)));
}

// ── for header ───────────────────────────────────────────────────────────

#[test]
fn for_rejects_less_or_equal() {
    assert_syntax_error(
        "for (int i = 0; i <= 5; i++) { }",
        SyntaxErrorKind::MalformedForHeader(ForHeaderPosition::ConditionOperator),
    );
}

#[test]
fn for_header_positions() {
    let cases = [
        ("for int i = 0; i < 5; i++) { }", ForHeaderPosition::OpenParen),
        ("for (float i = 0; i < 5; i++) { }", ForHeaderPosition::CounterType),
        ("for (int = 0; i < 5; i++) { }", ForHeaderPosition::CounterName),
        ("for (int i 0; i < 5; i++) { }", ForHeaderPosition::CounterAssign),
        ("for (int i = 0.5; i < 5; i++) { }", ForHeaderPosition::CounterInit),
        ("for (int i = 0 i < 5; i++) { }", ForHeaderPosition::InitTerminator),
        ("for (int i = 0; 3 < 5; i++) { }", ForHeaderPosition::ConditionVariable),
        ("for (int i = 0; i < \"5\"; i++) { }", ForHeaderPosition::Bound),
        ("for (int i = 0; i < 5 i++) { }", ForHeaderPosition::ConditionTerminator),
        ("for (int i = 0; i < 5; ++) { }", ForHeaderPosition::UpdateVariable),
        ("for (int i = 0; i < 5; i+) { }", ForHeaderPosition::UpdateOperator),
        ("for (int i = 0; i < 5; i++ { }", ForHeaderPosition::CloseParen),
        ("for (int i = 0; i < 5; i++) out(i);", ForHeaderPosition::Body),
    ];
    for (source, slot) in cases {
        assert_syntax_error(source, SyntaxErrorKind::MalformedForHeader(slot));
    }
}

#[test]
fn for_header_must_name_the_counter() {
    assert_syntax_error(
        "int n = 1; for (int i = 0; n < 3; i++) { }",
        SyntaxErrorKind::MalformedForHeader(ForHeaderPosition::ConditionVariable),
    );
    assert_syntax_error(
        "int n = 1; for (int i = 0; i < 3; n++) { }",
        SyntaxErrorKind::MalformedForHeader(ForHeaderPosition::UpdateVariable),
    );
    assert!(compile_to_ir("int n = 1; for (int i = 0; i < n; i++) { }").is_ok());
}

// ── Semantic errors ──────────────────────────────────────────────────────

#[test]
fn variable_redefinition() {
    let result = compile_to_ast("int x = 1;\nint x = 2;");
    assert_semantic_error(result.clone(), SemanticErrorKind::VariableRedefinition);
    assert_eq!(result.unwrap_err().position(), Some((2, 5)));
}

#[test]
fn names_are_global_across_blocks() {
    let source = r#"
        int x = 1;
        if (x == 1) {
            int y = 2;
        }
        string y = "again";
    "#;
    assert_semantic_error(compile_to_ast(source), SemanticErrorKind::VariableRedefinition);
}

#[test]
fn for_counter_is_a_declaration() {
    let source = "int i = 0; for (int i = 0; i < 3; i++) { }";
    assert_semantic_error(compile_to_ast(source), SemanticErrorKind::VariableRedefinition);
}

#[test]
fn undefined_variables() {
    let cases = [
        "if (y == 1) { }",
        "int x = 1; while (x < limit) { }",
        "out(missing);",
        "for (int i = 0; i < n; i++) { }",
        "for (int i = 0; j < 3; i++) { }",
    ];
    for source in cases {
        assert_semantic_error(compile_to_ast(source), SemanticErrorKind::UndefinedVariable);
    }
}

// ── Lexical errors ───────────────────────────────────────────────────────

#[test]
fn lexical_errors() {
    for source in ["string s = \"open;", "int x = 1e;", "int x = 1; @"] {
        match compile_to_ir(source) {
            Err(CompileError::Lexical { .. }) => {}
            other => panic!("expected LexicalError for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn error_messages_carry_kind_and_position() {
    let err = compile_to_ast("int x = 1;\n  }").unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("SyntaxError:UnmatchedBrace (2:3)"), "{text}");
}

#[test]
fn columns_count_characters_not_bytes() {
    let err = compile_to_ast("string s = \"ééé\"; int 5 = 1;").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Syntax {
            kind: SyntaxErrorKind::MissingIdentifier,
            ..
        }
    ));
    assert_eq!(err.position(), Some((1, 23)));
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn assert_syntax_error(source: &str, expected: SyntaxErrorKind) {
    let result = compile_to_ir(source);
    match result {
        Err(CompileError::Syntax { kind, .. }) => {
            assert_eq!(kind, expected, "wrong syntax error for {source:?}");
        }
        other => panic!("expected SyntaxError {expected:?} for {source:?}, got {other:?}"),
    }
}

fn assert_semantic_error<T: std::fmt::Debug>(
    result: Result<T, CompileError>,
    expected: SemanticErrorKind,
) {
    match result {
        Err(CompileError::Semantic { kind, .. }) => {
            assert_eq!(kind, expected);
        }
        Err(other) => panic!("expected SemanticError {expected:?}, got {other}"),
        Ok(value) => panic!("expected SemanticError {expected:?}, got Ok({value:?})"),
    }
}
