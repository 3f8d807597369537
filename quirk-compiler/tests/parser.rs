use quirk_compiler::compile_to_ast;
use quirk_compiler::frontend::lexer::Lexer;
use quirk_compiler::frontend::parser::parse;
use quirk_compiler::ir::ast::{Ast, AstKind, AstNodeId, StatementKind, VarType};
use quirk_compiler::ir::symbol_table::SymbolTable;

fn kinds(ast: &Ast, id: AstNodeId) -> Vec<AstKind> {
    ast.children(id).iter().map(|&c| ast.kind(c)).collect()
}

fn top_level(ast: &Ast) -> Vec<AstNodeId> {
    ast.children(ast.root().unwrap()).to_vec()
}

// ── Declarations ─────────────────────────────────────────────────────────

#[test]
fn declaration_shape() {
    let ast = compile_to_ast("int count = 5;").unwrap();
    let decls = top_level(&ast);
    assert_eq!(decls.len(), 1);

    let decl = decls[0];
    assert_eq!(ast.kind(decl), AstKind::VarDeclaration);
    assert_eq!(
        kinds(&ast, decl),
        vec![AstKind::VarType, AstKind::Identifier, AstKind::Assignment]
    );
    assert_eq!(ast.value(ast.child(decl, 0).unwrap()), "int");
    assert_eq!(ast.value(ast.child(decl, 1).unwrap()), "count");

    let assignment = ast.child(decl, 2).unwrap();
    let literal = ast.child(assignment, 0).unwrap();
    assert_eq!(ast.kind(literal), AstKind::NumericLiteral);
    assert_eq!(ast.value(literal), "5");
}

#[test]
fn every_type_declares() {
    let source = r#"
        int a = 1;
        float b = 2.5;
        string c = "three";
        char d = 'd';
        bool e = false;
    "#;
    let ast = compile_to_ast(source).unwrap();
    let literal_kinds: Vec<AstKind> = top_level(&ast)
        .into_iter()
        .map(|decl| {
            let assignment = ast.child(decl, 2).unwrap();
            ast.kind(ast.child(assignment, 0).unwrap())
        })
        .collect();
    assert_eq!(
        literal_kinds,
        vec![
            AstKind::NumericLiteral,
            AstKind::NumericLiteral,
            AstKind::StringLiteral,
            AstKind::CharLiteral,
            AstKind::BoolLiteral,
        ]
    );
}

#[test]
fn declarations_fill_symbol_table() {
    let mut symbols = SymbolTable::new();
    let ast = parse(
        Lexer::new("int x = 1;\nstring y = \"s\";"),
        &mut symbols,
    )
    .unwrap();

    let y = symbols.lookup("y").unwrap();
    assert_eq!(y.ty, VarType::String);
    assert_eq!((y.line, y.column), (2, 8));
    assert_eq!(ast.kind(y.ast_id), AstKind::VarDeclaration);
    assert_eq!(symbols.len(), 2);
}

// ── Conditions and blocks ────────────────────────────────────────────────

#[test]
fn condition_triple_is_kept() {
    let ast = compile_to_ast("int x = 1; if (x >= 10) { }").unwrap();
    let stmt = top_level(&ast)[1];
    assert_eq!(ast.kind(stmt), AstKind::Statement(StatementKind::If));
    assert_eq!(kinds(&ast, stmt), vec![AstKind::Condition, AstKind::CodeBlock]);

    let cond = ast.child(stmt, 0).unwrap();
    assert_eq!(ast.value(cond), "x >= 10");
    let parts: Vec<(AstKind, &str)> = ast
        .children(cond)
        .iter()
        .map(|&c| (ast.kind(c), ast.value(c)))
        .collect();
    assert_eq!(
        parts,
        vec![
            (AstKind::Identifier, "x"),
            (AstKind::RelationalOperator, ">="),
            (AstKind::NumericLiteral, "10"),
        ]
    );
}

#[test]
fn condition_keeps_last_right_operand() {
    let ast = compile_to_ast("int x = 1; int y = 2; while (x < 3 y) { }").unwrap();
    let cond = ast.child(top_level(&ast)[2], 0).unwrap();
    assert_eq!(ast.value(cond), "x < y");
}

#[test]
fn statements_nest_in_their_blocks() {
    let source = r#"
        int x = 1;
        if (x == 1) {
            int y = 2;
            while (y < 3) {
                out(y);
            }
        }
        out(x);
    "#;
    let ast = compile_to_ast(source).unwrap();
    let top = top_level(&ast);
    assert_eq!(top.len(), 3);

    let then_block = ast.child(top[1], 1).unwrap();
    assert_eq!(
        kinds(&ast, then_block),
        vec![
            AstKind::VarDeclaration,
            AstKind::Statement(StatementKind::While)
        ]
    );
    let loop_block = ast.child(ast.child(then_block, 1).unwrap(), 1).unwrap();
    assert_eq!(
        kinds(&ast, loop_block),
        vec![AstKind::Statement(StatementKind::Out)]
    );
    assert_eq!(ast.kind(top[2]), AstKind::Statement(StatementKind::Out));
}

#[test]
fn else_chain_is_flat_siblings() {
    let source = r#"
        int x = 1;
        if (x == 1) { } else if (x == 2) { } else if (x == 3) { } else { }
    "#;
    let ast = compile_to_ast(source).unwrap();
    let kinds: Vec<AstKind> = top_level(&ast).iter().map(|&c| ast.kind(c)).collect();
    assert_eq!(
        kinds,
        vec![
            AstKind::VarDeclaration,
            AstKind::Statement(StatementKind::If),
            AstKind::Statement(StatementKind::ElseIf),
            AstKind::Statement(StatementKind::ElseIf),
            AstKind::Statement(StatementKind::Else),
        ]
    );
    let else_stmt = top_level(&ast)[4];
    assert_eq!(ast.children(else_stmt).len(), 1);
    assert_eq!(ast.parent(else_stmt), ast.root());
}

#[test]
fn anonymous_block() {
    let ast = compile_to_ast("{ int x = 1; } int y = 2;").unwrap();
    let top = top_level(&ast);
    assert_eq!(ast.kind(top[0]), AstKind::CodeBlock);
    assert_eq!(kinds(&ast, top[0]), vec![AstKind::VarDeclaration]);
    assert_eq!(ast.kind(top[1]), AstKind::VarDeclaration);
}

// ── for and out ──────────────────────────────────────────────────────────

#[test]
fn for_header_layout() {
    let ast = compile_to_ast("int n = 4; for (int i = 0; i < n; i--) { }").unwrap();
    let stmt = top_level(&ast)[1];
    assert_eq!(ast.kind(stmt), AstKind::Statement(StatementKind::For));

    let header = ast.child(stmt, 0).unwrap();
    assert_eq!(ast.kind(header), AstKind::Condition);
    assert_eq!(ast.value(ast.child(header, 1).unwrap()), "i");
    assert_eq!(ast.value(ast.child(header, 5).unwrap()), "n");
    let step = ast.child(header, 7).unwrap();
    assert_eq!(ast.kind(step), AstKind::UnaryOperator);
    assert_eq!(ast.value(step), "--");
    assert_eq!(ast.kind(ast.child(stmt, 1).unwrap()), AstKind::CodeBlock);
}

#[test]
fn out_wraps_a_call() {
    let ast = compile_to_ast("out(\"hi\");").unwrap();
    let stmt = top_level(&ast)[0];
    let call = ast.child(stmt, 0).unwrap();
    assert_eq!(ast.kind(call), AstKind::FunctionCall);
    assert_eq!(ast.value(call), "out");
    let arg = ast.child(call, 0).unwrap();
    assert_eq!(ast.kind(arg), AstKind::StringLiteral);
    assert_eq!(ast.value(arg), "\"hi\"");
}

// ── Dump ─────────────────────────────────────────────────────────────────

#[test]
fn ast_dump() {
    let ast = compile_to_ast("bool ok = true;").unwrap();
    assert_eq!(
        ast.to_lines(),
        vec![
            "Type: Program, Value: ",
            "  Type: VAR_DECLARATION, Value: ",
            "    Type: VAR_TYPE, Value: bool",
            "    Type: IDENTIFIER, Value: ok",
            "    Type: ASSIGNMENT, Value: ",
            "      Type: BOOL_LITERAL, Value: true",
        ]
    );
}

#[test]
fn empty_source_is_just_the_root() {
    let ast = compile_to_ast("  // nothing here\n").unwrap();
    assert_eq!(ast.len(), 1);
    assert!(top_level(&ast).is_empty());
}
