//! Recursive-descent parser for Quirk.
//!
//! The statement dispatcher decides on the kind of the token it just
//! consumed. Nested blocks are tracked with an explicit scope stack whose top
//! is the node new statements are appended to; `{` (or a statement body)
//! pushes, `}` pops. Sub-grammars (declarations, conditions, the `for`
//! header, `out` calls) are separate descent functions. The first error
//! aborts the whole parse, no partial tree is returned.

use tracing::trace;

use crate::frontend::lexer::{Token, TokenKind, TokenSource};
use crate::ir::ast::{Ast, AstKind, AstNodeId, StatementKind, VarType};
use crate::ir::symbol_table::{SymbolInfo, SymbolTable};
use crate::{CompileError, ForHeaderPosition, SemanticErrorKind, SyntaxErrorKind, MAX_NESTING_DEPTH};

/// Parse a complete program, recording declarations in `symbols`.
#[tracing::instrument(skip_all)]
pub fn parse<T: TokenSource>(tokens: T, symbols: &mut SymbolTable) -> Result<Ast, CompileError> {
    Parser::new(tokens, symbols).parse()
}

/// The (left, operator, right) triple retained from a condition.
struct Condition {
    left: Token,
    op: Token,
    right: Token,
    open_brace: Token,
}

pub struct Parser<'s, T: TokenSource> {
    tokens: T,
    ast: Ast,
    scope_stack: Vec<AstNodeId>,
    symbols: &'s mut SymbolTable,
}

impl<'s, T: TokenSource> Parser<'s, T> {
    pub fn new(tokens: T, symbols: &'s mut SymbolTable) -> Self {
        let ast = Ast::new();
        let root = AstNodeId(0);
        Self {
            tokens,
            ast,
            scope_stack: vec![root],
            symbols,
        }
    }

    pub fn parse(mut self) -> Result<Ast, CompileError> {
        loop {
            let token = self.bump()?;
            match token.kind {
                TokenKind::EndOfFile => {
                    if self.scope_stack.len() > 1 {
                        return Err(syntax(
                            SyntaxErrorKind::UnclosedBlock,
                            &token,
                            format!(
                                "Unexpected end of input: {} block(s) still open, expected '}}'",
                                self.scope_stack.len() - 1
                            ),
                        ));
                    }
                    return Ok(self.ast);
                }
                TokenKind::Punctuation => {}
                TokenKind::Int
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::Bool => self.parse_declaration(token)?,
                TokenKind::Keyword => self.parse_keyword(token)?,
                TokenKind::CurlyParen if token.lexeme == "{" => {
                    let parent = self.current_parent();
                    let block = self.ast.add_child(parent, AstKind::CodeBlock, "", pos(&token));
                    self.push_scope(block, &token)?;
                }
                TokenKind::CurlyParen => self.pop_scope(&token)?,
                _ => {
                    return Err(syntax(
                        SyntaxErrorKind::UnexpectedToken,
                        &token,
                        format!("Unexpected token {token}"),
                    ))
                }
            }
        }
    }

    // ── Token and scope plumbing ─────────────────────────────────────────

    /// Consume the next token; error tokens from the lexer are fatal.
    fn bump(&mut self) -> Result<Token, CompileError> {
        let token = self.tokens.next_token();
        if token.kind == TokenKind::Error {
            return Err(CompileError::Lexical {
                line: token.line,
                col: token.column,
                lexeme: token.lexeme,
            });
        }
        Ok(token)
    }

    fn current_parent(&self) -> AstNodeId {
        // The root is never popped, so the stack always has a top.
        self.scope_stack.last().copied().unwrap_or(AstNodeId(0))
    }

    fn push_scope(&mut self, block: AstNodeId, opened_by: &Token) -> Result<(), CompileError> {
        if self.scope_stack.len() > MAX_NESTING_DEPTH {
            return Err(syntax(
                SyntaxErrorKind::NestingTooDeep,
                opened_by,
                format!("Blocks are nested deeper than {MAX_NESTING_DEPTH} levels"),
            ));
        }
        self.scope_stack.push(block);
        trace!(block = %block, depth = self.scope_stack.len() - 1, "enter block");
        Ok(())
    }

    fn pop_scope(&mut self, brace: &Token) -> Result<(), CompileError> {
        if self.scope_stack.len() <= 1 {
            return Err(syntax(
                SyntaxErrorKind::UnmatchedBrace,
                brace,
                "Unmatched '}' with no open block".to_string(),
            ));
        }
        let block = self.scope_stack.pop();
        trace!(block = ?block, depth = self.scope_stack.len() - 1, "leave block");
        Ok(())
    }

    /// Attach `token` under `parent` as a leaf tagged with its token kind.
    fn leaf(&mut self, parent: AstNodeId, token: &Token) -> Result<AstNodeId, CompileError> {
        let kind = AstKind::from_token(token.kind).ok_or_else(|| {
            syntax(
                SyntaxErrorKind::UnexpectedToken,
                token,
                format!("Token {token} cannot appear in this position"),
            )
        })?;
        Ok(self.ast.add_child(parent, kind, token.lexeme.clone(), pos(token)))
    }

    fn require_declared(&self, token: &Token) -> Result<(), CompileError> {
        if token.kind == TokenKind::Identifier && !self.symbols.contains(&token.lexeme) {
            return Err(semantic(
                SemanticErrorKind::UndefinedVariable,
                token,
                format!("Variable '{}' is used before it is declared", token.lexeme),
            ));
        }
        Ok(())
    }

    fn declare(&mut self, ty: VarType, name: &Token, ast_id: AstNodeId) -> Result<(), CompileError> {
        let info = SymbolInfo {
            name: name.lexeme.clone(),
            ty,
            ast_id,
            line: name.line,
            column: name.column,
        };
        if let Err(existing) = self.symbols.declare(info) {
            return Err(semantic(
                SemanticErrorKind::VariableRedefinition,
                name,
                format!(
                    "Variable '{}' already declared at {}:{}",
                    name.lexeme, existing.line, existing.column
                ),
            ));
        }
        trace!(name = %name.lexeme, ty = %ty, "declare");
        Ok(())
    }

    // ── Statements ───────────────────────────────────────────────────────

    /// `<type> <identifier> = <literal>`
    fn parse_declaration(&mut self, type_token: Token) -> Result<(), CompileError> {
        let Some(ty) = VarType::from_token(type_token.kind) else {
            return Err(syntax(
                SyntaxErrorKind::UnexpectedToken,
                &type_token,
                format!("Expected a type keyword, found {type_token}"),
            ));
        };

        let name = self.bump()?;
        if name.kind != TokenKind::Identifier {
            return Err(syntax(
                SyntaxErrorKind::MissingIdentifier,
                &name,
                format!("Expected identifier after '{ty}', found {name}"),
            ));
        }

        let assign = self.bump()?;
        if assign.kind != TokenKind::Assignment {
            return Err(syntax(
                SyntaxErrorKind::MissingAssignment,
                &assign,
                format!("Expected '=' after '{}', found {assign}", name.lexeme),
            ));
        }

        let literal = self.bump()?;
        if !literal_fits(ty, &literal) {
            return Err(syntax(
                SyntaxErrorKind::LiteralTypeMismatch,
                &literal,
                format!(
                    "Cannot initialize {ty} '{}' with {} {literal}",
                    name.lexeme, literal.kind
                ),
            ));
        }

        let decl = self.ast.alloc(AstKind::VarDeclaration, "", pos(&type_token));
        self.declare(ty, &name, decl)?;

        self.ast.add_child(decl, AstKind::VarType, ty.keyword(), pos(&type_token));
        self.ast.add_child(decl, AstKind::Identifier, name.lexeme.clone(), pos(&name));
        let assignment = self.ast.add_child(decl, AstKind::Assignment, "", pos(&assign));
        self.leaf(assignment, &literal)?;

        let parent = self.current_parent();
        self.ast.append(parent, decl)?;
        Ok(())
    }

    fn parse_keyword(&mut self, keyword: Token) -> Result<(), CompileError> {
        match StatementKind::from_keyword(&keyword.lexeme) {
            Some(kind @ (StatementKind::If | StatementKind::While)) => {
                self.parse_conditional(kind, keyword)
            }
            Some(StatementKind::ElseIf) => {
                self.require_if_before(&keyword)?;
                self.parse_conditional(StatementKind::ElseIf, keyword)
            }
            Some(StatementKind::Else) => self.parse_else(keyword),
            Some(StatementKind::For) => self.parse_for(keyword),
            Some(StatementKind::Out) => self.parse_out(keyword),
            None => Err(syntax(
                SyntaxErrorKind::UnexpectedToken,
                &keyword,
                format!("Unexpected keyword {keyword}"),
            )),
        }
    }

    /// `else if` / `else` must directly follow an `if` or `else if` statement.
    fn require_if_before(&self, keyword: &Token) -> Result<(), CompileError> {
        let previous = self
            .ast
            .last_child(self.current_parent())
            .map(|id| self.ast.kind(id));
        match previous {
            Some(AstKind::Statement(StatementKind::If | StatementKind::ElseIf)) => Ok(()),
            _ => Err(syntax(
                SyntaxErrorKind::DanglingElse,
                keyword,
                format!("'{}' without a preceding 'if'", keyword.lexeme),
            )),
        }
    }

    /// `if`, `else if` and `while`: `<keyword> ( <cond> ) { <body> }`
    fn parse_conditional(&mut self, kind: StatementKind, keyword: Token) -> Result<(), CompileError> {
        let cond = self.parse_condition(&keyword)?;

        let stmt = self
            .ast
            .alloc(AstKind::Statement(kind), kind.keyword(), pos(&keyword));
        let text = format!("{} {} {}", cond.left.lexeme, cond.op.lexeme, cond.right.lexeme);
        let condition = self
            .ast
            .add_child(stmt, AstKind::Condition, text, pos(&cond.left));
        self.leaf(condition, &cond.left)?;
        self.leaf(condition, &cond.op)?;
        self.leaf(condition, &cond.right)?;
        let block = self
            .ast
            .add_child(stmt, AstKind::CodeBlock, "", pos(&cond.open_brace));

        let parent = self.current_parent();
        self.ast.append(parent, stmt)?;
        self.push_scope(block, &cond.open_brace)
    }

    /// Scan `( ... {` keeping only the final left/op/right triple.
    ///
    /// The first operand fills `left`; after that the first relational
    /// operator fills `op` and every further operand overwrites `right`.
    /// Anything else between the parentheses is tolerated and dropped.
    fn parse_condition(&mut self, keyword: &Token) -> Result<Condition, CompileError> {
        let open = self.bump()?;
        if !open.is(TokenKind::RoundParen, "(") {
            return Err(syntax(
                SyntaxErrorKind::ExpectedParen,
                &open,
                format!("Expected '(' after '{}', found {open}", keyword.lexeme),
            ));
        }

        let mut left: Option<Token> = None;
        let mut op: Option<Token> = None;
        let mut right: Option<Token> = None;

        let open_brace = loop {
            let token = self.bump()?;
            match token.kind {
                TokenKind::CurlyParen if token.lexeme == "{" => break token,
                TokenKind::CurlyParen | TokenKind::EndOfFile => {
                    return Err(syntax(
                        SyntaxErrorKind::IncompleteCondition,
                        &token,
                        format!(
                            "Incomplete condition in '{}': expected '{{' after the condition, found {token}",
                            keyword.lexeme
                        ),
                    ));
                }
                kind if kind.is_operand() => {
                    if left.is_none() {
                        self.require_declared(&token)?;
                        left = Some(token);
                    } else {
                        right = Some(token);
                    }
                }
                TokenKind::RelationalOperator if left.is_some() && op.is_none() => {
                    op = Some(token);
                }
                _ => {}
            }
        };

        match (left, op, right) {
            (Some(left), Some(op), Some(right)) => {
                self.require_declared(&right)?;
                Ok(Condition {
                    left,
                    op,
                    right,
                    open_brace,
                })
            }
            _ => Err(syntax(
                SyntaxErrorKind::IncompleteCondition,
                &open_brace,
                format!(
                    "Incomplete condition in '{}': expected <operand> <relational operator> <operand>",
                    keyword.lexeme
                ),
            )),
        }
    }

    /// `else { <body> }`
    fn parse_else(&mut self, keyword: Token) -> Result<(), CompileError> {
        self.require_if_before(&keyword)?;

        let brace = self.bump()?;
        if !brace.is(TokenKind::CurlyParen, "{") {
            return Err(syntax(
                SyntaxErrorKind::ExpectedBrace,
                &brace,
                format!("Expected '{{' after 'else', found {brace}"),
            ));
        }

        let stmt = self.ast.alloc(
            AstKind::Statement(StatementKind::Else),
            StatementKind::Else.keyword(),
            pos(&keyword),
        );
        let block = self.ast.add_child(stmt, AstKind::CodeBlock, "", pos(&brace));
        let parent = self.current_parent();
        self.ast.append(parent, stmt)?;
        self.push_scope(block, &brace)
    }

    /// Consume one token of the `for` header, failing at exactly this slot.
    fn expect_for(
        &mut self,
        slot: ForHeaderPosition,
        accept: impl FnOnce(&Token) -> bool,
    ) -> Result<Token, CompileError> {
        let token = self.bump()?;
        if accept(&token) {
            Ok(token)
        } else {
            Err(syntax(
                SyntaxErrorKind::MalformedForHeader(slot),
                &token,
                format!(
                    "Malformed 'for' header: expected {}, found {token}",
                    slot.expected()
                ),
            ))
        }
    }

    /// `for ( int <id> = <n> ; <id> < <bound> ; <id> ++|-- ) { <body> }`
    fn parse_for(&mut self, keyword: Token) -> Result<(), CompileError> {
        use ForHeaderPosition as P;

        self.expect_for(P::OpenParen, |t| t.is(TokenKind::RoundParen, "("))?;
        let counter_type = self.expect_for(P::CounterType, |t| t.kind == TokenKind::Int)?;
        let counter = self.expect_for(P::CounterName, |t| t.kind == TokenKind::Identifier)?;
        let assign = self.expect_for(P::CounterAssign, |t| t.kind == TokenKind::Assignment)?;
        let init = self.expect_for(P::CounterInit, |t| literal_fits(VarType::Int, t))?;

        let stmt = self.ast.alloc(
            AstKind::Statement(StatementKind::For),
            StatementKind::For.keyword(),
            pos(&keyword),
        );
        self.declare(VarType::Int, &counter, stmt)?;

        self.expect_for(P::InitTerminator, |t| t.is(TokenKind::Punctuation, ";"))?;
        let cond_var = self.expect_for(P::ConditionVariable, |t| t.kind == TokenKind::Identifier)?;
        self.require_declared(&cond_var)?;
        require_counter(P::ConditionVariable, &counter, &cond_var)?;
        let op = self.expect_for(P::ConditionOperator, |t| {
            t.is(TokenKind::RelationalOperator, "<")
        })?;
        let bound = self.expect_for(P::Bound, |t| {
            matches!(t.kind, TokenKind::Identifier | TokenKind::NumericLiteral)
        })?;
        self.require_declared(&bound)?;
        self.expect_for(P::ConditionTerminator, |t| t.is(TokenKind::Punctuation, ";"))?;
        let update_var = self.expect_for(P::UpdateVariable, |t| t.kind == TokenKind::Identifier)?;
        self.require_declared(&update_var)?;
        require_counter(P::UpdateVariable, &counter, &update_var)?;
        let step = self.expect_for(P::UpdateOperator, |t| {
            t.kind == TokenKind::UnaryArithmeticOperator
        })?;
        self.expect_for(P::CloseParen, |t| t.is(TokenKind::RoundParen, ")"))?;
        let brace = self.expect_for(P::Body, |t| t.is(TokenKind::CurlyParen, "{"))?;

        let text = format!(
            "int {} = {}; {} < {}; {}{}",
            counter.lexeme, init.lexeme, cond_var.lexeme, bound.lexeme, update_var.lexeme, step.lexeme
        );
        let header = self
            .ast
            .add_child(stmt, AstKind::Condition, text, pos(&counter_type));
        self.ast
            .add_child(header, AstKind::VarType, VarType::Int.keyword(), pos(&counter_type));
        self.ast
            .add_child(header, AstKind::Identifier, counter.lexeme.clone(), pos(&counter));
        let assignment = self.ast.add_child(header, AstKind::Assignment, "", pos(&assign));
        self.leaf(assignment, &init)?;
        self.leaf(header, &cond_var)?;
        self.leaf(header, &op)?;
        self.leaf(header, &bound)?;
        self.leaf(header, &update_var)?;
        self.leaf(header, &step)?;
        let block = self.ast.add_child(stmt, AstKind::CodeBlock, "", pos(&brace));

        let parent = self.current_parent();
        self.ast.append(parent, stmt)?;
        self.push_scope(block, &brace)
    }

    /// `out ( <literal-or-identifier> )`
    fn parse_out(&mut self, keyword: Token) -> Result<(), CompileError> {
        let open = self.bump()?;
        if !open.is(TokenKind::RoundParen, "(") {
            return Err(syntax(
                SyntaxErrorKind::ExpectedParen,
                &open,
                format!("Expected '(' after 'out', found {open}"),
            ));
        }

        let arg = self.bump()?;
        if !arg.kind.is_operand() {
            return Err(syntax(
                SyntaxErrorKind::InvalidOutArgument,
                &arg,
                format!("'out' takes a literal or an identifier, found {arg}"),
            ));
        }
        self.require_declared(&arg)?;

        let close = self.bump()?;
        if !close.is(TokenKind::RoundParen, ")") {
            return Err(syntax(
                SyntaxErrorKind::ExpectedParen,
                &close,
                format!("Expected ')' to close 'out', found {close}"),
            ));
        }

        let stmt = self.ast.alloc(
            AstKind::Statement(StatementKind::Out),
            StatementKind::Out.keyword(),
            pos(&keyword),
        );
        let call = self
            .ast
            .add_child(stmt, AstKind::FunctionCall, "out", pos(&keyword));
        self.leaf(call, &arg)?;

        let parent = self.current_parent();
        self.ast.append(parent, stmt)?;
        Ok(())
    }
}

fn pos(token: &Token) -> (usize, usize) {
    (token.line, token.column)
}

/// Exact literal match for a declared type; `int` additionally rejects
/// fractional and exponent forms.
fn literal_fits(ty: VarType, literal: &Token) -> bool {
    if literal.kind != ty.literal_kind() {
        return false;
    }
    match ty {
        VarType::Int => literal.lexeme.chars().all(|c| c.is_ascii_digit()),
        _ => true,
    }
}

/// The loop always tests and steps its own counter, so the header must name it.
fn require_counter(slot: ForHeaderPosition, counter: &Token, found: &Token) -> Result<(), CompileError> {
    if found.lexeme == counter.lexeme {
        return Ok(());
    }
    Err(syntax(
        SyntaxErrorKind::MalformedForHeader(slot),
        found,
        format!(
            "Malformed 'for' header: expected loop counter '{}', found {found}",
            counter.lexeme
        ),
    ))
}

fn syntax(kind: SyntaxErrorKind, at: &Token, message: String) -> CompileError {
    CompileError::Syntax {
        kind,
        line: at.line,
        col: at.column,
        message,
    }
}

fn semantic(kind: SemanticErrorKind, at: &Token, message: String) -> CompileError {
    CompileError::Semantic {
        kind,
        line: at.line,
        col: at.column,
        message,
    }
}
