pub mod frontend;
pub mod ir;

use std::fmt;
use thiserror::Error;

use ir::ast::AstNodeId;

/// Deepest block nesting the parser accepts and lowering will descend into.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("LexicalError ({line}:{col}) - unexpected input '{lexeme}'")]
    Lexical {
        line: usize,
        col: usize,
        lexeme: String,
    },

    #[error("SyntaxError:{kind} ({line}:{col}) - {message}")]
    Syntax {
        kind: SyntaxErrorKind,
        line: usize,
        col: usize,
        message: String,
    },

    #[error("SemanticError:{kind} ({line}:{col}) - {message}")]
    Semantic {
        kind: SemanticErrorKind,
        line: usize,
        col: usize,
        message: String,
    },

    #[error("StructuralError: {0}")]
    Structural(#[from] StructuralError),
}

impl CompileError {
    /// 1-based source position, if the error has one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::Lexical { line, col, .. }
            | CompileError::Syntax { line, col, .. }
            | CompileError::Semantic { line, col, .. } => Some((*line, *col)),
            CompileError::Structural(_) => None,
        }
    }
}

/// Slots of the fixed `for` header, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForHeaderPosition {
    OpenParen,
    CounterType,
    CounterName,
    CounterAssign,
    CounterInit,
    InitTerminator,
    ConditionVariable,
    ConditionOperator,
    Bound,
    ConditionTerminator,
    UpdateVariable,
    UpdateOperator,
    CloseParen,
    Body,
}

impl ForHeaderPosition {
    pub fn expected(self) -> &'static str {
        match self {
            ForHeaderPosition::OpenParen => "'('",
            ForHeaderPosition::CounterType => "'int'",
            ForHeaderPosition::CounterName => "counter identifier",
            ForHeaderPosition::CounterAssign => "'='",
            ForHeaderPosition::CounterInit => "integer literal",
            ForHeaderPosition::InitTerminator => "';' after initializer",
            ForHeaderPosition::ConditionVariable => "identifier in loop condition",
            ForHeaderPosition::ConditionOperator => "'<'",
            ForHeaderPosition::Bound => "identifier or numeric loop bound",
            ForHeaderPosition::ConditionTerminator => "';' after loop condition",
            ForHeaderPosition::UpdateVariable => "identifier in loop update",
            ForHeaderPosition::UpdateOperator => "'++' or '--'",
            ForHeaderPosition::CloseParen => "')'",
            ForHeaderPosition::Body => "'{'",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnexpectedToken,
    MissingIdentifier,
    MissingAssignment,
    LiteralTypeMismatch,
    ExpectedParen,
    ExpectedBrace,
    IncompleteCondition,
    MalformedForHeader(ForHeaderPosition),
    UnmatchedBrace,
    UnclosedBlock,
    DanglingElse,
    InvalidOutArgument,
    NestingTooDeep,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::UnexpectedToken => write!(f, "UnexpectedToken"),
            SyntaxErrorKind::MissingIdentifier => write!(f, "MissingIdentifier"),
            SyntaxErrorKind::MissingAssignment => write!(f, "MissingAssignment"),
            SyntaxErrorKind::LiteralTypeMismatch => write!(f, "LiteralTypeMismatch"),
            SyntaxErrorKind::ExpectedParen => write!(f, "ExpectedParen"),
            SyntaxErrorKind::ExpectedBrace => write!(f, "ExpectedBrace"),
            SyntaxErrorKind::IncompleteCondition => write!(f, "IncompleteCondition"),
            SyntaxErrorKind::MalformedForHeader(pos) => write!(f, "MalformedForHeader({pos:?})"),
            SyntaxErrorKind::UnmatchedBrace => write!(f, "UnmatchedBrace"),
            SyntaxErrorKind::UnclosedBlock => write!(f, "UnclosedBlock"),
            SyntaxErrorKind::DanglingElse => write!(f, "DanglingElse"),
            SyntaxErrorKind::InvalidOutArgument => write!(f, "InvalidOutArgument"),
            SyntaxErrorKind::NestingTooDeep => write!(f, "NestingTooDeep"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    VariableRedefinition,
    UndefinedVariable,
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticErrorKind::VariableRedefinition => write!(f, "VariableRedefinition"),
            SemanticErrorKind::UndefinedVariable => write!(f, "UndefinedVariable"),
        }
    }
}

/// Malformed-tree conditions detected while lowering. These are contract
/// violations by whoever built the tree, not user input errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("AST has no Program root")]
    MissingRoot,

    #[error("'{kind}' node {node} has no parent for the sibling scan")]
    DetachedNode { node: AstNodeId, kind: String },

    #[error("{kind} node {node} has no child at index {index}")]
    MissingChild {
        node: AstNodeId,
        kind: String,
        index: usize,
    },

    #[error("'{keyword}' node {node} does not follow an 'if' chain")]
    OrphanBranch { node: AstNodeId, keyword: String },

    #[error("identifier '{name}' at node {node} has no storage")]
    UnboundIdentifier { node: AstNodeId, name: String },

    #[error("node {node} of kind {kind} cannot be lowered here")]
    UnexpectedNode { node: AstNodeId, kind: String },

    #[error("node {node} cannot be attached under {parent}: it is the root, already attached, or an ancestor")]
    AlreadyAttached { node: AstNodeId, parent: AstNodeId },

    #[error("block {node} is nested deeper than {limit} levels")]
    NestingTooDeep { node: AstNodeId, limit: usize },
}

/// Lex and parse `source` into a syntax tree.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn compile_to_ast(source: &str) -> Result<ir::ast::Ast, CompileError> {
    let mut symbols = ir::symbol_table::SymbolTable::new();
    frontend::parser::parse(frontend::lexer::Lexer::new(source), &mut symbols)
}

/// Lex, parse and lower `source` into an instruction tree.
pub fn compile_to_ir(source: &str) -> Result<ir::InstrTree, CompileError> {
    let ast = compile_to_ast(source)?;
    ir::ir_generator::lower(&ast)
}
