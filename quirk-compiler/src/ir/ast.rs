//! Parent-linked syntax tree produced by the parser.
//!
//! Nodes live in an arena owned by [`Ast`] and refer to each other through
//! [`AstNodeId`] indices. A node owns its `children` list; `parent` is a
//! plain index kept for sibling lookups during lowering.

use crate::frontend::lexer::TokenKind;
use crate::StructuralError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AstNodeId(pub usize);

impl fmt::Display for AstNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The statement keyword a `STATEMENT` node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    If,
    ElseIf,
    Else,
    While,
    For,
    Out,
}

impl StatementKind {
    pub fn keyword(self) -> &'static str {
        match self {
            StatementKind::If => "if",
            StatementKind::ElseIf => "else if",
            StatementKind::Else => "else",
            StatementKind::While => "while",
            StatementKind::For => "for",
            StatementKind::Out => "out",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "if" => Some(StatementKind::If),
            "else if" => Some(StatementKind::ElseIf),
            "else" => Some(StatementKind::Else),
            "while" => Some(StatementKind::While),
            "for" => Some(StatementKind::For),
            "out" => Some(StatementKind::Out),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstKind {
    Program,
    Statement(StatementKind),
    Condition,
    CodeBlock,
    VarDeclaration,
    VarType,
    Identifier,
    Assignment,
    StringLiteral,
    CharLiteral,
    NumericLiteral,
    BoolLiteral,
    RelationalOperator,
    UnaryOperator,
    FunctionCall,
}

impl AstKind {
    /// Leaf tag for a token that is stored verbatim in the tree.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Identifier => Some(AstKind::Identifier),
            TokenKind::StringLiteral => Some(AstKind::StringLiteral),
            TokenKind::CharLiteral => Some(AstKind::CharLiteral),
            TokenKind::NumericLiteral => Some(AstKind::NumericLiteral),
            TokenKind::BoolLiteral => Some(AstKind::BoolLiteral),
            TokenKind::RelationalOperator => Some(AstKind::RelationalOperator),
            TokenKind::UnaryArithmeticOperator => Some(AstKind::UnaryOperator),
            _ => None,
        }
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            AstKind::StringLiteral
                | AstKind::CharLiteral
                | AstKind::NumericLiteral
                | AstKind::BoolLiteral
        )
    }

    pub fn is_statement(self, kind: StatementKind) -> bool {
        self == AstKind::Statement(kind)
    }

    pub fn tag(self) -> &'static str {
        match self {
            AstKind::Program => "Program",
            AstKind::Statement(_) => "STATEMENT",
            AstKind::Condition => "CONDITION",
            AstKind::CodeBlock => "CODE_BLOCK",
            AstKind::VarDeclaration => "VAR_DECLARATION",
            AstKind::VarType => "VAR_TYPE",
            AstKind::Identifier => "IDENTIFIER",
            AstKind::Assignment => "ASSIGNMENT",
            AstKind::StringLiteral => "STRING_LITERAL",
            AstKind::CharLiteral => "CHAR_LITERAL",
            AstKind::NumericLiteral => "NUMERIC_LITERAL",
            AstKind::BoolLiteral => "BOOL_LITERAL",
            AstKind::RelationalOperator => "RELATIONAL_OPERATOR",
            AstKind::UnaryOperator => "UNARY_ARITHMETIC_OPERATOR",
            AstKind::FunctionCall => "FUNCTIONCALL",
        }
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The primitive types a variable can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Int,
    Float,
    String,
    Char,
    Bool,
}

impl VarType {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Int => Some(VarType::Int),
            TokenKind::Float => Some(VarType::Float),
            TokenKind::String => Some(VarType::String),
            TokenKind::Char => Some(VarType::Char),
            TokenKind::Bool => Some(VarType::Bool),
            _ => None,
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "int" => Some(VarType::Int),
            "float" => Some(VarType::Float),
            "string" => Some(VarType::String),
            "char" => Some(VarType::Char),
            "bool" => Some(VarType::Bool),
            _ => None,
        }
    }

    /// The only literal kind an initializer of this type may have.
    pub fn literal_kind(self) -> TokenKind {
        match self {
            VarType::Int | VarType::Float => TokenKind::NumericLiteral,
            VarType::String => TokenKind::StringLiteral,
            VarType::Char => TokenKind::CharLiteral,
            VarType::Bool => TokenKind::BoolLiteral,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::String => "string",
            VarType::Char => "char",
            VarType::Bool => "bool",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: AstKind,
    pub value: String,
    pub children: Vec<AstNodeId>,
    pub parent: Option<AstNodeId>,
    pub line: usize,
    pub column: usize,
}

/// Arena-backed syntax tree. Node 0 is the `Program` root.
///
/// `Ast::default()` is an arena without a root; lowering rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    pub fn new() -> Self {
        let mut ast = Self::default();
        ast.alloc(AstKind::Program, String::new(), (0, 0));
        ast
    }

    pub fn root(&self) -> Option<AstNodeId> {
        match self.nodes.first() {
            Some(node) if node.kind == AstKind::Program => Some(AstNodeId(0)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Panics on an id that did not come from this tree.
    pub fn node(&self, id: AstNodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: AstNodeId) -> AstKind {
        self.node(id).kind
    }

    pub fn value(&self, id: AstNodeId) -> &str {
        &self.node(id).value
    }

    pub fn children(&self, id: AstNodeId) -> &[AstNodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: AstNodeId, index: usize) -> Option<AstNodeId> {
        self.node(id).children.get(index).copied()
    }

    pub fn parent(&self, id: AstNodeId) -> Option<AstNodeId> {
        self.node(id).parent
    }

    pub fn last_child(&self, id: AstNodeId) -> Option<AstNodeId> {
        self.node(id).children.last().copied()
    }

    /// Create a detached node.
    pub(crate) fn alloc(
        &mut self,
        kind: AstKind,
        value: impl Into<String>,
        (line, column): (usize, usize),
    ) -> AstNodeId {
        let id = AstNodeId(self.nodes.len());
        self.nodes.push(AstNode {
            kind,
            value: value.into(),
            children: Vec::new(),
            parent: None,
            line,
            column,
        });
        id
    }

    /// Attach a detached node as the last child of `parent`.
    ///
    /// Rejects the root, a node that already has a parent, and a node that is
    /// an ancestor of `parent`, so every node keeps a single parent and the
    /// tree stays acyclic.
    pub(crate) fn append(&mut self, parent: AstNodeId, child: AstNodeId) -> Result<(), StructuralError> {
        let reattached = || StructuralError::AlreadyAttached {
            node: child,
            parent,
        };
        if child.0 == 0 || self.nodes[child.0].parent.is_some() {
            return Err(reattached());
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(reattached());
            }
            cursor = self.nodes[id.0].parent;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub fn add_child(
        &mut self,
        parent: AstNodeId,
        kind: AstKind,
        value: impl Into<String>,
        pos: (usize, usize),
    ) -> AstNodeId {
        let id = self.alloc(kind, value, pos);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// The sibling immediately after `id` in its parent's children.
    pub fn next_sibling(&self, id: AstNodeId) -> Option<AstNodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let at = siblings.iter().position(|&s| s == id)?;
        siblings.get(at + 1).copied()
    }

    /// Pre-order traversal starting at the root.
    pub fn walk(&self) -> Vec<(usize, AstNodeId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root() else {
            return out;
        };
        let mut stack = vec![(0, root)];
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for &child in self.children(id).iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .map(|(depth, id)| {
                let node = self.node(id);
                format!("{}Type: {}, Value: {}", "  ".repeat(depth), node.kind, node.value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_links_parent() {
        let mut ast = Ast::new();
        let root = ast.root().unwrap();
        let block = ast.add_child(root, AstKind::CodeBlock, "", (1, 1));
        let decl = ast.add_child(block, AstKind::VarDeclaration, "", (1, 2));
        assert_eq!(ast.parent(decl), Some(block));
        assert_eq!(ast.parent(block), Some(root));
        assert_eq!(ast.children(root), &[block]);
    }

    #[test]
    fn next_sibling_follows_insertion_order() {
        let mut ast = Ast::new();
        let root = ast.root().unwrap();
        let a = ast.add_child(root, AstKind::Statement(StatementKind::If), "if", (1, 1));
        let b = ast.add_child(root, AstKind::Statement(StatementKind::Else), "else", (2, 1));
        assert_eq!(ast.next_sibling(a), Some(b));
        assert_eq!(ast.next_sibling(b), None);
        assert_eq!(ast.next_sibling(root), None);
    }

    #[test]
    fn append_keeps_single_parent_and_no_cycles() {
        let mut ast = Ast::new();
        let root = ast.root().unwrap();
        let outer = ast.alloc(AstKind::CodeBlock, "", (1, 1));
        let inner = ast.add_child(outer, AstKind::CodeBlock, "", (1, 2));

        assert!(matches!(
            ast.append(inner, outer),
            Err(StructuralError::AlreadyAttached { .. })
        ));
        assert!(matches!(
            ast.append(outer, root),
            Err(StructuralError::AlreadyAttached { .. })
        ));
        assert!(ast.append(root, outer).is_ok());
        assert!(matches!(
            ast.append(root, inner),
            Err(StructuralError::AlreadyAttached { .. })
        ));
        assert_eq!(ast.parent(inner), Some(outer));
        assert_eq!(ast.children(root), &[outer]);
        assert_eq!(ast.walk().len(), 3);
    }

    #[test]
    fn default_tree_has_no_root() {
        assert_eq!(Ast::default().root(), None);
        assert!(Ast::default().to_lines().is_empty());
    }

    #[test]
    fn dump_is_indented_preorder() {
        let mut ast = Ast::new();
        let root = ast.root().unwrap();
        let decl = ast.add_child(root, AstKind::VarDeclaration, "", (1, 1));
        ast.add_child(decl, AstKind::VarType, "int", (1, 1));
        assert_eq!(
            ast.to_lines(),
            vec![
                "Type: Program, Value: ".to_string(),
                "  Type: VAR_DECLARATION, Value: ".to_string(),
                "    Type: VAR_TYPE, Value: int".to_string(),
            ]
        );
    }
}
