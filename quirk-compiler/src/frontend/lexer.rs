use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Raw token automaton. `else if` is merged into a single keyword by [`Lexer`].
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\r\n\f]+")] // Whitespace
#[logos(skip r"//[^\n]*")] // C++-style line comments starting with '//'
enum RawToken {
    // --- Keywords ---
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    #[token("for")]
    #[token("function")]
    #[token("out")]
    Keyword,

    // --- Type keywords ---
    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("string")]
    String,
    #[token("char")]
    Char,
    #[token("bool")]
    Bool,

    // --- Literals and identifiers ---
    #[token("true")]
    #[token("false")]
    BoolLiteral,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    NumericLiteral,
    /// `1e`, `2.5E+` - exponent marker without digits
    #[regex(r"[0-9]+(\.[0-9]*)?[eE][+-]?")]
    MalformedNumber,

    #[regex(r#""[^"]*""#)]
    StringLiteral,
    #[regex(r#""[^"]*"#)]
    UnterminatedString,

    #[regex(r"'[^']*'")]
    CharLiteral,
    #[regex(r"'[^']*")]
    UnterminatedChar,

    // --- Operators ---
    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("<")]
    #[token(">")]
    RelationalOperator,

    #[token("=")]
    Assignment,

    #[token("++")]
    #[token("--")]
    UnaryArithmeticOperator,

    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("^")]
    MathOperator,

    // --- Punctuation ---
    #[token("(")]
    #[token(")")]
    RoundParen,
    #[token("{")]
    #[token("}")]
    CurlyParen,
    #[token("[")]
    #[token("]")]
    SquareParen,
    #[token(";")]
    Punctuation,
    #[token(",")]
    Comma,
}

/// Token classification consumed by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Identifier,
    StringLiteral,
    CharLiteral,
    NumericLiteral,
    BoolLiteral,
    Punctuation,
    Assignment,
    RoundParen,
    CurlyParen,
    SquareParen,
    RelationalOperator,
    Comma,
    MathOperator,
    Int,
    Float,
    Char,
    String,
    Bool,
    UnaryArithmeticOperator,
    EndOfFile,
    Error,
}

impl TokenKind {
    /// Literal kinds and identifiers, i.e. everything that can fill an operand slot.
    pub fn is_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
                | TokenKind::NumericLiteral
                | TokenKind::BoolLiteral
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::CharLiteral => "CHAR_LITERAL",
            TokenKind::NumericLiteral => "NUMERIC_LITERAL",
            TokenKind::BoolLiteral => "BOOL_LITERAL",
            TokenKind::Punctuation => "PUNCTUATION",
            TokenKind::Assignment => "ASSIGNMENT",
            TokenKind::RoundParen => "ROUND_PAREN",
            TokenKind::CurlyParen => "CURLY_PAREN",
            TokenKind::SquareParen => "SQUARE_PAREN",
            TokenKind::RelationalOperator => "RELATIONAL_OPERATOR",
            TokenKind::Comma => "COMMA",
            TokenKind::MathOperator => "MATH_OPERATOR",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::Char => "CHAR",
            TokenKind::String => "STRING",
            TokenKind::Bool => "BOOL",
            TokenKind::UnaryArithmeticOperator => "UNARY_ARITHMETIC_OPERATOR",
            TokenKind::EndOfFile => "END_OF_FILE",
            TokenKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::If | RawToken::Else | RawToken::Keyword => TokenKind::Keyword,
            RawToken::Int => TokenKind::Int,
            RawToken::Float => TokenKind::Float,
            RawToken::String => TokenKind::String,
            RawToken::Char => TokenKind::Char,
            RawToken::Bool => TokenKind::Bool,
            RawToken::BoolLiteral => TokenKind::BoolLiteral,
            RawToken::Identifier => TokenKind::Identifier,
            RawToken::NumericLiteral => TokenKind::NumericLiteral,
            RawToken::StringLiteral => TokenKind::StringLiteral,
            RawToken::CharLiteral => TokenKind::CharLiteral,
            RawToken::RelationalOperator => TokenKind::RelationalOperator,
            RawToken::Assignment => TokenKind::Assignment,
            RawToken::UnaryArithmeticOperator => TokenKind::UnaryArithmeticOperator,
            RawToken::MathOperator => TokenKind::MathOperator,
            RawToken::RoundParen => TokenKind::RoundParen,
            RawToken::CurlyParen => TokenKind::CurlyParen,
            RawToken::SquareParen => TokenKind::SquareParen,
            RawToken::Punctuation => TokenKind::Punctuation,
            RawToken::Comma => TokenKind::Comma,
            RawToken::MalformedNumber
            | RawToken::UnterminatedString
            | RawToken::UnterminatedChar => TokenKind::Error,
        }
    }
}

/// A classified lexeme with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind, lexeme: &str) -> bool {
        self.kind == kind && self.lexeme == lexeme
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfFile => write!(f, "end of input"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

/// The parser's view of a lexer: a forward-only cursor over tokens.
///
/// Once the input is exhausted `next_token` keeps returning
/// [`TokenKind::EndOfFile`].
pub trait TokenSource {
    fn next_token(&mut self) -> Token;

    /// 1-based (line, column) of the read cursor.
    fn current_position(&self) -> (usize, usize);
}

/// Line-start table for byte offset to line/column conversion.
///
/// Columns count characters, not bytes.
#[derive(Debug, Clone)]
pub struct SourceIndex<'source> {
    source: &'source str,
    line_starts: Vec<usize>,
}

impl<'source> SourceIndex<'source> {
    pub fn new(source: &'source str) -> Self {
        let mut starts = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                starts.push(i + 1);
            }
        }
        Self {
            source,
            line_starts: starts,
        }
    }

    /// Convert a byte offset to 1-based (line, column).
    pub fn to_line_col(&self, byte: usize) -> (usize, usize) {
        match self.line_starts.binary_search(&byte) {
            Ok(line_idx) => (line_idx + 1, 1),
            Err(insert_pos) => {
                let line_idx = insert_pos.saturating_sub(1);
                let start = self.line_starts.get(line_idx).copied().unwrap_or(0);
                let column = self
                    .source
                    .get(start..byte)
                    .map_or(byte.saturating_sub(start), |text| text.chars().count());
                (line_idx + 1, column + 1)
            }
        }
    }
}

type RawItem = (Result<RawToken, ()>, Range<usize>);

/// Quirk lexer over an in-memory source string.
pub struct Lexer<'source> {
    source: &'source str,
    index: SourceIndex<'source>,
    raw: logos::Lexer<'source, RawToken>,
    peeked: Option<RawItem>,
    cursor: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            index: SourceIndex::new(source),
            raw: RawToken::lexer(source),
            peeked: None,
            cursor: 0,
        }
    }

    /// Drain the remaining input into a vector, including the final end-of-file token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn pull(&mut self) -> Option<RawItem> {
        if let Some(item) = self.peeked.take() {
            return Some(item);
        }
        let result = self.raw.next()?;
        Some((result, self.raw.span()))
    }

    fn peek(&mut self) -> Option<&RawItem> {
        if self.peeked.is_none() {
            let result = self.raw.next()?;
            self.peeked = Some((result, self.raw.span()));
        }
        self.peeked.as_ref()
    }

    fn make(&self, kind: TokenKind, lexeme: String, start: usize) -> Token {
        let (line, column) = self.index.to_line_col(start);
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Token {
        let Some((result, span)) = self.pull() else {
            self.cursor = self.source.len();
            return self.make(TokenKind::EndOfFile, String::new(), self.source.len());
        };
        self.cursor = span.end;

        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                let lexeme = self.source[span.clone()].to_string();
                return self.make(TokenKind::Error, lexeme, span.start);
            }
        };

        // `else` and `if` separated only by blanks on one line form the `else if` keyword
        if raw == RawToken::Else {
            let source = self.source;
            let merge_end = match self.peek() {
                Some((Ok(RawToken::If), next))
                    if source[span.end..next.start]
                        .chars()
                        .all(|c| c == ' ' || c == '\t') =>
                {
                    Some(next.end)
                }
                _ => None,
            };
            if let Some(end) = merge_end {
                self.peeked = None;
                self.cursor = end;
                return self.make(TokenKind::Keyword, "else if".to_string(), span.start);
            }
        }

        let lexeme = self.source[span.clone()].to_string();
        self.make(TokenKind::from(raw), lexeme, span.start)
    }

    fn current_position(&self) -> (usize, usize) {
        self.index.to_line_col(self.cursor)
    }
}

/// Convenience wrapper: lex a whole source string.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
