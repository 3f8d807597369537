//! Source text to syntax tree: the logos-driven lexer and the
//! recursive-descent parser.

pub mod lexer;
pub mod parser;
