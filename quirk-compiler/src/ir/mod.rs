//! Intermediate representation.
//!
//! This module holds the syntax tree the parser builds, the symbol table,
//! the instruction tree and the lowering pass between them.

pub mod ast;
pub mod ir;
pub use ir::*;
pub mod ir_generator;
pub mod symbol_table;
