//! AST to IR lowering.
//!
//! Walks the tree depth-first from the `Program` root and emits labelled
//! pseudo-instructions into an [`InstrTree`].

pub mod cond;
pub mod context;
pub mod stmt;

use crate::ir::ast::Ast;
use crate::ir::InstrTree;
use crate::CompileError;

pub use context::Gen;

/// Lower a parsed tree. The input is not modified, so lowering the same tree
/// twice yields identical output.
#[tracing::instrument(skip_all, fields(nodes = ast.len()))]
pub fn lower(ast: &Ast) -> Result<InstrTree, CompileError> {
    let mut g = Gen::new(ast);
    g.lower_program()?;
    let out = g.finish();
    tracing::debug!(instructions = out.len(), "lowering finished");
    Ok(out)
}
