use std::collections::HashMap;

use crate::ir::ast::{Ast, AstKind, AstNodeId};
use crate::ir::*;
use crate::{CompileError, StructuralError};

pub struct Gen<'a> {
    pub ast: &'a Ast,
    pub out: InstrTree,
    pub temp_count: usize,
    pub label_count: usize,
    /// Storage temp for every declared name, filled as declarations lower.
    pub storage: HashMap<String, Temp>,
    /// Label nodes currently receiving instructions. Empty means the root.
    insertion: Vec<InstrId>,
    /// Blocks entered below the root.
    pub depth: usize,
}

impl<'a> Gen<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            out: InstrTree::new(),
            temp_count: 0,
            label_count: 0,
            storage: HashMap::new(),
            insertion: Vec::new(),
            depth: 0,
        }
    }

    pub fn finish(self) -> InstrTree {
        self.out
    }

    pub fn new_temp(&mut self) -> Temp {
        let t = Temp(self.temp_count);
        self.temp_count += 1;
        t
    }

    pub fn new_label(&mut self, prefix: &str) -> Label {
        let l = Label(format!("{prefix}{}", self.label_count));
        self.label_count += 1;
        l
    }

    pub fn emit(&mut self, i: Instr) -> InstrId {
        let at = self.insertion.last().copied().unwrap_or(self.out.root());
        self.out.push(at, i)
    }

    /// Emit a label and make it the insertion point while `f` runs.
    pub fn with_label<F, R>(&mut self, label: Label, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let id = self.emit(Instr::Label(label));
        self.insertion.push(id);
        let result = f(self);
        self.insertion.pop();
        result
    }

    pub fn patch_false_target(&mut self, branch: InstrId, target: Label) {
        tracing::debug!(branch = branch.0, target = %target, "patching conditional branch");
        let patched = self.out.patch_false_target(branch, target);
        debug_assert!(patched, "branch {branch:?} was already complete");
    }

    pub fn child(&self, node: AstNodeId, index: usize) -> Result<AstNodeId, CompileError> {
        self.ast.child(node, index).ok_or_else(|| {
            StructuralError::MissingChild {
                node,
                kind: self.ast.kind(node).to_string(),
                index,
            }
            .into()
        })
    }

    /// Like [`Gen::child`], but also checks the child's kind.
    pub fn child_of_kind(
        &self,
        node: AstNodeId,
        index: usize,
        kind: AstKind,
    ) -> Result<AstNodeId, CompileError> {
        let id = self.child(node, index)?;
        if self.ast.kind(id) != kind {
            return Err(self.unexpected(id));
        }
        Ok(id)
    }

    pub fn unexpected(&self, node: AstNodeId) -> CompileError {
        StructuralError::UnexpectedNode {
            node,
            kind: self.ast.kind(node).to_string(),
        }
        .into()
    }
}
