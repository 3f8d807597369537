use super::context::Gen;
use crate::ir::ast::{AstKind, AstNodeId};
use crate::ir::*;
use crate::{CompileError, StructuralError};

impl Gen<'_> {
    /// Lower a `CONDITION` triple to a `cmp` and return its result temp.
    pub fn lower_condition(&mut self, cond: AstNodeId) -> Result<Temp, CompileError> {
        let left = self.child(cond, 0)?;
        let op_node = self.child_of_kind(cond, 1, AstKind::RelationalOperator)?;
        let right = self.child(cond, 2)?;

        let op = RelOp::from_symbol(self.ast.value(op_node)).ok_or_else(|| self.unexpected(op_node))?;
        let left = self.lower_operand(left)?;
        let right = self.lower_operand(right)?;

        let dst = self.new_temp();
        self.emit(Instr::Cmp {
            dst,
            op,
            left,
            right,
        });
        Ok(dst)
    }

    /// Literals are used as written. An identifier is loaded from its storage
    /// temp and the loaded temp is used.
    pub fn lower_operand(&mut self, node: AstNodeId) -> Result<Operand, CompileError> {
        let ast = self.ast;
        let kind = ast.kind(node);
        if kind.is_literal() {
            return Ok(Operand::Literal(ast.value(node).to_string()));
        }
        if kind != AstKind::Identifier {
            return Err(self.unexpected(node));
        }

        let name = ast.value(node);
        let src = *self
            .storage
            .get(name)
            .ok_or_else(|| StructuralError::UnboundIdentifier {
                node,
                name: name.to_string(),
            })?;
        let dst = self.new_temp();
        self.emit(Instr::Load { dst, src });
        Ok(Operand::Temp(dst))
    }
}
