use super::context::Gen;
use crate::ir::ast::{AstKind, AstNodeId, StatementKind, VarType};
use crate::ir::*;
use crate::{CompileError, StructuralError, MAX_NESTING_DEPTH};

impl Gen<'_> {
    pub fn lower_program(&mut self) -> Result<(), CompileError> {
        let root = self.ast.root().ok_or(StructuralError::MissingRoot)?;
        self.lower_block(root)
    }

    /// Lower the children of `block` in order. An `if` consumes the
    /// `else if` and `else` siblings that follow it.
    pub fn lower_block(&mut self, block: AstNodeId) -> Result<(), CompileError> {
        if self.depth > MAX_NESTING_DEPTH {
            return Err(StructuralError::NestingTooDeep {
                node: block,
                limit: MAX_NESTING_DEPTH,
            }
            .into());
        }
        self.depth += 1;
        let result = self.lower_children(block);
        self.depth -= 1;
        result
    }

    fn lower_children(&mut self, block: AstNodeId) -> Result<(), CompileError> {
        let ast = self.ast;
        let children = ast.children(block);
        let mut i = 0;
        while i < children.len() {
            let consumed = self.lower_stmt(children[i])?;
            i += 1 + consumed;
        }
        Ok(())
    }

    /// Returns how many following siblings the statement consumed.
    pub fn lower_stmt(&mut self, node: AstNodeId) -> Result<usize, CompileError> {
        match self.ast.kind(node) {
            AstKind::VarDeclaration => self.lower_var_decl(node).map(|_| 0),
            AstKind::Statement(StatementKind::If) => self.lower_if_chain(node),
            AstKind::Statement(kind @ (StatementKind::ElseIf | StatementKind::Else)) => {
                Err(StructuralError::OrphanBranch {
                    node,
                    keyword: kind.keyword().to_string(),
                }
                .into())
            }
            AstKind::Statement(StatementKind::While) => self.lower_while(node).map(|_| 0),
            AstKind::Statement(StatementKind::For) => self.lower_for(node).map(|_| 0),
            AstKind::Statement(StatementKind::Out) => self.lower_out(node).map(|_| 0),
            AstKind::CodeBlock => self.lower_block(node).map(|_| 0),
            // A bare literal has no effect as a statement.
            kind if kind.is_literal() => Ok(0),
            _ => Err(self.unexpected(node)),
        }
    }

    pub fn lower_var_decl(&mut self, node: AstNodeId) -> Result<(), CompileError> {
        let ty_node = self.child_of_kind(node, 0, AstKind::VarType)?;
        let name = self.child_of_kind(node, 1, AstKind::Identifier)?;
        let assignment = self.child_of_kind(node, 2, AstKind::Assignment)?;
        let init = self.child(assignment, 0)?;
        if !self.ast.kind(init).is_literal() {
            return Err(self.unexpected(init));
        }

        let ty = VarType::from_keyword(self.ast.value(ty_node)).ok_or_else(|| self.unexpected(ty_node))?;
        let dst = self.new_temp();
        self.emit(Instr::Alloc { dst, ty });
        let value = self.lower_operand(init)?;
        self.emit(Instr::Store { value, dst });
        self.storage.insert(self.ast.value(name).to_string(), dst);
        Ok(())
    }

    /// Lower an `if` and the `else if` / `else` arms directly after it.
    ///
    /// Each conditional branch is emitted with only its true target. Its
    /// false target is patched once the next arm is known: the next
    /// `else if` label, the `else` label, or `merge` when the chain ends.
    fn lower_if_chain(&mut self, if_node: AstNodeId) -> Result<usize, CompileError> {
        let ast = self.ast;
        let parent = ast.parent(if_node).ok_or_else(|| StructuralError::DetachedNode {
            node: if_node,
            kind: ast.kind(if_node).to_string(),
        })?;
        let siblings = ast.children(parent);
        let at = siblings
            .iter()
            .position(|&s| s == if_node)
            .ok_or_else(|| StructuralError::DetachedNode {
                node: if_node,
                kind: ast.kind(if_node).to_string(),
            })?;

        let then = self.new_label("then");
        let merge = self.new_label("merge");
        let mut pending = self.lower_branch(if_node, then.clone())?;
        let body = self.child_of_kind(if_node, 1, AstKind::CodeBlock)?;
        self.lower_arm(then, body, &merge)?;

        let mut consumed = 0;
        let mut next = siblings.get(at + 1).copied();
        while let Some(arm) = next.filter(|&n| ast.kind(n).is_statement(StatementKind::ElseIf)) {
            let elseif = self.new_label("elseif");
            let then = self.new_label("then");
            self.patch_false_target(pending, elseif.clone());
            pending = self.with_label(elseif, |this| this.lower_branch(arm, then.clone()))?;
            let body = self.child_of_kind(arm, 1, AstKind::CodeBlock)?;
            self.lower_arm(then, body, &merge)?;
            consumed += 1;
            next = siblings.get(at + 1 + consumed).copied();
        }

        match next {
            Some(arm) if ast.kind(arm).is_statement(StatementKind::Else) => {
                let otherwise = self.new_label("else");
                self.patch_false_target(pending, otherwise.clone());
                let body = self.child_of_kind(arm, 0, AstKind::CodeBlock)?;
                self.lower_arm(otherwise, body, &merge)?;
                consumed += 1;
            }
            _ => self.patch_false_target(pending, merge.clone()),
        }

        self.emit(Instr::Label(merge));
        Ok(consumed)
    }

    /// Condition plus a conditional branch whose false target is still open.
    fn lower_branch(&mut self, stmt: AstNodeId, on_true: Label) -> Result<InstrId, CompileError> {
        let cond = self.child_of_kind(stmt, 0, AstKind::Condition)?;
        let cond = self.lower_condition(cond)?;
        Ok(self.emit(Instr::CondBr {
            cond,
            on_true,
            on_false: None,
        }))
    }

    fn lower_arm(&mut self, label: Label, body: AstNodeId, merge: &Label) -> Result<(), CompileError> {
        self.with_label(label, |this| {
            this.lower_block(body)?;
            this.emit(Instr::Br {
                target: merge.clone(),
            });
            Ok(())
        })
    }

    /// Counter and bound get their own storage; the condition block reloads
    /// both on every iteration. The header's comparison and update always
    /// act on the counter, which the parser enforces.
    pub fn lower_for(&mut self, node: AstNodeId) -> Result<(), CompileError> {
        let header = self.child_of_kind(node, 0, AstKind::Condition)?;
        let body = self.child_of_kind(node, 1, AstKind::CodeBlock)?;
        let counter_name = self.child_of_kind(header, 1, AstKind::Identifier)?;
        let assignment = self.child_of_kind(header, 2, AstKind::Assignment)?;
        let init = self.child_of_kind(assignment, 0, AstKind::NumericLiteral)?;
        let bound = self.child(header, 5)?;
        let step_node = self.child_of_kind(header, 7, AstKind::UnaryOperator)?;
        let step = StepOp::from_symbol(self.ast.value(step_node)).ok_or_else(|| self.unexpected(step_node))?;

        let counter = self.new_temp();
        self.emit(Instr::Alloc {
            dst: counter,
            ty: VarType::Int,
        });
        self.emit(Instr::Store {
            value: Operand::Literal(self.ast.value(init).to_string()),
            dst: counter,
        });
        self.storage.insert(self.ast.value(counter_name).to_string(), counter);

        let bound_value = self.lower_operand(bound)?;
        let limit = self.new_temp();
        self.emit(Instr::Alloc {
            dst: limit,
            ty: VarType::Int,
        });
        self.emit(Instr::Store {
            value: bound_value,
            dst: limit,
        });

        let cond = self.new_label("for_cond");
        let body_label = self.new_label("for_body");
        let end = self.new_label("for_end");

        let current = self.with_label(cond.clone(), |this| {
            let current = this.new_temp();
            this.emit(Instr::Load {
                dst: current,
                src: counter,
            });
            let max = this.new_temp();
            this.emit(Instr::Load { dst: max, src: limit });
            let test = this.new_temp();
            this.emit(Instr::Cmp {
                dst: test,
                op: RelOp::Lt,
                left: Operand::Temp(current),
                right: Operand::Temp(max),
            });
            this.emit(Instr::CondBr {
                cond: test,
                on_true: body_label.clone(),
                on_false: Some(end.clone()),
            });
            current
        });

        self.with_label(body_label, |this| {
            this.lower_block(body)?;
            this.emit(Instr::Step { target: current, op: step });
            this.emit(Instr::Store {
                value: Operand::Temp(current),
                dst: counter,
            });
            this.emit(Instr::Br { target: cond });
            Ok::<_, CompileError>(())
        })?;

        self.emit(Instr::Label(end));
        Ok(())
    }

    pub fn lower_while(&mut self, node: AstNodeId) -> Result<(), CompileError> {
        let header = self.child_of_kind(node, 0, AstKind::Condition)?;
        let body = self.child_of_kind(node, 1, AstKind::CodeBlock)?;
        let cond = self.new_label("while_cond");
        let body_label = self.new_label("while_body");
        let end = self.new_label("while_end");

        self.with_label(cond.clone(), |this| {
            let test = this.lower_condition(header)?;
            this.emit(Instr::CondBr {
                cond: test,
                on_true: body_label.clone(),
                on_false: Some(end.clone()),
            });
            Ok::<_, CompileError>(())
        })?;
        self.with_label(body_label, |this| {
            this.lower_block(body)?;
            this.emit(Instr::Br { target: cond });
            Ok::<_, CompileError>(())
        })?;
        self.emit(Instr::Label(end));
        Ok(())
    }

    pub fn lower_out(&mut self, node: AstNodeId) -> Result<(), CompileError> {
        let call = self.child_of_kind(node, 0, AstKind::FunctionCall)?;
        let arg = self.child(call, 0)?;
        let arg = self.lower_operand(arg)?;
        self.emit(Instr::Call {
            callee: self.ast.value(call).to_string(),
            args: vec![arg],
        });
        Ok(())
    }
}
