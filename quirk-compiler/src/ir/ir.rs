// A tree of labelled pseudo-instructions. Label nodes own the instructions
// emitted while they were the active insertion point.

use crate::ir::ast::VarType;
use std::fmt;

/// A numbered temporary, rendered as `%t<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temp(pub usize);

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%t{}", self.0)
    }
}

/// A block label such as `then0` or `for_end7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Temp(Temp),
    /// Literal text exactly as written in the source.
    Literal(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(t) => write!(f, "{t}"),
            Operand::Literal(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl RelOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(RelOp::Eq),
            "!=" => Some(RelOp::Neq),
            "<" => Some(RelOp::Lt),
            ">" => Some(RelOp::Gt),
            "<=" => Some(RelOp::Le),
            ">=" => Some(RelOp::Ge),
            _ => None,
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelOp::Eq => "==",
            RelOp::Neq => "!=",
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
        };
        write!(f, "{s}")
    }
}

/// `for` counter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOp {
    Inc,
    Dec,
}

impl StepOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "++" => Some(StepOp::Inc),
            "--" => Some(StepOp::Dec),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Synthetic tree root, never printed.
    Root,

    /// `dst = alloc <ty>`
    Alloc { dst: Temp, ty: VarType },

    /// `store <value>, <dst>`
    Store { value: Operand, dst: Temp },

    /// `dst = load <src>`
    Load { dst: Temp, src: Temp },

    /// `dst = cmp <op> <left>, <right>`
    Cmp {
        dst: Temp,
        op: RelOp,
        left: Operand,
        right: Operand,
    },

    /// `target = target +/- 1`
    Step { target: Temp, op: StepOp },

    /// `br <cond>, label <on_true>[, label <on_false>]`
    ///
    /// `on_false` starts out empty for `if` chains and is filled in once the
    /// next arm is known.
    CondBr {
        cond: Temp,
        on_true: Label,
        on_false: Option<Label>,
    },

    /// `br label <target>`
    Br { target: Label },

    /// `<name>:`
    Label(Label),

    /// `call <callee>(<args>)`
    Call { callee: String, args: Vec<Operand> },
}

impl Instr {
    /// Short operation tag, for backends that dispatch on it.
    pub fn operation(&self) -> &'static str {
        match self {
            Instr::Root => "root",
            Instr::Alloc { .. } => "alloc",
            Instr::Store { .. } => "store",
            Instr::Load { .. } => "load",
            Instr::Cmp { .. } => "cmp",
            Instr::Step { op: StepOp::Inc, .. } => "inc",
            Instr::Step { op: StepOp::Dec, .. } => "dec",
            Instr::CondBr { .. } | Instr::Br { .. } => "br",
            Instr::Label(_) => "label",
            Instr::Call { .. } => "call",
        }
    }

    /// Every label this instruction can transfer control to.
    pub fn branch_targets(&self) -> Vec<&Label> {
        match self {
            Instr::CondBr {
                on_true, on_false, ..
            } => std::iter::once(on_true).chain(on_false.as_ref()).collect(),
            Instr::Br { target } => vec![target],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Root => write!(f, "root"),
            Instr::Alloc { dst, ty } => write!(f, "{dst} = alloc {ty}"),
            Instr::Store { value, dst } => write!(f, "store {value}, {dst}"),
            Instr::Load { dst, src } => write!(f, "{dst} = load {src}"),
            Instr::Cmp {
                dst,
                op,
                left,
                right,
            } => write!(f, "{dst} = cmp {op} {left}, {right}"),
            Instr::Step { target, op } => {
                let sign = match op {
                    StepOp::Inc => '+',
                    StepOp::Dec => '-',
                };
                write!(f, "{target} = {target} {sign} 1")
            }
            Instr::CondBr {
                cond,
                on_true,
                on_false,
            } => {
                write!(f, "br {cond}, label {on_true}")?;
                if let Some(other) = on_false {
                    write!(f, ", label {other}")?;
                }
                Ok(())
            }
            Instr::Br { target } => write!(f, "br label {target}"),
            Instr::Label(label) => write!(f, "{}:", label.name()),
            Instr::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "call {callee}({})", args.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrNode {
    pub instr: Instr,
    pub children: Vec<InstrId>,
    pub parent: Option<InstrId>,
}

/// Output of lowering: an arena of instructions under a synthetic root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrTree {
    nodes: Vec<InstrNode>,
}

impl Default for InstrTree {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![InstrNode {
                instr: Instr::Root,
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> InstrId {
        InstrId(0)
    }

    /// Number of instructions, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: InstrId) -> &InstrNode {
        &self.nodes[id.0]
    }

    pub fn instr(&self, id: InstrId) -> &Instr {
        &self.nodes[id.0].instr
    }

    pub fn children(&self, id: InstrId) -> &[InstrId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: InstrId) -> Option<InstrId> {
        self.nodes[id.0].parent
    }

    /// Append `instr` as the last child of `parent`.
    pub fn push(&mut self, parent: InstrId, instr: Instr) -> InstrId {
        let id = InstrId(self.nodes.len());
        self.nodes.push(InstrNode {
            instr,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Fill in the missing false target of an already emitted conditional
    /// branch. Returns `false` if `id` is not a conditional branch or already
    /// has both targets.
    pub fn patch_false_target(&mut self, id: InstrId, target: Label) -> bool {
        match &mut self.nodes[id.0].instr {
            Instr::CondBr { on_false, .. } if on_false.is_none() => {
                *on_false = Some(target);
                true
            }
            _ => false,
        }
    }

    /// Pre-order traversal with depth, root excluded.
    pub fn walk(&self) -> Vec<(usize, InstrId)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, InstrId)> = self
            .children(self.root())
            .iter()
            .rev()
            .map(|&id| (0, id))
            .collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for &child in self.children(id).iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instr> + '_ {
        self.walk().into_iter().map(move |(_, id)| self.instr(id))
    }

    /// First label instruction with the given name.
    pub fn find_label(&self, name: &str) -> Option<InstrId> {
        self.walk()
            .into_iter()
            .map(|(_, id)| id)
            .find(|&id| matches!(self.instr(id), Instr::Label(l) if l.name() == name))
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .map(|(depth, id)| format!("{}{}", "  ".repeat(depth), self.instr(id)))
            .collect()
    }
}
