use crate::ir::ast::{AstNodeId, VarType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub ty: VarType,
    pub ast_id: AstNodeId,
    pub line: usize,
    pub column: usize,
}

/// Declared variables in declaration order.
///
/// The namespace is flat: leaving a block does not release its names, so a
/// name declared anywhere blocks redeclaration for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a symbol; returns the existing entry on redefinition.
    pub fn declare(&mut self, info: SymbolInfo) -> Result<(), SymbolInfo> {
        if let Some(existing) = self.lookup(&info.name) {
            return Err(existing.clone());
        }
        self.symbols.push(info);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.symbols.iter()
    }
}
