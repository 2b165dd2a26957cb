use std::collections::HashMap;

use serde::Serialize;

use crate::{ast::{ast::NodeId, types::DataType}, errors::errors::ErrorImpl, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Local,
    Parameter,
    /// A class field, visible by its bare name inside the class's methods.
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub declared_type: DataType,
    pub scope_path: String,
    pub line: u32,
    pub column: u32,
    pub is_initialized: bool,
    pub is_used: bool,
    /// Declarator, parameter or field this symbol was created from.
    pub decl: NodeId,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(
        name: String,
        declared_type: DataType,
        decl: NodeId,
        kind: SymbolKind,
        position: Position,
    ) -> Self {
        Symbol {
            name,
            declared_type,
            scope_path: String::new(),
            line: position.line,
            column: position.column,
            is_initialized: kind != SymbolKind::Local,
            is_used: false,
            decl,
            kind,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// One scope, e.g. `global.Persona.saludar.bloque3`. Symbols keep their
/// declaration order.
#[derive(Debug)]
pub struct Environment {
    pub path: String,
    pub symbols: Vec<Symbol>,
    symbol_lookup: HashMap<String, usize>,
}

impl Environment {
    pub fn new(path: String) -> Self {
        Environment {
            path,
            symbols: vec![],
            symbol_lookup: HashMap::new(),
        }
    }

    pub fn declare_symbol(&mut self, mut symbol: Symbol) -> Result<(), ErrorImpl> {
        if self.symbol_lookup.contains_key(&symbol.name) {
            return Err(ErrorImpl::VariableAlreadyDeclared {
                variable: symbol.name,
            });
        }

        symbol.scope_path = self.path.clone();
        self.symbol_lookup.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_lookup.get(name).copied()
    }

    /// Locals and parameters never read after their declaration.
    pub fn unused_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols
            .iter()
            .filter(|symbol| symbol.kind != SymbolKind::Field && !symbol.is_used)
    }
}
