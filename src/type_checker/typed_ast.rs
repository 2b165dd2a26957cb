//! Annotated tree and side tables produced by the semantic analyzer.
//!
//! The AST itself is never modified. Instead the analyzer returns:
//! - A [`SemanticNode`] tree mirroring the AST with resolved types and the
//!   diagnostics attached to the node that caused them
//! - A [`TypeTable`] keyed by [`NodeId`], which the code generator uses to
//!   make every representation decision from resolved types
//!
//! Both are bundled with the class table and the diagnostic lists in
//! [`Analysis`].

use std::collections::HashMap;

use crate::{
    ast::{ast::NodeId, types::DataType},
    errors::errors::Error,
    Span,
};

use super::{classes::ClassTable, symbols::SymbolKind};

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticNode {
    /// Construct tag, the same as the AST node's.
    pub kind: &'static str,
    /// Identifier, literal or operator text, when the construct has one.
    pub value: Option<String>,
    pub data_type: Option<DataType>,
    /// Whether the node denotes an expression and so must end up typed.
    pub expression: bool,
    pub children: Vec<SemanticNode>,
    pub errors: Vec<Error>,
    pub span: Span,
}

impl SemanticNode {
    pub fn new(kind: &'static str, span: Span) -> Self {
        SemanticNode {
            kind,
            value: None,
            data_type: None,
            expression: false,
            children: vec![],
            errors: vec![],
            span,
        }
    }

    pub fn expression(kind: &'static str, span: Span) -> Self {
        SemanticNode {
            expression: true,
            ..SemanticNode::new(kind, span)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn push(&mut self, child: SemanticNode) {
        self.children.push(child);
    }

    /// Whether this node or any descendant carries a diagnostic.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.children.iter().any(SemanticNode::has_errors)
    }

    /// Pre-order traversal of the tree.
    pub fn descendants(&self) -> Vec<&SemanticNode> {
        let mut nodes = vec![self];
        for child in self.children.iter() {
            nodes.extend(child.descendants());
        }
        nodes
    }
}

/// How an identifier expression was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Declarator, parameter or field the name refers to.
    pub decl: NodeId,
    pub kind: SymbolKind,
}

/// What the analyzer learned about a local declarator.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclInfo {
    pub name: String,
    pub data_type: DataType,
    /// A local or parameter of the same name was visible at the declaration.
    pub shadows: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTable {
    expr_types: HashMap<NodeId, DataType>,
    bindings: HashMap<NodeId, Binding>,
    declarations: HashMap<NodeId, DeclInfo>,
}

impl TypeTable {
    pub fn type_of(&self, id: NodeId) -> Option<&DataType> {
        self.expr_types.get(&id)
    }

    pub fn binding(&self, id: NodeId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    pub fn declaration(&self, id: NodeId) -> Option<&DeclInfo> {
        self.declarations.get(&id)
    }

    pub(crate) fn record_type(&mut self, id: NodeId, data_type: DataType) {
        self.expr_types.insert(id, data_type);
    }

    pub(crate) fn record_binding(&mut self, id: NodeId, binding: Binding) {
        self.bindings.insert(id, binding);
    }

    pub(crate) fn record_declaration(&mut self, id: NodeId, info: DeclInfo) {
        self.declarations.insert(id, info);
    }
}

/// Result of [`analyze`](super::type_checker::analyze).
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tree: SemanticNode,
    pub types: TypeTable,
    pub classes: ClassTable,
    /// Every error, in the order found. Code generation requires this to be
    /// empty.
    pub errors: Vec<Error>,
    pub warnings: Vec<Error>,
}

impl Analysis {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}
