use crate::Span;

use super::{expressions::Expr, statements::{Declarator, Stmt}, types::TypeAnnotation};

/// Identity of an expression, parameter or declarator. Assigned by the parser,
/// unique within one parse, and used as the key of the semantic side tables.
pub type NodeId = u32;

/// Node Trait
///
/// Every AST node exposes a stable kind tag and the span it was parsed from.
pub trait Node {
    /// Returns the tag of the grammar construct, e.g. `"ifStatement"`.
    fn kind(&self) -> &'static str;
    /// Returns the span of the node.
    fn span(&self) -> &Span;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
    pub main: MainDecl,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub visibility: Visibility,
    pub name: String,
    pub members: Vec<Member>,
    pub span: Span,
}

impl ClassDecl {
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field),
            Member::Method(_) => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            Member::Field(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
}

/// `publico entero edad, altura~` or `privado cadena nombre = "x"~`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub visibility: Visibility,
    pub ty: TypeAnnotation,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub visibility: Visibility,
    pub return_type: TypeAnnotation,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id: NodeId,
    pub ty: TypeAnnotation,
    pub name: String,
    pub span: Span,
}

/// `principal() { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct MainDecl {
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl Node for Program {
    fn kind(&self) -> &'static str {
        "program"
    }
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Node for ClassDecl {
    fn kind(&self) -> &'static str {
        "classDeclaration"
    }
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Node for Member {
    fn kind(&self) -> &'static str {
        match self {
            Member::Field(_) => "fieldDeclaration",
            Member::Method(_) => "methodDeclaration",
        }
    }
    fn span(&self) -> &Span {
        match self {
            Member::Field(field) => &field.span,
            Member::Method(method) => &method.span,
        }
    }
}

impl Node for MainDecl {
    fn kind(&self) -> &'static str {
        "mainEntry"
    }
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Node for Block {
    fn kind(&self) -> &'static str {
        "block"
    }
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Node for Stmt {
    fn kind(&self) -> &'static str {
        self.kind.tag()
    }
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Node for Expr {
    fn kind(&self) -> &'static str {
        self.kind.tag()
    }
    fn span(&self) -> &Span {
        &self.span
    }
}
