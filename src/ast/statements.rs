use crate::Span;

use super::{
    ast::{Block, NodeId},
    expressions::Expr,
    types::TypeAnnotation,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `entero a, b = 2~`
    VarDecl {
        ty: TypeAnnotation,
        declarators: Vec<Declarator>,
    },
    Assignment(Assignment),
    /// A method or in-class call evaluated for its side effects.
    Call(Expr),
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<ElseBranch>,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
        default: Option<DefaultCase>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    DoWhile {
        body: Block,
        condition: Expr,
    },
    For {
        init: ForInit,
        condition: Expr,
        update: Assignment,
        body: Block,
    },
    Return(Option<Expr>),
    Break,
    Print(Expr),
}

impl StmtKind {
    pub fn tag(&self) -> &'static str {
        match self {
            StmtKind::VarDecl { .. } => "variableDeclaration",
            StmtKind::Assignment(_) => "assignment",
            StmtKind::Call(_) => "callStatement",
            StmtKind::If { .. } => "ifStatement",
            StmtKind::Switch { .. } => "switchStatement",
            StmtKind::While { .. } => "whileStatement",
            StmtKind::DoWhile { .. } => "doWhileStatement",
            StmtKind::For { .. } => "forStatement",
            StmtKind::Return(_) => "returnStatement",
            StmtKind::Break => "breakStatement",
            StmtKind::Print(_) => "printStatement",
        }
    }
}

/// One name introduced by a declaration, with its optional initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub id: NodeId,
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expr,
    pub operator: AssignOp,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Block(Block),
    /// `sino si (...) { ... }`
    If(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub label: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultCase {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// `para (entero i = 0; ...)`
    Declaration {
        ty: TypeAnnotation,
        declarator: Declarator,
    },
    /// `para (i = 0; ...)`
    Assignment(Assignment),
}
