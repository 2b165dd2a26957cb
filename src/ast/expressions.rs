use crate::Span;

use super::ast::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    Binary {
        operator: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },
    /// `objeto.campo`
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },
    /// `arreglo[i]`
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// `objeto.metodo(args)`
    MethodCall {
        object: Box<Expr>,
        method: String,
        arguments: Vec<Expr>,
    },
    /// `metodo(args)`, only meaningful inside a class body
    Call {
        callee: String,
        arguments: Vec<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
}

impl ExprKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ExprKind::Literal(Literal::Boolean(_)) => "boolean",
            ExprKind::Literal(_) => "literal",
            ExprKind::Identifier(_) => "identifier",
            ExprKind::Binary { operator, .. } => operator.category(),
            ExprKind::Unary {
                operator: UnaryOp::Not,
                ..
            } => "not",
            ExprKind::Unary {
                operator: UnaryOp::Negate,
                ..
            } => "negation",
            ExprKind::FieldAccess { .. } => "fieldAccess",
            ExprKind::Index { .. } => "arrayIndex",
            ExprKind::MethodCall { .. } => "methodCall",
            ExprKind::Call { .. } => "call",
            ExprKind::ArrayLiteral(_) => "arrayLiteral",
        }
    }
}

impl Expr {
    /// Literal values usable as `caso` labels and in constant initializers.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(_) => true,
            ExprKind::Unary {
                operator: UnaryOp::Negate,
                operand,
            } => matches!(
                operand.kind,
                ExprKind::Literal(Literal::Integer(_)) | ExprKind::Literal(Literal::Float(_))
            ),
            _ => false,
        }
    }

    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Identifier(_) | ExprKind::FieldAccess { .. } | ExprKind::Index { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    /// Kept as written so the emitted constant matches the source.
    Float(String),
    /// Contents between the quotes.
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Equals,
    NotEquals,
    And,
    Or,
}

impl BinaryOp {
    /// The operator as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Less => "<",
            BinaryOp::LessEquals => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEquals => ">=",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Modulo => "binaryArithmetic",
            BinaryOp::And | BinaryOp::Or => "logical",
            _ => "binaryRelational",
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equals | BinaryOp::NotEquals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "NOT",
            UnaryOp::Negate => "-",
        }
    }
}
