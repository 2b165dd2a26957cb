use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

/// Whether a diagnostic blocks the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// The pipeline stage a diagnostic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
    Codegen,
}

/// Flat, serialisable view of an [`Error`], used by the JSON diagnostics sink.
#[derive(Debug, Serialize)]
pub struct ErrorReport<'a> {
    pub name: &'a str,
    pub severity: Severity,
    pub phase: Phase,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn message(&self) -> String {
        self.internal_error.to_string()
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    pub fn severity(&self) -> Severity {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::SpacedTerminator
            | ErrorImpl::UnusedVariable { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } | ErrorImpl::SpacedTerminator => Phase::Lexical,
            ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::MissingTerminator { .. }
            | ErrorImpl::MisplacedTerminator
            | ErrorImpl::UnexpectedEof { .. }
            | ErrorImpl::InvalidNumber { .. }
            | ErrorImpl::InvalidAssignmentTarget => Phase::Syntax,
            ErrorImpl::CodegenPrecondition { .. } => Phase::Codegen,
            _ => Phase::Semantic,
        }
    }

    pub fn report(&self) -> ErrorReport<'_> {
        ErrorReport {
            name: self.get_error_name(),
            severity: self.severity(),
            phase: self.phase(),
            line: self.position.line,
            column: self.position.column,
            message: self.message(),
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::SpacedTerminator => "SpacedTerminator",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::MissingTerminator { .. } => "MissingTerminator",
            ErrorImpl::MisplacedTerminator => "MisplacedTerminator",
            ErrorImpl::UnexpectedEof { .. } => "UnexpectedEof",
            ErrorImpl::InvalidNumber { .. } => "InvalidNumber",
            ErrorImpl::ClassAlreadyDeclared { .. } => "ClassAlreadyDeclared",
            ErrorImpl::RecursiveClass { .. } => "RecursiveClass",
            ErrorImpl::MemberAlreadyDeclared { .. } => "MemberAlreadyDeclared",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::UndeclaredIdentifier { .. } => "UndeclaredIdentifier",
            ErrorImpl::UndeclaredFunction { .. } => "UndeclaredFunction",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::InvalidVariableType { .. } => "InvalidVariableType",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::InvalidOperands { .. } => "InvalidOperands",
            ErrorImpl::InvalidOperand { .. } => "InvalidOperand",
            ErrorImpl::NonBooleanCondition { .. } => "NonBooleanCondition",
            ErrorImpl::NotAClass { .. } => "NotAClass",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::UnknownMethod { .. } => "UnknownMethod",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::ArgumentTypeMismatch { .. } => "ArgumentTypeMismatch",
            ErrorImpl::NotIndexable { .. } => "NotIndexable",
            ErrorImpl::InvalidIndex { .. } => "InvalidIndex",
            ErrorImpl::MixedArrayLiteral { .. } => "MixedArrayLiteral",
            ErrorImpl::EmptyArrayLiteral => "EmptyArrayLiteral",
            ErrorImpl::InvalidSwitchType { .. } => "InvalidSwitchType",
            ErrorImpl::InvalidCaseLabel { .. } => "InvalidCaseLabel",
            ErrorImpl::DuplicateCaseLabel { .. } => "DuplicateCaseLabel",
            ErrorImpl::ReturnTypeMismatch { .. } => "ReturnTypeMismatch",
            ErrorImpl::MissingReturnValue { .. } => "MissingReturnValue",
            ErrorImpl::BreakOutsideLoop => "BreakOutsideLoop",
            ErrorImpl::NotPrintable { .. } => "NotPrintable",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            ErrorImpl::UnusedVariable { .. } => "UnusedVariable",
            ErrorImpl::NonBooleanCondition { .. } => "NonBooleanCondition",
            ErrorImpl::NotAClass { .. } => "NotAClass",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::UnknownMethod { .. } => "UnknownMethod",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::ArgumentTypeMismatch { .. } => "ArgumentTypeMismatch",
            ErrorImpl::NotIndexable { .. } => "NotIndexable",
            ErrorImpl::InvalidIndex { .. } => "InvalidIndex",
            ErrorImpl::MixedArrayLiteral { .. } => "MixedArrayLiteral",
            ErrorImpl::EmptyArrayLiteral => "EmptyArrayLiteral",
            ErrorImpl::InvalidSwitchType { .. } => "InvalidSwitchType",
            ErrorImpl::InvalidCaseLabel { .. } => "InvalidCaseLabel",
            ErrorImpl::DuplicateCaseLabel { .. } => "DuplicateCaseLabel",
            ErrorImpl::ReturnTypeMismatch { .. } => "ReturnTypeMismatch",
            ErrorImpl::MissingReturnValue { .. } => "MissingReturnValue",
            ErrorImpl::BreakOutsideLoop => "BreakOutsideLoop",
            ErrorImpl::NotPrintable { .. } => "NotPrintable",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            ErrorImpl::UnusedVariable { .. } => "UnusedVariable",
            ErrorImpl::CodegenPrecondition { .. } => "CodegenPrecondition",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { token } => {
                ErrorTip::Suggestion(format!("`{}` is not part of the language", token))
            }
            ErrorImpl::SpacedTerminator | ErrorImpl::MisplacedTerminator => ErrorTip::Suggestion(
                String::from("Write `~` directly after the statement, e.g. `x = 1~`"),
            ),
            ErrorImpl::UnexpectedToken { found, expected } => ErrorTip::Suggestion(format!(
                "Found `{}` where {} was expected",
                found, expected
            )),
            ErrorImpl::MissingTerminator { .. } => ErrorTip::Suggestion(String::from(
                "Statements end with `~`, did you forget one on the previous line?",
            )),
            ErrorImpl::UnexpectedEof { .. } => ErrorTip::Suggestion(String::from(
                "Check for a missing `~` or `}`",
            )),
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::NonBooleanCondition { construct, .. } => ErrorTip::Suggestion(format!(
                "Use a comparison such as `x > 0` as the `{}` condition",
                construct
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found, is the class declared?", type_))
            }
            ErrorImpl::ArgumentCountMismatch {
                expected, received, ..
            } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::BreakOutsideLoop => ErrorTip::Suggestion(String::from(
                "`romper` may only appear inside a loop or a `cambio`",
            )),
            ErrorImpl::UnusedVariable { variable } => ErrorTip::Suggestion(format!(
                "Remove `{}` or use it",
                variable
            )),
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.position, self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum ErrorImpl {
    // Lexical
    #[error("unrecognised character {token:?}")]
    UnrecognisedToken { token: String },
    #[error("terminator `~` must not be preceded by whitespace")]
    SpacedTerminator,

    // Syntax
    #[error("unexpected token {found:?}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },
    #[error("likely missing terminator `~` before {found:?}")]
    MissingTerminator { found: String },
    #[error("terminator `~` preceded by whitespace")]
    MisplacedTerminator,
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("invalid number literal {token:?}")]
    InvalidNumber { token: String },

    // Semantic
    #[error("class {class:?} already declared")]
    ClassAlreadyDeclared { class: String },
    #[error("class {class:?} contains itself by value")]
    RecursiveClass { class: String },
    #[error("class {class:?} already has a member named {member:?}")]
    MemberAlreadyDeclared { class: String, member: String },
    #[error("variable {variable:?} already declared in this scope")]
    VariableAlreadyDeclared { variable: String },
    #[error("identifier {name:?} not declared")]
    UndeclaredIdentifier { name: String },
    #[error("function {name:?} not declared")]
    UndeclaredFunction { name: String },
    #[error("unknown type {type_}")]
    UnknownType { type_: String },
    #[error("variables cannot have type {type_}")]
    InvalidVariableType { type_: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMismatch { expected: String, received: String },
    #[error("operator {operator} cannot be applied to {left} and {right}")]
    InvalidOperands {
        operator: String,
        left: String,
        right: String,
    },
    #[error("operator {operator} cannot be applied to {operand}")]
    InvalidOperand { operator: String, operand: String },
    #[error("condition of `{construct}` must be booleano, found {found}")]
    NonBooleanCondition { construct: String, found: String },
    #[error("type {type_} is not a class")]
    NotAClass { type_: String },
    #[error("class {class:?} has no member named {member:?}")]
    UnknownMember { class: String, member: String },
    #[error("class {class:?} has no method named {method:?}")]
    UnknownMethod { class: String, method: String },
    #[error("{method:?} expects {expected} arguments, received {received}")]
    ArgumentCountMismatch {
        method: String,
        expected: usize,
        received: usize,
    },
    #[error("argument {index} of {method:?} expects {expected}, received {received}")]
    ArgumentTypeMismatch {
        method: String,
        index: usize,
        expected: String,
        received: String,
    },
    #[error("type {type_} cannot be indexed")]
    NotIndexable { type_: String },
    #[error("index must be entero, found {found}")]
    InvalidIndex { found: String },
    #[error("array literal mixes {first} and {found}")]
    MixedArrayLiteral { first: String, found: String },
    #[error("cannot infer the element type of `[]` here")]
    EmptyArrayLiteral,
    #[error("`cambio` requires entero or caracter, found {found}")]
    InvalidSwitchType { found: String },
    #[error("`caso` label must be a {expected} literal, found {found}")]
    InvalidCaseLabel { expected: String, found: String },
    #[error("duplicate `caso` label {label}")]
    DuplicateCaseLabel { label: String },
    #[error("return type mismatch: expected {expected}, received {received}")]
    ReturnTypeMismatch { expected: String, received: String },
    #[error("missing return value of type {expected}")]
    MissingReturnValue { expected: String },
    #[error("`romper` outside of a loop or `cambio`")]
    BreakOutsideLoop,
    #[error("values of type {type_} cannot be printed")]
    NotPrintable { type_: String },
    #[error("left-hand side of an assignment must be a variable, field or element")]
    InvalidAssignmentTarget,

    // Warnings
    #[error("variable {variable:?} is declared but never used")]
    UnusedVariable { variable: String },

    // Code generation
    #[error("cannot generate code for `{node}`: {reason}")]
    CodegenPrecondition { node: String, reason: String },
}
