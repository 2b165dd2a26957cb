use pretty_assertions::assert_eq;

use crate::errors::errors::{Error, ErrorImpl, ErrorTip, Phase, Severity};
use crate::Position;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        Position::new(10, 4),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(*error.get_position(), Position::new(10, 4));
}

#[test]
fn test_display_includes_position() {
    let error = Error::new(
        ErrorImpl::UndeclaredIdentifier {
            name: "y".to_string(),
        },
        Position::new(3, 9),
    );

    assert_eq!(error.to_string(), "3:9: identifier \"y\" not declared");
}

#[test]
fn test_warnings() {
    let unused = Error::new(
        ErrorImpl::UnusedVariable {
            variable: "x".to_string(),
        },
        Position::new(1, 1),
    );
    let spaced = Error::new(ErrorImpl::SpacedTerminator, Position::new(1, 1));
    let misplaced = Error::new(ErrorImpl::MisplacedTerminator, Position::new(1, 1));

    assert!(unused.is_warning());
    assert!(spaced.is_warning());
    assert!(!misplaced.is_warning());
    assert_eq!(misplaced.severity(), Severity::Error);
}

#[test]
fn test_phases() {
    let cases = [
        (ErrorImpl::SpacedTerminator, Phase::Lexical),
        (ErrorImpl::InvalidAssignmentTarget, Phase::Syntax),
        (ErrorImpl::BreakOutsideLoop, Phase::Semantic),
        (
            ErrorImpl::CodegenPrecondition {
                node: "identifier".to_string(),
                reason: "untyped".to_string(),
            },
            Phase::Codegen,
        ),
    ];

    for (error, phase) in cases {
        assert_eq!(Error::new(error, Position::null()).phase(), phase);
    }
}

#[test]
fn test_report_serializes() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            expected: "entero".to_string(),
            received: "cadena".to_string(),
        },
        Position::new(20, 16),
    );

    let json = serde_json::to_value(error.report()).unwrap();
    assert_eq!(json["name"], "TypeMismatch");
    assert_eq!(json["severity"], "error");
    assert_eq!(json["phase"], "semantic");
    assert_eq!(json["line"], 20);
    assert_eq!(json["column"], 16);
    assert_eq!(
        json["message"],
        "types do not match: expected entero, received cadena"
    );
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(ErrorImpl::EmptyArrayLiteral, Position::null());
    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            expected: "entero".to_string(),
            received: "cadena".to_string(),
        },
        Position::null(),
    );

    assert_eq!(
        error.get_tip().to_string(),
        "Expected type `entero`, received `cadena`"
    );
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");
    assert_eq!(ErrorTip::None.to_string(), "");
}
