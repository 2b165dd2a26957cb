//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Variable declarations and assignments
//! - Class declarations
//! - Expressions and operator precedence
//! - Control flow statements
//! - Error recovery

use super::parser::parse;
use crate::{
    ast::{
        ast::{Member, Program},
        expressions::{BinaryOp, Expr, ExprKind, Literal, UnaryOp},
        statements::{ElseBranch, ForInit, Stmt, StmtKind},
        types::{DataType, TypeKind},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    Position,
};

fn parse_source(source: &str) -> (Option<Program>, Vec<Error>) {
    let (tokens, _) = tokenize(source);
    parse(tokens)
}

fn parse_ok(source: &str) -> Program {
    let (program, errors) = parse_source(source);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    program.unwrap()
}

fn main_statements(body: &str) -> Vec<Stmt> {
    parse_ok(&format!("principal() {{\n{}\n}}", body))
        .main
        .body
        .statements
}

fn initializer(stmt: &Stmt) -> &Expr {
    match &stmt.kind {
        StmtKind::VarDecl { declarators, .. } => declarators[0].init.as_ref().unwrap(),
        other => panic!("expected a declaration, got {:?}", other),
    }
}

fn binary(expr: &Expr) -> (BinaryOp, &Expr, &Expr) {
    match &expr.kind {
        ExprKind::Binary {
            operator,
            left,
            right,
        } => (*operator, left, right),
        other => panic!("expected a binary expression, got {:?}", other),
    }
}

#[test]
fn test_parse_empty_main() {
    let program = parse_ok("principal() { }");

    assert!(program.classes.is_empty());
    assert!(program.main.body.statements.is_empty());
}

#[test]
fn test_parse_variable_declaration() {
    let statements = main_statements("entero a, b = 2~");

    match &statements[0].kind {
        StmtKind::VarDecl { ty, declarators } => {
            assert_eq!(ty.kind, TypeKind::Primitive(DataType::Entero));
            assert_eq!(declarators.len(), 2);
            assert_eq!(declarators[0].name, "a");
            assert!(declarators[0].init.is_none());
            assert_eq!(declarators[1].name, "b");
            assert!(declarators[1].init.is_some());
        }
        other => panic!("expected a declaration, got {:?}", other),
    }
}

#[test]
fn test_parse_class_typed_declarations() {
    let statements = main_statements("Persona p~\nPersona[] gente~\nentero[] v = [1, 2]~");

    let types: Vec<TypeKind> = statements
        .iter()
        .map(|stmt| match &stmt.kind {
            StmtKind::VarDecl { ty, .. } => ty.kind.clone(),
            other => panic!("expected a declaration, got {:?}", other),
        })
        .collect();

    assert_eq!(
        types,
        vec![
            TypeKind::Symbol(String::from("Persona")),
            TypeKind::Array(Box::new(TypeKind::Symbol(String::from("Persona")))),
            TypeKind::Array(Box::new(TypeKind::Primitive(DataType::Entero))),
        ]
    );
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let statements = main_statements("entero r = 1 + 2 * 3~");
    let (operator, left, right) = binary(initializer(&statements[0]));

    assert_eq!(operator, BinaryOp::Add);
    assert_eq!(left.kind, ExprKind::Literal(Literal::Integer(1)));
    assert_eq!(binary(right).0, BinaryOp::Multiply);
}

#[test]
fn test_and_binds_tighter_than_or() {
    let statements = main_statements("booleano b = x OR y AND z~");
    let (operator, _, right) = binary(initializer(&statements[0]));

    assert_eq!(operator, BinaryOp::Or);
    assert_eq!(binary(right).0, BinaryOp::And);
}

#[test]
fn test_comparison_binds_tighter_than_equality() {
    let statements = main_statements("booleano b = x < y == verdadero~");
    let (operator, left, right) = binary(initializer(&statements[0]));

    assert_eq!(operator, BinaryOp::Equals);
    assert_eq!(binary(left).0, BinaryOp::Less);
    assert_eq!(right.kind, ExprKind::Literal(Literal::Boolean(true)));
}

#[test]
fn test_binary_operators_are_left_associative() {
    let statements = main_statements("entero r = 10 - 4 - 3~");
    let (operator, left, right) = binary(initializer(&statements[0]));

    assert_eq!(operator, BinaryOp::Subtract);
    assert_eq!(binary(left).0, BinaryOp::Subtract);
    assert_eq!(right.kind, ExprKind::Literal(Literal::Integer(3)));
}

#[test]
fn test_prefix_operators() {
    let statements = main_statements("booleano b = NOT x == y~\nentero n = a - -b * 2~");

    // NOT binds tighter than ==
    let (operator, left, _) = binary(initializer(&statements[0]));
    assert_eq!(operator, BinaryOp::Equals);
    assert!(matches!(
        left.kind,
        ExprKind::Unary {
            operator: UnaryOp::Not,
            ..
        }
    ));

    // The infix `-` keeps its precedence after being used as a prefix
    let (operator, _, right) = binary(initializer(&statements[1]));
    assert_eq!(operator, BinaryOp::Subtract);
    let (operator, left, _) = binary(right);
    assert_eq!(operator, BinaryOp::Multiply);
    assert!(matches!(
        left.kind,
        ExprKind::Unary {
            operator: UnaryOp::Negate,
            ..
        }
    ));
}

#[test]
fn test_grouping_overrides_precedence() {
    let statements = main_statements("entero r = (1 + 2) * 3~");
    let (operator, left, _) = binary(initializer(&statements[0]));

    assert_eq!(operator, BinaryOp::Multiply);
    assert_eq!(binary(left).0, BinaryOp::Add);
}

#[test]
fn test_postfix_expressions() {
    let statements = main_statements("p.edad = v[1] + p.obtener(2, 3)~");

    let assignment = match &statements[0].kind {
        StmtKind::Assignment(assignment) => assignment,
        other => panic!("expected an assignment, got {:?}", other),
    };

    assert!(matches!(
        &assignment.target.kind,
        ExprKind::FieldAccess { field, .. } if field == "edad"
    ));

    let (_, left, right) = binary(&assignment.value);
    assert!(matches!(left.kind, ExprKind::Index { .. }));
    match &right.kind {
        ExprKind::MethodCall {
            method, arguments, ..
        } => {
            assert_eq!(method, "obtener");
            assert_eq!(arguments.len(), 2);
        }
        other => panic!("expected a method call, got {:?}", other),
    }
}

#[test]
fn test_parse_call_statements() {
    let statements = main_statements("p.saludar()~\nsaludar(1)~");

    assert!(matches!(
        &statements[0].kind,
        StmtKind::Call(Expr {
            kind: ExprKind::MethodCall { .. },
            ..
        })
    ));
    assert!(matches!(
        &statements[1].kind,
        StmtKind::Call(Expr {
            kind: ExprKind::Call { .. },
            ..
        })
    ));
}

#[test]
fn test_parse_class_declaration() {
    let source = r#"
publico clase Persona {
    publico entero edad~
    privado cadena nombre = "Ana"~
    publico vacio establecerEdad(entero v) {
        edad = v~
    }
    saludar() {
        imprimir(nombre)~
    }
}

principal() { }
"#;
    let program = parse_ok(source);
    let class = &program.classes[0];

    assert_eq!(class.name, "Persona");
    assert_eq!(class.fields().count(), 2);

    let methods: Vec<_> = class.methods().collect();
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].name, "establecerEdad");
    assert_eq!(methods[0].params.len(), 1);
    assert_eq!(methods[0].params[0].name, "v");
    assert_eq!(methods[1].name, "saludar");
    assert_eq!(
        methods[1].return_type.kind,
        TypeKind::Primitive(DataType::Vacio)
    );
    assert!(matches!(class.members[1], Member::Field(_)));
}

#[test]
fn test_parse_if_else_chain() {
    let statements = main_statements(
        "si (x > 0) {\n imprimir(1)~\n} sino si (x < 0) {\n imprimir(2)~\n} sino {\n imprimir(3)~\n}",
    );

    match &statements[0].kind {
        StmtKind::If {
            else_branch: Some(ElseBranch::If(nested)),
            ..
        } => assert!(matches!(
            nested.kind,
            StmtKind::If {
                else_branch: Some(ElseBranch::Block(_)),
                ..
            }
        )),
        other => panic!("expected an if chain, got {:?}", other),
    }
}

#[test]
fn test_parse_switch() {
    let statements = main_statements(
        "cambio (x) {\n caso 1:\n imprimir(1)~\n romper~\n caso 2:\n predeterminado:\n imprimir(0)~\n}",
    );

    match &statements[0].kind {
        StmtKind::Switch { cases, default, .. } => {
            assert_eq!(cases.len(), 2);
            assert_eq!(cases[0].body.len(), 2);
            assert!(cases[1].body.is_empty());
            assert_eq!(default.as_ref().unwrap().body.len(), 1);
        }
        other => panic!("expected a switch, got {:?}", other),
    }
}

#[test]
fn test_parse_loops() {
    let statements = main_statements(
        "mientras (i < 3) {\n i += 1~\n}\nhacer {\n i = i - 1~\n} mientras (i > 0)~\npara (entero j = 0; j < 3; j += 1) {\n escribir(j)~\n}",
    );

    assert!(matches!(statements[0].kind, StmtKind::While { .. }));
    assert!(matches!(statements[1].kind, StmtKind::DoWhile { .. }));
    match &statements[2].kind {
        StmtKind::For { init, body, .. } => {
            assert!(matches!(init, ForInit::Declaration { .. }));
            assert!(matches!(body.statements[0].kind, StmtKind::Print(_)));
        }
        other => panic!("expected a for loop, got {:?}", other),
    }
}

#[test]
fn test_parse_return_and_break() {
    let statements = main_statements("retornar~\nretornar 0~\nromper~");

    assert_eq!(statements[0].kind, StmtKind::Return(None));
    assert!(matches!(statements[1].kind, StmtKind::Return(Some(_))));
    assert_eq!(statements[2].kind, StmtKind::Break);
}

#[test]
fn test_missing_terminator_is_reported() {
    let (program, errors) = parse_source("principal() {\n    entero x = 5\n    imprimir(x)~\n}");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        *errors[0].get_internal_error(),
        ErrorImpl::MissingTerminator {
            found: String::from("imprimir")
        }
    );
    // Reported right after the `5`
    assert_eq!(*errors[0].get_position(), Position::new(2, 17));

    // The following statement is still parsed
    let statements = program.unwrap().main.body.statements;
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0].kind, StmtKind::Print(_)));
}

#[test]
fn test_recovery_collects_multiple_errors() {
    let (program, errors) = parse_source("principal() {\n entero = 5~\n x 5~\n imprimir(1)~\n}");

    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e.get_internal_error(), ErrorImpl::UnexpectedToken { .. })));
    assert_eq!(program.unwrap().main.body.statements.len(), 1);
}

#[test]
fn test_recovery_inside_class_body() {
    let source = "clase A {\n entero x\n entero y~\n}\nprincipal() { }";
    let (program, errors) = parse_source(source);

    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].get_internal_error(),
        ErrorImpl::MissingTerminator { .. }
    ));
    assert_eq!(program.unwrap().classes[0].fields().count(), 1);
}

#[test]
fn test_spaced_terminator_is_accepted_with_error() {
    let (program, errors) = parse_source("principal() {\n entero x = 5 ~\n}");

    assert_eq!(errors.len(), 1);
    assert_eq!(*errors[0].get_internal_error(), ErrorImpl::MisplacedTerminator);
    assert_eq!(program.unwrap().main.body.statements.len(), 1);
}

#[test]
fn test_invalid_assignment_target() {
    let (_, errors) = parse_source("principal() {\n f() = 3~\n}");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        *errors[0].get_internal_error(),
        ErrorImpl::InvalidAssignmentTarget
    );
}

#[test]
fn test_nested_array_types_are_rejected() {
    let (_, errors) = parse_source("principal() {\n entero[][] m~\n}");

    assert!(!errors.is_empty());
}

#[test]
fn test_missing_principal() {
    let (program, errors) = parse_source("clase A { }");

    assert!(program.is_none());
    assert!(matches!(
        errors[0].get_internal_error(),
        ErrorImpl::UnexpectedEof { .. }
    ));
}

#[test]
fn test_trailing_tokens_after_principal() {
    let (program, errors) = parse_source("principal() { } extra");

    assert!(program.is_some());
    assert_eq!(
        *errors[0].get_internal_error(),
        ErrorImpl::UnexpectedToken {
            found: String::from("extra"),
            expected: String::from("end of file"),
        }
    );
}

fn collect_ids(expr: &Expr, ids: &mut Vec<u32>) {
    ids.push(expr.id);
    match &expr.kind {
        ExprKind::Binary { left, right, .. } => {
            collect_ids(left, ids);
            collect_ids(right, ids);
        }
        ExprKind::Unary { operand, .. } => collect_ids(operand, ids),
        _ => {}
    }
}

#[test]
fn test_node_ids_are_unique() {
    let statements = main_statements("entero a = 1 + 2 * 3, b = -a~\nentero c = a + b~");

    let mut ids = vec![];
    for stmt in &statements {
        if let StmtKind::VarDecl { declarators, .. } = &stmt.kind {
            for declarator in declarators {
                ids.push(declarator.id);
                if let Some(init) = &declarator.init {
                    collect_ids(init, &mut ids);
                }
            }
        }
    }

    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(ids.len(), deduped.len());
}

#[test]
fn test_spans_cover_statements() {
    let statements = main_statements("imprimir(1)~");

    assert_eq!(statements[0].span.start, Position::new(2, 1));
    assert_eq!(statements[0].span.end, Position::new(2, 13));
}
