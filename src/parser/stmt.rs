use crate::{
    ast::{
        ast::{Block, ClassDecl, FieldDecl, MainDecl, Member, MethodDecl, Param, Program, Visibility},
        expressions::{Expr, ExprKind},
        statements::{
            AssignOp, Assignment, DefaultCase, Declarator, ElseBranch, ForInit, Stmt, StmtKind,
            SwitchCase,
        },
        types::{DataType, TypeAnnotation, TypeKind},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
    Position,
};

use super::{parser::Parser, types::parse_type};

/// `program := class_decl* 'principal' '(' ')' block EOF`
pub fn parse_program(parser: &mut Parser) -> Result<Program, Error> {
    let start = parser.get_position();

    let mut classes = Vec::new();
    while starts_class(parser) {
        let mark = parser.mark();
        match parse_class_decl(parser) {
            Ok(class) => classes.push(class),
            Err(error) => {
                parser.record(error);
                skip_to_declaration(parser, mark);
            }
        }
    }

    let main_start = parser.expect(TokenKind::Principal)?.span.start;
    parser.expect(TokenKind::OpenParen)?;
    parser.expect(TokenKind::CloseParen)?;
    let body = parse_block(parser)?;
    let main = MainDecl {
        body,
        span: parser.span_from(main_start),
    };

    if parser.has_tokens() {
        let error = parser.unexpected(TokenKind::EOF.describe());
        parser.record(error);
    }

    Ok(Program {
        classes,
        main,
        span: parser.span_from(start),
    })
}

fn starts_class(parser: &Parser) -> bool {
    match parser.current_token_kind() {
        TokenKind::Clase => true,
        TokenKind::Publico | TokenKind::Privado => parser.peek_kind(1) == TokenKind::Clase,
        _ => false,
    }
}

/// Top level recovery: skip to the next class or to `principal`.
fn skip_to_declaration(parser: &mut Parser, mark: usize) {
    if parser.mark() == mark {
        parser.advance();
    }

    while parser.has_tokens()
        && !starts_class(parser)
        && parser.current_token_kind() != TokenKind::Principal
    {
        parser.advance();
    }
}

fn parse_visibility(parser: &mut Parser, default: Visibility) -> Visibility {
    match parser.current_token_kind() {
        TokenKind::Publico => {
            parser.advance();
            Visibility::Public
        }
        TokenKind::Privado => {
            parser.advance();
            Visibility::Private
        }
        _ => default,
    }
}

pub fn parse_class_decl(parser: &mut Parser) -> Result<ClassDecl, Error> {
    let start = parser.get_position();
    let visibility = parse_visibility(parser, Visibility::Public);

    parser.expect(TokenKind::Clase)?;
    let name = parser.expect(TokenKind::Identifier)?.lexeme;
    parser.expect(TokenKind::OpenCurly)?;

    let mut members = Vec::new();
    // A `clase` or `principal` here means the closing brace is missing
    while !matches!(
        parser.current_token_kind(),
        TokenKind::CloseCurly | TokenKind::EOF | TokenKind::Clase | TokenKind::Principal
    ) {
        let mark = parser.mark();
        match parse_member(parser) {
            Ok(member) => members.push(member),
            Err(error) => {
                parser.record(error);
                parser.synchronize(mark);
            }
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(ClassDecl {
        visibility,
        name,
        members,
        span: parser.span_from(start),
    })
}

/// `member := visibility? (field | method)`
pub fn parse_member(parser: &mut Parser) -> Result<Member, Error> {
    let start = parser.get_position();
    let visibility = parse_visibility(parser, Visibility::Private);

    // Methods without a return type: `saludar() { ... }`
    if parser.current_token_kind() == TokenKind::Identifier
        && parser.peek_kind(1) == TokenKind::OpenParen
    {
        let token = parser.current_token().clone();
        let return_type = TypeAnnotation {
            kind: TypeKind::Primitive(DataType::Vacio),
            span: token.span,
        };
        let name = parser.advance().lexeme;
        return parse_method_rest(parser, start, visibility, return_type, name).map(Member::Method);
    }

    let ty = parse_type(parser, BindingPower::Default)?;

    if parser.current_token_kind() == TokenKind::Identifier
        && parser.peek_kind(1) == TokenKind::OpenParen
    {
        let name = parser.advance().lexeme;
        return parse_method_rest(parser, start, visibility, ty, name).map(Member::Method);
    }

    let declarators = parse_declarators(parser)?;
    parser.expect_terminator()?;

    Ok(Member::Field(FieldDecl {
        visibility,
        ty,
        declarators,
        span: parser.span_from(start),
    }))
}

fn parse_method_rest(
    parser: &mut Parser,
    start: Position,
    visibility: Visibility,
    return_type: TypeAnnotation,
    name: String,
) -> Result<MethodDecl, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut params = Vec::new();
    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            let param_start = parser.get_position();
            let ty = parse_type(parser, BindingPower::Default)?;
            let name = parser.expect(TokenKind::Identifier)?.lexeme;
            params.push(Param {
                id: parser.advance_id(),
                ty,
                name,
                span: parser.span_from(param_start),
            });

            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    let body = parse_block(parser)?;

    Ok(MethodDecl {
        visibility,
        return_type,
        name,
        params,
        body,
        span: parser.span_from(start),
    })
}

/// `block := '{' statement* '}'`
pub fn parse_block(parser: &mut Parser) -> Result<Block, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;
    let statements = parse_statements(parser, &[TokenKind::CloseCurly]);
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Block {
        statements,
        span: parser.span_from(start),
    })
}

/// Parses statements until one of `stops` (or EOF), recording errors and
/// resynchronising after each failed statement.
fn parse_statements(parser: &mut Parser, stops: &[TokenKind]) -> Vec<Stmt> {
    let mut statements = Vec::new();

    while parser.has_tokens() && !stops.contains(&parser.current_token_kind()) {
        let mark = parser.mark();
        match parse_stmt(parser) {
            Ok(stmt) => statements.push(stmt),
            Err(error) => {
                parser.record(error);
                parser.synchronize(mark);
            }
        }
    }

    statements
}

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let handler = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied();

    match handler {
        Some(handler) => handler(parser),
        None => Err(parser.unexpected("a statement")),
    }
}

/// `declarator := ID ('=' expr)?`
fn parse_declarator(parser: &mut Parser) -> Result<Declarator, Error> {
    let token = parser.expect(TokenKind::Identifier)?;

    let init = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    Ok(Declarator {
        id: parser.advance_id(),
        name: token.lexeme,
        init,
        span: parser.span_from(token.span.start),
    })
}

fn parse_declarators(parser: &mut Parser) -> Result<Vec<Declarator>, Error> {
    let mut declarators = vec![parse_declarator(parser)?];

    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        declarators.push(parse_declarator(parser)?);
    }

    Ok(declarators)
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let ty = parse_type(parser, BindingPower::Default)?;
    let declarators = parse_declarators(parser)?;
    parser.expect_terminator()?;

    Ok(Stmt {
        kind: StmtKind::VarDecl { ty, declarators },
        span: parser.span_from(start),
    })
}

/// Whether the tokens ahead spell a class typed declaration:
/// `Persona p` or `Persona[] gente`.
fn at_class_declaration(parser: &Parser) -> bool {
    parser.current_token_kind() == TokenKind::Identifier
        && (parser.peek_kind(1) == TokenKind::Identifier
            || (parser.peek_kind(1) == TokenKind::OpenBracket
                && parser.peek_kind(2) == TokenKind::CloseBracket))
}

/// Statements starting with an identifier: class typed declarations,
/// assignments and calls.
pub fn parse_identifier_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if at_class_declaration(parser) {
        return parse_var_decl_stmt(parser);
    }

    let start = parser.get_position();
    let expr = parse_expr(parser, BindingPower::Default)?;

    let kind = match parser.current_token_kind() {
        TokenKind::Assignment | TokenKind::PlusEquals => {
            StmtKind::Assignment(parse_assignment_rest(parser, expr)?)
        }
        _ if matches!(expr.kind, ExprKind::Call { .. } | ExprKind::MethodCall { .. }) => {
            StmtKind::Call(expr)
        }
        _ => return Err(parser.unexpected("`=`, `+=` or a call")),
    };

    parser.expect_terminator()?;

    Ok(Stmt {
        kind,
        span: parser.span_from(start),
    })
}

/// Parses `('=' | '+=') expr` after an already parsed target.
fn parse_assignment_rest(parser: &mut Parser, target: Expr) -> Result<Assignment, Error> {
    if !target.is_assignable() {
        return Err(Error::new(ErrorImpl::InvalidAssignmentTarget, target.span.start));
    }

    let operator = match parser.current_token_kind() {
        TokenKind::Assignment => AssignOp::Assign,
        TokenKind::PlusEquals => AssignOp::AddAssign,
        _ => return Err(parser.unexpected("`=` or `+=`")),
    };
    parser.advance();

    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Assignment {
        span: target.span.to(&value.span),
        target,
        operator,
        value,
    })
}

fn parse_parenthesized(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(condition)
}

/// `si (c) { } sino si (c) { } sino { }`
pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Si)?.span.start;
    let condition = parse_parenthesized(parser)?;
    let then_branch = parse_block(parser)?;

    let else_branch = if parser.current_token_kind() == TokenKind::Sino {
        parser.advance();
        if parser.current_token_kind() == TokenKind::Si {
            Some(ElseBranch::If(Box::new(parse_if_stmt(parser)?)))
        } else {
            Some(ElseBranch::Block(parse_block(parser)?))
        }
    } else {
        None
    };

    Ok(Stmt {
        kind: StmtKind::If {
            condition,
            then_branch,
            else_branch,
        },
        span: parser.span_from(start),
    })
}

pub fn parse_switch_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    const CASE_END: [TokenKind; 3] = [
        TokenKind::Caso,
        TokenKind::Predeterminado,
        TokenKind::CloseCurly,
    ];

    let start = parser.expect(TokenKind::Cambio)?.span.start;
    let scrutinee = parse_parenthesized(parser)?;
    parser.expect(TokenKind::OpenCurly)?;

    let mut cases = Vec::new();
    let mut default: Option<DefaultCase> = None;

    loop {
        match parser.current_token_kind() {
            TokenKind::Caso => {
                let case_start = parser.advance().span.start;
                let label = parse_expr(parser, BindingPower::Default)?;
                parser.expect(TokenKind::Colon)?;
                let body = parse_statements(parser, &CASE_END);
                cases.push(SwitchCase {
                    label,
                    body,
                    span: parser.span_from(case_start),
                });
            }
            TokenKind::Predeterminado => {
                if default.is_some() {
                    let error = parser.unexpected("`caso` or `}`");
                    parser.record(error);
                }

                let case_start = parser.advance().span.start;
                parser.expect(TokenKind::Colon)?;
                let body = parse_statements(parser, &CASE_END);
                default = Some(DefaultCase {
                    body,
                    span: parser.span_from(case_start),
                });
            }
            _ => break,
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt {
        kind: StmtKind::Switch {
            scrutinee,
            cases,
            default,
        },
        span: parser.span_from(start),
    })
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Mientras)?.span.start;
    let condition = parse_parenthesized(parser)?;
    let body = parse_block(parser)?;

    Ok(Stmt {
        kind: StmtKind::While { condition, body },
        span: parser.span_from(start),
    })
}

/// `hacer { } mientras (c)~`
pub fn parse_do_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Hacer)?.span.start;
    let body = parse_block(parser)?;
    parser.expect(TokenKind::Mientras)?;
    let condition = parse_parenthesized(parser)?;
    parser.expect_terminator()?;

    Ok(Stmt {
        kind: StmtKind::DoWhile { body, condition },
        span: parser.span_from(start),
    })
}

/// `para (entero i = 0; i < n; i += 1) { }`
pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Para)?.span.start;
    parser.expect(TokenKind::OpenParen)?;

    let init = if parser.current_token_kind().is_primitive_type() || at_class_declaration(parser) {
        let ty = parse_type(parser, BindingPower::Default)?;
        let declarator = parse_declarator(parser)?;
        if declarator.init.is_none() {
            return Err(parser.unexpected(TokenKind::Assignment.describe()));
        }
        ForInit::Declaration { ty, declarator }
    } else {
        let target = parse_expr(parser, BindingPower::Default)?;
        ForInit::Assignment(parse_assignment_rest(parser, target)?)
    };
    parser.expect(TokenKind::Semicolon)?;

    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    let target = parse_expr(parser, BindingPower::Default)?;
    let update = parse_assignment_rest(parser, target)?;
    parser.expect(TokenKind::CloseParen)?;

    let body = parse_block(parser)?;

    Ok(Stmt {
        kind: StmtKind::For {
            init,
            condition,
            update,
            body,
        },
        span: parser.span_from(start),
    })
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Retornar)?.span.start;

    let value = if parser.at_terminator() || parser.current_token_kind() == TokenKind::CloseCurly {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };
    parser.expect_terminator()?;

    Ok(Stmt {
        kind: StmtKind::Return(value),
        span: parser.span_from(start),
    })
}

pub fn parse_break_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Romper)?.span.start;
    parser.expect_terminator()?;

    Ok(Stmt {
        kind: StmtKind::Break,
        span: parser.span_from(start),
    })
}

/// `imprimir(expr)~`, `escribir` is accepted as a synonym.
pub fn parse_print_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;
    let value = parse_parenthesized(parser)?;
    parser.expect_terminator()?;

    Ok(Stmt {
        kind: StmtKind::Print(value),
        span: parser.span_from(start),
    })
}
