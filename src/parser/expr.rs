use crate::{
    ast::expressions::{BinaryOp, Expr, ExprKind, Literal, UnaryOp},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected("an expression")),
    };

    let mut left = nud(parser)?;

    // While the next operator binds tighter than `bp`, keep extending lhs
    while parser.current_binding_power() > bp {
        let token_kind = parser.current_token_kind();
        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected("an operator")),
        };

        let operator_bp = parser.current_binding_power();
        left = led(parser, left, operator_bp)?;
    }

    Ok(left)
}

fn make_expr(parser: &mut Parser, kind: ExprKind, span: Span) -> Expr {
    Expr {
        id: parser.advance_id(),
        kind,
        span,
    }
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();
    let kind = match token.kind {
        TokenKind::Integer => match token.lexeme.parse::<i64>() {
            Ok(value) => ExprKind::Literal(Literal::Integer(value)),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::InvalidNumber {
                        token: token.lexeme.clone(),
                    },
                    token.position(),
                ))
            }
        },
        TokenKind::Float => ExprKind::Literal(Literal::Float(token.lexeme.clone())),
        TokenKind::String => {
            let inner = &token.lexeme[1..token.lexeme.len() - 1];
            ExprKind::Literal(Literal::String(inner.to_string()))
        }
        TokenKind::Verdadero => ExprKind::Literal(Literal::Boolean(true)),
        TokenKind::Falso => ExprKind::Literal(Literal::Boolean(false)),
        TokenKind::Identifier => ExprKind::Identifier(token.lexeme.clone()),
        _ => return Err(parser.unexpected("an expression")),
    };

    parser.advance();
    Ok(make_expr(parser, kind, token.span))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = match operator_token.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEquals => BinaryOp::LessEquals,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEquals => BinaryOp::GreaterEquals,
        TokenKind::Equals => BinaryOp::Equals,
        TokenKind::NotEquals => BinaryOp::NotEquals,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    found: operator_token.lexeme,
                    expected: String::from("a binary operator"),
                },
                operator_token.span.start,
            ))
        }
    };

    let right = parse_expr(parser, bp)?;
    let span = left.span.to(&right.span);

    Ok(make_expr(
        parser,
        ExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

/// `NOT x` and `-x`. Both bind tighter than every binary operator and nest to
/// the right, so `NOT NOT x` is `NOT (NOT x)`.
pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = if operator_token.kind == TokenKind::Not {
        UnaryOp::Not
    } else {
        UnaryOp::Negate
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = Span::new(operator_token.span.start, operand.span.end);

    Ok(make_expr(
        parser,
        ExprKind::Unary {
            operator,
            operand: Box::new(operand),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_array_literal_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::OpenBracket)?.span.start;
    let elements = parse_expr_list(parser, TokenKind::CloseBracket)?;
    parser.expect(TokenKind::CloseBracket)?;

    let span = parser.span_from(start);
    Ok(make_expr(parser, ExprKind::ArrayLiteral(elements), span))
}

/// Parses comma separated expressions up to, not including, `closing`.
pub fn parse_expr_list(parser: &mut Parser, closing: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut items = vec![];

    if parser.current_token_kind() == closing {
        return Ok(items);
    }

    loop {
        items.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    Ok(items)
}

/// `metodo(args)`: only a bare name may be called directly, everything else
/// goes through `objeto.metodo(args)`.
pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let callee = match left.kind {
        ExprKind::Identifier(name) => name,
        _ => return Err(parser.unexpected("`~` or an operator")),
    };

    parser.expect(TokenKind::OpenParen)?;
    let arguments = parse_expr_list(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::CloseParen)?;

    let span = parser.span_from(left.span.start);
    Ok(make_expr(parser, ExprKind::Call { callee, arguments }, span))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let start = left.span.start;
    parser.expect(TokenKind::Dot)?;
    let name = parser.expect(TokenKind::Identifier)?.lexeme;

    let kind = if parser.current_token_kind() == TokenKind::OpenParen {
        parser.advance();
        let arguments = parse_expr_list(parser, TokenKind::CloseParen)?;
        parser.expect(TokenKind::CloseParen)?;

        ExprKind::MethodCall {
            object: Box::new(left),
            method: name,
            arguments,
        }
    } else {
        ExprKind::FieldAccess {
            object: Box::new(left),
            field: name,
        }
    };

    let span = parser.span_from(start);
    Ok(make_expr(parser, kind, span))
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    let span = parser.span_from(left.span.start);
    Ok(make_expr(
        parser,
        ExprKind::Index {
            array: Box::new(left),
            index: Box::new(index),
        },
        span,
    ))
}
