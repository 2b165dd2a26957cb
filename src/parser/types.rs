use std::collections::HashMap;

use crate::{
    ast::types::{DataType, TypeAnnotation, TypeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeAnnotation, Error>;
pub type TypeLEDHandler = fn(&mut Parser, TypeAnnotation, BindingPower) -> Result<TypeAnnotation, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Entero, parse_primitive_type);
    parser.type_nud(TokenKind::Flotante, parse_primitive_type);
    parser.type_nud(TokenKind::Booleano, parse_primitive_type);
    parser.type_nud(TokenKind::Caracter, parse_primitive_type);
    parser.type_nud(TokenKind::Cadena, parse_primitive_type);
    parser.type_nud(TokenKind::Vacio, parse_primitive_type);
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);

    // entero[]
    parser.type_led(TokenKind::OpenBracket, BindingPower::Call, parse_array_type);
}

pub fn parse_primitive_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let token = parser.advance();
    let primitive = match token.kind {
        TokenKind::Entero => DataType::Entero,
        TokenKind::Flotante => DataType::Flotante,
        TokenKind::Booleano => DataType::Booleano,
        TokenKind::Caracter => DataType::Caracter,
        TokenKind::Cadena => DataType::Cadena,
        _ => DataType::Vacio,
    };

    Ok(TypeAnnotation {
        kind: TypeKind::Primitive(primitive),
        span: token.span,
    })
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    Ok(TypeAnnotation {
        kind: TypeKind::Symbol(token.lexeme),
        span: token.span,
    })
}

pub fn parse_array_type(
    parser: &mut Parser,
    left: TypeAnnotation,
    _bp: BindingPower,
) -> Result<TypeAnnotation, Error> {
    if let TypeKind::Array(_) = left.kind {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                found: String::from("["),
                expected: String::from("an identifier"),
            },
            parser.get_position(),
        ));
    }

    parser.expect(TokenKind::OpenBracket)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(TypeAnnotation {
        span: Span::new(left.span.start, parser.previous_end()),
        kind: TypeKind::Array(Box::new(left.kind)),
    })
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeAnnotation, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_type_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected("a type")),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_type_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if token_bp <= bp {
            break;
        }

        let led = match parser.get_type_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected("a type")),
        };
        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}
