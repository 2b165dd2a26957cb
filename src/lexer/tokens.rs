use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::{Position, Span};

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("entero", TokenKind::Entero);
        map.insert("flotante", TokenKind::Flotante);
        map.insert("booleano", TokenKind::Booleano);
        map.insert("caracter", TokenKind::Caracter);
        map.insert("cadena", TokenKind::Cadena);
        map.insert("vacio", TokenKind::Vacio);
        map.insert("principal", TokenKind::Principal);
        map.insert("clase", TokenKind::Clase);
        map.insert("publico", TokenKind::Publico);
        map.insert("privado", TokenKind::Privado);
        map.insert("imprimir", TokenKind::Imprimir);
        map.insert("escribir", TokenKind::Escribir);
        map.insert("romper", TokenKind::Romper);
        map.insert("retornar", TokenKind::Retornar);
        map.insert("cambio", TokenKind::Cambio);
        map.insert("caso", TokenKind::Caso);
        map.insert("predeterminado", TokenKind::Predeterminado);
        map.insert("verdadero", TokenKind::Verdadero);
        map.insert("falso", TokenKind::Falso);
        map.insert("si", TokenKind::Si);
        map.insert("sino", TokenKind::Sino);
        map.insert("mientras", TokenKind::Mientras);
        map.insert("hacer", TokenKind::Hacer);
        map.insert("para", TokenKind::Para);
        map.insert("AND", TokenKind::And);
        map.insert("OR", TokenKind::Or);
        map.insert("NOT", TokenKind::Not);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Integer,
    Float,
    String,
    Identifier,
    Error,

    Terminator, // ~
    Semicolon,
    Comma,
    Colon,
    Dot,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    PlusEquals,
    Equals,    // ==
    NotEquals, // !=
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Plus,
    Dash,
    Star,
    Slash,
    Percent,

    And,
    Or,
    Not,

    // Types
    Entero,
    Flotante,
    Booleano,
    Caracter,
    Cadena,
    Vacio,

    // Reserved
    Principal,
    Clase,
    Publico,
    Privado,
    Imprimir,
    Escribir,
    Romper,
    Retornar,
    Cambio,
    Caso,
    Predeterminado,
    Verdadero,
    Falso,
    Si,
    Sino,
    Mientras,
    Hacer,
    Para,
}

impl TokenKind {
    pub fn is_primitive_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Entero
                | TokenKind::Flotante
                | TokenKind::Booleano
                | TokenKind::Caracter
                | TokenKind::Cadena
                | TokenKind::Vacio
        )
    }

    /// Tokens a statement can start with. Used when resynchronising after a
    /// syntax error.
    pub fn starts_statement(&self) -> bool {
        self.is_primitive_type()
            || matches!(
                self,
                TokenKind::Si
                    | TokenKind::Cambio
                    | TokenKind::Mientras
                    | TokenKind::Hacer
                    | TokenKind::Para
                    | TokenKind::Retornar
                    | TokenKind::Romper
                    | TokenKind::Imprimir
                    | TokenKind::Escribir
            )
    }

    /// How the token kind is named in "expected ..." diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::EOF => "end of file",
            TokenKind::Integer => "an integer",
            TokenKind::Float => "a float",
            TokenKind::String => "a string",
            TokenKind::Identifier => "an identifier",
            TokenKind::Error => "an unrecognised character",
            TokenKind::Terminator => "`~`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Dot => "`.`",
            TokenKind::OpenBracket => "`[`",
            TokenKind::CloseBracket => "`]`",
            TokenKind::OpenCurly => "`{`",
            TokenKind::CloseCurly => "`}`",
            TokenKind::OpenParen => "`(`",
            TokenKind::CloseParen => "`)`",
            TokenKind::Assignment => "`=`",
            TokenKind::PlusEquals => "`+=`",
            TokenKind::Equals => "`==`",
            TokenKind::NotEquals => "`!=`",
            TokenKind::Less => "`<`",
            TokenKind::LessEquals => "`<=`",
            TokenKind::Greater => "`>`",
            TokenKind::GreaterEquals => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Dash => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::And => "`AND`",
            TokenKind::Or => "`OR`",
            TokenKind::Not => "`NOT`",
            TokenKind::Entero => "`entero`",
            TokenKind::Flotante => "`flotante`",
            TokenKind::Booleano => "`booleano`",
            TokenKind::Caracter => "`caracter`",
            TokenKind::Cadena => "`cadena`",
            TokenKind::Vacio => "`vacio`",
            TokenKind::Principal => "`principal`",
            TokenKind::Clase => "`clase`",
            TokenKind::Publico => "`publico`",
            TokenKind::Privado => "`privado`",
            TokenKind::Imprimir => "`imprimir`",
            TokenKind::Escribir => "`escribir`",
            TokenKind::Romper => "`romper`",
            TokenKind::Retornar => "`retornar`",
            TokenKind::Cambio => "`cambio`",
            TokenKind::Caso => "`caso`",
            TokenKind::Predeterminado => "`predeterminado`",
            TokenKind::Verdadero => "`verdadero`",
            TokenKind::Falso => "`falso`",
            TokenKind::Si => "`si`",
            TokenKind::Sino => "`sino`",
            TokenKind::Mientras => "`mientras`",
            TokenKind::Hacer => "`hacer`",
            TokenKind::Para => "`para`",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} `{}` at {}", self.kind, self.lexeme, self.span.start)
    }
}

impl Token {
    pub fn line(&self) -> u32 {
        self.span.start.line
    }

    pub fn column(&self) -> u32 {
        self.span.start.column
    }

    pub fn position(&self) -> Position {
        self.span.start
    }
}
