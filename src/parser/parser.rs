//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and the `parse` entry point.
//! The parser uses a Pratt parser approach with NUD/LED handlers for
//! expression parsing and specialized functions for statement parsing.
//!
//! It maintains lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence
//! - Type parsing handlers
//!
//! Syntax errors do not stop the parse. They are collected on the parser and
//! the token stream is resynchronised at the next statement boundary.

use std::collections::HashMap;

use log::debug;

use crate::{
    ast::ast::{NodeId, Program},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::parse_program,
    types::{
        create_token_type_lookups, TypeLEDHandler, TypeLEDLookup, TypeNUDHandler, TypeNUDLookup,
    },
};

/// The main parser structure that maintains parsing state.
///
/// This struct holds the token stream and maintains lookup tables for
/// parsing statements, expressions, and types. It tracks the current
/// position in the token stream and the syntax errors recorded so far.
pub struct Parser {
    /// The list of tokens to parse, always ending in `EOF`
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// Syntax errors recorded while recovering
    errors: Vec<Error>,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Lookup table for null denotation (prefix) expression handlers
    nud_lookup: NUDLookup,
    /// Lookup table for left denotation (infix) expression handlers
    led_lookup: LEDLookup,
    /// Lookup table for expression binding powers (precedence)
    binding_power_lookup: BPLookup,
    /// Lookup table for type null denotation handlers
    type_nud_lookup: TypeNUDLookup,
    /// Lookup table for type left denotation handlers
    type_led_lookup: TypeLEDLookup,
    /// Lookup table for type binding powers
    type_binding_power_lookup: BPLookup,
    /// Counter for generating unique node IDs
    current_id: NodeId,
}

impl Parser {
    /// Creates a new Parser instance.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Vector of tokens to parse. An `EOF` token is appended if
    ///   the vector does not already end with one.
    ///
    /// # Returns
    ///
    /// A new Parser instance ready to parse the token stream.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EOF) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(Position::new(1, 1));
            tokens.push(Token {
                kind: TokenKind::EOF,
                lexeme: String::new(),
                span: Span::new(end, end),
            });
        }

        Parser {
            tokens,
            pos: 0,
            errors: vec![],
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            type_led_lookup: HashMap::new(),
            type_binding_power_lookup: HashMap::new(),
            current_id: 0,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Returns the kind of the token `offset` places ahead, or `EOF` past the end.
    pub fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EOF)
    }

    /// Advances to the next token and returns the previous token.
    ///
    /// The parser never moves past the trailing `EOF`.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Builds the error for an unexpected current token.
    ///
    /// # Arguments
    ///
    /// * `expected` - Human readable description of what was expected
    pub fn unexpected(&self, expected: &str) -> Error {
        let token = self.current_token();
        let error = match token.kind {
            TokenKind::EOF => ErrorImpl::UnexpectedEof {
                expected: expected.to_string(),
            },
            TokenKind::Error if token.lexeme == "~" => ErrorImpl::MisplacedTerminator,
            _ => ErrorImpl::UnexpectedToken {
                found: token.lexeme.clone(),
                expected: expected.to_string(),
            },
        };

        Error::new(error, token.position())
    }

    /// Expects a token of the specified kind, with optional custom error.
    ///
    /// # Arguments
    ///
    /// * `expected_kind` - The expected TokenKind
    /// * `error` - Optional custom error to return if expectation fails
    ///
    /// # Returns
    ///
    /// Returns Ok(Token) if the current token matches, otherwise returns an Error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current_token_kind() != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(self.unexpected(expected_kind.describe())),
            }
        } else {
            Ok(self.advance())
        }
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Expects the statement terminator `~`.
    ///
    /// A `~` preceded by whitespace arrives as an error token; it is reported
    /// but accepted so the statement itself still parses. Anything else is
    /// reported as a likely missing terminator, positioned right after the
    /// previous token.
    pub fn expect_terminator(&mut self) -> Result<Token, Error> {
        let token = self.current_token();
        match token.kind {
            TokenKind::Terminator => Ok(self.advance()),
            TokenKind::Error if token.lexeme == "~" => {
                let error = Error::new(ErrorImpl::MisplacedTerminator, token.position());
                self.record(error);
                Ok(self.advance())
            }
            _ => {
                let found = if token.kind == TokenKind::EOF {
                    String::from("end of file")
                } else {
                    token.lexeme.clone()
                };
                Err(Error::new(
                    ErrorImpl::MissingTerminator { found },
                    self.previous_end(),
                ))
            }
        }
    }

    /// Whether the current token is a terminator, spaced or not.
    pub fn at_terminator(&self) -> bool {
        let token = self.current_token();
        token.kind == TokenKind::Terminator
            || (token.kind == TokenKind::Error && token.lexeme == "~")
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    /// Records a syntax error and keeps parsing.
    pub fn record(&mut self, error: Error) {
        debug!("syntax error: {}", error);
        self.errors.push(error);
    }

    /// Skips tokens until a point where parsing can resume.
    ///
    /// Stops after a `~`, or before a `}` closing the current block, or before
    /// a token that starts a statement or a declaration. When nothing was
    /// consumed since `start`, the offending token is skipped first.
    pub fn synchronize(&mut self, start: usize) {
        let mut depth = 0usize;

        if self.pos == start {
            self.advance();
        }

        while self.has_tokens() {
            let kind = self.current_token_kind();
            match kind {
                TokenKind::Terminator if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::OpenCurly => depth += 1,
                TokenKind::CloseCurly if depth == 0 => return,
                TokenKind::CloseCurly => depth -= 1,
                _ if depth == 0 && self.at_sync_point() => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn at_sync_point(&self) -> bool {
        let kind = self.current_token_kind();
        kind.starts_statement()
            || matches!(
                kind,
                TokenKind::Clase
                    | TokenKind::Publico
                    | TokenKind::Privado
                    | TokenKind::Principal
                    | TokenKind::Caso
                    | TokenKind::Predeterminado
            )
    }

    /// Current position in the token stream, used with [`Parser::synchronize`].
    pub fn mark(&self) -> usize {
        self.pos
    }

    /// Returns a reference to the statement lookup table.
    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    /// Returns a reference to the NUD (null denotation) lookup table.
    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    /// Returns a reference to the LED (left denotation) lookup table.
    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    /// Returns a reference to the type binding power lookup table.
    pub fn get_type_bp_lookup(&self) -> &BPLookup {
        &self.type_binding_power_lookup
    }

    /// Returns a reference to the type NUD lookup table.
    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    /// Returns a reference to the type LED lookup table.
    pub fn get_type_led_lookup(&self) -> &TypeLEDLookup {
        &self.type_led_lookup
    }

    /// Binding power of the current token, `Default` if it is not an operator.
    pub fn current_binding_power(&self) -> BindingPower {
        *self
            .binding_power_lookup
            .get(&self.current_token_kind())
            .unwrap_or(&BindingPower::Default)
    }

    /// Registers a left denotation (infix) handler for a token.
    ///
    /// # Arguments
    ///
    /// * `kind` - The token kind to register
    /// * `binding_power` - The precedence/binding power for this operator
    /// * `led_fn` - The handler function for this infix operator
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    ///
    /// Prefix handlers carry no binding power of their own, so a token that is
    /// both prefix and infix (`-`, `(`, `[`) keeps its infix precedence.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Registers a type left denotation handler.
    pub fn type_led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        led_fn: TypeLEDHandler,
    ) {
        self.type_binding_power_lookup.insert(kind, binding_power);
        self.type_led_lookup.insert(kind, led_fn);
    }

    /// Registers a type null denotation handler.
    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    /// Advances the internal ID counter and returns the previous value.
    pub fn advance_id(&mut self) -> NodeId {
        let id = self.current_id;
        self.current_id += 1;
        id
    }

    /// Returns the position of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().position()
    }

    /// Returns the end of the last consumed token.
    pub fn previous_end(&self) -> Position {
        if self.pos == 0 {
            return self.current_token().span.start;
        }
        self.tokens[self.pos - 1].span.end
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.previous_end())
    }
}

/// Parses a stream of tokens into an Abstract Syntax Tree.
///
/// This is the main entry point for parsing. It creates a parser instance,
/// initializes all lookup tables, and parses the class declarations and the
/// `principal` block.
///
/// # Arguments
///
/// * `tokens` - Vector of tokens to parse
///
/// # Returns
///
/// A tuple containing:
/// - The program, or `None` when no `principal` block could be parsed
/// - Every syntax error found. The parse failed if this is non-empty, even
///   when a partial program is returned.
pub fn parse(tokens: Vec<Token>) -> (Option<Program>, Vec<Error>) {
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let program = match parse_program(&mut parser) {
        Ok(program) => Some(program),
        Err(error) => {
            parser.record(error);
            None
        }
    };

    debug!(
        "parse: {} syntax errors, {} node ids",
        parser.errors.len(),
        parser.current_id
    );

    (program, parser.errors)
}
