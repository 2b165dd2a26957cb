use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{TokenKind, Token, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &str);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

impl RegexPattern {
    fn new(pattern: &str, handler: RegexHandler) -> Self {
        RegexPattern {
            regex: Regex::new(pattern).unwrap(),
            handler,
        }
    }
}

lazy_static! {
    /// Token patterns in priority order. Every pattern is anchored, the first
    /// one matching at the cursor wins.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern::new(r"^//[^\n]*", skip_handler),
        RegexPattern::new(r"^/\*(?s:.*?)\*/", skip_handler),
        RegexPattern::new(r"^[ \t\r]+", whitespace_handler),
        RegexPattern::new(r"^\n", newline_handler),
        RegexPattern::new(r"^==", MK_DEFAULT_HANDLER!(TokenKind::Equals)),
        RegexPattern::new(r"^!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals)),
        RegexPattern::new(r"^<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals)),
        RegexPattern::new(r"^>=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals)),
        RegexPattern::new(r"^\+=", MK_DEFAULT_HANDLER!(TokenKind::PlusEquals)),
        RegexPattern::new(r"^\+", MK_DEFAULT_HANDLER!(TokenKind::Plus)),
        RegexPattern::new(r"^-", MK_DEFAULT_HANDLER!(TokenKind::Dash)),
        RegexPattern::new(r"^\*", MK_DEFAULT_HANDLER!(TokenKind::Star)),
        RegexPattern::new(r"^/", MK_DEFAULT_HANDLER!(TokenKind::Slash)),
        RegexPattern::new(r"^%", MK_DEFAULT_HANDLER!(TokenKind::Percent)),
        RegexPattern::new(r"^<", MK_DEFAULT_HANDLER!(TokenKind::Less)),
        RegexPattern::new(r"^>", MK_DEFAULT_HANDLER!(TokenKind::Greater)),
        RegexPattern::new(r"^=", MK_DEFAULT_HANDLER!(TokenKind::Assignment)),
        RegexPattern::new(r"^~", terminator_handler),
        RegexPattern::new(r"^;", MK_DEFAULT_HANDLER!(TokenKind::Semicolon)),
        RegexPattern::new(r"^,", MK_DEFAULT_HANDLER!(TokenKind::Comma)),
        RegexPattern::new(r"^:", MK_DEFAULT_HANDLER!(TokenKind::Colon)),
        RegexPattern::new(r"^\.", MK_DEFAULT_HANDLER!(TokenKind::Dot)),
        RegexPattern::new(r"^\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket)),
        RegexPattern::new(r"^\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket)),
        RegexPattern::new(r"^\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen)),
        RegexPattern::new(r"^\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen)),
        RegexPattern::new(r"^\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly)),
        RegexPattern::new(r"^\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly)),
        RegexPattern::new(r"^[0-9]+\.[0-9]*", MK_DEFAULT_HANDLER!(TokenKind::Float)),
        RegexPattern::new(r"^[0-9]+", MK_DEFAULT_HANDLER!(TokenKind::Integer)),
        RegexPattern::new(r#"^"[^"\n]*""#, MK_DEFAULT_HANDLER!(TokenKind::String)),
        RegexPattern::new(r"^[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        RegexPattern::new(r"^.", error_handler),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    diagnostics: Vec<Error>,
    source: String,
    pos: usize,
    line: u32,
    column: u32,
    /// Set while the last thing consumed on this line was blank space.
    after_whitespace: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            tokens: vec![],
            diagnostics: vec![],
            source: source.to_string(),
            pos: 0,
            line: 1,
            column: 1,
            after_whitespace: false,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Moves the cursor over `lexeme`, keeping line and column in sync.
    pub fn consume(&mut self, lexeme: &str) {
        for c in lexeme.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += lexeme.len();
    }

    pub fn push_lexeme(&mut self, kind: TokenKind, lexeme: &str) {
        let start = self.position();
        self.consume(lexeme);
        let token = MK_TOKEN!(kind, lexeme.to_string(), Span::new(start, self.position()));
        self.tokens.push(token);
        self.after_whitespace = false;
    }

    pub fn report(&mut self, error: ErrorImpl, position: Position) {
        self.diagnostics.push(Error::new(error, position));
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }
}

fn skip_handler(lexer: &mut Lexer, lexeme: &str) {
    lexer.consume(lexeme);
    lexer.after_whitespace = false;
}

fn whitespace_handler(lexer: &mut Lexer, lexeme: &str) {
    lexer.consume(lexeme);
    lexer.after_whitespace = true;
}

fn newline_handler(lexer: &mut Lexer, lexeme: &str) {
    lexer.consume(lexeme);
    lexer.after_whitespace = false;
}

fn terminator_handler(lexer: &mut Lexer, lexeme: &str) {
    if lexer.after_whitespace {
        let position = lexer.position();
        lexer.report(ErrorImpl::SpacedTerminator, position);
        lexer.push_lexeme(TokenKind::Error, lexeme);
    } else {
        lexer.push_lexeme(TokenKind::Terminator, lexeme);
    }
}

fn symbol_handler(lexer: &mut Lexer, lexeme: &str) {
    let kind = RESERVED_LOOKUP
        .get(lexeme)
        .copied()
        .unwrap_or(TokenKind::Identifier);
    lexer.push_lexeme(kind, lexeme);
}

fn error_handler(lexer: &mut Lexer, lexeme: &str) {
    let position = lexer.position();
    lexer.report(
        ErrorImpl::UnrecognisedToken {
            token: lexeme.to_string(),
        },
        position,
    );
    lexer.push_lexeme(TokenKind::Error, lexeme);
}

/// Splits `source` into tokens.
///
/// Lexing never fails: characters outside the language become
/// [`TokenKind::Error`] tokens and are reported in the returned diagnostics,
/// which the parser is left to reject. The token list always ends in `EOF`.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Error>) {
    let mut lex = Lexer::new(source);

    while !lex.at_eof() {
        let matched = PATTERNS.iter().find_map(|pattern| {
            pattern
                .regex
                .find(lex.remainder())
                .map(|m| (pattern.handler, m.as_str().to_string()))
        });

        match matched {
            Some((handler, lexeme)) => handler(&mut lex, &lexeme),
            // `^.` matches any single character but a newline, which has its own pattern
            None => break,
        }
    }

    let eof = lex.position();
    lex.tokens.push(MK_TOKEN!(TokenKind::EOF, String::new(), Span::new(eof, eof)));
    trace!(
        "tokenize: {} tokens, {} diagnostics",
        lex.tokens.len(),
        lex.diagnostics.len()
    );

    (lex.tokens, lex.diagnostics)
}
