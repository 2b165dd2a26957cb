#![allow(clippy::module_inception)]

use std::fmt::Display;

use log::{debug, info};
use serde::Serialize;

use crate::{
    compiler::compiler::{generate, CodegenOptions},
    errors::errors::{Error, ErrorTip},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::analyze,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// A 1-based line/column location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    pub fn null() -> Self {
        Position { line: 0, column: 0 }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

/// Everything a single run of the pipeline produced.
#[derive(Debug, Default)]
pub struct Compilation {
    /// Errors and warnings from every stage that ran, in reporting order.
    pub diagnostics: Vec<Error>,
    /// Generated C source, present only when no stage reported an error.
    pub output: Option<String>,
}

impl Compilation {
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.diagnostics.iter().filter(|d| !d.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Error> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }
}

/// Runs lexer, parser, semantic analysis and code generation over `source`.
///
/// Syntax errors stop the pipeline before semantic analysis; semantic errors
/// stop it before code generation. Diagnostics gathered so far are always
/// returned.
pub fn compile(source: &str, options: &CodegenOptions) -> Compilation {
    let mut compilation = Compilation::default();

    let (tokens, lex_diagnostics) = tokenize(source);
    debug!("lexed {} tokens", tokens.len());
    compilation.diagnostics.extend(lex_diagnostics);

    let (program, syntax_errors) = parse(tokens);
    let syntax_failed = !syntax_errors.is_empty();
    compilation.diagnostics.extend(syntax_errors);

    let program = match program {
        Some(program) if !syntax_failed => program,
        _ => {
            info!("syntax analysis failed, skipping semantic analysis");
            return compilation;
        }
    };

    let analysis = analyze(&program);
    let semantic_failed = !analysis.errors.is_empty();
    compilation.diagnostics.extend(analysis.errors.iter().cloned());
    compilation.diagnostics.extend(analysis.warnings.iter().cloned());

    if semantic_failed {
        info!("semantic analysis failed, skipping code generation");
        return compilation;
    }

    match generate(&program, &analysis, options) {
        Ok(output) => compilation.output = Some(output),
        Err(error) => compilation.diagnostics.push(error),
    }

    compilation
}

/// Returns the 1-based line number and the text of `line` within `source`.
pub fn get_line_at_position(source: &str, position: &Position) -> Option<(usize, String)> {
    let line_number = position.line as usize;
    if line_number == 0 {
        return None;
    }

    source
        .split('\n')
        .nth(line_number - 1)
        .map(|line| (line_number, line.trim_end_matches('\r').to_string()))
}

/// Renders a diagnostic with a caret pointing at its column.
///
/// ```text
/// Error: TypeMismatch (Expected type `entero`, received `cadena`)
/// -> prueba.jonson
///    |
/// 20 | entero y = "hola"~
///    | ---------^
/// ```
pub fn display_error(error: &Error, source: &str, file: &str) -> String {
    let mut rendered = String::new();
    let label = if error.is_warning() { "Warning" } else { "Error" };

    if let ErrorTip::None = error.get_tip() {
        rendered.push_str(&format!("{}: {}\n", label, error.get_error_name()));
    } else {
        rendered.push_str(&format!(
            "{}: {} ({})\n",
            label,
            error.get_error_name(),
            error.get_tip()
        ));
    }
    rendered.push_str(&format!("-> {}:{}\n", file, error.get_position()));

    let Some((line, line_text)) = get_line_at_position(source, error.get_position()) else {
        return rendered;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    rendered.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    rendered.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let column = error.get_position().column as usize;
    let arrows = column.saturating_sub(removed_whitespace).max(1);
    rendered.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    rendered
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();

    (string.chars().skip(start).collect(), start)
}
