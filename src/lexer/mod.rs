//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts jonson source
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using an ordered table of regex patterns
//! - Recognition of Spanish keywords, identifiers, literals and operators
//! - Line/column tracking for error reporting
//! - Comments, whitespace and the `~` spacing rule

pub mod lexer;
pub mod tokens;
