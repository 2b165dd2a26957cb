//! Semantic analysis.
//!
//! Runs in two passes over the AST. The first registers every class with its
//! field types and method signatures ([`classes`]). The second walks the
//! class bodies and `principal`, resolving names through a stack of scopes
//! ([`symbols`]), typing expressions ([`operators`]) and attaching each
//! diagnostic to the node that caused it ([`typed_ast`]).

pub mod classes;
pub mod operators;
pub mod symbols;
pub mod type_checker;
pub mod typed_ast;
