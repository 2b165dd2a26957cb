//! C code generation.
//!
//! Lowers an analyzed [`Program`](crate::ast::ast::Program) to one C
//! translation unit. Every decision is driven by the resolved types in the
//! [`Analysis`](crate::type_checker::typed_ast::Analysis): storage layout,
//! string handling, printf formats and method dispatch.

pub mod classes;
pub mod compiler;
pub mod expr;
pub mod locals;
pub mod stmt;

#[cfg(test)]
mod tests;
