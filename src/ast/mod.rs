/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: program, class, member and block nodes plus the `Node` trait
/// - expressions: expression nodes and operators
/// - statements: statement nodes
/// - types: written type annotations and resolved data types
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
