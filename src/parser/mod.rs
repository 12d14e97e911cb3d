//! klang source front end
//!
//! This module turns klang source text into an Abstract Syntax Tree (AST):
//! - [`preprocess`]: `replace` directives (source text → substitution table)
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → AST), split across `declarations`,
//!   `statements` and `expressions`
//! - [`ast`]: AST node definitions
//! - [`unit`]: Compilation units and diagnostics
//! - [`outline`]: Flat, indented view of a parsed program
//!
//! # Language summary
//!
//! - Declarations: `fun`, `define` (return type required), `struct`, `type`,
//!   global `var`
//! - Statements: `var`, assignment (plain and compound), `return`, `if`/`else`,
//!   `while`, `for ... in range(a, b)`, `break`, `continue`, calls
//! - Expressions: six precedence levels, same-level runs associate to the right
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent with statement-level error recovery.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod outline;
pub mod parse;
pub mod preprocess;
mod statements;
pub mod unit;

pub use parse::{ParseError, Parser};
pub use unit::{parse_source, CompilationUnit, Diagnostic, DiagnosticKind};
