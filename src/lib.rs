//! # Introduction
//!
//! klang is the front end of a small statement-oriented language. It reads
//! `.k` source, applies `replace` directives, tokenizes and parses the result
//! into a typed syntax tree, and reports every syntax error it can find in
//! one pass.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Preprocess → Lexer → Parser → AST
//! ```
//!
//! 1. [`parser::preprocess`]: collects `replace a -> b` directives into a
//!    per-unit substitution table.
//! 2. [`parser::lexer`]: tokenizes, rewriting identifiers through the table
//!    and keeping the spelling the user wrote.
//! 3. [`parser::parse`]: recursive descent with error recovery; returns a
//!    [`parser::ast::Program`] or the full list of errors.
//! 4. [`ui`]: ratatui-based inspector for source, tokens and tree; not part
//!    of the stable library API.
//!
//! ```
//! use klang::parser::parse_source;
//!
//! let program = parse_source("demo.k", "fun main() -> int { return 1 + 2 }").unwrap();
//! assert_eq!(program.declarations.len(), 1);
//! ```

pub mod parser;
pub mod ui;
