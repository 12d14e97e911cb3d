//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, error recovery and the main parse
//! entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, recovery and coordination
//! - `declarations`: `fun`, `define`, `struct`, `type`, top-level `var`, and types
//! - `statements`: statements inside blocks
//! - `expressions`: the six-level expression chain
//!
//! # Error recovery
//!
//! Syntax errors are collected instead of aborting the parse. A failed
//! statement skips ahead to the next statement boundary (`;`, a closing brace
//! at the same nesting depth, or a statement keyword) and the block carries
//! on. A block that runs into end of input fails its whole declaration; the
//! parser then skips to the next declaration keyword, so sibling
//! declarations still get parsed.
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::preprocess::{preprocess, PreprocessError};
use thiserror::Error;
use tracing::{debug, trace};

/// Deepest nesting of expressions and blocks the parser will follow.
///
/// Every binary level, prefix operator, expression and block counts as one
/// level, so a parenthesised operand costs five.
pub const MAX_NESTING: usize = 100;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at line {}, column {}: {message}", location.line, location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
    /// Kind of the offending token
    pub found: TokenKind,
    /// Token kinds that would have been accepted, when known
    pub expected: Vec<TokenKind>,
}

/// Recursive descent parser for klang
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) errors: Vec<ParseError>,
    depth: usize,
}

impl Parser {
    /// Preprocess and tokenize `source`, ready to parse.
    pub fn new(source: &str) -> Result<Self, PreprocessError> {
        let preprocessed = preprocess(source)?;
        let tokens = Lexer::new(&preprocessed.source, &preprocessed.table).tokenize();
        Ok(Self::from_tokens(tokens))
    }

    /// Parser over an existing token stream. A missing trailing `Eof` is
    /// supplied.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                literal: String::new(),
                location,
                original: None,
                display: None,
                error: None,
            });
        }
        Self {
            tokens,
            position: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Parse the entire program (top-level declarations).
    ///
    /// Returns every syntax error found when there is at least one; a partial
    /// program is never returned.
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut program = Program::new();

        while !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }

            let before = self.position;
            match self.parse_top_level_declaration() {
                Ok(decl) => program.declarations.push(decl),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize_declaration();
                    if self.position == before {
                        self.advance();
                    }
                }
            }
        }

        debug!(
            declarations = program.declarations.len(),
            errors = self.errors.len(),
            "parsed program"
        );

        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    /// Parse a single expression spanning the whole input.
    pub fn parse_standalone_expression(&mut self) -> Result<Expression, Vec<ParseError>> {
        let expr = self.parse_expression().map_err(|e| vec![e])?;
        if !self.is_at_end() {
            return Err(vec![self.error_expected(&[TokenKind::Eof], "Expected end of expression")]);
        }
        Ok(expr)
    }

    // ===== Error recovery =====

    /// Skip to the next statement boundary.
    ///
    /// Stops after a `;` or after a block that was entered while skipping
    /// closes, and before an unmatched `}` or a statement keyword. May consume
    /// nothing; callers guard against looping on the same token.
    pub(crate) fn synchronize_statement(&mut self) {
        let start = self.position;
        let mut depth = 0usize;

        while !self.is_at_end() {
            let kind = self.peek().kind;
            match kind {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        break;
                    }
                }
                _ if depth == 0 && starts_statement(kind) => break,
                _ => {}
            }
            self.advance();
        }

        trace!(skipped = self.position - start, "resynchronized at statement boundary");
    }

    /// Skip to the next top-level declaration keyword outside any braces.
    pub(crate) fn synchronize_declaration(&mut self) {
        let start = self.position;
        let mut depth = 0usize;

        while !self.is_at_end() {
            let kind = self.peek().kind;
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                _ if depth == 0 && starts_declaration(kind) => break,
                _ => {}
            }
            self.advance();
        }

        trace!(skipped = self.position - start, "resynchronized at declaration boundary");
    }

    /// Skip the rest of a braced body whose `{` was already consumed, up to
    /// and including its closing `}`.
    pub(crate) fn skip_to_closing_brace(&mut self) {
        let mut depth = 1usize;
        while !self.is_at_end() {
            match self.advance().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    // ===== Helper methods =====

    /// Run `parse` one nesting level deeper.
    ///
    /// Fails at the current token instead of recursing past [`MAX_NESTING`].
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(format!(
                "Nesting too deep: more than {} levels of expressions or blocks",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    /// Error at the current token, listing what would have been accepted.
    pub(crate) fn error_expected(&self, expected: &[TokenKind], message: &str) -> ParseError {
        ParseError {
            message: format!("{}, found {}", message, self.peek()),
            location: self.current_location(),
            found: self.peek().kind,
            expected: expected.to_vec(),
        }
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.current_location(),
            found: self.peek().kind,
            expected: Vec::new(),
        }
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind, message: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_expected(&[kind], message))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::LParen, &format!("Expected '(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::RParen, &format!("Expected ')' {ctx}"))
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::LBrace, &format!("Expected '{{' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<Ident, ParseError> {
        if self.check(TokenKind::Ident) {
            let token = self.advance();
            Ok(Ident {
                name: token.literal.clone(),
                original: token.original.clone(),
                location: token.location,
            })
        } else {
            Err(self.error_expected(&[TokenKind::Ident], &format!("Expected identifier {ctx}")))
        }
    }

    /// Consume an optional `;` terminator.
    pub(crate) fn skip_terminator(&mut self) {
        self.match_token(TokenKind::Semicolon);
    }
}

fn starts_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Var
            | TokenKind::Return
            | TokenKind::For
            | TokenKind::While
            | TokenKind::If
            | TokenKind::Break
            | TokenKind::Continue
    )
}

fn starts_declaration(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Fun | TokenKind::Define | TokenKind::Var | TokenKind::Struct | TokenKind::Type
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
        Parser::new(source).unwrap().parse_program()
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse("fun main() -> int { return 0 }").unwrap();

        assert_eq!(program.declarations.len(), 1);
        match &program.declarations[0] {
            Declaration::Function(def) => {
                assert_eq!(def.name.as_str(), "main");
                assert!(def.params.is_empty());
                assert_eq!(def.return_type.as_ref().map(|t| t.to_string()).as_deref(), Some("int"));
                assert_eq!(def.body.statements.len(), 1);
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_source_is_empty_program() {
        let program = parse("  // nothing here\n").unwrap();
        assert!(program.declarations.is_empty());
    }

    #[test]
    fn test_errors_accumulate_across_statements() {
        let errors = parse(
            "fun main() {\n    var x = \n    var y = 2\n    y = )\n    return y\n}",
        )
        .unwrap_err();

        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert_eq!(errors[0].location.line, 3);
        assert_eq!(errors[0].found, TokenKind::Var);
        assert_eq!(errors[1].location, SourceLocation::new(4, 9));
        assert_eq!(errors[1].found, TokenKind::RParen);
    }

    #[test]
    fn test_unterminated_block_does_not_hide_earlier_declarations() {
        let errors = parse("fun a() { x = 1 }\nfun b() {\n  y = 2\n  var z = (3\n").unwrap_err();
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert_eq!(errors[0].expected, vec![TokenKind::RParen]);
        assert_eq!(errors[1].found, TokenKind::Eof);
        assert!(errors[1].message.contains("Unterminated block"));
    }

    #[test]
    fn test_broken_declaration_does_not_stop_siblings() {
        let errors = parse(
            "fun ok() {}\nfun broken( { return 1 }\nfun bad2() -> { }\nfun fine() {}\ndefine oops",
        )
        .unwrap_err();
        let lines: Vec<usize> = errors.iter().map(|e| e.location.line).collect();
        assert_eq!(lines, vec![2, 3, 5], "{:?}", errors);
    }

    #[test]
    fn test_invalid_token_is_reported_as_syntax_error() {
        let errors = parse("fun f() { var s = \"open }\n").unwrap_err();
        assert_eq!(errors[0].found, TokenKind::Invalid);
        assert!(errors[0].message.contains("unterminated string literal"));
    }

    #[test]
    fn test_nesting_limit_resets_after_error() {
        let deep = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
        let source = format!("fun f() {{\n  var a = {}\n  var b = (((2)))\n}}\nfun g() {{}}", deep);
        let errors = parse(&source).unwrap_err();
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert_eq!(errors[0].location.line, 2);
        assert!(errors[0].message.starts_with("Nesting too deep"));
    }

    #[test]
    fn test_standalone_expression_rejects_trailing_tokens() {
        let mut parser = Parser::new("1 + 2 )").unwrap();
        let errors = parser.parse_standalone_expression().unwrap_err();
        assert_eq!(errors[0].found, TokenKind::RParen);
        assert_eq!(errors[0].expected, vec![TokenKind::Eof]);
    }
}
