//! Compilation units: one named source text run through the whole front end.

use crate::parser::ast::{Program, SourceLocation};
use crate::parser::lexer::{Lexer, Token};
use crate::parser::parse::{ParseError, Parser};
use crate::parser::preprocess::{preprocess, PreprocessError, Preprocessed};
use thiserror::Error;
use tracing::{debug, instrument};

/// A front-end error tied to the unit it came from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{unit}:{}:{}: {message}", location.line, location.column)]
pub struct Diagnostic {
    /// Unit name, usually the file path
    pub unit: String,
    pub message: String,
    pub location: SourceLocation,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Preprocess,
    Syntax,
}

impl Diagnostic {
    fn preprocess(unit: &str, err: PreprocessError) -> Self {
        Diagnostic {
            unit: unit.to_string(),
            message: err.message,
            location: err.location,
            kind: DiagnosticKind::Preprocess,
        }
    }

    fn syntax(unit: &str, err: ParseError) -> Self {
        Diagnostic {
            unit: unit.to_string(),
            message: err.message,
            location: err.location,
            kind: DiagnosticKind::Syntax,
        }
    }
}

/// Named source text. Every stage is recomputed on demand and nothing is
/// shared between units.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub name: String,
    pub source: String,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        CompilationUnit {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Run only the `replace` directive pass.
    pub fn preprocess(&self) -> Result<Preprocessed, Diagnostic> {
        preprocess(&self.source).map_err(|err| Diagnostic::preprocess(&self.name, err))
    }

    /// Preprocess and tokenize. The stream always ends with `Eof`.
    pub fn tokens(&self) -> Result<Vec<Token>, Diagnostic> {
        let preprocessed = self.preprocess()?;
        Ok(Lexer::new(&preprocessed.source, &preprocessed.table).tokenize())
    }

    /// Full front end: preprocess, tokenize, parse.
    ///
    /// Returns every diagnostic when anything went wrong; no partial tree.
    #[instrument(skip(self), fields(unit = %self.name))]
    pub fn parse(&self) -> Result<Program, Vec<Diagnostic>> {
        let tokens = self.tokens().map_err(|d| vec![d])?;
        debug!(tokens = tokens.len(), "tokenized");

        Parser::from_tokens(tokens).parse_program().map_err(|errors| {
            errors
                .into_iter()
                .map(|err| Diagnostic::syntax(&self.name, err))
                .collect()
        })
    }
}

/// Parse `source` as a unit called `name`.
pub fn parse_source(name: &str, source: &str) -> Result<Program, Vec<Diagnostic>> {
    CompilationUnit::new(name, source).parse()
}
