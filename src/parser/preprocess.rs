//! `replace` directive preprocessor
//!
//! Runs before tokenization. Every line whose first word is `replace` must have
//! the shape
//!
//! ```text
//! replace <identifier> -> <identifier> | "<text>"
//! ```
//!
//! Valid directives are collected into a [`SubstitutionTable`] and the
//! directive lines are blanked out of the source (the line breaks stay, so
//! locations reported later still match the file). Any other line starting
//! with `replace` is a fatal [`PreprocessError`].
//!
//! The table is applied per identifier token by the lexer, which keeps the
//! pre-substitution spelling on the token for diagnostics. [`SubstitutionTable::apply`]
//! produces the equivalent rewritten text.
//!
//! Replacement text that is not a plain ASCII identifier (e.g. `"ñandú"`) is
//! mapped to a synthesized `unicode_id_N` name; the table keeps the reverse
//! mapping so the original text can be shown again.

use super::ast::SourceLocation;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, trace};

const DIRECTIVE_KEYWORD: &str = "replace";
const SYNTHETIC_PREFIX: &str = "unicode_id_";

/// Malformed `replace` directive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Preprocess error at line {}, column {}: {message}", location.line, location.column)]
pub struct PreprocessError {
    pub message: String,
    pub location: SourceLocation,
}

/// Identifier rewrites for one compilation unit.
///
/// Built once by [`preprocess`] and read-only afterwards. Nothing in here is
/// shared between units; the synthetic-name counter lives on the table.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    /// source identifier -> replacement identifier
    entries: FxHashMap<String, String>,
    /// synthesized identifier -> replacement text as written
    originals: FxHashMap<String, String>,
    /// replacement text -> synthesized identifier
    synthesized: FxHashMap<String, String>,
    /// identifiers already present in the source; synthesized names avoid them
    reserved: FxHashSet<String>,
    next_synthetic_id: usize,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `from -> to`. A later call for the same `from` replaces the
    /// earlier mapping.
    pub fn insert(&mut self, from: &str, to: &str) {
        let target = if is_identifier(to) {
            to.to_string()
        } else {
            self.synthesize(to)
        };
        trace!(from, to = %target, "registered substitution");
        self.entries.insert(from.to_string(), target);
    }

    /// Replacement identifier for `ident`, if any.
    pub fn lookup(&self, ident: &str) -> Option<&str> {
        self.entries.get(ident).map(String::as_str)
    }

    /// Text a synthesized identifier stands for.
    pub fn original_text(&self, synthesized: &str) -> Option<&str> {
        self.originals.get(synthesized).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark identifiers that synthesized names must not collide with.
    pub fn reserve<'a>(&mut self, idents: impl IntoIterator<Item = &'a str>) {
        self.reserved.extend(idents.into_iter().map(str::to_string));
    }

    /// Rewrite every whole identifier in `text` through the table.
    ///
    /// String literals and `//` comments are copied unchanged, matching what
    /// the lexer substitutes.
    pub fn apply(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '/' && chars.get(i + 1) == Some(&'/') {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(chars[i]);
                    i += 1;
                }
                continue;
            }

            if c == '"' {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    let ch = chars[i];
                    out.push(ch);
                    i += 1;
                    if ch == '\\' {
                        if let Some(&escaped) = chars.get(i) {
                            out.push(escaped);
                            i += 1;
                        }
                    } else if ch == '"' {
                        break;
                    }
                }
                continue;
            }

            if is_ident_start(c) {
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match self.lookup(&word) {
                    Some(replacement) => out.push_str(replacement),
                    None => out.push_str(&word),
                }
                continue;
            }

            // Keep exponents such as `1e5` away from identifier lookup.
            if c.is_ascii_digit() {
                let end = number_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }

            out.push(c);
            i += 1;
        }

        out
    }

    fn synthesize(&mut self, text: &str) -> String {
        if let Some(existing) = self.synthesized.get(text) {
            return existing.clone();
        }

        let name = loop {
            self.next_synthetic_id += 1;
            let candidate = format!("{}{}", SYNTHETIC_PREFIX, self.next_synthetic_id);
            if !self.reserved.contains(&candidate) && !self.originals.contains_key(&candidate) {
                break candidate;
            }
        };

        self.synthesized.insert(text.to_string(), name.clone());
        self.originals.insert(name.clone(), text.to_string());
        name
    }
}

/// Result of the preprocessing phase
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Source with directive lines blanked
    pub source: String,
    pub table: SubstitutionTable,
    /// Number of directives seen (including overridden ones)
    pub directives: usize,
}

impl Preprocessed {
    /// Source text with the substitutions applied textually.
    pub fn rewritten_source(&self) -> String {
        self.table.apply(&self.source)
    }
}

/// Collect `replace` directives and strip them from the source.
pub fn preprocess(source: &str) -> Result<Preprocessed, PreprocessError> {
    let mut table = SubstitutionTable::new();
    table.reserve(identifiers(source));

    let mut stripped = String::with_capacity(source.len());
    let mut directives = 0;

    for (index, raw_line) in source.split_inclusive('\n').enumerate() {
        let line_number = index + 1;
        let content = raw_line.trim_end_matches(['\n', '\r']);

        match parse_directive(content, line_number)? {
            Some(directive) => {
                directives += 1;
                table.insert(&directive.from, &directive.to);
                stripped.push_str(&raw_line[content.len()..]);
            }
            None => stripped.push_str(raw_line),
        }
    }

    debug!(
        directives,
        substitutions = table.len(),
        "collected replace directives"
    );

    Ok(Preprocessed {
        source: stripped,
        table,
        directives,
    })
}

struct Directive {
    from: String,
    to: String,
}

/// Cursor over one directive line
struct LineCursor<'a> {
    chars: Vec<char>,
    position: usize,
    line: usize,
    text: &'a str,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str, line: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            position: 0,
            line,
            text,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.position += 1;
        }
    }

    fn identifier(&mut self) -> Option<String> {
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        let start = self.position;
        while self.peek().is_some_and(is_ident_continue) {
            self.position += 1;
        }
        Some(self.chars[start..self.position].iter().collect())
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.position + 1)
    }

    fn error(&self, message: impl Into<String>) -> PreprocessError {
        PreprocessError {
            message: format!("{} in `{}`", message.into(), self.text.trim()),
            location: self.location(),
        }
    }
}

/// `Ok(None)` for ordinary lines, `Ok(Some(..))` for a well-formed directive.
fn parse_directive(line: &str, line_number: usize) -> Result<Option<Directive>, PreprocessError> {
    let mut cursor = LineCursor::new(line, line_number);
    cursor.skip_whitespace();

    match cursor.identifier() {
        Some(word) if word == DIRECTIVE_KEYWORD => {}
        _ => return Ok(None),
    }

    cursor.skip_whitespace();
    let from = cursor
        .identifier()
        .ok_or_else(|| cursor.error("expected identifier after 'replace'"))?;

    cursor.skip_whitespace();
    if cursor.peek() != Some('-') || cursor.chars.get(cursor.position + 1) != Some(&'>') {
        return Err(cursor.error(format!("expected '->' after '{}'", from)));
    }
    cursor.position += 2;

    cursor.skip_whitespace();
    let to = if cursor.peek() == Some('"') {
        cursor.position += 1;
        let start = cursor.position;
        while cursor.peek().is_some_and(|c| c != '"') {
            cursor.position += 1;
        }
        if cursor.peek().is_none() {
            return Err(cursor.error("unterminated string"));
        }
        let text: String = cursor.chars[start..cursor.position].iter().collect();
        cursor.position += 1;
        if text.is_empty() {
            return Err(cursor.error("empty replacement text"));
        }
        text
    } else {
        cursor
            .identifier()
            .ok_or_else(|| cursor.error("expected identifier or string after '->'"))?
    };

    cursor.skip_whitespace();
    let trailing_comment =
        cursor.peek() == Some('/') && cursor.chars.get(cursor.position + 1) == Some(&'/');
    if cursor.peek().is_some() && !trailing_comment {
        return Err(cursor.error("unexpected text after replacement"));
    }

    Ok(Some(Directive { from, to }))
}

/// End of the numeric literal starting at `start`, scanned like the lexer does.
fn number_end(chars: &[char], start: usize) -> usize {
    let digit_at = |i: usize| chars.get(i).is_some_and(|c| c.is_ascii_digit());
    let mut i = start;
    while digit_at(i) {
        i += 1;
    }
    if chars.get(i) == Some(&'.') && digit_at(i + 1) {
        i += 1;
        while digit_at(i) {
            i += 1;
        }
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        i += 1;
        if matches!(chars.get(i), Some('+') | Some('-')) {
            i += 1;
        }
        while digit_at(i) {
            i += 1;
        }
    }
    i
}

fn identifiers(source: &str) -> impl Iterator<Item = &str> {
    source
        .split(|c: char| !is_ident_continue(c))
        .filter(|word| word.chars().next().is_some_and(is_ident_start))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Plain ASCII identifier (the only replacement text used verbatim).
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}
