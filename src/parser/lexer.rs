//! Lexer (tokenizer) for klang source code
//!
//! Converts preprocessed source text into a flat [`Token`] stream consumed by
//! the parser. Identifiers are passed through the unit's
//! [`SubstitutionTable`] before the keyword check, so a `replace` directive
//! whose target is a keyword turns the aliased word into that keyword.
//!
//! Lexical errors never abort the scan: they come out as
//! [`TokenKind::Invalid`] tokens carrying a [`LexErrorKind`], and the parser
//! reports them like any other unexpected token.

use super::ast::SourceLocation;
use super::preprocess::SubstitutionTable;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Token classes produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Invalid,

    // Identifiers and literals
    Ident,
    Int,
    Float,
    String,
    Bool,

    // Keywords
    Var,
    Fun,
    Define,
    Return,
    If,
    Else,
    In,
    Range,
    For,
    While,
    Break,
    Continue,
    Struct,
    Type,
    Nil,

    // Assignment
    Assign,        // =
    PlusAssign,    // +=
    MinusAssign,   // -=
    StarAssign,    // *=
    SlashAssign,   // /=
    PercentAssign, // %=
    AmpAssign,     // &=
    PipeAssign,    // |=
    CaretAssign,   // ^=
    ShlAssign,     // <<=
    ShrAssign,     // >>=

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Bitwise
    Amp,   // &
    Pipe,  // |
    Caret, // ^
    Tilde, // ~
    Shl,   // <<
    Shr,   // >>

    // Logical
    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    // Punctuation
    Arrow,     // ->
    Colon,     // :
    Semicolon, // ;
    Comma,     // ,
    Dot,       // .
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        keyword_spelling(self).is_some()
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(word) = keyword_spelling(*self) {
            return write!(f, "'{}'", word);
        }
        let text = match self {
            TokenKind::Eof => "end of file",
            TokenKind::Invalid => "invalid token",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::String => "string literal",
            TokenKind::Bool => "boolean literal",
            TokenKind::Assign => "'='",
            TokenKind::PlusAssign => "'+='",
            TokenKind::MinusAssign => "'-='",
            TokenKind::StarAssign => "'*='",
            TokenKind::SlashAssign => "'/='",
            TokenKind::PercentAssign => "'%='",
            TokenKind::AmpAssign => "'&='",
            TokenKind::PipeAssign => "'|='",
            TokenKind::CaretAssign => "'^='",
            TokenKind::ShlAssign => "'<<='",
            TokenKind::ShrAssign => "'>>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Tilde => "'~'",
            TokenKind::Shl => "'<<'",
            TokenKind::Shr => "'>>'",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Arrow => "'->'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            _ => unreachable!("keywords are handled above"),
        };
        f.write_str(text)
    }
}

/// Keyword table, consulted with the substituted spelling.
pub fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "var" => TokenKind::Var,
        "fun" => TokenKind::Fun,
        "define" => TokenKind::Define,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "in" => TokenKind::In,
        "range" => TokenKind::Range,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "struct" => TokenKind::Struct,
        "type" => TokenKind::Type,
        "nil" => TokenKind::Nil,
        "true" | "false" => TokenKind::Bool,
        _ => return None,
    };
    Some(kind)
}

fn keyword_spelling(kind: TokenKind) -> Option<&'static str> {
    let word = match kind {
        TokenKind::Var => "var",
        TokenKind::Fun => "fun",
        TokenKind::Define => "define",
        TokenKind::Return => "return",
        TokenKind::If => "if",
        TokenKind::Else => "else",
        TokenKind::In => "in",
        TokenKind::Range => "range",
        TokenKind::For => "for",
        TokenKind::While => "while",
        TokenKind::Break => "break",
        TokenKind::Continue => "continue",
        TokenKind::Struct => "struct",
        TokenKind::Type => "type",
        TokenKind::Nil => "nil",
        _ => return None,
    };
    Some(word)
}

/// Why a token came out as [`TokenKind::Invalid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("malformed number: exponent has no digits")]
    MalformedExponent,
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
    #[error("'\\x' escape needs two hex digits")]
    BadHexEscape,
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
}

/// A lexed token. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Text after substitution; decoded contents for string literals.
    pub literal: String,
    pub location: SourceLocation,
    /// Spelling in the source when a substitution rewrote this identifier
    pub original: Option<String>,
    /// Replacement text behind a synthesized identifier
    pub display: Option<String>,
    pub error: Option<LexErrorKind>,
}

impl Token {
    fn new(kind: TokenKind, literal: impl Into<String>, location: SourceLocation) -> Self {
        Token {
            kind,
            literal: literal.into(),
            location,
            original: None,
            display: None,
            error: None,
        }
    }

    fn invalid(error: LexErrorKind, literal: impl Into<String>, location: SourceLocation) -> Self {
        Token {
            error: Some(error),
            ..Token::new(TokenKind::Invalid, literal, location)
        }
    }

    /// Spelling to show the user: the replacement text behind a synthesized
    /// name, otherwise the literal.
    pub fn spelling(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.literal)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "identifier '{}'", self.spelling())?,
            TokenKind::Int | TokenKind::Float => write!(f, "{} {}", self.kind, self.literal)?,
            TokenKind::String => write!(f, "string literal {:?}", self.literal)?,
            TokenKind::Bool => write!(f, "'{}'", self.literal)?,
            TokenKind::Invalid => match self.error {
                Some(error) => write!(f, "invalid token '{}' ({})", self.literal, error)?,
                None => write!(f, "invalid token '{}'", self.literal)?,
            },
            kind => write!(f, "{}", kind)?,
        }
        if let Some(original) = &self.original {
            write!(f, " (written as '{}')", original)?;
        }
        Ok(())
    }
}

/// Single forward pass over preprocessed source
pub struct Lexer<'t> {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    table: &'t SubstitutionTable,
    finished: bool,
}

impl<'t> Lexer<'t> {
    /// Create a new lexer; identifiers are rewritten through `table`.
    pub fn new(input: &str, table: &'t SubstitutionTable) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            table,
            finished: false,
        }
    }

    /// Tokenize the entire input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        debug!(tokens = tokens.len(), "tokenized source");
        tokens
    }

    /// Next token; keeps returning `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let loc = self.current_location();
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, "", loc);
        };

        match ch {
            '"' => self.string_literal(loc),
            '0'..='9' => self.number_literal(loc),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(loc),

            '=' => self.operator(loc, "=", TokenKind::Assign, &[("=", TokenKind::EqEq)]),
            '+' => self.operator(loc, "+", TokenKind::Plus, &[("=", TokenKind::PlusAssign)]),
            '-' => self.operator(
                loc,
                "-",
                TokenKind::Minus,
                &[(">", TokenKind::Arrow), ("=", TokenKind::MinusAssign)],
            ),
            '*' => self.operator(loc, "*", TokenKind::Star, &[("=", TokenKind::StarAssign)]),
            '/' => self.operator(loc, "/", TokenKind::Slash, &[("=", TokenKind::SlashAssign)]),
            '%' => self.operator(loc, "%", TokenKind::Percent, &[("=", TokenKind::PercentAssign)]),
            '&' => self.operator(
                loc,
                "&",
                TokenKind::Amp,
                &[("=", TokenKind::AmpAssign), ("&", TokenKind::AndAnd)],
            ),
            '|' => self.operator(
                loc,
                "|",
                TokenKind::Pipe,
                &[("=", TokenKind::PipeAssign), ("|", TokenKind::OrOr)],
            ),
            '^' => self.operator(loc, "^", TokenKind::Caret, &[("=", TokenKind::CaretAssign)]),
            '<' => self.operator(
                loc,
                "<",
                TokenKind::Lt,
                &[
                    ("=", TokenKind::Le),
                    ("<=", TokenKind::ShlAssign),
                    ("<", TokenKind::Shl),
                ],
            ),
            '>' => self.operator(
                loc,
                ">",
                TokenKind::Gt,
                &[
                    ("=", TokenKind::Ge),
                    (">=", TokenKind::ShrAssign),
                    (">", TokenKind::Shr),
                ],
            ),
            '!' => self.operator(loc, "!", TokenKind::Bang, &[("=", TokenKind::NotEq)]),

            '~' => Token::new(TokenKind::Tilde, "~", loc),
            ':' => Token::new(TokenKind::Colon, ":", loc),
            ';' => Token::new(TokenKind::Semicolon, ";", loc),
            ',' => Token::new(TokenKind::Comma, ",", loc),
            '.' => Token::new(TokenKind::Dot, ".", loc),
            '(' => Token::new(TokenKind::LParen, "(", loc),
            ')' => Token::new(TokenKind::RParen, ")", loc),
            '{' => Token::new(TokenKind::LBrace, "{", loc),
            '}' => Token::new(TokenKind::RBrace, "}", loc),
            '[' => Token::new(TokenKind::LBracket, "[", loc),
            ']' => Token::new(TokenKind::RBracket, "]", loc),

            other => Token::invalid(LexErrorKind::UnexpectedCharacter(other), other, loc),
        }
    }

    /// Longest-match operator: `follow` lists continuations in the order they
    /// are tried, and the first one that matches wins.
    fn operator(
        &mut self,
        loc: SourceLocation,
        lead: &str,
        single: TokenKind,
        follow: &[(&str, TokenKind)],
    ) -> Token {
        for (rest, kind) in follow {
            if self.lookahead_is(rest) {
                for _ in rest.chars() {
                    self.advance();
                }
                return Token::new(*kind, format!("{}{}", lead, rest), loc);
            }
        }
        Token::new(single, lead, loc)
    }

    fn lookahead_is(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, expected)| self.peek_ahead(i) == Some(expected))
    }

    /// Parse string literal (opening quote already consumed)
    fn string_literal(&mut self, loc: SourceLocation) -> Token {
        let mut value = String::new();
        let mut error = None;

        while let Some(ch) = self.advance() {
            match ch {
                '"' => {
                    return match error {
                        Some(error) => Token::invalid(error, value, loc),
                        None => Token::new(TokenKind::String, value, loc),
                    };
                }
                '\\' => match self.escape_sequence() {
                    Ok(decoded) => value.push(decoded),
                    // Keep scanning to the closing quote so the rest of the
                    // line does not lex as garbage.
                    Err(kind) => {
                        error.get_or_insert(kind);
                    }
                },
                _ => value.push(ch),
            }
        }

        Token::invalid(LexErrorKind::UnterminatedString, value, loc)
    }

    /// Decode the escape after a backslash
    fn escape_sequence(&mut self) -> Result<char, LexErrorKind> {
        let escaped = self.advance().ok_or(LexErrorKind::UnterminatedString)?;
        let decoded = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            'x' => {
                let hi = self.peek().and_then(|c| c.to_digit(16));
                let lo = self.peek_ahead(1).and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        self.advance();
                        self.advance();
                        char::from((hi * 16 + lo) as u8)
                    }
                    _ => return Err(LexErrorKind::BadHexEscape),
                }
            }
            other => return Err(LexErrorKind::UnknownEscape(other)),
        };
        Ok(decoded)
    }

    /// Integer or float literal (first digit already consumed).
    ///
    /// A fraction needs a digit after the dot; an exponent is `e`/`E`, an
    /// optional sign and at least one digit.
    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let start = self.position - 1;
        let mut is_float = false;

        self.consume_digits();

        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_digits();
            is_float = true;
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Token::invalid(LexErrorKind::MalformedExponent, self.text_from(start), loc);
            }
            self.consume_digits();
            is_float = true;
        }

        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        Token::new(kind, self.text_from(start), loc)
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Identifier, substituted and then checked against the keyword table
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Token {
        let start = self.position - 1;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let written = self.text_from(start);

        let mut token = match self.table.lookup(&written) {
            Some(replacement) => {
                let mut token = Token::new(TokenKind::Ident, replacement, loc);
                token.display = self.table.original_text(replacement).map(str::to_string);
                token.original = Some(written);
                token
            }
            None => Token::new(TokenKind::Ident, written, loc),
        };

        if let Some(kind) = keyword(&token.literal) {
            token.kind = kind;
        }
        token
    }

    /// Skip whitespace and `//` comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Yields every token up to and including the first `Eof`.
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = token.kind == TokenKind::Eof;
        Some(token)
    }
}

/// Tokenize `source` with no substitutions.
pub fn tokenize(source: &str) -> Vec<Token> {
    let table = SubstitutionTable::new();
    Lexer::new(source, &table).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::preprocess::preprocess;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = tokenize("fun main() -> int { return 0 }");
        let expected = [
            TokenKind::Fun,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Arrow,
            TokenKind::Ident,
            TokenKind::LBrace,
            TokenKind::Return,
            TokenKind::Int,
            TokenKind::RBrace,
            TokenKind::Eof,
        ];
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), expected);
        assert_eq!(tokens[1].literal, "main");
        assert_eq!(tokens[5].literal, "int");
    }

    #[test]
    fn test_compound_assignment_is_one_token() {
        let tokens = tokenize("a+=1");
        assert_eq!(tokens.len(), 4);
        assert_eq!((tokens[0].kind, tokens[0].literal.as_str()), (TokenKind::Ident, "a"));
        assert_eq!((tokens[1].kind, tokens[1].literal.as_str()), (TokenKind::PlusAssign, "+="));
        assert_eq!((tokens[2].kind, tokens[2].literal.as_str()), (TokenKind::Int, "1"));
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== = -> -= - &= && & |= || | <= <<= << < >= >>= >> > != ! ^= ^ %= ~"),
            vec![
                TokenKind::EqEq,
                TokenKind::Assign,
                TokenKind::Arrow,
                TokenKind::MinusAssign,
                TokenKind::Minus,
                TokenKind::AmpAssign,
                TokenKind::AndAnd,
                TokenKind::Amp,
                TokenKind::PipeAssign,
                TokenKind::OrOr,
                TokenKind::Pipe,
                TokenKind::Le,
                TokenKind::ShlAssign,
                TokenKind::Shl,
                TokenKind::Lt,
                TokenKind::Ge,
                TokenKind::ShrAssign,
                TokenKind::Shr,
                TokenKind::Gt,
                TokenKind::NotEq,
                TokenKind::Bang,
                TokenKind::CaretAssign,
                TokenKind::Caret,
                TokenKind::PercentAssign,
                TokenKind::Tilde,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.14 1e10 2.5E-3 7e+2 5. x");
        assert_eq!((tokens[0].kind, tokens[0].literal.as_str()), (TokenKind::Int, "42"));
        assert_eq!((tokens[1].kind, tokens[1].literal.as_str()), (TokenKind::Float, "3.14"));
        assert_eq!((tokens[2].kind, tokens[2].literal.as_str()), (TokenKind::Float, "1e10"));
        assert_eq!((tokens[3].kind, tokens[3].literal.as_str()), (TokenKind::Float, "2.5E-3"));
        assert_eq!((tokens[4].kind, tokens[4].literal.as_str()), (TokenKind::Float, "7e+2"));
        // No digit after the dot: integer followed by '.'
        assert_eq!(tokens[5].kind, TokenKind::Int);
        assert_eq!(tokens[6].kind, TokenKind::Dot);
        assert_eq!(tokens[7].kind, TokenKind::Ident);
    }

    #[test]
    fn test_exponent_without_digits_is_invalid() {
        let tokens = tokenize("1e");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert_eq!(tokens[0].literal, "1e");
        assert_eq!(tokens[0].error, Some(LexErrorKind::MalformedExponent));

        let tokens = tokenize("2e+;");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_string_literal_escapes() {
        let tokens = tokenize(r#""a\tb\n\x41\"q\"""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].literal, "a\tb\nA\"q\"");
    }

    #[test]
    fn test_bad_escapes_are_invalid() {
        let tokens = tokenize(r#""\q" "\xZ1" x"#);
        assert_eq!(tokens[0].error, Some(LexErrorKind::UnknownEscape('q')));
        assert_eq!(tokens[1].error, Some(LexErrorKind::BadHexEscape));
        assert_eq!(tokens[2].kind, TokenKind::Ident);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("var s = \"never closed");
        assert_eq!(tokens[3].kind, TokenKind::Invalid);
        assert_eq!(tokens[3].error, Some(LexErrorKind::UnterminatedString));
        assert_eq!(tokens[3].location, SourceLocation::new(1, 9));
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_comments_and_locations() {
        let tokens = tokenize("var x // comment\n  x /= 2");
        assert_eq!(tokens[0].location, SourceLocation::new(1, 1));
        assert_eq!(tokens[1].location, SourceLocation::new(1, 5));
        assert_eq!(tokens[2].location, SourceLocation::new(2, 3));
        assert_eq!(tokens[3].kind, TokenKind::SlashAssign);
        assert_eq!(tokens[3].location, SourceLocation::new(2, 5));
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(
            kinds("var fun define return if else in range for while break continue struct type nil true false"),
            vec![
                TokenKind::Var,
                TokenKind::Fun,
                TokenKind::Define,
                TokenKind::Return,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::In,
                TokenKind::Range,
                TokenKind::For,
                TokenKind::While,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Struct,
                TokenKind::Type,
                TokenKind::Nil,
                TokenKind::Bool,
                TokenKind::Bool,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let tokens = tokenize("a @ b");
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].error, Some(LexErrorKind::UnexpectedCharacter('@')));
        assert_eq!(tokens[2].literal, "b");
    }

    #[test]
    fn test_substitution_keeps_original_spelling() {
        let pre = preprocess("replace foo -> bar\nfoo(1)").unwrap();
        let tokens = Lexer::new(&pre.source, &pre.table).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].literal, "bar");
        assert_eq!(tokens[0].original.as_deref(), Some("foo"));
        assert_eq!(tokens[0].location, SourceLocation::new(2, 1));
    }

    #[test]
    fn test_substitution_can_alias_keywords() {
        let pre = preprocess("replace fn -> fun\nreplace loop -> while\nfn f() { loop x {} }").unwrap();
        let tokens = Lexer::new(&pre.source, &pre.table).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Fun);
        assert_eq!(tokens[0].original.as_deref(), Some("fn"));
        assert_eq!(tokens[5].kind, TokenKind::While);
    }

    #[test]
    fn test_synthesized_identifier_displays_original_text() {
        let pre = preprocess("replace x -> \"ñu\"\nx").unwrap();
        let tokens = Lexer::new(&pre.source, &pre.table).tokenize();
        assert_eq!(tokens[0].literal, "unicode_id_1");
        assert_eq!(tokens[0].spelling(), "ñu");
        assert_eq!(tokens[0].to_string(), "identifier 'ñu' (written as 'x')");
    }

    #[test]
    fn test_iterator_stops_after_eof() {
        let table = SubstitutionTable::new();
        let collected: Vec<Token> = Lexer::new("a b", &table).collect();
        assert_eq!(collected.len(), 3);
        assert_eq!(collected[2].kind, TokenKind::Eof);
    }
}
