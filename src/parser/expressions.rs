//! Expression parsing implementation
//!
//! Expressions are parsed by recursive descent over six levels, loosest
//! first:
//!
//! 1. Equality: `==`, `!=`
//! 2. Comparison: `<`, `<=`, `>`, `>=`
//! 3. Addition: `+`, `-`
//! 4. Multiplication: `*`, `/`, `%`
//! 5. Unary prefix: `!`, `-`, `~`
//! 6. Primary: literals, names, calls, `( ... )`, `{ ... }` array literals,
//!    followed by any number of `[index]` postfixes
//!
//! The right operand of a binary level is parsed at that *same* level, so
//! equal-precedence runs nest to the right: `a - b - c` is `a - (b - c)`.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse an expression (entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.nested(|parser| {
            Ok(Expression {
                equality: parser.parse_equality()?,
            })
        })
    }

    fn parse_equality(&mut self) -> Result<Equality, ParseError> {
        self.parse_chain(Self::parse_comparison, |kind| match kind {
            TokenKind::EqEq => Some(EqualityOp::Eq),
            TokenKind::NotEq => Some(EqualityOp::Ne),
            _ => None,
        })
    }

    fn parse_comparison(&mut self) -> Result<Comparison, ParseError> {
        self.parse_chain(Self::parse_addition, |kind| match kind {
            TokenKind::Lt => Some(ComparisonOp::Lt),
            TokenKind::Le => Some(ComparisonOp::Le),
            TokenKind::Gt => Some(ComparisonOp::Gt),
            TokenKind::Ge => Some(ComparisonOp::Ge),
            _ => None,
        })
    }

    fn parse_addition(&mut self) -> Result<Addition, ParseError> {
        self.parse_chain(Self::parse_multiplication, |kind| match kind {
            TokenKind::Plus => Some(AdditionOp::Add),
            TokenKind::Minus => Some(AdditionOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplication(&mut self) -> Result<Multiplication, ParseError> {
        self.parse_chain(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(MultiplicationOp::Mul),
            TokenKind::Slash => Some(MultiplicationOp::Div),
            TokenKind::Percent => Some(MultiplicationOp::Mod),
            _ => None,
        })
    }

    /// `operand (op chain)?` where the right-hand chain is this same level.
    fn parse_chain<Operand, Op>(
        &mut self,
        operand: fn(&mut Self) -> Result<Operand, ParseError>,
        operator: fn(TokenKind) -> Option<Op>,
    ) -> Result<BinaryChain<Operand, Op>, ParseError> {
        self.nested(|parser| {
            let left = operand(parser)?;

            let Some(op) = operator(parser.peek().kind) else {
                return Ok(BinaryChain::single(left));
            };
            parser.advance();

            let right = parser.parse_chain(operand, operator)?;
            Ok(BinaryChain {
                left,
                rest: Some((op, Box::new(right))),
            })
        })
    }

    fn parse_unary(&mut self) -> Result<Unary, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return Ok(Unary::Primary(self.parse_primary()?)),
        };

        let location = self.current_location();
        self.advance();

        if op == UnaryOp::Neg {
            if let Some(primary) = self.negated_int_min(location) {
                return Ok(Unary::Primary(primary));
            }
        }

        let operand = self.nested(Self::parse_unary)?;
        Ok(Unary::Prefix {
            op,
            operand: Box::new(operand),
            location,
        })
    }

    /// `-9223372036854775808` only fits in 64 bits as one negative literal.
    fn negated_int_min(&mut self, location: SourceLocation) -> Option<Primary> {
        let token = self.peek();
        if token.kind != TokenKind::Int || token.literal.parse::<i64>().is_ok() {
            return None;
        }
        let value = format!("-{}", token.literal).parse::<i64>().ok()?;
        self.advance();

        Some(Primary {
            base: PrimaryBase::Int(value),
            postfixes: Vec::new(),
            location,
        })
    }

    /// Primary base plus trailing `[index]` postfixes.
    pub(crate) fn parse_primary(&mut self) -> Result<Primary, ParseError> {
        let location = self.current_location();
        let base = self.parse_primary_base()?;

        let mut postfixes = Vec::new();
        while self.match_token(TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect_token(TokenKind::RBracket, "Expected ']' after index")?;
            postfixes.push(Postfix::Index(index));
        }

        Ok(Primary {
            base,
            postfixes,
            location,
        })
    }

    fn parse_primary_base(&mut self) -> Result<PrimaryBase, ParseError> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Int => {
                self.advance();
                token.literal.parse::<i64>().map(PrimaryBase::Int).map_err(|_| ParseError {
                    message: format!("Integer literal {} does not fit in 64 bits", token.literal),
                    location: token.location,
                    found: TokenKind::Int,
                    expected: Vec::new(),
                })
            }
            TokenKind::Float => {
                self.advance();
                token.literal.parse::<f64>().map(PrimaryBase::Float).map_err(|_| ParseError {
                    message: format!("Malformed float literal {}", token.literal),
                    location: token.location,
                    found: TokenKind::Float,
                    expected: Vec::new(),
                })
            }
            TokenKind::String => {
                self.advance();
                Ok(PrimaryBase::String(token.literal))
            }
            TokenKind::Bool => {
                self.advance();
                Ok(PrimaryBase::Bool(token.literal == "true"))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(PrimaryBase::Nil)
            }
            TokenKind::Ident => {
                if self.peek_ahead(1).map(|t| t.kind) == Some(TokenKind::LParen) {
                    Ok(PrimaryBase::Call(self.parse_function_call()?))
                } else {
                    let name = self.expect_identifier("")?;
                    Ok(PrimaryBase::Ident(name))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(PrimaryBase::Paren(Box::new(inner)))
            }
            TokenKind::LBrace => {
                self.advance();
                let elements = self.parse_argument_list(TokenKind::RBrace)?;
                self.expect_token(TokenKind::RBrace, "Expected '}' after array elements")?;
                Ok(PrimaryBase::Array(elements))
            }
            _ => Err(self.error_expected(&[], "Expected expression")),
        }
    }

    /// `name(args)`
    pub(crate) fn parse_function_call(&mut self) -> Result<FunctionCall, ParseError> {
        let location = self.current_location();
        let name = self.expect_identifier("for function name")?;
        self.expect_lparen("after function name")?;
        let args = self.parse_argument_list(TokenKind::RParen)?;
        self.expect_rparen("after arguments")?;

        Ok(FunctionCall {
            name,
            args,
            location,
        })
    }

    /// Comma-separated expressions up to (not including) `close`.
    fn parse_argument_list(&mut self, close: TokenKind) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        if self.check(close) {
            return Ok(items);
        }

        loop {
            items.push(self.parse_expression()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::{ParseError, Parser};

    fn expr(source: &str) -> Expression {
        Parser::new(source).unwrap().parse_standalone_expression().unwrap()
    }

    fn expr_err(source: &str) -> Vec<ParseError> {
        Parser::new(source).unwrap().parse_standalone_expression().unwrap_err()
    }

    #[test]
    fn test_same_level_runs_nest_right() {
        assert_eq!(expr("a - b - c").to_string(), "(a - (b - c))");
        assert_eq!(expr("a / b * c").to_string(), "(a / (b * c))");
        assert_eq!(expr("a == b != c").to_string(), "(a == (b != c))");
    }

    #[test]
    fn test_precedence_levels() {
        assert_eq!(expr("1 + 2 * 3").to_string(), "(1 + (2 * 3))");
        assert_eq!(expr("a < b + 1 == c").to_string(), "((a < (b + 1)) == c)");
        assert_eq!(expr("-x * ~y").to_string(), "(-x * ~y)");
        assert_eq!(expr("!!done").to_string(), "!!done");
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(expr("(1 + 2) * 3").to_string(), "((1 + 2) * 3)");
        assert_eq!(expr("(a - b) - c").to_string(), "((a - b) - c)");
        assert_eq!(expr("(x)").to_string(), "(x)");
    }

    #[test]
    fn test_primaries() {
        assert_eq!(expr("max(a, b[i][j], 2.5)").to_string(), "max(a, b[i][j], 2.5)");
        assert_eq!(expr("{1, 2, {3}}").to_string(), "{1, 2, {3}}");
        assert_eq!(expr("{}").to_string(), "{}");
        assert_eq!(expr("\"hi\\n\"").to_string(), "\"hi\\n\"");
        assert_eq!(expr("nil == false").to_string(), "(nil == false)");
        assert_eq!(expr("f()").to_string(), "f()");
    }

    #[test]
    fn test_lone_primary_is_not_binary() {
        let e = expr("items[0]");
        assert!(!e.is_binary());
        let primary = e.as_primary().unwrap();
        assert_eq!(primary.postfixes.len(), 1);
        assert!(matches!(&primary.base, PrimaryBase::Ident(id) if id.as_str() == "items"));

        assert!(expr("a + 0").is_binary());
        assert!(expr("-a").as_primary().is_none());
    }

    #[test]
    fn test_integer_overflow_is_a_syntax_error() {
        let errors = expr_err("99999999999999999999");
        assert_eq!(errors[0].found, TokenKind::Int);
        assert!(errors[0].message.contains("does not fit"));
        assert_eq!(expr("9223372036854775807").to_string(), "9223372036854775807");
    }

    #[test]
    fn test_most_negative_integer_literal() {
        let e = expr("-9223372036854775808");
        assert_eq!(e.to_string(), "-9223372036854775808");
        match e.as_primary().map(|p| &p.base) {
            Some(PrimaryBase::Int(value)) => assert_eq!(*value, i64::MIN),
            other => panic!("Expected integer literal, got {:?}", other),
        }

        assert!(expr_err("-9223372036854775809")[0].message.contains("does not fit"));
        assert!(expr("-5").as_primary().is_none());
        assert_eq!(expr("1 - 9223372036854775807").to_string(), "(1 - 9223372036854775807)");
    }

    #[test]
    fn test_long_chain_hits_nesting_limit() {
        let chain = vec!["1"; 10_000].join(" + ");
        let errors = expr_err(&chain);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Nesting too deep"));
        assert_eq!(errors[0].found, TokenKind::Int);

        let negations = format!("{}x", "-".repeat(10_000));
        assert!(expr_err(&negations)[0].message.starts_with("Nesting too deep"));
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let chain = vec!["a"; 80].join(" - ");
        assert!(expr(&chain).is_binary());

        let parens = format!("{}x{}", "(".repeat(15), ")".repeat(15));
        assert_eq!(expr(&parens).to_string(), parens);
    }

    #[test]
    fn test_missing_operand() {
        let errors = expr_err("1 + ");
        assert_eq!(errors[0].found, TokenKind::Eof);
        assert!(errors[0].message.starts_with("Expected expression"));

        let errors = expr_err("f(1, 2");
        assert_eq!(errors[0].expected, vec![TokenKind::RParen]);
    }
}
