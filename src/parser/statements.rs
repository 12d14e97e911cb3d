//! Statement parsing implementation
//!
//! This module handles parsing of all statement types in klang:
//! - Local variables: `var x: int = 5`
//! - Control flow: `if`/`else if`/`else`, `while`, `for ... in range(a, b)`
//! - Jump statements: `return`, `break`, `continue`
//! - Assignments, including compound operators and `*p = ...` through pointers
//! - Calls and bare expressions
//!
//! Statement terminators are optional: a `;` after a statement is consumed
//! when present.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use tracing::trace;

impl Parser {
    /// Parse a braced block.
    ///
    /// A statement that fails to parse is recorded and the block resumes at
    /// the next statement boundary. Hitting end of input before the closing
    /// `}` fails the whole block.
    pub(crate) fn parse_block(&mut self, ctx: &str) -> Result<Block, ParseError> {
        self.nested(|parser| parser.parse_block_contents(ctx))
    }

    fn parse_block_contents(&mut self, ctx: &str) -> Result<Block, ParseError> {
        let location = self.current_location();
        self.expect_lbrace(ctx)?;

        let mut statements = Vec::new();
        loop {
            if self.match_token(TokenKind::RBrace) {
                break;
            }
            if self.is_at_end() {
                return Err(ParseError {
                    message: format!(
                        "Unterminated block opened at line {}, column {}: expected '}}' before end of file",
                        location.line, location.column
                    ),
                    location: self.current_location(),
                    found: TokenKind::Eof,
                    expected: vec![TokenKind::RBrace],
                });
            }
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }

            let before = self.position;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                // A nested block already ran out of input.
                Err(err) if is_unterminated(&err) => return Err(err),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize_statement();
                    if self.position == before {
                        self.advance();
                    }
                }
            }
        }

        trace!(statements = statements.len(), "parsed block");
        Ok(Block {
            statements,
            location,
        })
    }

    /// Parse a single statement
    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek().kind {
            TokenKind::Var => {
                let decl = self.parse_var_declaration()?;
                self.skip_terminator();
                Ok(Statement::Var(decl))
            }
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::For => Ok(Statement::For(self.parse_for_loop()?)),
            TokenKind::While => Ok(Statement::While(self.parse_while_loop()?)),
            TokenKind::If => Ok(Statement::If(self.parse_if_statement()?)),
            TokenKind::Break => {
                let location = self.current_location();
                self.advance();
                self.skip_terminator();
                Ok(Statement::Break(location))
            }
            TokenKind::Continue => {
                let location = self.current_location();
                self.advance();
                self.skip_terminator();
                Ok(Statement::Continue(location))
            }
            TokenKind::Star => self.parse_deref_assignment(),
            _ => self.parse_expression_statement(),
        }
    }

    /// `return` with a value only when the next token can begin an expression.
    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.current_location();
        self.advance(); // 'return'

        let value = if starts_expression(self.peek().kind) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.skip_terminator();

        Ok(Statement::Return(ReturnStmt { value, location }))
    }

    /// `for i in range(start, end) { ... }`
    pub(crate) fn parse_for_loop(&mut self) -> Result<ForLoop, ParseError> {
        let location = self.current_location();
        self.advance(); // 'for'

        let iterator = self.expect_identifier("for loop variable")?;
        self.expect_token(TokenKind::In, "Expected 'in' after loop variable")?;
        self.expect_token(TokenKind::Range, "Expected 'range' after 'in'")?;
        self.expect_lparen("after 'range'")?;
        let start = self.parse_expression()?;
        self.expect_token(TokenKind::Comma, "Expected ',' between range start and end")?;
        let end = self.parse_expression()?;
        self.expect_rparen("after range bounds")?;

        let body = self.parse_block("before loop body")?;

        Ok(ForLoop {
            iterator,
            start,
            end,
            body,
            location,
        })
    }

    pub(crate) fn parse_while_loop(&mut self) -> Result<WhileLoop, ParseError> {
        let location = self.current_location();
        self.advance(); // 'while'

        let condition = self.parse_expression()?;
        let body = self.parse_block("after while condition")?;

        Ok(WhileLoop {
            condition,
            body,
            location,
        })
    }

    /// `if cond { ... }` with any number of `else if` links and an optional
    /// final `else`.
    pub(crate) fn parse_if_statement(&mut self) -> Result<IfStatement, ParseError> {
        let location = self.current_location();
        self.advance(); // 'if'

        let condition = self.parse_expression()?;
        let body = self.parse_block("after if condition")?;

        let else_branch = if self.match_token(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(ElseBranch::If(Box::new(self.parse_if_statement()?)))
            } else {
                Some(ElseBranch::Block(self.parse_block("after 'else'")?))
            }
        } else {
            None
        };

        Ok(IfStatement {
            condition,
            body,
            else_branch,
            location,
        })
    }

    /// `*p = v`, `**pp += v`
    fn parse_deref_assignment(&mut self) -> Result<Statement, ParseError> {
        let location = self.current_location();

        let mut depth = 0;
        while self.match_token(TokenKind::Star) {
            depth += 1;
        }
        let target = self.parse_primary()?;

        let Some(op) = assign_op(self.peek().kind) else {
            return Err(self.error_expected(
                &[TokenKind::Assign],
                "Expected assignment after dereferenced target",
            ));
        };
        self.advance();

        let value = self.parse_expression()?;
        self.skip_terminator();

        Ok(Statement::Assignment(Assignment {
            target: LValue::Deref { depth, target },
            op,
            value,
            location,
        }))
    }

    /// Assignment, call or bare expression.
    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.current_location();
        let expr = self.parse_expression()?;

        if let Some(op) = assign_op(self.peek().kind) {
            let target = self.assignment_target(expr)?;
            self.advance();

            let value = self.parse_expression()?;
            self.skip_terminator();

            return Ok(Statement::Assignment(Assignment {
                target,
                op,
                value,
                location,
            }));
        }

        self.skip_terminator();

        let is_call = matches!(
            expr.as_primary(),
            Some(Primary { base: PrimaryBase::Call(_), postfixes, .. }) if postfixes.is_empty()
        );
        if is_call {
            if let Some(Primary {
                base: PrimaryBase::Call(call),
                ..
            }) = expr.clone().into_primary()
            {
                return Ok(Statement::Call(call));
            }
        }

        Ok(Statement::Expression(expr))
    }

    /// Narrow an already-parsed expression to something assignable: a bare
    /// name or a name with index postfixes. The parser sits on the operator.
    fn assignment_target(&self, expr: Expression) -> Result<LValue, ParseError> {
        let location = expr.location();
        let rendered = expr.to_string();

        let invalid = || ParseError {
            message: format!("Invalid assignment target '{}'", rendered),
            location,
            found: self.peek().kind,
            expected: Vec::new(),
        };

        let Some(primary) = expr.into_primary() else {
            return Err(invalid());
        };
        let PrimaryBase::Ident(base) = primary.base else {
            return Err(invalid());
        };

        if primary.postfixes.is_empty() {
            return Ok(LValue::Ident(base));
        }

        let indices = primary
            .postfixes
            .into_iter()
            .map(|postfix| match postfix {
                Postfix::Index(index) => index,
            })
            .collect();
        Ok(LValue::Index { base, indices })
    }
}

fn is_unterminated(err: &ParseError) -> bool {
    err.found == TokenKind::Eof && err.expected == [TokenKind::RBrace]
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::Add,
        TokenKind::MinusAssign => AssignOp::Sub,
        TokenKind::StarAssign => AssignOp::Mul,
        TokenKind::SlashAssign => AssignOp::Div,
        TokenKind::PercentAssign => AssignOp::Mod,
        TokenKind::AmpAssign => AssignOp::BitAnd,
        TokenKind::PipeAssign => AssignOp::BitOr,
        TokenKind::CaretAssign => AssignOp::BitXor,
        TokenKind::ShlAssign => AssignOp::Shl,
        TokenKind::ShrAssign => AssignOp::Shr,
        _ => return None,
    };
    Some(op)
}

fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::String
            | TokenKind::Bool
            | TokenKind::Nil
            | TokenKind::LParen
            | TokenKind::LBrace
            | TokenKind::Bang
            | TokenKind::Minus
            | TokenKind::Tilde
            | TokenKind::Invalid
    )
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::{ParseError, Parser};

    fn body(source: &str) -> Vec<Statement> {
        let wrapped = format!("fun main() {{\n{}\n}}", source);
        let program = Parser::new(&wrapped).unwrap().parse_program().unwrap();
        match program.declarations.into_iter().next() {
            Some(Declaration::Function(def)) => def.body.statements,
            other => panic!("Expected function, got {:?}", other),
        }
    }

    fn body_errors(source: &str) -> Vec<ParseError> {
        let wrapped = format!("fun main() {{\n{}\n}}", source);
        Parser::new(&wrapped).unwrap().parse_program().unwrap_err()
    }

    #[test]
    fn test_for_loop_bounds() {
        let stmts = body("for i in range(0, n - 1) { }");
        match &stmts[0] {
            Statement::For(for_loop) => {
                assert_eq!(for_loop.iterator.as_str(), "i");
                assert_eq!(for_loop.start.to_string(), "0");
                assert_eq!(for_loop.end.to_string(), "(n - 1)");
                assert!(for_loop.body.statements.is_empty());
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop_missing_end() {
        let errors = body_errors("for i in range(10) { }");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expected, vec![TokenKind::Comma]);
        assert_eq!(errors[0].location, SourceLocation::new(2, 18));
    }

    #[test]
    fn test_for_loop_misspelled_range() {
        let errors = body_errors("for i in rnage(0, 3) { }");
        assert_eq!(errors[0].expected, vec![TokenKind::Range]);
        assert_eq!(errors[0].found, TokenKind::Ident);
        assert_eq!(errors[0].location, SourceLocation::new(2, 10));
    }

    #[test]
    fn test_else_if_chain() {
        let stmts = body("if a < 1 { x = 1 } else if a < 2 { x = 2 } else { x = 3 }");
        let Statement::If(first) = &stmts[0] else {
            panic!("Expected if, got {:?}", stmts[0]);
        };
        let Some(ElseBranch::If(second)) = &first.else_branch else {
            panic!("Expected else-if, got {:?}", first.else_branch);
        };
        assert_eq!(second.condition.to_string(), "(a < 2)");
        assert!(matches!(second.else_branch, Some(ElseBranch::Block(_))));
    }

    #[test]
    fn test_assignment_forms() {
        let stmts = body("x = 1\ngrid[i][j] += 2;\n**pp = 3\ncount <<= 1");
        let targets: Vec<String> = stmts
            .iter()
            .map(|s| match s {
                Statement::Assignment(a) => format!("{} {}", a.target, a.op.symbol()),
                other => panic!("Expected assignment, got {:?}", other),
            })
            .collect();
        assert_eq!(targets, vec!["x =", "grid[i][j] +=", "**pp =", "count <<="]);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errors = body_errors("a + b = 3;\nf() = 4");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("Invalid assignment target '(a + b)'"));
        assert_eq!(errors[0].location, SourceLocation::new(2, 1));
        assert_eq!(errors[1].found, TokenKind::Assign);
    }

    #[test]
    fn test_call_and_expression_statements() {
        let stmts = body("print(1, 2)\nx + 1\nitems[0]");
        assert!(matches!(&stmts[0], Statement::Call(call) if call.args.len() == 2));
        assert!(matches!(&stmts[1], Statement::Expression(_)));
        assert!(matches!(&stmts[2], Statement::Expression(_)));
    }

    #[test]
    fn test_return_forms() {
        let stmts = body("while running { break; continue }\nreturn\n");
        assert!(matches!(&stmts[0], Statement::While(w) if w.body.statements.len() == 2));
        assert!(matches!(&stmts[1], Statement::Return(r) if r.value.is_none()));

        let stmts = body("return -x");
        assert!(matches!(&stmts[0], Statement::Return(r) if r.value.is_some()));
    }

    #[test]
    fn test_nested_unterminated_block_reported_once() {
        let errors = Parser::new("fun f() {\n  while x {\n    if y {\n")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(errors[0].message.contains("Unterminated block opened at line 3"));
    }

    #[test]
    fn test_deeply_nested_blocks_fail_without_overflow() {
        let source = format!(
            "fun f() {{\n{}{}\n}}\nfun g() {{}}",
            "if a { ".repeat(1_000),
            "} ".repeat(1_000)
        );
        let errors = Parser::new(&source).unwrap().parse_program().unwrap_err();
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(errors[0].message.starts_with("Nesting too deep"));
        assert_eq!(errors[0].location.line, 2);
    }
}
