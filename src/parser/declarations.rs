//! Declaration parsing implementation
//!
//! This module handles parsing of top-level declarations in klang programs:
//!
//! - Function definitions: `fun name(params) -> Type { ... }`
//! - Macro definitions: `define name(params) -> Type { ... }`
//! - Struct definitions: `struct Name { field: Type, ... }`
//! - Type aliases: `type Name = Type`
//! - Global variables: `var name: Type = expr`
//! - Type parsing: base name, pointers, arrays
//!
//! # Grammar
//!
//! ```text
//! declaration  ::= function_def | macro_def | struct_def | type_alias | var_decl
//! function_def ::= "fun" identifier "(" params ")" ("->" type)? block
//! macro_def    ::= "define" identifier "(" params ")" "->" type block
//! params       ::= (identifier ":" type ("," identifier ":" type)*)?
//! struct_def   ::= "struct" identifier "{" (identifier ":" type (","|";")?)* "}"
//! type_alias   ::= "type" identifier "=" type
//! var_decl     ::= "var" identifier (":" type)? ("=" expression)?
//! type         ::= identifier ("*" | "[" expression? "]")*
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use tracing::trace;

impl Parser {
    /// Parse one top-level declaration.
    pub(crate) fn parse_top_level_declaration(&mut self) -> Result<Declaration, ParseError> {
        let declaration = match self.peek().kind {
            TokenKind::Fun => Declaration::Function(self.parse_function_definition()?),
            TokenKind::Define => Declaration::Macro(self.parse_macro_definition()?),
            TokenKind::Struct => Declaration::Struct(self.parse_struct_definition()?),
            TokenKind::Type => Declaration::TypeAlias(self.parse_type_alias()?),
            TokenKind::Var => {
                let decl = self.parse_var_declaration()?;
                self.skip_terminator();
                Declaration::Var(decl)
            }
            _ => {
                return Err(self.error_expected(
                    &[
                        TokenKind::Fun,
                        TokenKind::Define,
                        TokenKind::Var,
                        TokenKind::Struct,
                        TokenKind::Type,
                    ],
                    "Expected declaration",
                ))
            }
        };

        trace!(name = declaration.name().as_str(), "parsed declaration");
        Ok(declaration)
    }

    /// `fun name(params) (-> Type)? { ... }`; no arrow means a void function.
    pub(crate) fn parse_function_definition(&mut self) -> Result<FunctionDef, ParseError> {
        let location = self.current_location();
        self.expect_token(TokenKind::Fun, "Expected 'fun'")?;

        let name = self.expect_identifier("after 'fun'")?;
        let params = self.parse_parameter_list()?;

        let return_type = if self.match_token(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block("before function body")?;

        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
            location,
        })
    }

    /// `define name(params) -> Type { ... }`
    pub(crate) fn parse_macro_definition(&mut self) -> Result<MacroDef, ParseError> {
        let location = self.current_location();
        self.expect_token(TokenKind::Define, "Expected 'define'")?;

        let name = self.expect_identifier("after 'define'")?;
        let params = self.parse_parameter_list()?;

        if !self.match_token(TokenKind::Arrow) {
            return Err(self.error_expected(
                &[TokenKind::Arrow],
                &format!("Expected '->' and a return type for macro '{}'", name.as_str()),
            ));
        }
        let return_type = self.parse_type()?;

        let body = self.parse_block("before macro body")?;

        Ok(MacroDef {
            name,
            params,
            return_type,
            body,
            location,
        })
    }

    /// Parenthesised `name: Type` list.
    ///
    /// A repeated parameter name is recorded as an error but does not stop
    /// the declaration from parsing.
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect_lparen("after function name")?;

        let mut params: Vec<Param> = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let name = self.expect_identifier("for parameter name")?;
                self.expect_token(TokenKind::Colon, "Expected ':' after parameter name")?;
                let param_type = self.parse_type()?;

                if params.iter().any(|p| p.name.name == name.name) {
                    self.errors.push(ParseError {
                        message: format!("Duplicate parameter '{}'", name),
                        location: name.location,
                        found: TokenKind::Ident,
                        expected: Vec::new(),
                    });
                }
                params.push(Param { name, param_type });

                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_rparen("after parameters")?;
        Ok(params)
    }

    pub(crate) fn parse_struct_definition(&mut self) -> Result<StructDecl, ParseError> {
        let location = self.current_location();
        self.expect_token(TokenKind::Struct, "Expected 'struct'")?;

        let name = self.expect_identifier("after 'struct'")?;
        self.expect_lbrace("after struct name")?;

        // A bad field abandons the rest of the body, not the declarations after it.
        let fields = match self.parse_struct_fields(&name) {
            Ok(fields) => fields,
            Err(err) => {
                self.skip_to_closing_brace();
                return Err(err);
            }
        };
        self.advance(); // '}'

        Ok(StructDecl {
            name,
            fields,
            location,
        })
    }

    fn parse_struct_fields(&mut self, name: &Ident) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.error_expected(
                    &[TokenKind::RBrace],
                    &format!("Unterminated struct '{}': expected '}}'", name.as_str()),
                ));
            }

            let field_name = self.expect_identifier("for struct field")?;
            self.expect_token(TokenKind::Colon, "Expected ':' after field name")?;
            let field_type = self.parse_type()?;
            fields.push(Field {
                name: field_name,
                field_type,
            });

            if !self.match_token(TokenKind::Comma) {
                self.skip_terminator();
            }
        }
        Ok(fields)
    }

    /// `type Name = Type`
    pub(crate) fn parse_type_alias(&mut self) -> Result<TypeAlias, ParseError> {
        let location = self.current_location();
        self.expect_token(TokenKind::Type, "Expected 'type'")?;

        let name = self.expect_identifier("after 'type'")?;
        self.expect_token(TokenKind::Assign, "Expected '=' after type alias name")?;
        let aliased = self.parse_type()?;
        self.skip_terminator();

        Ok(TypeAlias {
            name,
            aliased,
            location,
        })
    }

    /// `var name (: Type)? (= expression)?`, shared by globals and locals.
    /// The terminator is left to the caller.
    pub(crate) fn parse_var_declaration(&mut self) -> Result<VarDecl, ParseError> {
        let location = self.current_location();
        self.expect_token(TokenKind::Var, "Expected 'var'")?;

        let name = self.expect_identifier("after 'var'")?;

        let var_type = if self.match_token(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.match_token(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(VarDecl {
            name,
            var_type,
            init,
            location,
        })
    }

    /// Parse a type: a base name followed by `*` and `[size?]` modifiers in
    /// the order written.
    pub(crate) fn parse_type(&mut self) -> Result<Type, ParseError> {
        let base = self.expect_identifier("for type name")?;
        let mut ty = Type::new(base);

        loop {
            if self.match_token(TokenKind::Star) {
                ty = ty.with_pointer();
            } else if self.match_token(TokenKind::LBracket) {
                let size = if self.check(TokenKind::RBracket) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect_token(TokenKind::RBracket, "Expected ']' after array size")?;
                ty = ty.with_array(size);
            } else {
                break;
            }
        }

        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::{ParseError, Parser};

    fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
        Parser::new(source).unwrap().parse_program()
    }

    fn single(source: &str) -> Declaration {
        let mut program = parse(source).unwrap();
        assert_eq!(program.declarations.len(), 1);
        program.declarations.remove(0)
    }

    #[test]
    fn test_function_without_arrow_is_void() {
        match single("fun tick(n: int) { n += 1 }") {
            Declaration::Function(def) => {
                assert!(def.return_type.is_none());
                assert_eq!(def.params.len(), 1);
                assert_eq!(def.params[0].param_type.to_string(), "int");
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_macro_requires_return_type() {
        let errors = parse("define twice(x: int) { return x * 2 }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expected, vec![TokenKind::Arrow]);
        assert_eq!(errors[0].found, TokenKind::LBrace);

        match single("define twice(x: int) -> int { return x * 2 }") {
            Declaration::Macro(def) => assert_eq!(def.return_type.to_string(), "int"),
            other => panic!("Expected macro, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_types_with_modifiers() {
        match single("fun f(p: char**, grid: int[3][4], buf: byte[]) {}") {
            Declaration::Function(def) => {
                let types: Vec<String> =
                    def.params.iter().map(|p| p.param_type.to_string()).collect();
                assert_eq!(types, vec!["char**", "int[3][4]", "byte[]"]);
                assert_eq!(def.params[0].param_type.modifiers, vec![TypeModifier::Pointer(2)]);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_modifier_order_is_kept() {
        let program = parse(
            "var a: int*[3]\nvar b: int[3]*\nvar c: int*[]*",
        )
        .unwrap();
        let modifiers: Vec<Vec<TypeModifier>> = program
            .declarations
            .iter()
            .map(|decl| match decl {
                Declaration::Var(var) => var.var_type.clone().map(|t| t.modifiers).unwrap_or_default(),
                other => panic!("Expected var, got {:?}", other),
            })
            .collect();

        assert!(matches!(
            modifiers[0].as_slice(),
            [TypeModifier::Pointer(1), TypeModifier::Array(Some(_))]
        ));
        assert!(matches!(
            modifiers[1].as_slice(),
            [TypeModifier::Array(Some(_)), TypeModifier::Pointer(1)]
        ));
        assert!(matches!(
            modifiers[2].as_slice(),
            [TypeModifier::Pointer(1), TypeModifier::Array(None), TypeModifier::Pointer(1)]
        ));
    }

    #[test]
    fn test_bad_struct_field_is_one_error() {
        let errors = parse("struct P {\n  x: int\n  var: int\n}\nfun ok() {}").unwrap_err();
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert_eq!(errors[0].location, SourceLocation::new(3, 3));
        assert_eq!(errors[0].found, TokenKind::Var);

        let errors = parse("struct Q { a: int[ }\nstruct R { b: }\nvar fine = 1").unwrap_err();
        let lines: Vec<usize> = errors.iter().map(|e| e.location.line).collect();
        assert_eq!(lines, vec![1, 2], "{:?}", errors);
    }

    #[test]
    fn test_duplicate_parameter_is_reported() {
        let errors = parse("fun f(a: int, b: int, a: float) {}\nfun g() {}").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Duplicate parameter 'a'"));
        assert_eq!(errors[0].location, SourceLocation::new(1, 23));
    }

    #[test]
    fn test_struct_fields_with_mixed_separators() {
        match single("struct Point {\n  x: int,\n  y: int;\n  next: Point*\n}") {
            Declaration::Struct(decl) => {
                let names: Vec<&str> = decl.fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["x", "y", "next"]);
                assert_eq!(decl.fields[2].field_type.to_string(), "Point*");
            }
            other => panic!("Expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_type_alias_and_global_var() {
        let program = parse("type Grid = int[8][8]\nvar board: Grid\nvar count = 0;").unwrap();
        assert_eq!(program.declarations.len(), 3);
        match &program.declarations[0] {
            Declaration::TypeAlias(alias) => assert_eq!(alias.aliased.to_string(), "int[8][8]"),
            other => panic!("Expected type alias, got {:?}", other),
        }
        match &program.declarations[2] {
            Declaration::Var(var) => {
                assert!(var.var_type.is_none());
                assert_eq!(var.init.as_ref().map(|e| e.to_string()).as_deref(), Some("0"));
            }
            other => panic!("Expected var, got {:?}", other),
        }
    }

    #[test]
    fn test_stray_top_level_tokens() {
        let errors = parse("x = 1\nfun f() {}").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].found, TokenKind::Ident);
        assert!(errors[0].message.starts_with("Expected declaration"));
    }
}
