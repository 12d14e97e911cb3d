use klang::parser::ast::*;
use klang::parser::lexer::TokenKind;
use klang::parser::outline::outline;
use klang::parser::unit::{parse_source, CompilationUnit, DiagnosticKind};

fn function<'p>(program: &'p Program, name: &str) -> &'p FunctionDef {
    program
        .declarations
        .iter()
        .find_map(|decl| match decl {
            Declaration::Function(def) if def.name.as_str() == name => Some(def),
            _ => None,
        })
        .unwrap_or_else(|| panic!("function '{}' not found", name))
}

#[test]
fn test_showcase_program_parses() {
    let source = include_str!("../demos/showcase.k");
    let program = parse_source("showcase.k", source).unwrap();

    let names: Vec<&str> = program.declarations.iter().map(|d| d.name().as_str()).collect();
    assert_eq!(
        names,
        vec!["Node", "Grid", "counter", "origin", "square", "sum_to", "walk", "main"]
    );

    let walk = function(&program, "walk");
    assert!(walk.return_type.is_none());
    assert!(matches!(walk.body.statements[1], Statement::While(_)));

    let main = function(&program, "main");
    match &main.body.statements[0] {
        Statement::Var(var) => {
            // `greeting` is rewritten to a synthesized name; its original spelling survives.
            assert_eq!(var.name.as_str(), "unicode_id_1");
            assert_eq!(var.name.original.as_deref(), Some("greeting"));
        }
        other => panic!("Expected var, got {:?}", other),
    }
}

#[test]
fn test_replace_renames_call_and_keeps_original() {
    let program = parse_source(
        "calls.k",
        "replace foo -> bar\nfun main() {\n  foo(1, 2)\n}",
    )
    .unwrap();

    let main = function(&program, "main");
    match &main.body.statements[0] {
        Statement::Call(call) => {
            assert_eq!(call.name.as_str(), "bar");
            assert_eq!(call.name.original.as_deref(), Some("foo"));
            assert_eq!(call.args.len(), 2);
            assert_eq!(call.location, SourceLocation::new(3, 3));
        }
        other => panic!("Expected call, got {:?}", other),
    }
}

#[test]
fn test_macro_without_return_type_fails() {
    let diagnostics = parse_source("m.k", "define twice(x: int) {\n  return x + x\n}").unwrap_err();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
    assert!(diagnostics[0].message.contains("'->'"));
}

#[test]
fn test_function_without_arrow_is_void() {
    let program = parse_source("v.k", "fun log(msg: string) { print(msg) }").unwrap();
    assert!(function(&program, "log").return_type.is_none());
}

#[test]
fn test_for_loop_over_range() {
    let program = parse_source("f.k", "fun f() {\n  for i in range(1, 10) {}\n}").unwrap();
    match &function(&program, "f").body.statements[0] {
        Statement::For(for_loop) => {
            assert_eq!(for_loop.iterator.as_str(), "i");
            assert_eq!(for_loop.start.to_string(), "1");
            assert_eq!(for_loop.end.to_string(), "10");
            assert!(for_loop.body.statements.is_empty());
        }
        other => panic!("Expected for loop, got {:?}", other),
    }
}

#[test]
fn test_for_loop_errors_are_located() {
    let diagnostics =
        parse_source("r.k", "fun f() {\n  for i in rang(1, 10) {}\n  for j in range(1) {}\n}")
            .unwrap_err();
    let locations: Vec<String> = diagnostics.iter().map(|d| d.location.to_string()).collect();
    assert_eq!(locations, vec!["2:12", "3:19"]);
}

#[test]
fn test_right_associative_subtraction() {
    let program = parse_source("e.k", "fun f() -> int { return a - b - c }").unwrap();
    match &function(&program, "f").body.statements[0] {
        Statement::Return(ret) => {
            assert_eq!(ret.value.as_ref().map(|v| v.to_string()).as_deref(), Some("(a - (b - c))"));
        }
        other => panic!("Expected return, got {:?}", other),
    }
}

#[test]
fn test_keyword_aliases_parse_like_keywords() {
    let aliased = parse_source(
        "alias.k",
        "replace fn -> fun\nreplace when -> if\nfn f(x: int) { when x { return } }",
    )
    .unwrap();
    let plain = parse_source("plain.k", "\n\nfun f(x: int) { if x { return } }").unwrap();

    let aliased_rows: Vec<String> = outline(&aliased).into_iter().map(|n| n.label).collect();
    let plain_rows: Vec<String> = outline(&plain).into_iter().map(|n| n.label).collect();
    assert_eq!(aliased_rows, plain_rows);
}

#[test]
fn test_all_errors_reported_in_one_pass() {
    let source = "fun a() {\n  var = 1\n  var b = \n}\nfun c( {}\nfun d() {}\n";
    let diagnostics = parse_source("many.k", source).unwrap_err();
    assert_eq!(diagnostics.len(), 3, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].location.line, 2);
    assert_eq!(diagnostics[1].location.line, 4);
    assert_eq!(diagnostics[2].location.line, 5);
    assert!(diagnostics.iter().all(|d| d.to_string().starts_with("many.k:")));
}

#[test]
fn test_token_stream_for_unit() {
    let unit = CompilationUnit::new("t.k", "replace yes -> true\nvar ok = yes");
    let kinds: Vec<TokenKind> = unit.tokens().unwrap().iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Var, TokenKind::Ident, TokenKind::Assign, TokenKind::Bool, TokenKind::Eof]
    );
}

#[test]
fn test_overlong_expression_is_a_diagnostic() {
    let chain = vec!["1"; 10_000].join(" + ");
    let source = format!("fun f() -> int {{ return {} }}\nfun g() {{}}", chain);
    let diagnostics = parse_source("long.k", &source).unwrap_err();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
    assert!(diagnostics[0].message.starts_with("Nesting too deep"));

    let parens = format!("fun f() -> int {{ return {}1{} }}", "(".repeat(5_000), ")".repeat(5_000));
    assert!(parse_source("parens.k", &parens).is_err());
}
