//! Indented, one-line-per-node rendering of a parsed [`Program`].
//!
//! Used by the `--ast` dump and the inspector's tree pane. Expressions are
//! not broken down further; they appear in their fully parenthesised form.

use crate::parser::ast::*;

/// One row of the outline
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    /// Nesting depth, 0 for top-level declarations
    pub depth: usize,
    pub label: String,
    pub location: SourceLocation,
}

/// Flatten `program` into outline rows in source order.
pub fn outline(program: &Program) -> Vec<OutlineNode> {
    let mut out = OutlineBuilder { nodes: Vec::new() };
    for declaration in &program.declarations {
        out.declaration(declaration);
    }
    out.nodes
}

/// Render the outline as text, two spaces per level.
pub fn render(program: &Program) -> String {
    outline(program)
        .iter()
        .map(|node| format!("{}{}  @{}\n", "  ".repeat(node.depth), node.label, node.location))
        .collect()
}

struct OutlineBuilder {
    nodes: Vec<OutlineNode>,
}

impl OutlineBuilder {
    fn push(&mut self, depth: usize, label: String, location: SourceLocation) {
        self.nodes.push(OutlineNode {
            depth,
            label,
            location,
        });
    }

    fn declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Var(var) => self.var(0, var),
            Declaration::Function(def) => {
                let mut label = format!("fun {}({})", name(&def.name), params(&def.params));
                if let Some(ret) = &def.return_type {
                    label.push_str(&format!(" -> {}", ret));
                }
                self.push(0, label, def.location);
                self.block(1, &def.body);
            }
            Declaration::Macro(def) => {
                let label = format!(
                    "define {}({}) -> {}",
                    name(&def.name),
                    params(&def.params),
                    def.return_type
                );
                self.push(0, label, def.location);
                self.block(1, &def.body);
            }
            Declaration::Struct(decl) => {
                self.push(0, format!("struct {}", name(&decl.name)), decl.location);
                for field in &decl.fields {
                    self.push(
                        1,
                        format!("{}: {}", name(&field.name), field.field_type),
                        field.name.location,
                    );
                }
            }
            Declaration::TypeAlias(alias) => {
                self.push(
                    0,
                    format!("type {} = {}", name(&alias.name), alias.aliased),
                    alias.location,
                );
            }
        }
    }

    fn var(&mut self, depth: usize, var: &VarDecl) {
        let mut label = format!("var {}", name(&var.name));
        if let Some(ty) = &var.var_type {
            label.push_str(&format!(": {}", ty));
        }
        if let Some(init) = &var.init {
            label.push_str(&format!(" = {}", init));
        }
        self.push(depth, label, var.location);
    }

    fn block(&mut self, depth: usize, block: &Block) {
        for statement in &block.statements {
            self.statement(depth, statement);
        }
    }

    fn statement(&mut self, depth: usize, statement: &Statement) {
        match statement {
            Statement::Var(var) => self.var(depth, var),
            Statement::Assignment(assign) => self.push(
                depth,
                format!("{} {} {}", assign.target, assign.op.symbol(), assign.value),
                assign.location,
            ),
            Statement::Return(ret) => {
                let label = match &ret.value {
                    Some(value) => format!("return {}", value),
                    None => "return".to_string(),
                };
                self.push(depth, label, ret.location);
            }
            Statement::For(for_loop) => {
                self.push(
                    depth,
                    format!(
                        "for {} in range({}, {})",
                        name(&for_loop.iterator),
                        for_loop.start,
                        for_loop.end
                    ),
                    for_loop.location,
                );
                self.block(depth + 1, &for_loop.body);
            }
            Statement::While(while_loop) => {
                self.push(
                    depth,
                    format!("while {}", while_loop.condition),
                    while_loop.location,
                );
                self.block(depth + 1, &while_loop.body);
            }
            Statement::If(if_stmt) => self.if_chain(depth, if_stmt, "if"),
            Statement::Call(call) => self.push(depth, format!("call {}", call), call.location),
            Statement::Expression(expr) => {
                self.push(depth, format!("expr {}", expr), expr.location())
            }
            Statement::Break(location) => self.push(depth, "break".to_string(), *location),
            Statement::Continue(location) => self.push(depth, "continue".to_string(), *location),
        }
    }

    fn if_chain(&mut self, depth: usize, if_stmt: &IfStatement, keyword: &str) {
        self.push(
            depth,
            format!("{} {}", keyword, if_stmt.condition),
            if_stmt.location,
        );
        self.block(depth + 1, &if_stmt.body);

        match &if_stmt.else_branch {
            Some(ElseBranch::If(next)) => self.if_chain(depth, next, "else if"),
            Some(ElseBranch::Block(block)) => {
                self.push(depth, "else".to_string(), block.location);
                self.block(depth + 1, block);
            }
            None => {}
        }
    }
}

/// Identifier with its pre-substitution spelling, if any
fn name(ident: &Ident) -> String {
    match &ident.original {
        Some(original) if *original != ident.name => {
            format!("{} (written '{}')", ident.name, original)
        }
        _ => ident.name.clone(),
    }
}

fn params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", name(&p.name), p.param_type))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;

    fn labels(source: &str) -> Vec<(usize, String)> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        outline(&program)
            .into_iter()
            .map(|node| (node.depth, node.label))
            .collect()
    }

    #[test]
    fn test_outline_nesting() {
        let rows = labels(
            "fun main() -> int {\n  for i in range(0, 3) {\n    if i == 1 { continue } else { total += i }\n  }\n  return total\n}",
        );
        let expected = vec![
            (0, "fun main() -> int".to_string()),
            (1, "for i in range(0, 3)".to_string()),
            (2, "if (i == 1)".to_string()),
            (3, "continue".to_string()),
            (2, "else".to_string()),
            (3, "total += i".to_string()),
            (1, "return total".to_string()),
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_outline_shows_original_spelling() {
        let rows = labels("replace n -> count\nfun f(n: int) {}");
        assert_eq!(rows[0].1, "fun f(count (written 'n'): int)");
    }

    #[test]
    fn test_render_indents_and_locates() {
        let program = Parser::new("struct P { x: int }").unwrap().parse_program().unwrap();
        assert_eq!(render(&program), "struct P  @1:1\n  x: int  @1:12\n");
    }
}
