// AST (Abstract Syntax Tree) definitions for the klang front end

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An identifier as it appears after substitution.
///
/// `original` holds the spelling the user actually wrote when a `replace`
/// directive rewrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub original: Option<String>,
    pub location: SourceLocation,
}

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Var(VarDecl),
    Function(FunctionDef),
    Macro(MacroDef),
    Struct(StructDecl),
    TypeAlias(TypeAlias),
}

impl Declaration {
    pub fn name(&self) -> &Ident {
        match self {
            Declaration::Var(decl) => &decl.name,
            Declaration::Function(def) => &def.name,
            Declaration::Macro(def) => &def.name,
            Declaration::Struct(decl) => &decl.name,
            Declaration::TypeAlias(alias) => &alias.name,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            Declaration::Var(decl) => decl.location,
            Declaration::Function(def) => def.location,
            Declaration::Macro(def) => def.location,
            Declaration::Struct(decl) => decl.location,
            Declaration::TypeAlias(alias) => alias.location,
        }
    }
}

/// `var name (: Type)? (= init)?`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Ident,
    pub var_type: Option<Type>,
    pub init: Option<Expression>,
    pub location: SourceLocation,
}

/// Function or macro parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub param_type: Type,
}

/// `fun` definition; `return_type` is `None` for a void function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: Block,
    pub location: SourceLocation,
}

/// `define` definition. Unlike `fun`, the return type is mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDef {
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Block,
    pub location: SourceLocation,
}

/// Struct field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Ident,
    pub field_type: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<Field>,
    pub location: SourceLocation,
}

/// `type Name = Type`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub name: Ident,
    pub aliased: Type,
    pub location: SourceLocation,
}

/// Braced statement list
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: SourceLocation,
}

/// Statements allowed inside a block
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Var(VarDecl),
    Assignment(Assignment),
    Return(ReturnStmt),
    For(ForLoop),
    While(WhileLoop),
    If(IfStatement),
    Call(FunctionCall),
    Expression(Expression),
    Break(SourceLocation),
    Continue(SourceLocation),
}

impl Statement {
    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::Var(decl) => decl.location,
            Statement::Assignment(assign) => assign.location,
            Statement::Return(ret) => ret.location,
            Statement::For(for_loop) => for_loop.location,
            Statement::While(while_loop) => while_loop.location,
            Statement::If(if_stmt) => if_stmt.location,
            Statement::Call(call) => call.location,
            Statement::Expression(expr) => expr.location(),
            Statement::Break(loc) | Statement::Continue(loc) => *loc,
        }
    }
}

/// Assignment operators (plain and compound)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: LValue,
    pub op: AssignOp,
    pub value: Expression,
    pub location: SourceLocation,
}

/// Assignment targets
#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Ident(Ident),
    Index {
        base: Ident,
        indices: Vec<Expression>,
    },
    /// `depth` stars applied to `target`, e.g. `**p`
    Deref {
        depth: usize,
        target: Primary,
    },
}

impl fmt::Display for LValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LValue::Ident(ident) => write!(f, "{}", ident),
            LValue::Index { base, indices } => {
                write!(f, "{}", base)?;
                for index in indices {
                    write!(f, "[{}]", index)?;
                }
                Ok(())
            }
            LValue::Deref { depth, target } => {
                write!(f, "{}{}", "*".repeat(*depth), target)
            }
        }
    }
}

/// `return` with an optional value; `None` is a void return.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub location: SourceLocation,
}

/// `for <iterator> in range(<start>, <end>) { ... }` over the half-open
/// range `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub iterator: Ident,
    pub start: Expression,
    pub end: Expression,
    pub body: Block,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub condition: Expression,
    pub body: Block,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub body: Block,
    pub else_branch: Option<ElseBranch>,
    pub location: SourceLocation,
}

/// Either an `else if` chain link or a terminal `else` block, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    If(Box<IfStatement>),
    Block(Block),
}

/// Base type name plus modifiers in the order they were written
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub base: Ident,
    pub modifiers: Vec<TypeModifier>,
}

impl Type {
    pub fn new(base: Ident) -> Self {
        Type {
            base,
            modifiers: Vec::new(),
        }
    }

    pub fn with_pointer(mut self) -> Self {
        match self.modifiers.last_mut() {
            Some(TypeModifier::Pointer(level)) => *level += 1,
            _ => self.modifiers.push(TypeModifier::Pointer(1)),
        }
        self
    }

    pub fn with_array(mut self, size: Option<Expression>) -> Self {
        self.modifiers.push(TypeModifier::Array(size));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeModifier {
    /// Consecutive `*` markers collapse into one entry carrying the level.
    Pointer(usize),
    Array(Option<Expression>),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for modifier in &self.modifiers {
            match modifier {
                TypeModifier::Pointer(level) => write!(f, "{}", "*".repeat(*level))?,
                TypeModifier::Array(Some(size)) => write!(f, "[{}]", size)?,
                TypeModifier::Array(None) => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

// ===== Expressions =====

/// Expression root; delegates straight to the equality level.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub equality: Equality,
}

/// One precedence level: a left operand, optionally followed by an operator
/// and a right-hand chain of the *same* level.
///
/// The right-hand side recursing into the same level makes runs of equal
/// precedence associate to the right: `a - b - c` is `a - (b - c)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryChain<Operand, Op> {
    pub left: Operand,
    pub rest: Option<(Op, Box<BinaryChain<Operand, Op>>)>,
}

impl<Operand, Op> BinaryChain<Operand, Op> {
    pub fn single(left: Operand) -> Self {
        BinaryChain { left, rest: None }
    }

    pub fn is_single(&self) -> bool {
        self.rest.is_none()
    }
}

pub type Equality = BinaryChain<Comparison, EqualityOp>;
pub type Comparison = BinaryChain<Addition, ComparisonOp>;
pub type Addition = BinaryChain<Multiplication, AdditionOp>;
pub type Multiplication = BinaryChain<Unary, MultiplicationOp>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplicationOp {
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,    // !x
    Neg,    // -x
    BitNot, // ~x
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unary {
    Prefix {
        op: UnaryOp,
        operand: Box<Unary>,
        location: SourceLocation,
    },
    Primary(Primary),
}

/// A primary base with zero or more postfix operations
#[derive(Debug, Clone, PartialEq)]
pub struct Primary {
    pub base: PrimaryBase,
    pub postfixes: Vec<Postfix>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryBase {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Nil,
    Call(FunctionCall),
    Ident(Ident),
    Paren(Box<Expression>),
    Array(Vec<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Postfix {
    Index(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: Ident,
    pub args: Vec<Expression>,
    pub location: SourceLocation,
}

impl Expression {
    /// The lone primary when the expression has no operators at all.
    pub fn as_primary(&self) -> Option<&Primary> {
        let unary = self.lone_unary()?;
        match unary {
            Unary::Primary(primary) => Some(primary),
            Unary::Prefix { .. } => None,
        }
    }

    pub fn into_primary(self) -> Option<Primary> {
        if self.as_primary().is_none() {
            return None;
        }
        match self.equality.left.left.left.left {
            Unary::Primary(primary) => Some(primary),
            Unary::Prefix { .. } => None,
        }
    }

    /// True when some level carries a binary operator.
    pub fn is_binary(&self) -> bool {
        self.lone_unary().is_none()
    }

    fn lone_unary(&self) -> Option<&Unary> {
        let comparison = self.equality.is_single().then_some(&self.equality.left)?;
        let addition = comparison.is_single().then_some(&comparison.left)?;
        let multiplication = addition.is_single().then_some(&addition.left)?;
        multiplication.is_single().then_some(&multiplication.left)
    }

    /// Location of the leftmost operand
    pub fn location(&self) -> SourceLocation {
        self.equality.left.left.left.left.location()
    }
}

impl Unary {
    pub fn location(&self) -> SourceLocation {
        match self {
            Unary::Prefix { location, .. } => *location,
            Unary::Primary(primary) => primary.location,
        }
    }
}

// ===== Display: fully parenthesised rendering =====

/// Source spelling of a binary operator
pub trait OpSymbol {
    fn symbol(&self) -> &'static str;
}

impl OpSymbol for EqualityOp {
    fn symbol(&self) -> &'static str {
        match self {
            EqualityOp::Eq => "==",
            EqualityOp::Ne => "!=",
        }
    }
}

impl OpSymbol for ComparisonOp {
    fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }
}

impl OpSymbol for AdditionOp {
    fn symbol(&self) -> &'static str {
        match self {
            AdditionOp::Add => "+",
            AdditionOp::Sub => "-",
        }
    }
}

impl OpSymbol for MultiplicationOp {
    fn symbol(&self) -> &'static str {
        match self {
            MultiplicationOp::Mul => "*",
            MultiplicationOp::Div => "/",
            MultiplicationOp::Mod => "%",
        }
    }
}

impl<Operand: fmt::Display, Op: OpSymbol> fmt::Display for BinaryChain<Operand, Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rest {
            None => write!(f, "{}", self.left),
            Some((op, right)) => write!(f, "({} {} {})", self.left, op.symbol(), right),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.equality)
    }
}

impl fmt::Display for Unary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unary::Prefix { op, operand, .. } => {
                let symbol = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::BitNot => "~",
                };
                write!(f, "{}{}", symbol, operand)
            }
            Unary::Primary(primary) => write!(f, "{}", primary),
        }
    }
}

impl fmt::Display for Primary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for postfix in &self.postfixes {
            match postfix {
                Postfix::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for PrimaryBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryBase::Int(n) => write!(f, "{}", n),
            PrimaryBase::Float(x) => write!(f, "{:?}", x),
            PrimaryBase::String(s) => write!(f, "{:?}", s),
            PrimaryBase::Bool(b) => write!(f, "{}", b),
            PrimaryBase::Nil => write!(f, "nil"),
            PrimaryBase::Call(call) => write!(f, "{}", call),
            PrimaryBase::Ident(ident) => write!(f, "{}", ident),
            // Binary chains already bracket themselves.
            PrimaryBase::Paren(inner) if inner.is_binary() => write!(f, "{}", inner),
            PrimaryBase::Paren(inner) => write!(f, "({})", inner),
            PrimaryBase::Array(elements) => {
                write!(f, "{{")?;
                write_list(f, elements)?;
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_list(f, &self.args)?;
        write!(f, ")")
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
