use super::expr::{CallExpr, Expr};
use super::program::StatementList;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    If(IfStatement),
    While(WhileStatement),
    Return(ReturnStatement),
    Break,
    VarDecl(VarDeclaration),
    FunctionDecl(FunctionDeclaration),
    /// A call whose result is discarded.
    Call(CallExpr),
}

/// `if cond then ... [else ...] end`. A missing `else` is an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub cond: Expr,
    pub then_branch: StatementList,
    pub else_branch: StatementList,
}

/// `while cond do ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub cond: Expr,
    pub body: StatementList,
}

/// `return [expr]`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expr>,
}

/// `name = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub name: String,
    pub value: Expr,
}

/// `function name(params) body end`. The parser appends a bare `return` to `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub params: Vec<String>,
    pub body: StatementList,
}
