//! # Abstract Syntax Tree
//!
//! Produced by the parser, consumed by the IR code generator.
//!
//! Expressions are layered by precedence exactly as the grammar is:
//! `Or → And → Eq → Cmp → Add → Mul → Unary → Value`. Every binary layer stores the
//! operands of the next-tighter layer plus the operators between them, so a layer with a
//! single operand and no operator is simply a pass-through.

pub mod expr;
pub mod program;
pub mod stmt;

pub use expr::{
    AddExpr, AndExpr, BinaryOp, CallExpr, CmpExpr, EqExpr, Expr, Literal, LiteralKind, MulExpr,
    OrExpr, UnaryExpr, UnaryOp, ValueExpr,
};
pub use program::{Program, StatementList};
pub use stmt::{
    FunctionDeclaration, IfStatement, ReturnStatement, Statement, VarDeclaration,
    WhileStatement,
};
