use serde::{Deserialize, Serialize};

use crate::token::Tag;

/// Binary operators across all expression layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Operator for an equality-layer token.
    pub fn equality(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Eq => Some(BinaryOp::Eq),
            Tag::Neq => Some(BinaryOp::Neq),
            _ => None,
        }
    }

    /// Operator for a comparison-layer token.
    pub fn comparison(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Less => Some(BinaryOp::Less),
            Tag::LessEq => Some(BinaryOp::LessEq),
            Tag::Greater => Some(BinaryOp::Greater),
            Tag::GreaterEq => Some(BinaryOp::GreaterEq),
            _ => None,
        }
    }

    /// Operator for an additive-layer token.
    pub fn additive(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Plus => Some(BinaryOp::Add),
            Tag::Minus => Some(BinaryOp::Sub),
            _ => None,
        }
    }

    /// Operator for a multiplicative-layer token.
    pub fn multiplicative(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Mul => Some(BinaryOp::Mul),
            Tag::Div => Some(BinaryOp::Div),
            Tag::DivRem => Some(BinaryOp::Rem),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "~=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl UnaryOp {
    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Plus => Some(UnaryOp::Plus),
            Tag::Minus => Some(UnaryOp::Minus),
            Tag::Not => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "not",
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Top of the precedence ladder.
pub type Expr = OrExpr;

/// `a or b or c`
#[derive(Debug, Clone, PartialEq)]
pub struct OrExpr {
    pub exprs: Vec<AndExpr>,
}

/// `a and b and c`
#[derive(Debug, Clone, PartialEq)]
pub struct AndExpr {
    pub exprs: Vec<EqExpr>,
}

/// `a == b ~= c`; `ops.len() == exprs.len() - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct EqExpr {
    pub exprs: Vec<CmpExpr>,
    pub ops: Vec<BinaryOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CmpExpr {
    pub exprs: Vec<AddExpr>,
    pub ops: Vec<BinaryOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddExpr {
    pub exprs: Vec<MulExpr>,
    pub ops: Vec<BinaryOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MulExpr {
    pub exprs: Vec<UnaryExpr>,
    pub ops: Vec<BinaryOp>,
}

/// Any number of prefix operators applied to a value, written left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub ops: Vec<UnaryOp>,
    pub value: ValueExpr,
}

/// Leaf of the expression grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Id(String),
    Literal(Literal),
    Paren(Box<Expr>),
    Call(CallExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Boolean,
    Number,
    String,
    Nil,
}

/// A literal as written in the source. Strings keep their surrounding quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

/// `name(arg, ...)`, either as a statement or inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
}
