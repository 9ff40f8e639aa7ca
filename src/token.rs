use serde::{Deserialize, Serialize};

/// Token category. Keyword tags carry the keyword's own spelling in `Token::value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    // Discarded by the lexer iterator
    Comment,

    // Keywords
    End,
    Function,
    Return,
    While,
    Break,
    Do,
    If,
    Then,
    Else,
    Nil,
    Not,
    Or,
    And,

    // Literals
    Boolean,
    Number,
    String,

    // Names
    Id,

    // Delimiters
    LParen,
    RParen,
    Comma,

    // Operators
    Plus,
    Minus,
    Mul,
    Div,
    DivRem,
    LessEq,
    GreaterEq,
    Less,
    Greater,
    Eq,
    Neq,
    Assign,

    // Appended by the parser
    Eof,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Comment => "Comment",
            Tag::End => "end",
            Tag::Function => "function",
            Tag::Return => "return",
            Tag::While => "while",
            Tag::Break => "break",
            Tag::Do => "do",
            Tag::If => "if",
            Tag::Then => "then",
            Tag::Else => "else",
            Tag::Nil => "nil",
            Tag::Not => "not",
            Tag::Or => "or",
            Tag::And => "and",
            Tag::Boolean => "boolean",
            Tag::Number => "number",
            Tag::String => "string",
            Tag::Id => "id",
            Tag::LParen => "lparen",
            Tag::RParen => "rparen",
            Tag::Comma => "comma",
            Tag::Plus => "plus",
            Tag::Minus => "minus",
            Tag::Mul => "mul",
            Tag::Div => "div",
            Tag::DivRem => "divrem",
            Tag::LessEq => "lesseq",
            Tag::GreaterEq => "greatereq",
            Tag::Less => "less",
            Tag::Greater => "greater",
            Tag::Eq => "eq",
            Tag::Neq => "neq",
            Tag::Assign => "assign",
            Tag::Eof => "EOF",
        }
    }

    /// Tokens that can open an expression (used by `return` to decide whether a value follows).
    pub fn starts_expression(self) -> bool {
        matches!(
            self,
            Tag::Plus
                | Tag::Minus
                | Tag::Not
                | Tag::LParen
                | Tag::Nil
                | Tag::Id
                | Tag::Boolean
                | Tag::Number
                | Tag::String
        )
    }
}

/// A lexed token. `line` and `pos` are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub tag: Tag,
    pub line: usize,
    pub pos: usize,
    pub value: String,
}

impl Token {
    pub fn new(tag: Tag, line: usize, pos: usize, value: impl Into<String>) -> Self {
        Token {
            tag,
            line,
            pos,
            value: value.into(),
        }
    }

    pub fn is(&self, tag: Tag) -> bool {
        self.tag == tag
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {}): {}",
            self.tag.name(),
            self.line,
            self.pos,
            self.value
        )
    }
}
