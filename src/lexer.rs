use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::token::{Tag, Token};

/// No rule matched at a non-whitespace position.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{line}:{col}: lexical error: unexpected character '{found}'")]
pub struct LexerError {
    pub line: usize,
    pub col: usize,
    pub found: char,
}

/// Ordered rule table. The first rule matching at the cursor wins, so keywords shadow
/// identifiers even when they are only a prefix of the word (`ending` lexes as `end`, `ing`).
const RULES: &[(&str, Tag)] = &[
    (r"--.*", Tag::Comment),
    (r"end", Tag::End),
    (r"function", Tag::Function),
    (r"return", Tag::Return),
    (r"while", Tag::While),
    (r"break", Tag::Break),
    (r"do", Tag::Do),
    (r"if", Tag::If),
    (r"then", Tag::Then),
    (r"else", Tag::Else),
    (r"nil", Tag::Nil),
    (r"not", Tag::Not),
    (r"or", Tag::Or),
    (r"and", Tag::And),
    (r"(true|false)", Tag::Boolean),
    (r"[^\d\W]\w*", Tag::Id),
    (r"\d*\.\d+|\d+", Tag::Number),
    (r#""[^"\n]*""#, Tag::String),
    (r"\(", Tag::LParen),
    (r"\)", Tag::RParen),
    (r",", Tag::Comma),
    (r"\+", Tag::Plus),
    (r"-", Tag::Minus),
    (r"\*", Tag::Mul),
    (r"/", Tag::Div),
    (r"%", Tag::DivRem),
    (r"<=", Tag::LessEq),
    (r">=", Tag::GreaterEq),
    (r"<", Tag::Less),
    (r">", Tag::Greater),
    (r"==", Tag::Eq),
    (r"~=", Tag::Neq),
    (r"=", Tag::Assign),
];

static COMPILED_RULES: LazyLock<Vec<(Regex, Tag)>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(pattern, tag)| {
            let anchored = format!("^(?:{pattern})");
            (
                Regex::new(&anchored).expect("lexer rule table must compile"),
                *tag,
            )
        })
        .collect()
});

/// Regex-driven lexer.
///
/// Iterating yields tokens lazily and skips comments. After the first error the
/// iterator is exhausted. `reset` restarts it over a new source unit.
pub struct Lexer {
    source: String,
    index: usize,
    line: usize,
    col: usize,
    failed: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.to_string(),
            index: 0,
            line: 1,
            col: 1,
            failed: false,
        }
    }

    pub fn reset(&mut self, source: &str) {
        self.source.clear();
        self.source.push_str(source);
        self.index = 0;
        self.line = 1;
        self.col = 1;
        self.failed = false;
    }

    fn current(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn is_line_break(&self) -> bool {
        let rest = &self.source[self.index..];
        rest.starts_with('\n') || rest.starts_with("\r\n")
    }

    /// Consumes one character, treating `\r\n` as a single line break.
    fn advance(&mut self) {
        let Some(ch) = self.current() else {
            return;
        };
        if self.is_line_break() {
            if ch == '\r' {
                self.index += 1;
            }
            self.index += 1;
            self.line += 1;
            self.col = 1;
        } else {
            self.index += ch.len_utf8();
            self.col += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    /// Produces the next raw token, comments included.
    fn next_raw(&mut self) -> Option<Result<Token, LexerError>> {
        self.skip_whitespace();
        let ch = self.current()?;

        let rest = &self.source[self.index..];
        for (regex, tag) in COMPILED_RULES.iter() {
            if let Some(m) = regex.find(rest) {
                let text = m.as_str();
                let token = Token::new(*tag, self.line, self.col, text);
                self.col += text.chars().count();
                self.index += m.end();
                return Some(Ok(token));
            }
        }

        Some(Err(LexerError {
            line: self.line,
            col: self.col,
            found: ch,
        }))
    }

    /// Collects the whole token stream, comments removed.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        self.collect()
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.next_raw()? {
                Ok(token) if token.is(Tag::Comment) => continue,
                Ok(token) => return Some(Ok(token)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
