//! Binary encoding of op sequences.
//!
//! ## Wire format
//!
//! ```text
//! Zero-operand op:  opcode(u8)
//! PUSHV / PUSHL:    opcode(u8) | len(u16, big endian) | payload(len bytes, UTF-8)
//! ```
//!
//! The `PUSHV` payload is the decimal slot number; the `PUSHL` payload is the literal's
//! text. There is no header and no op count: a stream is decoded until the bytes run out.
//! Literal text is re-classified on decode, so a string whose text reads as a number or
//! keyword (`"12"`, `"nil"`) comes back as that number or keyword.
//!
//! A name that is read but never assigned anywhere in the program has no slot; it is
//! encoded as `PUSHL nil` rather than a `PUSHV` of a reserved slot.

use thiserror::Error;

use super::op::Op;
use crate::lang::value::Value;

// ── opcodes ─────────────────────────────────────────────────────────────────
const OP_OR: u8 = 0;
const OP_AND: u8 = 1;
const OP_EQ: u8 = 2;
const OP_NEQ: u8 = 3;
const OP_LESS: u8 = 4;
const OP_LESS_EQ: u8 = 5;
const OP_GREATER: u8 = 6;
const OP_GREATER_EQ: u8 = 7;
const OP_ADD: u8 = 8;
const OP_SUB: u8 = 9;
const OP_MUL: u8 = 10;
const OP_DIV: u8 = 11;
const OP_DIV_REM: u8 = 12;
const OP_UNARY_PLUS: u8 = 13;
const OP_UNARY_MINUS: u8 = 14;
const OP_UNARY_NOT: u8 = 15;
const OP_PUSHV: u8 = 16;
const OP_PUSHL: u8 = 17;
const OP_POP: u8 = 18;
const OP_LOAD: u8 = 19;
const OP_JMP: u8 = 20;
const OP_CJMP: u8 = 21;
const OP_CALL: u8 = 22;
const OP_CALLB: u8 = 23;
const OP_RETURN: u8 = 24;
const OP_HAULT: u8 = 25;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("op {index}: payload of {len} bytes exceeds the 65535-byte limit")]
    PayloadTooLong { index: usize, len: usize },
}

/// Decoding failures carry the byte offset of the op being decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("offset {offset}: unknown opcode {opcode}")]
    UnknownOpcode { offset: usize, opcode: u8 },

    #[error("offset {offset}: unexpected end of input")]
    Truncated { offset: usize },

    #[error("offset {offset}: payload is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("offset {offset}: invalid slot '{payload}'")]
    InvalidSlot { offset: usize, payload: String },
}

pub fn opcode(op: &Op) -> u8 {
    match op {
        Op::Or => OP_OR,
        Op::And => OP_AND,
        Op::Eq => OP_EQ,
        Op::Neq => OP_NEQ,
        Op::Less => OP_LESS,
        Op::LessEq => OP_LESS_EQ,
        Op::Greater => OP_GREATER,
        Op::GreaterEq => OP_GREATER_EQ,
        Op::Add => OP_ADD,
        Op::Sub => OP_SUB,
        Op::Mul => OP_MUL,
        Op::Div => OP_DIV,
        Op::DivRem => OP_DIV_REM,
        Op::UnaryPlus => OP_UNARY_PLUS,
        Op::UnaryMinus => OP_UNARY_MINUS,
        Op::UnaryNot => OP_UNARY_NOT,
        Op::Pushv(_) => OP_PUSHV,
        Op::Pushl(_) => OP_PUSHL,
        Op::Pop => OP_POP,
        Op::Load => OP_LOAD,
        Op::Jmp => OP_JMP,
        Op::CJmp => OP_CJMP,
        Op::Call => OP_CALL,
        Op::Callb => OP_CALLB,
        Op::Return => OP_RETURN,
        Op::Hault => OP_HAULT,
    }
}

fn zero_operand(opcode: u8) -> Option<Op> {
    let op = match opcode {
        OP_OR => Op::Or,
        OP_AND => Op::And,
        OP_EQ => Op::Eq,
        OP_NEQ => Op::Neq,
        OP_LESS => Op::Less,
        OP_LESS_EQ => Op::LessEq,
        OP_GREATER => Op::Greater,
        OP_GREATER_EQ => Op::GreaterEq,
        OP_ADD => Op::Add,
        OP_SUB => Op::Sub,
        OP_MUL => Op::Mul,
        OP_DIV => Op::Div,
        OP_DIV_REM => Op::DivRem,
        OP_UNARY_PLUS => Op::UnaryPlus,
        OP_UNARY_MINUS => Op::UnaryMinus,
        OP_UNARY_NOT => Op::UnaryNot,
        OP_POP => Op::Pop,
        OP_LOAD => Op::Load,
        OP_JMP => Op::Jmp,
        OP_CJMP => Op::CJmp,
        OP_CALL => Op::Call,
        OP_CALLB => Op::Callb,
        OP_RETURN => Op::Return,
        OP_HAULT => Op::Hault,
        _ => return None,
    };
    Some(op)
}

// ── encoding ────────────────────────────────────────────────────────────────

pub fn encode(ops: &[Op]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(ops.len() * 2);
    for (index, op) in ops.iter().enumerate() {
        out.push(opcode(op));
        let payload = match op {
            Op::Pushv(slot) => slot.to_string(),
            Op::Pushl(value) => value.to_string(),
            _ => continue,
        };
        let len = u16::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLong {
            index,
            len: payload.len(),
        })?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(payload.as_bytes());
    }
    Ok(out)
}

// ── decoding ────────────────────────────────────────────────────────────────

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize, offset: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(DecodeError::Truncated { offset })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.take(1, offset)?[0])
    }

    fn payload(&mut self, offset: usize) -> Result<&'a str, DecodeError> {
        let len = self.take(2, offset)?;
        let len = u16::from_be_bytes([len[0], len[1]]) as usize;
        let bytes = self.take(len, offset)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Op>, DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut ops = Vec::new();
    while !reader.at_end() {
        let offset = reader.pos;
        let opcode = reader.u8(offset)?;
        let op = match opcode {
            OP_PUSHV => {
                let payload = reader.payload(offset)?;
                let slot = payload.parse().map_err(|_| DecodeError::InvalidSlot {
                    offset,
                    payload: payload.to_string(),
                })?;
                Op::Pushv(slot)
            }
            OP_PUSHL => Op::Pushl(Value::from_literal(reader.payload(offset)?)),
            other => zero_operand(other).ok_or(DecodeError::UnknownOpcode {
                offset,
                opcode: other,
            })?,
        };
        ops.push(op);
    }
    Ok(ops)
}
