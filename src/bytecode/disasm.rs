use std::collections::BTreeSet;
use std::fmt::Write;

use crate::bytecode::Op;
use crate::lang::value::Value;

/// Renders one op per line as `id: OP [operand]`.
///
/// Addresses only exist as `PUSHL` literals consumed by a later `JMP`, `CJMP` or `CALL`,
/// so ops that are the target of one are marked with `►`.
pub fn disassemble(ops: &[Op]) -> String {
    let targets = collect_jump_targets(ops);
    let mut out = String::new();
    for (ip, op) in ops.iter().enumerate() {
        let marker = if targets.contains(&ip) { "► " } else { "" };
        let _ = writeln!(out, "{}{}: {}", marker, ip, op);
    }
    out
}

/// Follows each address literal to the control op that consumes it.
fn collect_jump_targets(ops: &[Op]) -> BTreeSet<usize> {
    let mut targets = BTreeSet::new();
    let mut pending = Vec::new();
    for (ip, op) in ops.iter().enumerate() {
        match op {
            Op::Pushl(value) => pending.push(value),
            Op::Jmp | Op::CJmp | Op::Call => {
                if let Some(addr) = address_operand(ops, ip, &pending) {
                    targets.insert(addr);
                }
                pending.clear();
            }
            Op::Load | Op::Pop | Op::Return | Op::Hault | Op::Callb => pending.clear(),
            _ => {}
        }
    }
    targets
}

/// `JMP` consumes the literal right before it, `CJMP` the literal before its condition,
/// `CALL` the literal before its argument count.
fn address_operand(ops: &[Op], ip: usize, pending: &[&Value]) -> Option<usize> {
    let value = match ops[ip] {
        Op::Jmp => pending.last(),
        Op::CJmp => pending.first(),
        Op::Call => pending.iter().rev().nth(1),
        _ => None,
    }?;
    value.to_index().filter(|&addr| addr < ops.len())
}
