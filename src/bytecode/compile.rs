use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    bytecode::{CodeObject, Op, compile_error::BytecodeError},
    ir::{CallSite, InstrId, Instruction, IrValue, LinearIr},
    lang::value::Value,
};

/// Slot pushed for a parameter that binds nothing (builtin arguments).
const NO_SLOT: f64 = -1.0;

/// Lowers linear IR to stack-machine ops.
///
/// Two passes: a numbering pass gives every assigned name a dense slot in first-seen
/// order, then each IR instruction is expanded. Jump and call addresses are emitted as
/// placeholders and backpatched with the first op generated for the target instruction.
#[derive(Default)]
pub struct Compiler {
    ops: Vec<Op>,

    /// Variable name -> slot
    slots: HashMap<String, usize>,

    /// (op index of the address placeholder, IR target)
    patches: Vec<(usize, InstrId)>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot table of the last compilation.
    pub fn slots(&self) -> &HashMap<String, usize> {
        &self.slots
    }

    pub fn compile(&mut self, ir: &LinearIr) -> Result<CodeObject, BytecodeError> {
        self.ops.clear();
        self.patches.clear();
        self.number_slots(ir);

        let mut first_op = Vec::with_capacity(ir.len());
        for (_, instr) in ir.iter() {
            first_op.push(self.ops.len());
            self.instruction(instr)?;
        }

        for (at, target) in self.patches.drain(..) {
            let addr = *first_op
                .get(target)
                .ok_or(BytecodeError::UnresolvedTarget { op: at, target })?;
            trace!(op = at, ir = target, addr, "backpatch");
            self.ops[at] = Op::Pushl(Value::from(addr));
        }

        debug!(
            ops = self.ops.len(),
            slots = self.slots.len(),
            "compiled bytecode"
        );
        Ok(CodeObject::new(std::mem::take(&mut self.ops)))
    }

    fn number_slots(&mut self, ir: &LinearIr) {
        self.slots.clear();
        for (_, instr) in ir.iter() {
            let name = match instr {
                Instruction::Assignment { lhs, .. } => lhs,
                Instruction::Parameter {
                    name: Some(name), ..
                } => name,
                _ => continue,
            };
            let next = self.slots.len();
            self.slots.entry(name.clone()).or_insert(next);
        }
    }

    fn slot(&self, name: &str) -> Result<usize, BytecodeError> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| BytecodeError::UnknownSlot(name.to_string()))
    }

    fn emit(&mut self, op: Op) {
        self.ops.push(op);
    }

    fn push_literal(&mut self, value: impl Into<Value>) {
        self.emit(Op::Pushl(value.into()));
    }

    fn push_address(&mut self, target: InstrId) {
        self.patches.push((self.ops.len(), target));
        self.push_literal(Value::Nil);
    }

    /// Pushes an IR operand: a quoted string, a variable, or another literal.
    fn operand(&mut self, text: &str) {
        if let Some(s) = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            self.push_literal(s);
        } else if is_variable(text) {
            match self.slots.get(text) {
                Some(&slot) => self.emit(Op::Pushv(slot)),
                // never assigned anywhere
                None => self.push_literal(Value::Nil),
            }
        } else {
            self.push_literal(Value::from_literal(text));
        }
    }

    /// `addr argc CALL` for declared functions, `name argc CALLB` for builtins.
    fn call_sequence(&mut self, call: &CallSite) {
        match call.target {
            Some(target) => {
                self.push_address(target);
                self.push_literal(call.argc);
                self.emit(Op::Call);
            }
            None => {
                self.push_literal(call.name.as_str());
                self.push_literal(call.argc);
                self.emit(Op::Callb);
            }
        }
    }

    fn instruction(&mut self, instr: &Instruction) -> Result<(), BytecodeError> {
        match instr {
            Instruction::Goto(target) => {
                self.push_address(*target);
                self.emit(Op::Jmp);
            }
            Instruction::IfGoto { cond, target } => {
                self.push_address(*target);
                self.operand(cond);
                self.emit(Op::CJmp);
            }
            Instruction::Assignment { lhs, rhs } => {
                let slot = self.slot(lhs)?;
                self.push_literal(slot);
                match rhs {
                    IrValue::Single(value) => self.operand(value),
                    IrValue::Unary { op, operand } => {
                        self.operand(operand);
                        self.emit(Op::unary(*op));
                    }
                    IrValue::Binary { op, lhs, rhs } => {
                        // the left operand ends up on top
                        self.operand(rhs);
                        self.operand(lhs);
                        self.emit(Op::binary(*op));
                    }
                    IrValue::Call(call) => {
                        self.push_literal(1.0);
                        self.call_sequence(call);
                    }
                }
                self.emit(Op::Load);
            }
            Instruction::Return(value) => {
                self.operand(value);
                self.emit(Op::Return);
            }
            Instruction::Parameter { value, name } => {
                match name {
                    Some(name) => {
                        let slot = self.slot(name)?;
                        self.push_literal(slot);
                    }
                    None => self.push_literal(NO_SLOT),
                }
                self.operand(value);
            }
            Instruction::Call(call) => {
                self.push_literal(0.0);
                self.call_sequence(call);
                self.emit(Op::Pop);
            }
            Instruction::End => self.emit(Op::Hault),
            // removed by linearization; nothing to execute
            Instruction::Blank => {}
        }
        Ok(())
    }
}

/// Identifiers other than the literal keywords.
fn is_variable(text: &str) -> bool {
    let mut chars = text.chars();
    let starts_word = chars
        .next()
        .is_some_and(|c| c == '_' || (c.is_alphanumeric() && !c.is_numeric()));
    starts_word
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !matches!(text, "true" | "false" | "nil")
}
