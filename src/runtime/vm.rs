use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bytecode::Op;
use crate::lang::value::Value;
use crate::runtime::builtins::{BUILTINS, Builtin};
use crate::runtime::config::VmConfig;
use crate::runtime::console::Console;
use crate::runtime::frame::Frame;
use crate::runtime::runtime_error::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Halted,
    Faulted,
}

/// What the dispatch loop does after an op.
enum Flow {
    Next,
    Jump(usize),
    Halt(Option<Value>),
}

/// Stack machine over a flat op sequence.
///
/// The root frame is never popped. `Return` in a callee frame resumes the caller at the
/// address stored at the bottom of the callee's stack; in the root frame it halts and
/// the returned value becomes the program's result.
pub struct Vm<'a> {
    ops: Vec<Op>,
    ip: usize,
    frames: Vec<Frame>,
    builtins: &'static HashMap<&'static str, Builtin>,
    config: VmConfig,
    console: Console<'a>,
    state: RunState,
}

impl<'a> Vm<'a> {
    pub fn new(ops: Vec<Op>, config: VmConfig, console: Console<'a>) -> Self {
        Vm {
            ops,
            ip: 0,
            frames: vec![Frame::new()],
            builtins: &BUILTINS,
            config,
            console,
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Live frames, the root frame included.
    pub fn frames(&self) -> usize {
        self.frames.len()
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Operand stack of the innermost frame.
    pub fn stack(&self) -> &[Value] {
        match self.frames.last() {
            Some(frame) => frame.stack(),
            None => &[],
        }
    }

    /// Runs until the program halts or faults. Running off the end of the ops halts.
    pub fn run(&mut self) -> Result<Option<Value>, RuntimeError> {
        while self.state == RunState::Running {
            let Some(op) = self.ops.get(self.ip).cloned() else {
                self.state = RunState::Halted;
                return Ok(None);
            };
            trace!(ip = self.ip, frames = self.frames.len(), %op, "dispatch");

            match self.step(&op) {
                Ok(Flow::Next) => self.ip += 1,
                Ok(Flow::Jump(addr)) => self.ip = addr,
                Ok(Flow::Halt(result)) => {
                    self.state = RunState::Halted;
                    debug!(ip = self.ip, result = ?result, "halted");
                    return Ok(result);
                }
                Err(e) => {
                    self.state = RunState::Faulted;
                    debug!(ip = self.ip, error = %e, "faulted");
                    return Err(e);
                }
            }
        }
        Ok(None)
    }

    // Frame access

    fn frame(&mut self) -> &mut Frame {
        // the root frame is never popped
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn push(&mut self, value: Value) {
        self.frame().push(value);
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.frame().pop()
    }

    fn pop_number(&mut self) -> Result<f64, RuntimeError> {
        let value = self.pop()?;
        value.to_number().ok_or_else(|| RuntimeError::not_a_number(&value))
    }

    /// Pops `( rhs lhs )` and returns `(lhs, rhs)`.
    fn pop_operands(&mut self) -> Result<(Value, Value), RuntimeError> {
        let lhs = self.pop()?;
        let rhs = self.pop()?;
        Ok((lhs, rhs))
    }

    fn pop_numbers(&mut self) -> Result<(f64, f64), RuntimeError> {
        let lhs = self.pop_number()?;
        let rhs = self.pop_number()?;
        Ok((lhs, rhs))
    }

    fn pop_index(&mut self, err: fn(String) -> RuntimeError) -> Result<usize, RuntimeError> {
        let value = self.pop()?;
        value.to_index().ok_or_else(|| err(value.to_string()))
    }

    fn pop_address(&mut self) -> Result<usize, RuntimeError> {
        let addr = self.pop_index(RuntimeError::InvalidAddress)?;
        if addr >= self.ops.len() {
            return Err(RuntimeError::InvalidAddress(addr.to_string()));
        }
        Ok(addr)
    }

    /// Pops the assigned flag and, when set, the destination slot below it.
    fn pop_destination(&mut self) -> Result<Option<Value>, RuntimeError> {
        let flag = self.pop()?;
        if !matches!(flag, Value::Number(n) if n == 0.0) {
            Ok(Some(self.pop()?))
        } else {
            Ok(None)
        }
    }

    /// Pops `argc` `(slot value)` pairs; the last argument is on top.
    fn pop_arguments(&mut self, argc: usize) -> Result<Vec<(Value, Value)>, RuntimeError> {
        let mut args = Vec::with_capacity(argc);
        for _ in 0..argc {
            let value = self.pop()?;
            let slot = self.pop()?;
            args.push((slot, value));
        }
        args.reverse();
        Ok(args)
    }

    // Dispatch

    fn step(&mut self, op: &Op) -> Result<Flow, RuntimeError> {
        match op {
            Op::Or => {
                let (lhs, rhs) = self.pop_operands()?;
                self.push(if lhs.is_truthy() { lhs } else { rhs });
            }
            Op::And => {
                let (lhs, rhs) = self.pop_operands()?;
                self.push(if lhs.is_truthy() { rhs } else { lhs });
            }
            Op::Eq => {
                let (lhs, rhs) = self.pop_operands()?;
                self.push(Value::Bool(lhs == rhs));
            }
            Op::Neq => {
                let (lhs, rhs) = self.pop_operands()?;
                self.push(Value::Bool(lhs != rhs));
            }
            Op::Less => {
                let (lhs, rhs) = self.pop_numbers()?;
                self.push(Value::Bool(lhs < rhs));
            }
            Op::LessEq => {
                let (lhs, rhs) = self.pop_numbers()?;
                self.push(Value::Bool(lhs <= rhs));
            }
            Op::Greater => {
                let (lhs, rhs) = self.pop_numbers()?;
                self.push(Value::Bool(lhs > rhs));
            }
            Op::GreaterEq => {
                let (lhs, rhs) = self.pop_numbers()?;
                self.push(Value::Bool(lhs >= rhs));
            }
            Op::Add => {
                let (lhs, rhs) = self.pop_operands()?;
                let result = match (&lhs, &rhs) {
                    (Value::String(a), Value::String(b)) => Value::String(format!("{}{}", a, b)),
                    _ => Value::Number(number(&lhs)? + number(&rhs)?),
                };
                self.push(result);
            }
            Op::Sub => {
                let (lhs, rhs) = self.pop_numbers()?;
                self.push(Value::Number(lhs - rhs));
            }
            Op::Mul => {
                let (lhs, rhs) = self.pop_numbers()?;
                self.push(Value::Number(lhs * rhs));
            }
            Op::Div => {
                let (lhs, rhs) = self.pop_numbers()?;
                if rhs == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                self.push(Value::Number(lhs / rhs));
            }
            Op::DivRem => {
                let (lhs, rhs) = self.pop_numbers()?;
                if rhs == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                // floored: the result takes the sign of the divisor
                self.push(Value::Number(lhs - (lhs / rhs).floor() * rhs));
            }
            Op::UnaryPlus => {
                let n = self.pop_number()?;
                self.push(Value::Number(n));
            }
            Op::UnaryMinus => {
                let n = self.pop_number()?;
                self.push(Value::Number(-n));
            }
            Op::UnaryNot => {
                let value = self.pop()?;
                self.push(Value::Bool(!value.is_truthy()));
            }

            Op::Pushv(slot) => {
                let value = self.frame().get(*slot);
                self.push(value);
            }
            Op::Pushl(value) => self.push(value.clone()),
            Op::Pop => {
                self.pop()?;
            }
            Op::Load => {
                let value = self.pop()?;
                let slot = self.pop_index(RuntimeError::InvalidSlot)?;
                self.frame().bind(slot, value);
            }
            Op::Jmp => return Ok(Flow::Jump(self.pop_address()?)),
            Op::CJmp => {
                let cond = self.pop()?;
                let addr = self.pop_address()?;
                if cond.is_truthy() {
                    return Ok(Flow::Jump(addr));
                }
            }
            Op::Call => return self.call(),
            Op::Callb => self.call_builtin()?,
            Op::Return => {
                let value = self.pop()?;
                if self.frames.len() == 1 {
                    return Ok(Flow::Halt(Some(value)));
                }
                let ret = self.pop_index(RuntimeError::InvalidAddress)?;
                self.frames.pop();
                self.push(value);
                return Ok(Flow::Jump(ret));
            }
            Op::Hault => return Ok(Flow::Halt(None)),
        }
        Ok(Flow::Next)
    }

    fn call(&mut self) -> Result<Flow, RuntimeError> {
        if self.frames.len() >= self.config.max_frames {
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_frames,
            });
        }

        let argc = self.pop_index(RuntimeError::InvalidOperand)?;
        let addr = self.pop_address()?;
        let dest = self.pop_destination()?;

        let mut callee = Frame::new();
        callee.push(Value::from(self.ip + 1));
        for (slot, value) in self.pop_arguments(argc)? {
            let slot = slot
                .to_index()
                .ok_or_else(|| RuntimeError::InvalidSlot(slot.to_string()))?;
            callee.bind(slot, value);
        }

        if let Some(dest) = dest {
            self.push(dest);
        }
        self.frames.push(callee);
        Ok(Flow::Jump(addr))
    }

    fn call_builtin(&mut self) -> Result<(), RuntimeError> {
        let argc = self.pop_index(RuntimeError::InvalidOperand)?;
        let name = match self.pop()? {
            Value::String(name) => name,
            other => return Err(RuntimeError::InvalidOperand(other.to_string())),
        };
        let dest = self.pop_destination()?;
        let args: Vec<Value> = self
            .pop_arguments(argc)?
            .into_iter()
            .map(|(_, value)| value)
            .collect();

        let builtin = *self
            .builtins
            .get(name.as_str())
            .ok_or_else(|| RuntimeError::UnknownBuiltin(name.clone()))?;
        let result = builtin(&args, &mut self.console)?;

        if let Some(dest) = dest {
            self.push(dest);
        }
        self.push(result);
        Ok(())
    }
}

fn number(value: &Value) -> Result<f64, RuntimeError> {
    value.to_number().ok_or_else(|| RuntimeError::not_a_number(value))
}
