use serde::{Deserialize, Serialize};

use super::value::IrValue;

/// Index of an instruction in its arena (and, after linearization, its id).
pub type InstrId = usize;

/// A call: `target` is the callee's entry for declared functions, `None` for builtins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub name: String,
    pub argc: usize,
    pub target: Option<InstrId>,
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call {} {}", self.name, self.argc)?;
        if let Some(target) = self.target {
            write!(f, " {}", target)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Goto(InstrId),
    IfGoto { cond: String, target: InstrId },
    Assignment { lhs: String, rhs: IrValue },
    Return(String),
    /// Pushes an argument. `name` is the callee's parameter for declared functions.
    Parameter { value: String, name: Option<String> },
    /// A call whose result is discarded.
    Call(CallSite),
    End,
    /// Jump-target placeholder, removed by linearization.
    Blank,
}

impl Instruction {
    pub fn is_blank(&self) -> bool {
        matches!(self, Instruction::Blank)
    }

    /// The jump or call target, if this instruction has one.
    pub fn target(&self) -> Option<InstrId> {
        match self {
            Instruction::Goto(target) | Instruction::IfGoto { target, .. } => Some(*target),
            Instruction::Call(call)
            | Instruction::Assignment {
                rhs: IrValue::Call(call),
                ..
            } => call.target,
            _ => None,
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut InstrId> {
        match self {
            Instruction::Goto(target) | Instruction::IfGoto { target, .. } => Some(target),
            Instruction::Call(call)
            | Instruction::Assignment {
                rhs: IrValue::Call(call),
                ..
            } => call.target.as_mut(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Goto(target) => write!(f, "goto {}", target),
            Instruction::IfGoto { cond, target } => write!(f, "if {} goto {}", cond, target),
            Instruction::Assignment { lhs, rhs } => write!(f, "{} = {}", lhs, rhs),
            Instruction::Return(value) => write!(f, "return {}", value),
            Instruction::Parameter {
                value,
                name: Some(name),
            } => write!(f, "push parameter {} = {}", name, value),
            Instruction::Parameter { value, name: None } => {
                write!(f, "push parameter {}", value)
            }
            Instruction::Call(call) => write!(f, "{}", call),
            Instruction::End => write!(f, "end"),
            Instruction::Blank => write!(f, "blank"),
        }
    }
}
