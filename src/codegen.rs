//! AST → three-address IR.
//!
//! Every expression result lands in a fresh temporary (`__tmp0`, `__tmp1`, ...). The
//! `__tmp` prefix is reserved; source programs should not use it.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{
    AddExpr, AndExpr, BinaryOp, CallExpr, CmpExpr, EqExpr, Expr, FunctionDeclaration,
    IfStatement, MulExpr, Program, Statement, StatementList, UnaryExpr, ValueExpr,
    WhileStatement,
};
use crate::codegen_error::CodegenError;
use crate::ir::{CallSite, InstrId, Instruction, IrValue, LinearIr, linearize};

/// Placeholder for a target that is patched once the destination exists.
const PENDING: InstrId = InstrId::MAX;

const NIL: &str = "nil";

#[derive(Debug, Clone)]
struct FunctionInfo {
    entry: InstrId,
    params: Vec<String>,
}

pub struct CodeGenerator {
    arena: Vec<Instruction>,
    temp_counter: usize,
    /// Innermost last. A function is registered in the scope enclosing its body.
    namespaces: Vec<HashMap<String, FunctionInfo>>,
    /// One entry per enclosing loop: the `break` gotos still waiting for the loop end.
    loop_exits: Vec<Vec<InstrId>>,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator {
            arena: Vec::new(),
            temp_counter: 0,
            namespaces: vec![HashMap::new()],
            loop_exits: Vec::new(),
        }
    }

    /// Lowers a whole program, appends `End` and linearizes.
    pub fn generate(mut self, program: &Program) -> Result<LinearIr, CodegenError> {
        self.statement_list(&program.statements)?;
        self.emit(Instruction::End);
        debug!(
            arena = self.arena.len(),
            temporaries = self.temp_counter,
            "generated IR"
        );
        Ok(linearize(self.arena)?)
    }

    fn emit(&mut self, instr: Instruction) -> InstrId {
        self.arena.push(instr);
        self.arena.len() - 1
    }

    fn patch(&mut self, at: InstrId, target: InstrId) {
        if let Some(slot) = self.arena.get_mut(at).and_then(Instruction::target_mut) {
            *slot = target;
        }
    }

    fn new_temp(&mut self) -> String {
        let name = format!("__tmp{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    fn assign(&mut self, lhs: String, rhs: IrValue) -> InstrId {
        self.emit(Instruction::Assignment { lhs, rhs })
    }

    fn lookup(&self, name: &str) -> Option<&FunctionInfo> {
        self.namespaces.iter().rev().find_map(|ns| ns.get(name))
    }

    // Statements

    fn statement_list(&mut self, list: &StatementList) -> Result<(), CodegenError> {
        for statement in &list.statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    /// Generates a branch or loop body; an empty one still gets an instruction to target.
    fn block(&mut self, list: &StatementList) -> Result<InstrId, CodegenError> {
        let start = self.arena.len();
        self.statement_list(list)?;
        if self.arena.len() == start {
            self.emit(Instruction::Blank);
        }
        Ok(start)
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), CodegenError> {
        match statement {
            Statement::If(stmt) => self.if_statement(stmt),
            Statement::While(stmt) => self.while_statement(stmt),
            Statement::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => self.expr(expr)?,
                    None => NIL.to_string(),
                };
                self.emit(Instruction::Return(value));
                Ok(())
            }
            Statement::Break => {
                let goto = self.emit(Instruction::Goto(PENDING));
                self.loop_exits
                    .last_mut()
                    .ok_or(CodegenError::BreakOutsideLoop)?
                    .push(goto);
                Ok(())
            }
            Statement::VarDecl(decl) => {
                let value = self.expr(&decl.value)?;
                self.assign(decl.name.clone(), IrValue::Single(value));
                Ok(())
            }
            Statement::FunctionDecl(decl) => self.function_declaration(decl),
            Statement::Call(call) => {
                let site = self.call(call)?;
                self.emit(Instruction::Call(site));
                Ok(())
            }
        }
    }

    fn if_statement(&mut self, stmt: &IfStatement) -> Result<(), CodegenError> {
        let cond = self.expr(&stmt.cond)?;
        let to_then = self.emit(Instruction::IfGoto {
            cond,
            target: PENDING,
        });
        let to_else = self.emit(Instruction::Goto(PENDING));

        let then_start = self.block(&stmt.then_branch)?;
        let to_end = self.emit(Instruction::Goto(PENDING));
        let else_start = self.block(&stmt.else_branch)?;
        let end = self.emit(Instruction::Blank);

        self.patch(to_then, then_start);
        self.patch(to_else, else_start);
        self.patch(to_end, end);
        Ok(())
    }

    fn while_statement(&mut self, stmt: &WhileStatement) -> Result<(), CodegenError> {
        let to_cond = self.emit(Instruction::Goto(PENDING));

        self.loop_exits.push(Vec::new());
        let body_start = self.arena.len();
        let body = self.statement_list(&stmt.body);
        let breaks = self.loop_exits.pop().unwrap_or_default();
        body?;

        let cond_start = self.arena.len();
        let cond = self.expr(&stmt.cond)?;
        self.emit(Instruction::IfGoto {
            cond,
            target: body_start,
        });
        let end = self.emit(Instruction::Blank);

        self.patch(to_cond, cond_start);
        for goto in breaks {
            self.patch(goto, end);
        }
        Ok(())
    }

    fn function_declaration(&mut self, decl: &FunctionDeclaration) -> Result<(), CodegenError> {
        let to_end = self.emit(Instruction::Goto(PENDING));
        let entry = self.emit(Instruction::Blank);

        if let Some(scope) = self.namespaces.last_mut() {
            scope.insert(
                decl.name.clone(),
                FunctionInfo {
                    entry,
                    params: decl.params.clone(),
                },
            );
        }

        // A function body is not inside any enclosing loop.
        let outer_loops = std::mem::take(&mut self.loop_exits);
        self.namespaces.push(HashMap::new());
        let body = self.statement_list(&decl.body);
        self.namespaces.pop();
        self.loop_exits = outer_loops;
        body?;

        self.emit(Instruction::Return(NIL.to_string()));
        let end = self.emit(Instruction::Blank);
        self.patch(to_end, end);
        Ok(())
    }

    // Expressions

    fn call(&mut self, call: &CallExpr) -> Result<CallSite, CodegenError> {
        let args = call
            .args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(function) = self.lookup(&call.name).cloned() else {
            let argc = args.len();
            for value in args {
                self.emit(Instruction::Parameter { value, name: None });
            }
            return Ok(CallSite {
                name: call.name.clone(),
                argc,
                target: None,
            });
        };

        if args.len() > function.params.len() {
            return Err(CodegenError::TooManyArguments {
                name: call.name.clone(),
                expected: function.params.len(),
                found: args.len(),
            });
        }

        let mut args = args.into_iter();
        for param in &function.params {
            let value = args.next().unwrap_or_else(|| NIL.to_string());
            self.emit(Instruction::Parameter {
                value,
                name: Some(param.clone()),
            });
        }
        Ok(CallSite {
            name: call.name.clone(),
            argc: function.params.len(),
            target: Some(function.entry),
        })
    }

    /// Evaluates an expression and returns the name holding its value.
    fn expr(&mut self, expr: &Expr) -> Result<String, CodegenError> {
        let ops = vec![BinaryOp::Or; expr.exprs.len().saturating_sub(1)];
        self.chain(&expr.exprs, &ops, Self::and_expr)
    }

    fn and_expr(&mut self, expr: &AndExpr) -> Result<String, CodegenError> {
        let ops = vec![BinaryOp::And; expr.exprs.len().saturating_sub(1)];
        self.chain(&expr.exprs, &ops, Self::eq_expr)
    }

    fn eq_expr(&mut self, expr: &EqExpr) -> Result<String, CodegenError> {
        self.chain(&expr.exprs, &expr.ops, Self::cmp_expr)
    }

    fn cmp_expr(&mut self, expr: &CmpExpr) -> Result<String, CodegenError> {
        self.chain(&expr.exprs, &expr.ops, Self::add_expr)
    }

    fn add_expr(&mut self, expr: &AddExpr) -> Result<String, CodegenError> {
        self.chain(&expr.exprs, &expr.ops, Self::mul_expr)
    }

    fn mul_expr(&mut self, expr: &MulExpr) -> Result<String, CodegenError> {
        self.chain(&expr.exprs, &expr.ops, Self::unary_expr)
    }

    /// Folds one binary layer left to right. Every operand is evaluated.
    fn chain<T>(
        &mut self,
        exprs: &[T],
        ops: &[BinaryOp],
        mut operand: impl FnMut(&mut Self, &T) -> Result<String, CodegenError>,
    ) -> Result<String, CodegenError> {
        let Some((first, rest)) = exprs.split_first() else {
            return Ok(NIL.to_string());
        };
        let mut prev = operand(self, first)?;
        for (expr, op) in rest.iter().zip(ops) {
            let cur = operand(self, expr)?;
            let tmp = self.new_temp();
            self.assign(
                tmp.clone(),
                IrValue::Binary {
                    op: *op,
                    lhs: prev,
                    rhs: cur,
                },
            );
            prev = tmp;
        }
        Ok(prev)
    }

    fn unary_expr(&mut self, expr: &UnaryExpr) -> Result<String, CodegenError> {
        let mut value = self.value_expr(&expr.value)?;
        for op in &expr.ops {
            let tmp = self.new_temp();
            self.assign(
                tmp.clone(),
                IrValue::Unary {
                    op: *op,
                    operand: value,
                },
            );
            value = tmp;
        }
        Ok(value)
    }

    fn value_expr(&mut self, expr: &ValueExpr) -> Result<String, CodegenError> {
        let rhs = match expr {
            ValueExpr::Paren(inner) => return self.expr(inner),
            ValueExpr::Id(name) => IrValue::Single(name.clone()),
            ValueExpr::Literal(literal) => IrValue::Single(literal.text.clone()),
            ValueExpr::Call(call) => IrValue::Call(self.call(call)?),
        };
        let tmp = self.new_temp();
        self.assign(tmp.clone(), rhs);
        Ok(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn try_gen(source: &str) -> Result<LinearIr, CodegenError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        CodeGenerator::new().generate(&program)
    }

    fn listing(source: &str) -> String {
        try_gen(source).unwrap().to_string()
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(listing(""), "0: end\n");
    }

    #[test]
    fn test_builtin_call_with_binary_argument() {
        assert_eq!(
            listing("print(1 + 2)"),
            "0: __tmp0 = 1\n\
             1: __tmp1 = 2\n\
             2: __tmp2 = __tmp0 + __tmp1\n\
             3: push parameter __tmp2\n\
             4: call print 1\n\
             5: end\n"
        );
    }

    #[test]
    fn test_assignment() {
        assert_eq!(listing("x = \"hi\""), "0: __tmp0 = \"hi\"\n1: x = __tmp0\n2: end\n");
    }

    #[test]
    fn test_operator_list_folds_left() {
        assert_eq!(
            listing("x = a - b - c"),
            "0: __tmp0 = a\n\
             1: __tmp1 = b\n\
             2: __tmp2 = __tmp0 - __tmp1\n\
             3: __tmp3 = c\n\
             4: __tmp4 = __tmp2 - __tmp3\n\
             5: x = __tmp4\n\
             6: end\n"
        );
    }

    #[test]
    fn test_unary_prefixes_apply_left_to_right() {
        assert_eq!(
            listing("x = - not y"),
            "0: __tmp0 = y\n\
             1: __tmp1 = - __tmp0\n\
             2: __tmp2 = not __tmp1\n\
             3: x = __tmp2\n\
             4: end\n"
        );
    }

    #[test]
    fn test_if_without_else() {
        assert_eq!(
            listing("if x then y = 1 end"),
            "0: __tmp0 = x\n\
             1: if __tmp0 goto 3\n\
             2: goto 6\n\
             3: __tmp1 = 1\n\
             4: y = __tmp1\n\
             5: goto 6\n\
             6: end\n"
        );
    }

    #[test]
    fn test_if_with_else() {
        assert_eq!(
            listing("if x then y = 1 else y = 2 end"),
            "0: __tmp0 = x\n\
             1: if __tmp0 goto 3\n\
             2: goto 6\n\
             3: __tmp1 = 1\n\
             4: y = __tmp1\n\
             5: goto 8\n\
             6: __tmp2 = 2\n\
             7: y = __tmp2\n\
             8: end\n"
        );
    }

    #[test]
    fn test_empty_while_body_jumps_to_condition() {
        assert_eq!(
            listing("while x do end"),
            "0: goto 1\n1: __tmp0 = x\n2: if __tmp0 goto 1\n3: end\n"
        );
    }

    #[test]
    fn test_break_targets_loop_end() {
        assert_eq!(
            listing("while x do break end"),
            "0: goto 2\n\
             1: goto 4\n\
             2: __tmp0 = x\n\
             3: if __tmp0 goto 1\n\
             4: end\n"
        );
    }

    #[test]
    fn test_break_outside_loop() {
        assert!(matches!(
            try_gen("break"),
            Err(CodegenError::BreakOutsideLoop)
        ));
    }

    #[test]
    fn test_break_in_function_inside_loop_is_outside_loop() {
        assert!(matches!(
            try_gen("while x do function f() break end end"),
            Err(CodegenError::BreakOutsideLoop)
        ));
    }

    #[test]
    fn test_function_declaration_and_call() {
        assert_eq!(
            listing("function f(a) return a end f(1)"),
            "0: goto 5\n\
             1: __tmp0 = a\n\
             2: return __tmp0\n\
             3: return nil\n\
             4: return nil\n\
             5: __tmp1 = 1\n\
             6: push parameter a = __tmp1\n\
             7: call f 1 1\n\
             8: end\n"
        );
    }

    #[test]
    fn test_missing_arguments_padded_with_nil() {
        let ir = listing("function f(a, b) end f(1)");
        assert!(ir.contains("push parameter a = __tmp0\n"), "{}", ir);
        assert!(ir.contains("push parameter b = nil\n"), "{}", ir);
        assert!(ir.contains("call f 2 1\n"), "{}", ir);
    }

    #[test]
    fn test_too_many_arguments() {
        let err = try_gen("function f(a) end f(1, 2)").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::TooManyArguments {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_call_result_captured_in_temporary() {
        let ir = listing("function f() return 1 end x = f()");
        assert!(ir.contains("__tmp1 = call f 0 1\n"), "{}", ir);
        assert!(ir.contains("x = __tmp1\n"), "{}", ir);
    }

    #[test]
    fn test_recursive_call_resolves_to_entry() {
        let ir = listing("function f(n) f(n) end");
        assert!(ir.contains("call f 1 1\n"), "{}", ir);
    }

    #[test]
    fn test_forward_reference_is_builtin_call() {
        let ir = listing("g() function g() end");
        assert!(ir.starts_with("0: call g 0\n"), "{}", ir);
    }

    #[test]
    fn test_nested_function_not_visible_outside() {
        let ir = listing("function outer() function inner() end inner() end inner()");
        // the inner call resolves, the outer one falls back to a builtin call
        assert!(ir.contains("call inner 0 2\n"), "{}", ir);
        assert!(ir.contains("call inner 0\n"), "{}", ir);
    }
}
