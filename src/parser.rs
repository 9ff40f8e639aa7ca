use crate::ast::{
    AddExpr, AndExpr, BinaryOp, CallExpr, CmpExpr, EqExpr, Expr, FunctionDeclaration,
    IfStatement, Literal, LiteralKind, MulExpr, OrExpr, Program, ReturnStatement, Statement,
    StatementList, UnaryExpr, UnaryOp, ValueExpr, VarDeclaration, WhileStatement,
};
use crate::parser_error::ParserError;
use crate::token::{Tag, Token};

/// Recursive-descent parser with one token of lookahead.
///
/// Precedence is encoded by the call chain, lowest first:
/// `or → and → == ~= → < <= > >= → + - → * / % → unary + - not → value`.
///
/// The token list is terminated with a synthetic `EOF` token so lookahead never runs off
/// the end; the parser never advances past it.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a parser over lexer output, appending the `EOF` token.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let (line, pos) = match tokens.last() {
            Some(last) => (last.line, last.pos + last.value.chars().count()),
            None => (1, 1),
        };
        tokens.push(Token::new(Tag::Eof, line, pos, "EOF"));
        Parser { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Looks `offset` tokens ahead, saturating at `EOF`.
    fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn at(&self, tag: Tag) -> bool {
        self.current().is(tag)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is(Tag::Eof) {
            self.pos += 1;
        }
        token
    }

    fn consume(&mut self, tag: Tag) -> Result<Token, ParserError> {
        if self.at(tag) {
            Ok(self.advance())
        } else {
            Err(ParserError::expected(tag.name(), self.current()))
        }
    }

    fn consume_id(&mut self) -> Result<String, ParserError> {
        if self.at(Tag::Id) {
            Ok(self.advance().value)
        } else {
            Err(ParserError::unexpected(self.current()))
        }
    }

    /// Parses a complete source unit. Anything left before `EOF` is an error.
    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let statements = self.statement_list()?;
        self.consume(Tag::Eof)?;
        Ok(Program { statements })
    }

    fn statement_list(&mut self) -> Result<StatementList, ParserError> {
        let mut statements = Vec::new();
        while matches!(
            self.current().tag,
            Tag::If | Tag::While | Tag::Return | Tag::Break | Tag::Function | Tag::Id
        ) {
            statements.push(self.statement()?);
        }
        Ok(StatementList::new(statements))
    }

    fn statement(&mut self) -> Result<Statement, ParserError> {
        match self.current().tag {
            Tag::If => self.if_statement(),
            Tag::While => self.while_statement(),
            Tag::Return => self.return_statement(),
            Tag::Break => {
                self.advance();
                Ok(Statement::Break)
            }
            Tag::Function => self.function_declaration(),
            Tag::Id if self.peek(1).is(Tag::LParen) => Ok(Statement::Call(self.call_expr()?)),
            Tag::Id => self.var_declaration(),
            _ => Err(ParserError::unexpected(self.current())),
        }
    }

    /// `if cond then ... [else ...] end`
    fn if_statement(&mut self) -> Result<Statement, ParserError> {
        self.consume(Tag::If)?;
        let cond = self.expr()?;
        self.consume(Tag::Then)?;
        let then_branch = self.statement_list()?;
        let mut else_branch = StatementList::default();
        if !self.at(Tag::End) {
            self.consume(Tag::Else)?;
            else_branch = self.statement_list()?;
        }
        self.consume(Tag::End)?;
        Ok(Statement::If(IfStatement {
            cond,
            then_branch,
            else_branch,
        }))
    }

    /// `while cond do ... end`
    fn while_statement(&mut self) -> Result<Statement, ParserError> {
        self.consume(Tag::While)?;
        let cond = self.expr()?;
        self.consume(Tag::Do)?;
        let body = self.statement_list()?;
        self.consume(Tag::End)?;
        Ok(Statement::While(WhileStatement { cond, body }))
    }

    /// `return [expr]`
    ///
    /// The value is parsed only when the next token can start an expression. An
    /// identifier directly followed by `=` begins the next statement instead.
    fn return_statement(&mut self) -> Result<Statement, ParserError> {
        self.consume(Tag::Return)?;
        let cur = self.current();
        let has_value = cur.tag.starts_expression()
            && (!cur.is(Tag::Id) || !self.peek(1).is(Tag::Assign));
        let value = if has_value { Some(self.expr()?) } else { None };
        Ok(Statement::Return(ReturnStatement { value }))
    }

    /// `name = expr`
    fn var_declaration(&mut self) -> Result<Statement, ParserError> {
        let name = self.consume_id()?;
        self.consume(Tag::Assign)?;
        let value = self.expr()?;
        Ok(Statement::VarDecl(VarDeclaration { name, value }))
    }

    /// `function name(a, b) ... end`
    fn function_declaration(&mut self) -> Result<Statement, ParserError> {
        self.consume(Tag::Function)?;
        let name = self.consume_id()?;
        self.consume(Tag::LParen)?;
        let mut params = Vec::new();
        if !self.at(Tag::RParen) {
            params.push(self.consume_id()?);
            while !self.at(Tag::RParen) {
                self.consume(Tag::Comma)?;
                params.push(self.consume_id()?);
            }
        }
        self.consume(Tag::RParen)?;
        let mut body = self.statement_list()?;
        body.statements.push(Statement::Return(ReturnStatement { value: None }));
        self.consume(Tag::End)?;
        Ok(Statement::FunctionDecl(FunctionDeclaration { name, params, body }))
    }

    pub fn expr(&mut self) -> Result<Expr, ParserError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<OrExpr, ParserError> {
        let mut exprs = vec![self.and_expr()?];
        while self.at(Tag::Or) {
            self.advance();
            exprs.push(self.and_expr()?);
        }
        Ok(OrExpr { exprs })
    }

    fn and_expr(&mut self) -> Result<AndExpr, ParserError> {
        let mut exprs = vec![self.eq_expr()?];
        while self.at(Tag::And) {
            self.advance();
            exprs.push(self.eq_expr()?);
        }
        Ok(AndExpr { exprs })
    }

    fn eq_expr(&mut self) -> Result<EqExpr, ParserError> {
        let mut exprs = vec![self.cmp_expr()?];
        let mut ops = Vec::new();
        while let Some(op) = BinaryOp::equality(self.current().tag) {
            self.advance();
            ops.push(op);
            exprs.push(self.cmp_expr()?);
        }
        Ok(EqExpr { exprs, ops })
    }

    fn cmp_expr(&mut self) -> Result<CmpExpr, ParserError> {
        let mut exprs = vec![self.add_expr()?];
        let mut ops = Vec::new();
        while let Some(op) = BinaryOp::comparison(self.current().tag) {
            self.advance();
            ops.push(op);
            exprs.push(self.add_expr()?);
        }
        Ok(CmpExpr { exprs, ops })
    }

    fn add_expr(&mut self) -> Result<AddExpr, ParserError> {
        let mut exprs = vec![self.mul_expr()?];
        let mut ops = Vec::new();
        while let Some(op) = BinaryOp::additive(self.current().tag) {
            self.advance();
            ops.push(op);
            exprs.push(self.mul_expr()?);
        }
        Ok(AddExpr { exprs, ops })
    }

    fn mul_expr(&mut self) -> Result<MulExpr, ParserError> {
        let mut exprs = vec![self.unary_expr()?];
        let mut ops = Vec::new();
        while let Some(op) = BinaryOp::multiplicative(self.current().tag) {
            self.advance();
            ops.push(op);
            exprs.push(self.unary_expr()?);
        }
        Ok(MulExpr { exprs, ops })
    }

    fn unary_expr(&mut self) -> Result<UnaryExpr, ParserError> {
        let mut ops = Vec::new();
        while let Some(op) = UnaryOp::from_tag(self.current().tag) {
            self.advance();
            ops.push(op);
        }
        let value = self.value_expr()?;
        Ok(UnaryExpr { ops, value })
    }

    fn value_expr(&mut self) -> Result<ValueExpr, ParserError> {
        let kind = match self.current().tag {
            Tag::Id if self.peek(1).is(Tag::LParen) => {
                return Ok(ValueExpr::Call(self.call_expr()?));
            }
            Tag::Id => return Ok(ValueExpr::Id(self.advance().value)),
            Tag::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.consume(Tag::RParen)?;
                return Ok(ValueExpr::Paren(Box::new(inner)));
            }
            Tag::Boolean => LiteralKind::Boolean,
            Tag::Number => LiteralKind::Number,
            Tag::String => LiteralKind::String,
            Tag::Nil => LiteralKind::Nil,
            _ => return Err(ParserError::unexpected(self.current())),
        };
        let text = self.advance().value;
        Ok(ValueExpr::Literal(Literal { kind, text }))
    }

    /// `name(arg, ...)`
    fn call_expr(&mut self) -> Result<CallExpr, ParserError> {
        let name = self.consume_id()?;
        self.consume(Tag::LParen)?;
        let mut args = Vec::new();
        if !self.at(Tag::RParen) {
            args.push(self.expr()?);
            while !self.at(Tag::RParen) && !self.at(Tag::Eof) {
                self.consume(Tag::Comma)?;
                args.push(self.expr()?);
            }
        }
        self.consume(Tag::RParen)?;
        Ok(CallExpr { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Program {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    fn parse_err(source: &str) -> ParserError {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap_err()
    }

    /// Unwraps the single-operand layers down to the value of a bare expression.
    fn leaf(expr: &Expr) -> &UnaryExpr {
        &expr.exprs[0].exprs[0].exprs[0].exprs[0].exprs[0].exprs[0]
    }

    #[test]
    fn test_empty_program() {
        let program = parse("");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_assignment() {
        let program = parse("x = 1");
        assert_eq!(program.statements.len(), 1);
        match &program.statements.statements[0] {
            Statement::VarDecl(decl) => {
                assert_eq!(decl.name, "x");
                assert!(matches!(
                    &leaf(&decl.value).value,
                    ValueExpr::Literal(Literal { kind: LiteralKind::Number, text }) if text == "1"
                ));
            }
            other => panic!("expected VarDecl, got {other:?}"),
        }
    }

    #[test]
    fn test_call_statement() {
        let program = parse(r#"print("hi", x)"#);
        match &program.statements.statements[0] {
            Statement::Call(call) => {
                assert_eq!(call.name, "print");
                assert_eq!(call.args.len(), 2);
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_layers() {
        // 1 + 2 * 3 < 10 == true
        let program = parse("x = 1 + 2 * 3 < 10 == true");
        let Statement::VarDecl(decl) = &program.statements.statements[0] else {
            panic!("expected VarDecl");
        };
        let eq = &decl.value.exprs[0].exprs[0];
        assert_eq!(eq.ops, vec![BinaryOp::Eq]);
        let cmp = &eq.exprs[0];
        assert_eq!(cmp.ops, vec![BinaryOp::Less]);
        let add = &cmp.exprs[0];
        assert_eq!(add.ops, vec![BinaryOp::Add]);
        assert_eq!(add.exprs[1].ops, vec![BinaryOp::Mul]);
        assert_eq!(add.exprs[1].exprs.len(), 2);
    }

    #[test]
    fn test_left_associative_operator_list() {
        let program = parse("x = a - b + c");
        let Statement::VarDecl(decl) = &program.statements.statements[0] else {
            panic!("expected VarDecl");
        };
        let add = &decl.value.exprs[0].exprs[0].exprs[0].exprs[0];
        assert_eq!(add.exprs.len(), 3);
        assert_eq!(add.ops, vec![BinaryOp::Sub, BinaryOp::Add]);
    }

    #[test]
    fn test_or_and_layers() {
        let program = parse("x = a or b and c or d");
        let Statement::VarDecl(decl) = &program.statements.statements[0] else {
            panic!("expected VarDecl");
        };
        assert_eq!(decl.value.exprs.len(), 3);
        assert_eq!(decl.value.exprs[1].exprs.len(), 2);
    }

    #[test]
    fn test_unary_prefixes() {
        let program = parse("x = - not y");
        let Statement::VarDecl(decl) = &program.statements.statements[0] else {
            panic!("expected VarDecl");
        };
        let unary = leaf(&decl.value);
        assert_eq!(unary.ops, vec![UnaryOp::Minus, UnaryOp::Not]);
        assert!(matches!(&unary.value, ValueExpr::Id(name) if name == "y"));
    }

    #[test]
    fn test_parenthesized_and_call_values() {
        let program = parse("x = (a + 1) * f(2)");
        let Statement::VarDecl(decl) = &program.statements.statements[0] else {
            panic!("expected VarDecl");
        };
        let mul = &decl.value.exprs[0].exprs[0].exprs[0].exprs[0].exprs[0];
        assert!(matches!(&mul.exprs[0].value, ValueExpr::Paren(_)));
        assert!(matches!(&mul.exprs[1].value, ValueExpr::Call(call) if call.name == "f"));
    }

    #[test]
    fn test_if_without_else() {
        let program = parse("if x then y = 1 end");
        match &program.statements.statements[0] {
            Statement::If(stmt) => {
                assert_eq!(stmt.then_branch.len(), 1);
                assert!(stmt.else_branch.is_empty());
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn test_if_with_else_and_empty_then() {
        let program = parse("if x then else y = 2 z = 3 end");
        match &program.statements.statements[0] {
            Statement::If(stmt) => {
                assert!(stmt.then_branch.is_empty());
                assert_eq!(stmt.else_branch.len(), 2);
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn test_while_and_break() {
        let program = parse("while true do break end");
        match &program.statements.statements[0] {
            Statement::While(stmt) => {
                assert_eq!(stmt.body.statements, vec![Statement::Break]);
            }
            other => panic!("expected While, got {other:?}"),
        }
    }

    #[test]
    fn test_function_appends_bare_return() {
        let program = parse("function add(a, b) return a + b end");
        match &program.statements.statements[0] {
            Statement::FunctionDecl(func) => {
                assert_eq!(func.name, "add");
                assert_eq!(func.params, vec!["a", "b"]);
                assert_eq!(func.body.len(), 2);
                assert_eq!(
                    func.body.statements[1],
                    Statement::Return(ReturnStatement { value: None })
                );
            }
            other => panic!("expected FunctionDecl, got {other:?}"),
        }
    }

    #[test]
    fn test_function_without_params() {
        let program = parse("function f() end");
        assert!(matches!(
            &program.statements.statements[0],
            Statement::FunctionDecl(func) if func.params.is_empty() && func.body.len() == 1
        ));
    }

    #[test]
    fn test_return_without_value_before_assignment() {
        let program = parse("function f() return x = 1 end");
        let Statement::FunctionDecl(func) = &program.statements.statements[0] else {
            panic!("expected FunctionDecl");
        };
        assert_eq!(
            func.body.statements[0],
            Statement::Return(ReturnStatement { value: None })
        );
        assert!(matches!(&func.body.statements[1], Statement::VarDecl(d) if d.name == "x"));
    }

    #[test]
    fn test_return_with_identifier_value() {
        let program = parse("function f(n) return n end");
        let Statement::FunctionDecl(func) = &program.statements.statements[0] else {
            panic!("expected FunctionDecl");
        };
        assert!(matches!(
            &func.body.statements[0],
            Statement::Return(ReturnStatement { value: Some(_) })
        ));
    }

    #[test]
    fn test_return_at_end_of_block_has_no_value() {
        let program = parse("if x then return end");
        let Statement::If(stmt) = &program.statements.statements[0] else {
            panic!("expected If");
        };
        assert_eq!(
            stmt.then_branch.statements[0],
            Statement::Return(ReturnStatement { value: None })
        );
    }

    #[test]
    fn test_missing_end_reports_eof() {
        let err = parse_err("while x do y = 1");
        assert!(err.message.contains("expected 'end'"), "msg = {}", err.message);
        assert_eq!(err.found, "EOF");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_missing_then() {
        let err = parse_err("if x y = 1 end");
        assert!(err.message.contains("expected 'then'"), "msg = {}", err.message);
        assert_eq!((err.line, err.col), (1, 6));
    }

    #[test]
    fn test_unexpected_value_token() {
        let err = parse_err("x = )");
        assert!(err.message.contains("unexpected symbol ')'"));
        assert_eq!((err.line, err.col), (1, 5));
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let err = parse_err("x = 1\n)");
        assert_eq!((err.line, err.col), (2, 1));
        assert_eq!(err.found, ")");
    }

    #[test]
    fn test_missing_comma_between_arguments() {
        let err = parse_err("print(1 2)");
        assert!(err.message.contains("expected 'comma'"), "msg = {}", err.message);
    }

    #[test]
    fn test_error_display_format() {
        let err = parse_err("x = ");
        assert!(err.to_string().starts_with("1:"), "got {}", err);
    }
}
