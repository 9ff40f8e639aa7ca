use super::stmt::Statement;

/// A sequence of statements (a block body, a branch, or the whole program).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatementList {
    pub statements: Vec<Statement>,
}

impl StatementList {
    pub fn new(statements: Vec<Statement>) -> Self {
        StatementList { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

/// Parsed source unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: StatementList,
}
