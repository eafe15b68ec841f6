//! Per-cell evaluation failures.
//!
//! None of these abort a run: the session stores `CellValue::Error` for the
//! failing cell and keeps the kind around as a diagnostic.

use thiserror::Error;

use super::cell_ref::CellRef;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("reference to undefined cell {0}")]
    UndefinedReference(CellRef),

    #[error("reference to non-integer cell {0}")]
    NonIntegerReference(CellRef),

    #[error("reference to out-of-range cell {0}")]
    InvalidReference(String),

    #[error("cell is part of a reference cycle")]
    CyclicReference,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("expression left {0} values on the stack")]
    UnbalancedExpression(usize),

    #[error("operator '{0}' needs two operands")]
    InsufficientOperands(char),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}
