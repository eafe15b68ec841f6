//! Reference substitution.
//!
//! Before a formula can be handed to the postfix evaluator, every cell
//! reference token is replaced by the referenced cell's resolved integer.
//! The output is a plain token stream joined by single spaces, e.g.
//! `A0 2 *` with `A0 = 5` becomes `5 2 *`.

use super::cell::CellGrid;
use super::cell_ref::{CellRef, is_reference_token};
use super::error::CellError;

/// Inline resolved values for every reference in `formula`.
///
/// Fails on the first reference that is undefined or does not hold an
/// integer; no partial substitution is returned.
pub fn substitute_references(formula: &str, grid: &CellGrid) -> Result<String, CellError> {
    let mut tokens: Vec<String> = Vec::new();

    for token in formula.split_whitespace() {
        if !is_reference_token(token) {
            tokens.push(token.to_string());
            continue;
        }

        let cell = CellRef::from_str(token)
            .ok_or_else(|| CellError::InvalidReference(token.to_string()))?;
        let value = grid
            .lookup(&cell)
            .ok_or(CellError::UndefinedReference(cell))?;
        let n = value
            .as_integer()
            .ok_or(CellError::NonIntegerReference(cell))?;
        tokens.push(n.to_string());
    }

    Ok(tokens.join(" "))
}
