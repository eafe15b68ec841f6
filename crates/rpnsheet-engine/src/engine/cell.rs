//! Cell data structures for the spreadsheet grid.
//!
//! - [`CellValue`] - The resolved value of a cell (integer, empty, or error)
//! - [`CellGrid`] - Sparse storage for resolved values

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::cell_ref::CellRef;

/// The final value of a cell.
///
/// The grid never holds a pending state: a coordinate is either absent
/// (reads as `Empty`) or carries its resolved value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellValue {
    Integer(i64),
    #[default]
    Empty,
    Error,
}

impl CellValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// Sparse grid of resolved values keyed by coordinate.
#[derive(Clone, Debug, Default)]
pub struct CellGrid {
    cells: HashMap<CellRef, CellValue>,
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at `cell`, with absent coordinates reading as `Empty`.
    pub fn get(&self, cell: &CellRef) -> CellValue {
        self.cells.get(cell).copied().unwrap_or_default()
    }

    /// Raw lookup that distinguishes "never written" from a stored value.
    pub fn lookup(&self, cell: &CellRef) -> Option<&CellValue> {
        self.cells.get(cell)
    }

    pub fn set(&mut self, cell: CellRef, value: CellValue) {
        self.cells.insert(cell, value);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
