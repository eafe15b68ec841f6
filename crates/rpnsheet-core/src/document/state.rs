use rpnsheet_engine::engine::{
    CellError, CellGrid, CellRef, CellValue, CycleMarking, FormulaRegistry, format_value,
};
use std::collections::HashMap;

/// Options that shape how a sheet is loaded and resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetOptions {
    pub cycle_marking: CycleMarking,
    /// Field separator for the row loader.
    pub delimiter: char,
}

impl Default for SheetOptions {
    fn default() -> Self {
        SheetOptions {
            cycle_marking: CycleMarking::default(),
            delimiter: ',',
        }
    }
}

/// Largest column and row index seen while loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub max_col: usize,
    pub max_row: usize,
}

/// One evaluation session: a grid built once, resolved once, then read-only.
///
/// Each input gets its own `Sheet`; there is no way to reset one.
#[derive(Debug, Default)]
pub struct Sheet {
    /// Resolved values
    pub(crate) grid: CellGrid,
    /// Formulas waiting for resolution (emptied by `resolve`)
    pub(crate) formulas: FormulaRegistry,
    /// Why each failed cell failed
    pub(crate) diagnostics: HashMap<CellRef, CellError>,
    pub(crate) dimensions: Option<Dimensions>,
    pub(crate) options: SheetOptions,
    pub(crate) resolved: bool,
}

impl Sheet {
    /// Create an empty session.
    pub fn new(options: SheetOptions) -> Self {
        Sheet {
            options,
            ..Sheet::default()
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Value of a cell; unwritten cells are `Empty`.
    pub fn value(&self, cell: &CellRef) -> CellValue {
        self.grid.get(cell)
    }

    /// Display string for a cell.
    pub fn display(&self, cell: &CellRef) -> String {
        format_value(&self.grid.get(cell))
    }

    /// Why a cell holds `Error`, if it does.
    pub fn diagnostic(&self, cell: &CellRef) -> Option<&CellError> {
        self.diagnostics.get(cell)
    }

    /// All failed cells with their reasons, in row-major order.
    pub fn diagnostics(&self) -> Vec<(CellRef, &CellError)> {
        let mut out: Vec<_> = self.diagnostics.iter().map(|(c, e)| (*c, e)).collect();
        out.sort_by_key(|(cell, _)| *cell);
        out
    }

    pub(crate) fn track_dimensions(&mut self, cell: &CellRef) {
        let dims = self.dimensions.get_or_insert(Dimensions {
            max_col: cell.col,
            max_row: cell.row,
        });
        dims.max_col = dims.max_col.max(cell.col);
        dims.max_row = dims.max_row.max(cell.row);
    }
}
