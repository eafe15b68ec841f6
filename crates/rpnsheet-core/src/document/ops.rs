use super::Sheet;
use crate::error::{Result, RpnsheetError};
use rpnsheet_engine::engine::{
    CellError, CellRef, CellValue, Resolution, eval_postfix, resolve_order, substitute_references,
};
use std::collections::HashSet;

impl Sheet {
    /// Classify raw cell text and store it.
    ///
    /// - Blank -> `Empty`
    /// - Contains an ASCII letter -> formula, resolved later by [`Sheet::resolve`]
    /// - Otherwise -> postfix expression, evaluated immediately
    pub fn set_cell_from_input(&mut self, cell: CellRef, input: &str) -> Result<()> {
        if self.resolved {
            return Err(RpnsheetError::AlreadyResolved);
        }
        self.track_dimensions(&cell);

        if input.trim().is_empty() {
            self.grid.set(cell, CellValue::Empty);
        } else if input.chars().any(|c| c.is_ascii_alphabetic()) {
            tracing::trace!(cell = %cell, formula = input, "registering formula");
            self.formulas.register(cell, input);
        } else {
            let result = eval_postfix(input);
            self.store(cell, result);
        }
        Ok(())
    }

    /// Resolve every registered formula.
    ///
    /// Cells implicated in a reference cycle are fixed to `Error` first;
    /// everything else is evaluated in dependency order, so a formula that
    /// reads a failed cell fails too. Calling this again is a no-op.
    pub fn resolve(&mut self) {
        if self.resolved {
            return;
        }
        self.resolved = true;

        let mut formulas = std::mem::take(&mut self.formulas);
        let Resolution { order, tainted } = resolve_order(&formulas, self.options.cycle_marking);

        for cell in &tainted {
            self.fail(*cell, CellError::CyclicReference);
        }
        let tainted: HashSet<CellRef> = tainted.into_iter().collect();

        for cell in order {
            if tainted.contains(&cell) {
                continue;
            }
            let Some(id) = formulas.id_of(&cell) else {
                continue;
            };
            let entry = formulas.entry_mut(id);
            let Some(text) = entry.text.as_mut() else {
                continue;
            };

            match substitute_references(text, &self.grid) {
                Ok(resolved) => {
                    *text = resolved;
                    let result = eval_postfix(text);
                    self.store(cell, result);
                }
                Err(err) => self.fail(cell, err),
            }
        }

        tracing::debug!(
            formulas = formulas.len(),
            cycles = tainted.len(),
            failed = self.diagnostics.len(),
            "resolution finished"
        );
    }

    fn store(&mut self, cell: CellRef, result: std::result::Result<i64, CellError>) {
        match result {
            Ok(n) => {
                tracing::debug!(cell = %cell, value = n, "evaluated");
                self.grid.set(cell, CellValue::Integer(n));
            }
            Err(err) => self.fail(cell, err),
        }
    }

    fn fail(&mut self, cell: CellRef, err: CellError) {
        tracing::debug!(cell = %cell, error = %err, "evaluation failed");
        self.grid.set(cell, CellValue::Error);
        self.diagnostics.insert(cell, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SheetOptions;
    use rpnsheet_engine::engine::CycleMarking;

    fn cell(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn sheet_with(cells: &[(&str, &str)], options: SheetOptions) -> Sheet {
        let mut sheet = Sheet::new(options);
        for (name, input) in cells {
            sheet.set_cell_from_input(cell(name), input).unwrap();
        }
        sheet.resolve();
        sheet
    }

    fn resolved(cells: &[(&str, &str)]) -> Sheet {
        sheet_with(cells, SheetOptions::default())
    }

    #[test]
    fn test_plain_expression() {
        let sheet = resolved(&[("A0", "3 4 +")]);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Integer(7));
    }

    #[test]
    fn test_formula_reads_resolved_value() {
        let sheet = resolved(&[("A0", "5"), ("A1", "A0 2 *")]);
        assert_eq!(sheet.value(&cell("A1")), CellValue::Integer(10));
    }

    #[test]
    fn test_formula_chain_registered_out_of_order() {
        let sheet = resolved(&[("A0", "C0 1 +"), ("B0", "2"), ("C0", "B0 B0 *")]);
        assert_eq!(sheet.value(&cell("C0")), CellValue::Integer(4));
        assert_eq!(sheet.value(&cell("A0")), CellValue::Integer(5));
    }

    #[test]
    fn test_two_cell_cycle() {
        let sheet = resolved(&[("A0", "A1 1 +"), ("A1", "A0 1 +")]);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Error);
        assert_eq!(sheet.value(&cell("A1")), CellValue::Error);
        assert_eq!(sheet.diagnostic(&cell("A0")), Some(&CellError::CyclicReference));
    }

    #[test]
    fn test_division_by_zero() {
        let sheet = resolved(&[("A0", "5 0 /")]);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Error);
        assert_eq!(sheet.diagnostic(&cell("A0")), Some(&CellError::DivisionByZero));
    }

    #[test]
    fn test_undefined_reference() {
        let sheet = resolved(&[("A0", "B5 1 +")]);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Error);
        assert_eq!(sheet.value(&cell("B5")), CellValue::Empty);
        assert_eq!(
            sheet.diagnostic(&cell("A0")),
            Some(&CellError::UndefinedReference(cell("B5")))
        );
    }

    #[test]
    fn test_insufficient_operands() {
        let sheet = resolved(&[("A0", "7 +")]);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Error);
        assert_eq!(
            sheet.diagnostic(&cell("A0")),
            Some(&CellError::InsufficientOperands('+'))
        );
    }

    #[test]
    fn test_dependent_of_cycle_fails() {
        let sheet = resolved(&[("A0", "A1 1 +"), ("A1", "A0 1 +"), ("B0", "A1 10 *")]);
        assert_eq!(sheet.value(&cell("B0")), CellValue::Error);
        assert_eq!(
            sheet.diagnostic(&cell("B0")),
            Some(&CellError::NonIntegerReference(cell("A1")))
        );
    }

    #[test]
    fn test_errors_cascade_through_chain() {
        let sheet = resolved(&[("A0", "1 0 /"), ("A1", "A0 1 +"), ("A2", "A1 1 +"), ("B0", "9")]);
        assert_eq!(sheet.value(&cell("A1")), CellValue::Error);
        assert_eq!(sheet.value(&cell("A2")), CellValue::Error);
        assert_eq!(sheet.value(&cell("B0")), CellValue::Integer(9));
    }

    #[test]
    fn test_blank_cell_is_empty_and_not_an_integer() {
        let sheet = resolved(&[("A0", "   "), ("A1", "A0 1 +")]);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Empty);
        assert!(sheet.diagnostic(&cell("A0")).is_none());
        assert_eq!(
            sheet.diagnostic(&cell("A1")),
            Some(&CellError::NonIntegerReference(cell("A0")))
        );
    }

    #[test]
    fn test_lowercase_reference_is_invalid_token() {
        let sheet = resolved(&[("A0", "1"), ("A1", "a0 1 +")]);
        assert_eq!(
            sheet.diagnostic(&cell("A1")),
            Some(&CellError::InvalidToken("a0".to_string()))
        );
    }

    #[test]
    fn test_non_ascii_letter_is_not_a_formula() {
        let sheet = resolved(&[("A0", "2 é +")]);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Error);
        assert_eq!(
            sheet.diagnostic(&cell("A0")),
            Some(&CellError::InvalidToken("é".to_string()))
        );
    }

    #[test]
    fn test_every_cycle_member_reports_cyclic_reference() {
        // C0 is closed into the A0 -> C0 -> B0 -> A0 cycle only through an
        // edge into a cell the traversal has already finished.
        let sheet = resolved(&[("A0", "B0 1 +"), ("B0", "A0 C0 +"), ("C0", "A0 1 +")]);
        for name in ["A0", "B0", "C0"] {
            assert_eq!(sheet.value(&cell(name)), CellValue::Error);
            assert_eq!(sheet.diagnostic(&cell(name)), Some(&CellError::CyclicReference));
        }
    }

    #[test]
    fn test_members_marking_keeps_upstream_value() {
        let cells = [("A0", "X0 2 +"), ("B0", "A0 B1 +"), ("B1", "B0 1 +"), ("X0", "5")];
        let sheet = resolved(&cells);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Integer(7));
        assert_eq!(sheet.value(&cell("X0")), CellValue::Integer(5));
        assert_eq!(sheet.value(&cell("B0")), CellValue::Error);
        assert_eq!(sheet.value(&cell("B1")), CellValue::Error);
    }

    #[test]
    fn test_active_path_marking_taints_upstream() {
        // A0 is registered first and leads into the B0 <-> B1 cycle.
        let cells = [("A0", "X0 2 +"), ("B0", "A0 B1 +"), ("B1", "B0 1 +"), ("X0", "5")];
        let options = SheetOptions {
            cycle_marking: CycleMarking::ActivePath,
            ..SheetOptions::default()
        };
        let sheet = sheet_with(&cells, options);
        assert_eq!(sheet.value(&cell("A0")), CellValue::Error);
        assert_eq!(sheet.diagnostic(&cell("A0")), Some(&CellError::CyclicReference));
        assert_eq!(sheet.value(&cell("B0")), CellValue::Error);
        assert_eq!(sheet.value(&cell("B1")), CellValue::Error);
    }

    #[test]
    fn test_resolve_is_idempotent_and_locks_input() {
        let mut sheet = resolved(&[("A0", "1 1 +")]);
        sheet.resolve();
        assert_eq!(sheet.value(&cell("A0")), CellValue::Integer(2));
        assert!(matches!(
            sheet.set_cell_from_input(cell("A1"), "1"),
            Err(RpnsheetError::AlreadyResolved)
        ));
    }

    #[test]
    fn test_dimensions_track_all_written_cells() {
        let sheet = resolved(&[("A0", "1"), ("C4", ""), ("B2", "A0")]);
        let dims = sheet.dimensions().unwrap();
        assert_eq!((dims.max_col, dims.max_row), (2, 4));
        assert_eq!(sheet.value(&cell("B2")), CellValue::Integer(1));
    }
}
