//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`CellValue`], [`CellGrid`] - Resolved values and their sparse storage
//! - [`CellRef`] - Cell reference parsing (A0 notation ↔ col/row indices)
//! - [`FormulaRegistry`] - Formulas and the cells that depend on them
//! - [`resolve_order`] - Evaluation ordering and circular dependency detection
//! - [`substitute_references`] - Inline resolved values into a formula
//! - [`eval_postfix`] - Evaluate a postfix arithmetic expression
//! - [`format_value`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod format;
mod preprocess;

pub use cell::{CellGrid, CellValue};
pub use cell_ref::{CellRef, is_reference_token};
pub use cycle::{CycleMarking, Resolution, resolve_order};
pub use deps::{FormulaEntry, FormulaRegistry, NodeId, extract_dependencies};
pub use error::CellError;
pub use eval::eval_postfix;
pub use format::{ERROR_MARKER, format_value};
pub use preprocess::substitute_references;
