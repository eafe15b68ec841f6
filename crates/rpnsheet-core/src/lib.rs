//! rpnsheet-core - evaluation session, row loading and table output.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{Dimensions, Sheet, SheetOptions};
pub use error::{Result, RpnsheetError};

pub use rpnsheet_engine::engine::{CellRef, CellValue, CycleMarking};
