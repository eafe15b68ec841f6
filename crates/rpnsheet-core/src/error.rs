//! Error types for rpnsheet core.
//!
//! Evaluation failures are per-cell data (see `CellError`) and never show up
//! here; these are the failures that stop a whole input from loading.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpnsheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Refusing to read {}: input too large ({size} bytes, max {max})", path.display())]
    InputTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Sheet has already been evaluated")]
    AlreadyResolved,
}

pub type Result<T> = std::result::Result<T, RpnsheetError>;
