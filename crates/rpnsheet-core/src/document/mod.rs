//! Evaluation session state and logic.

mod io;
mod ops;
mod state;

pub use state::{Dimensions, Sheet, SheetOptions};
