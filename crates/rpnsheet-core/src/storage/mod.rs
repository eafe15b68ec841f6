//! Row loading and tab-separated table output

pub(crate) mod csv;
mod table;

pub use csv::parse_rows;
pub use table::{render_table, write_table};
