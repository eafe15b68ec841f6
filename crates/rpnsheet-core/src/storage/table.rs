//! Tab-separated table output

use crate::document::Sheet;
use crate::error::Result;
use rpnsheet_engine::engine::CellRef;
use std::path::Path;

/// Render the resolved sheet as a tab-separated table.
///
/// The header row holds the column letters after an empty corner field;
/// each following row starts with its row number. Empty cells print as empty
/// fields and failed cells as `#ERR`.
pub fn render_table(sheet: &Sheet) -> String {
    let Some(dims) = sheet.dimensions() else {
        return String::new();
    };

    let mut out = String::new();

    let header: Vec<String> = std::iter::once(String::new())
        .chain((0..=dims.max_col).map(CellRef::col_to_letters))
        .collect();
    out.push_str(&header.join("\t"));
    out.push('\n');

    for row in 0..=dims.max_row {
        let fields: Vec<String> = std::iter::once(row.to_string())
            .chain((0..=dims.max_col).map(|col| sheet.display(&CellRef::new(col, row))))
            .collect();
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }

    out
}

/// Write the rendered table to a file
pub fn write_table(path: &Path, sheet: &Sheet) -> Result<()> {
    std::fs::write(path, render_table(sheet))?;
    Ok(())
}
