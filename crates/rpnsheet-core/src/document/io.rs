use super::{Sheet, SheetOptions};
use crate::error::{Result, RpnsheetError};
use crate::storage::parse_rows;
use std::path::Path;

const MAX_INPUT_FILE_BYTES: u64 = 64 * 1_048_576; // 64 MiB

fn read_input_file(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_INPUT_FILE_BYTES {
        return Err(RpnsheetError::InputTooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max: MAX_INPUT_FILE_BYTES,
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

impl Sheet {
    /// Build and resolve a sheet from delimited text.
    pub fn load_str(content: &str, options: SheetOptions) -> Result<Self> {
        let mut sheet = Sheet::new(options);
        let rows = parse_rows(content, options.delimiter);
        let count = rows.len();
        for (cell_ref, input) in rows {
            sheet.set_cell_from_input(cell_ref, &input)?;
        }
        sheet.resolve();

        tracing::info!(
            cells = count,
            errors = sheet.diagnostics.len(),
            "sheet evaluated"
        );
        Ok(sheet)
    }

    /// Build and resolve a sheet from a file.
    pub fn load_file(path: &Path, options: SheetOptions) -> Result<Self> {
        let content = read_input_file(path)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "loaded input");
        Self::load_str(&content, options)
    }
}
