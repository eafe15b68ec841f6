//! Row loading from delimited text

use rpnsheet_engine::engine::CellRef;

/// Split `content` into `(cell, raw text)` pairs in row-major order.
///
/// Every field is returned, blank ones included, so the caller sees the full
/// extent of each row.
pub fn parse_rows(content: &str, delimiter: char) -> Vec<(CellRef, String)> {
    let mut cells = Vec::new();

    for (row_idx, line) in content.lines().enumerate() {
        for (col_idx, field) in parse_csv_line(line, delimiter).into_iter().enumerate() {
            cells.push((CellRef::new(col_idx, row_idx), field));
        }
    }

    cells
}

/// Parse a single line, handling quoted fields
pub(crate) fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(c);
        }
    }
    fields.push(current.trim().to_string());
    fields
}
