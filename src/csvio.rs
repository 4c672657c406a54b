//! Minimal CSV encoding and decoding for record logs and datasets.
//!
//! Record logs carry free-form model output, so fields may contain commas,
//! quotes, and embedded newlines. The parser is quote-aware and operates on
//! whole documents rather than lines for that reason.

/// Escape a single field for CSV output.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Encode one row, including the trailing newline.
pub fn encode_row(fields: &[&str]) -> String {
    let escaped: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    let mut row = escaped.join(",");
    row.push('\n');
    row
}

/// Parse a whole CSV document into rows of fields.
///
/// Handles quoted fields with embedded commas, doubled quotes, and embedded
/// newlines. CR is dropped so CRLF input parses the same as LF. Fully blank
/// lines are skipped.
pub fn parse_rows(content: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\n' => {
                    if !row.is_empty() || !field.is_empty() {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                }
                '\r' => {}
                _ => field.push(c),
            }
        }
    }

    // Final row when the document does not end with a newline
    if !row.is_empty() || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
