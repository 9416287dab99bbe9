use crate::error::InventoryError;
use crate::models::session::{REMOTE_SESSION_NAME, RawSessionRow};

/// Column layout of a session table row.
///
/// The session tool drops `SESSIONNAME` for disconnected and remote sessions,
/// which slides every later column one position left. That is the only
/// malformation repaired here; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// `SESSIONNAME USERNAME ID STATE [TYPE] [DEVICE]`
    Aligned,
    /// `USERNAME ID STATE [TYPE] [DEVICE]`
    ShiftedLeft,
}

/// Parse the whole table, skipping blank lines and the header.
pub fn parse_session_table(output: &str) -> Result<Vec<RawSessionRow>, InventoryError> {
    let mut rows = Vec::new();
    for line in output.lines() {
        if let Some(row) = parse_session_row(line)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Parse one line. `Ok(None)` for blank and header lines.
pub fn parse_session_row(line: &str) -> Result<Option<RawSessionRow>, InventoryError> {
    let fields = tokenize(line);

    if fields.is_empty() {
        return Ok(None);
    }
    if fields[0].eq_ignore_ascii_case("SESSIONNAME") {
        return Ok(None);
    }
    if fields.len() < 3 {
        return Err(InventoryError::malformed(line, "expected at least 3 fields"));
    }

    let row = match detect_layout(&fields) {
        RowLayout::Aligned => {
            if fields.len() < 4 {
                return Err(InventoryError::malformed(line, "missing STATE column"));
            }
            if fields.len() > 6 {
                return Err(InventoryError::malformed(line, "too many columns"));
            }
            RawSessionRow {
                session_name: fields[0].to_string(),
                user_name: fields[1].to_string(),
                id: fields[2].to_string(),
                state: fields[3].to_string(),
                session_type: fields.get(4).map(|s| s.to_string()),
                device: fields.get(5).map(|s| s.to_string()),
            }
        }
        RowLayout::ShiftedLeft => {
            if fields.len() > 5 {
                return Err(InventoryError::malformed(line, "too many columns"));
            }
            RawSessionRow {
                session_name: REMOTE_SESSION_NAME.to_string(),
                user_name: fields[0].to_string(),
                id: fields[1].to_string(),
                state: fields[2].to_string(),
                session_type: fields.get(3).map(|s| s.to_string()),
                device: fields.get(4).map(|s| s.to_string()),
            }
        }
    };

    if !is_session_id(&row.id) {
        return Err(InventoryError::malformed(
            line,
            format!("session id '{}' is not numeric", row.id),
        ));
    }

    Ok(Some(row))
}

/// A `USERNAME` slot with no letters in it is really the session id.
pub fn detect_layout(fields: &[&str]) -> RowLayout {
    match fields.get(1) {
        Some(user) if !user.chars().any(char::is_alphabetic) => RowLayout::ShiftedLeft,
        _ => RowLayout::Aligned,
    }
}

/// Whitespace-separated fields, with the current-session marker `>` removed.
fn tokenize(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split_whitespace().collect();
    if let Some(first) = fields.first().copied() {
        match first.strip_prefix('>') {
            Some("") => {
                fields.remove(0);
            }
            Some(rest) => fields[0] = rest,
            None => {}
        }
    }
    fields
}

fn is_session_id(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
