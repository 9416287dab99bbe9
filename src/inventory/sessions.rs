use super::parser;
use crate::error::InventoryError;
use crate::models::session::{NormalizedSession, RawSessionRow, is_pseudo_user};
use crate::remote::RemoteQuery;

/// Human sessions on `host`, with the column shift repaired and pseudo-users removed.
pub async fn list_sessions<R: RemoteQuery>(
    remote: &R,
    host: &str,
) -> Result<Vec<NormalizedSession>, InventoryError> {
    let table = remote.session_table(host).await?;
    let rows = parser::parse_session_table(&table)?;
    log::debug!("[{}] session table has {} rows", host, rows.len());
    Ok(normalize_sessions(rows))
}

pub fn normalize_sessions(rows: Vec<RawSessionRow>) -> Vec<NormalizedSession> {
    rows.into_iter()
        .filter(|row| {
            let keep = !is_pseudo_user(&row.user_name);
            if keep {
                log::debug!(
                    "Session {} '{}' for {} ({}, type {}, device {})",
                    row.id,
                    row.session_name,
                    row.user_name,
                    row.state,
                    row.session_type.as_deref().unwrap_or("-"),
                    row.device.as_deref().unwrap_or("-")
                );
            } else {
                log::debug!("Skipping pseudo-user session '{}'", row.user_name);
            }
            keep
        })
        .map(NormalizedSession::from_row)
        .collect()
}
