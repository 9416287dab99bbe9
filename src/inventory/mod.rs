pub mod correlator;
pub mod keys;
pub mod lock_state;
pub mod logon_time;
pub mod parser;
pub mod sessions;

use crate::config::settings::Settings;
use crate::error::InventoryError;
use crate::models::session::EnrichedSession;
use crate::remote::RemoteQuery;

pub use correlator::SessionCorrelator;

/// Reachability pre-check, then the full correlation for `host`.
pub async fn inventory_host<R: RemoteQuery>(
    remote: &R,
    host: &str,
    settings: &Settings,
) -> Result<Vec<EnrichedSession>, InventoryError> {
    let reachable = remote.ping(host).await.unwrap_or_else(|e| {
        log::debug!("[{}] reachability probe failed: {}", host, e);
        false
    });
    if !reachable {
        return Err(InventoryError::HostUnreachable {
            host: host.to_string(),
        });
    }

    SessionCorrelator::new(remote, settings).build_report(host).await
}
