pub mod powershell;

#[cfg(test)]
pub mod mock;

use crate::error::InventoryError;
use crate::models::session::{LogonBinding, LogonSession, ProcessEntry};

pub use powershell::PowerShellRemote;

/// Queries the inventory needs from a remote Windows host.
///
/// Every call is one blocking round-trip from the caller's point of view; the
/// implementation decides how it reaches the host.
#[allow(async_fn_in_trait)]
pub trait RemoteQuery {
    /// Single reachability probe.
    async fn ping(&self, host: &str) -> Result<bool, InventoryError>;

    /// Raw session table: newline-delimited, whitespace-separated rows.
    async fn session_table(&self, host: &str) -> Result<String, InventoryError>;

    async fn logon_bindings(&self, host: &str) -> Result<Vec<LogonBinding>, InventoryError>;

    async fn logon_sessions(&self, host: &str) -> Result<Vec<LogonSession>, InventoryError>;

    /// Processes on `host` whose image name equals `image_name`.
    async fn find_processes(
        &self,
        host: &str,
        image_name: &str,
    ) -> Result<Vec<ProcessEntry>, InventoryError>;
}
