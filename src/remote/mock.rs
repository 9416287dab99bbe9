use std::sync::Mutex;

use super::RemoteQuery;
use crate::error::InventoryError;
use crate::models::session::{LogonBinding, LogonSession, ProcessEntry};

/// Canned remote host for tests. A `None` source makes that query fail.
#[derive(Default)]
pub struct MockRemote {
    pub reachable: bool,
    pub session_table: Option<String>,
    pub bindings: Option<Vec<LogonBinding>>,
    pub sessions: Option<Vec<LogonSession>>,
    pub processes: Option<Vec<ProcessEntry>>,
    calls: Mutex<Vec<String>>,
}

impl MockRemote {
    pub fn reachable(session_table: &str) -> Self {
        Self {
            reachable: true,
            session_table: Some(session_table.to_string()),
            bindings: Some(Vec::new()),
            sessions: Some(Vec::new()),
            processes: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_logons(mut self, bindings: Vec<LogonBinding>, sessions: Vec<LogonSession>) -> Self {
        self.bindings = Some(bindings);
        self.sessions = Some(sessions);
        self
    }

    pub fn with_processes(mut self, processes: Option<Vec<ProcessEntry>>) -> Self {
        self.processes = processes;
        self
    }

    /// Names of the queries made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

pub fn binding(user: &str, logon_id: &str) -> LogonBinding {
    LogonBinding {
        antecedent: format!(r#"\\.\root\cimv2:Win32_Account.Domain="CORP",Name="{}""#, user),
        dependent: format!(r#"\\.\root\cimv2:Win32_LogonSession.LogonId="{}""#, logon_id),
    }
}

pub fn logon(logon_id: &str, logon_type: u32, start_time: &str) -> LogonSession {
    LogonSession {
        logon_id: logon_id.to_string(),
        logon_type,
        start_time: Some(start_time.to_string()),
    }
}

pub fn logon_ui(process_id: u32) -> ProcessEntry {
    ProcessEntry {
        process_id,
        name: "LogonUI.exe".to_string(),
        session_id: Some(1),
    }
}

impl RemoteQuery for MockRemote {
    async fn ping(&self, host: &str) -> Result<bool, InventoryError> {
        self.record("ping");
        log::debug!("[{}] mock ping -> {}", host, self.reachable);
        Ok(self.reachable)
    }

    async fn session_table(&self, host: &str) -> Result<String, InventoryError> {
        self.record("session_table");
        self.session_table
            .clone()
            .ok_or_else(|| InventoryError::remote(host, "session table", "RPC server unavailable"))
    }

    async fn logon_bindings(&self, host: &str) -> Result<Vec<LogonBinding>, InventoryError> {
        self.record("logon_bindings");
        self.bindings
            .clone()
            .ok_or_else(|| InventoryError::remote(host, "logon bindings", "access denied"))
    }

    async fn logon_sessions(&self, host: &str) -> Result<Vec<LogonSession>, InventoryError> {
        self.record("logon_sessions");
        self.sessions
            .clone()
            .ok_or_else(|| InventoryError::remote(host, "logon sessions", "access denied"))
    }

    async fn find_processes(
        &self,
        host: &str,
        image_name: &str,
    ) -> Result<Vec<ProcessEntry>, InventoryError> {
        self.record("find_processes");
        let processes = self
            .processes
            .clone()
            .ok_or_else(|| InventoryError::remote(host, "process enumeration", "RPC server unavailable"))?;
        Ok(processes
            .into_iter()
            .filter(|p| p.name.eq_ignore_ascii_case(image_name))
            .collect())
    }
}
