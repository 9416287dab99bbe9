use serde::de::DeserializeOwned;
use tokio::process::Command;

use super::RemoteQuery;
use crate::config::settings::Settings;
use crate::error::InventoryError;
use crate::models::session::{LogonBinding, LogonSession, ProcessEntry};

/// Reaches the host through `qwinsta` and Windows PowerShell's WMI cmdlets.
pub struct PowerShellRemote {
    powershell: String,
    session_query: String,
}

impl PowerShellRemote {
    pub fn new(settings: &Settings) -> Self {
        Self {
            powershell: settings.powershell.clone(),
            session_query: settings.session_query.clone(),
        }
    }

    async fn run_script(
        &self,
        host: &str,
        query: &'static str,
        script: &str,
    ) -> Result<String, InventoryError> {
        log::debug!("[{}] {} via {}", host, query, self.powershell);

        let output = Command::new(&self.powershell)
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(script)
            .output()
            .await
            .map_err(|e| InventoryError::remote(host, query, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(InventoryError::remote(host, query, failure_reason(output.status, stderr)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn wmi_objects<T: DeserializeOwned>(
        &self,
        host: &str,
        query: &'static str,
        script: &str,
    ) -> Result<Vec<T>, InventoryError> {
        let stdout = self.run_script(host, query, script).await?;
        parse_json_objects(&stdout).map_err(|e| InventoryError::remote(host, query, e.to_string()))
    }
}

impl RemoteQuery for PowerShellRemote {
    async fn ping(&self, host: &str) -> Result<bool, InventoryError> {
        let script = format!(
            "Test-Connection -ComputerName {} -Count 1 -Quiet",
            quote(host)
        );
        let stdout = self.run_script(host, "reachability probe", &script).await?;
        Ok(stdout.trim().eq_ignore_ascii_case("true"))
    }

    async fn session_table(&self, host: &str) -> Result<String, InventoryError> {
        log::debug!("[{}] session table via {}", host, self.session_query);

        let output = Command::new(&self.session_query)
            .arg(format!("/server:{}", host))
            .output()
            .await
            .map_err(|e| InventoryError::remote(host, "session table", e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(InventoryError::remote(
                host,
                "session table",
                failure_reason(output.status, stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn logon_bindings(&self, host: &str) -> Result<Vec<LogonBinding>, InventoryError> {
        let script = wmi_script(host, "Win32_LoggedOnUser", None, &["Antecedent", "Dependent"]);
        self.wmi_objects(host, "logon bindings", &script).await
    }

    async fn logon_sessions(&self, host: &str) -> Result<Vec<LogonSession>, InventoryError> {
        let script = wmi_script(
            host,
            "Win32_LogonSession",
            None,
            &["LogonId", "LogonType", "StartTime"],
        );
        self.wmi_objects(host, "logon sessions", &script).await
    }

    async fn find_processes(
        &self,
        host: &str,
        image_name: &str,
    ) -> Result<Vec<ProcessEntry>, InventoryError> {
        let filter = format!("Name='{}'", image_name.replace('\'', "''"));
        let script = wmi_script(
            host,
            "Win32_Process",
            Some(&filter),
            &["ProcessId", "Name", "SessionId"],
        );
        self.wmi_objects(host, "process enumeration", &script).await
    }
}

/// PowerShell single-quoted literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn failure_reason(status: std::process::ExitStatus, stderr: String) -> String {
    if stderr.is_empty() {
        format!("exited with {}", status)
    } else {
        stderr
    }
}

/// `Get-WmiObject` pipeline that always emits a JSON array, even for zero or one objects.
fn wmi_script(host: &str, class: &str, filter: Option<&str>, properties: &[&str]) -> String {
    let filter_arg = match filter {
        Some(filter) => format!(" -Filter {}", quote(filter)),
        None => String::new(),
    };
    format!(
        "$items = Get-WmiObject -Class {} -ComputerName {}{} -ErrorAction Stop | Select-Object {}; \
         ConvertTo-Json -InputObject @($items) -Compress",
        class,
        quote(host),
        filter_arg,
        properties.join(", ")
    )
}

fn parse_json_objects<T: DeserializeOwned>(stdout: &str) -> serde_json::Result<Vec<T>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}
