use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Session label written in place of the missing `SESSIONNAME` column.
pub const REMOTE_SESSION_NAME: &str = "remote";

/// Session owners that belong to the system rather than to a person.
pub const PSEUDO_USERS: [&str; 3] = ["rdp-tcp", "services", "console"];

/// One row of the session table after column repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSessionRow {
    pub session_name: String,
    pub user_name: String,
    pub id: String,
    pub state: String,
    pub session_type: Option<String>,
    pub device: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    Console,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSession {
    pub user_name: String,
    pub session_id: String,
    pub session_kind: SessionKind,
    pub raw_state: String,
}

impl NormalizedSession {
    pub fn from_row(row: RawSessionRow) -> Self {
        let session_kind = if row.session_name.eq_ignore_ascii_case("console") {
            SessionKind::Console
        } else {
            SessionKind::Remote
        };

        Self {
            user_name: row.user_name,
            session_id: row.id,
            session_kind,
            raw_state: row.state,
        }
    }
}

/// `Win32_LoggedOnUser` association: account object path -> logon session object path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogonBinding {
    pub antecedent: String,
    pub dependent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogonSession {
    pub logon_id: String,
    pub logon_type: u32,
    /// DMTF datetime, e.g. `20261019083012.500000+060`.
    #[serde(default)]
    pub start_time: Option<String>,
}

impl LogonSession {
    pub const INTERACTIVE: u32 = 2;

    pub fn is_interactive(&self) -> bool {
        self.logon_type == Self::INTERACTIVE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessEntry {
    pub process_id: u32,
    pub name: String,
    #[serde(default)]
    pub session_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginType {
    #[serde(rename = "Local Log-in")]
    Local,
    #[serde(rename = "Remote Log-in")]
    Remote,
}

impl LoginType {
    pub fn label(&self) -> &'static str {
        match self {
            LoginType::Local => "Local Log-in",
            LoginType::Remote => "Remote Log-in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Locked,
    Unlocked,
    ProbeUnavailable,
}

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSession {
    pub user_name: String,
    pub login_type: LoginType,
    pub status: String,
    pub logon_time: Option<DateTime<Local>>,
    pub lock_state: Option<LockState>,
}

impl EnrichedSession {
    pub fn remote(session: NormalizedSession) -> Self {
        Self {
            user_name: session.user_name,
            login_type: LoginType::Remote,
            status: session.raw_state,
            logon_time: None,
            lock_state: None,
        }
    }
}

pub fn is_pseudo_user(user_name: &str) -> bool {
    PSEUDO_USERS
        .iter()
        .any(|pseudo| pseudo.eq_ignore_ascii_case(user_name))
}
