use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{host} is down")]
    HostUnreachable { host: String },

    #[error("remote query `{query}` failed on {host}: {reason}")]
    RemoteQuery {
        host: String,
        query: &'static str,
        reason: String,
    },

    #[error("malformed session row {line:?}: {reason}")]
    MalformedRow { line: String, reason: String },

    #[error("cannot decode {what}: {value:?}")]
    Decode { what: &'static str, value: String },
}

impl InventoryError {
    pub fn remote(host: &str, query: &'static str, reason: impl Into<String>) -> Self {
        InventoryError::RemoteQuery {
            host: host.to_string(),
            query,
            reason: reason.into(),
        }
    }

    pub fn malformed(line: &str, reason: impl Into<String>) -> Self {
        InventoryError::MalformedRow {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub fn decode(what: &'static str, value: &str) -> Self {
        InventoryError::Decode {
            what,
            value: value.to_string(),
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            InventoryError::HostUnreachable { .. } => 2,
            InventoryError::RemoteQuery { .. } => 3,
            InventoryError::MalformedRow { .. } | InventoryError::Decode { .. } => 4,
        }
    }
}
