use anyhow::{Result, bail};
use std::path::Path;
use std::str::FromStr;

const PREFIX: &str = "LOGON_INVENTORY_";

/// Which `Win32_LoggedOnUser` bindings count as candidates for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingFilter {
    /// Only bindings whose account name matches the requested user.
    MatchUser,
    /// Every binding, regardless of account.
    All,
}

impl FromStr for BindingFilter {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "match-user" => Ok(BindingFilter::MatchUser),
            "all" => Ok(BindingFilter::All),
            other => bail!("unknown binding filter '{}', expected 'user' or 'all'", other),
        }
    }
}

/// Which candidate wins when a user has several interactive logons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    FirstMatch,
    LastMatch,
}

impl FromStr for CollisionPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(CollisionPolicy::FirstMatch),
            "last" => Ok(CollisionPolicy::LastMatch),
            other => bail!("unknown collision policy '{}', expected 'first' or 'last'", other),
        }
    }
}

/// How an unavailable lock probe shows up in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeRendering {
    /// Unavailable probes read as "not locked".
    Compat,
    /// Unavailable probes read as "unknown".
    Strict,
}

impl FromStr for ProbeRendering {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compat" => Ok(ProbeRendering::Compat),
            "strict" => Ok(ProbeRendering::Strict),
            other => bail!("unknown probe rendering '{}', expected 'compat' or 'strict'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub powershell: String,
    pub session_query: String,
    pub lock_process: String,
    pub binding_filter: BindingFilter,
    pub collision_policy: CollisionPolicy,
    pub probe_rendering: ProbeRendering,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            powershell: "powershell".to_string(),
            session_query: "qwinsta".to_string(),
            lock_process: "LogonUI.exe".to_string(),
            binding_filter: BindingFilter::MatchUser,
            collision_policy: CollisionPolicy::LastMatch,
            probe_rendering: ProbeRendering::Compat,
        }
    }
}

impl Settings {
    /// Settings from the process environment (call after `dotenvy::dotenv()`).
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Process environment with the values from an env file layered on top.
    /// The file is read directly; the process environment is left untouched.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut vars: Vec<(String, String)> = std::env::vars().collect();
        for item in dotenvy::from_path_iter(path)? {
            vars.push(item?);
        }
        Self::from_vars(vars)
    }

    fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Self::default();

        for (key, value) in vars {
            let Some(name) = key.strip_prefix(PREFIX) else {
                continue;
            };
            match name {
                "POWERSHELL" => settings.powershell = non_empty(&key, value)?,
                "SESSION_QUERY" => settings.session_query = non_empty(&key, value)?,
                "LOCK_PROCESS" => settings.lock_process = validate_image_name(&value)?,
                "BINDING_FILTER" => settings.binding_filter = value.parse()?,
                "COLLISION_POLICY" => settings.collision_policy = value.parse()?,
                "PROBE_RENDERING" => settings.probe_rendering = value.parse()?,
                _ => log::debug!("Ignoring unknown setting {}", key),
            }
        }

        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

fn non_empty(key: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(trimmed.to_string())
}

/// The lock process name ends up inside a WQL filter, so keep it to a plain image name.
fn validate_image_name(value: &str) -> Result<String> {
    let value = value.trim();
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
    if !valid {
        bail!("invalid lock process name '{}'", value);
    }
    Ok(value.to_string())
}

/// Accepts a short host name or a fully-qualified domain name.
pub fn validate_host(value: &str) -> std::result::Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("host name must not be empty".to_string());
    }
    if value.len() > 253 {
        return Err("host name is longer than 253 characters".to_string());
    }
    if value.starts_with('-') || value.starts_with('.') {
        return Err(format!("'{}' is not a valid host name", value));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(format!("'{}' is not a valid host name", value));
    }
    Ok(value.to_string())
}
