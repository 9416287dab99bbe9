use crate::config::settings::ProbeRendering;
use crate::models::session::LockState;
use crate::remote::RemoteQuery;

impl LockState {
    /// Report wording. An unavailable probe reads as "not locked" in compat mode.
    pub fn label(&self, rendering: ProbeRendering) -> &'static str {
        match (self, rendering) {
            (LockState::Locked, _) => "locked",
            (LockState::Unlocked, _) => "not locked",
            (LockState::ProbeUnavailable, ProbeRendering::Compat) => "not locked",
            (LockState::ProbeUnavailable, ProbeRendering::Strict) => "unknown",
        }
    }
}

/// Checks for the lock-screen process on a host.
pub struct LockStateProber<'a, R> {
    remote: &'a R,
    lock_process: &'a str,
}

impl<'a, R: RemoteQuery> LockStateProber<'a, R> {
    pub fn new(remote: &'a R, lock_process: &'a str) -> Self {
        Self {
            remote,
            lock_process,
        }
    }

    /// `indicator` is the console session's user; empty means no session to be locked.
    pub async fn probe_lock_state(&self, host: &str, indicator: &str) -> LockState {
        match self.remote.find_processes(host, self.lock_process).await {
            Ok(processes) if !processes.is_empty() && !indicator.is_empty() => {
                let first = &processes[0];
                log::debug!(
                    "[{}] {} running (pid {}, session {:?}), console locked",
                    host,
                    first.name,
                    first.process_id,
                    first.session_id
                );
                LockState::Locked
            }
            Ok(_) => LockState::Unlocked,
            Err(e) => {
                log::warn!("[{}] lock probe unavailable: {}", host, e);
                LockState::ProbeUnavailable
            }
        }
    }
}
