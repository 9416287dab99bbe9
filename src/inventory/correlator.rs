use super::lock_state::LockStateProber;
use super::logon_time::LogonTimeResolver;
use super::sessions;
use crate::config::settings::Settings;
use crate::error::InventoryError;
use crate::models::session::{EnrichedSession, LoginType, NormalizedSession, SessionKind};
use crate::remote::RemoteQuery;

/// Builds one enriched record per human session on a host.
pub struct SessionCorrelator<'a, R> {
    remote: &'a R,
    settings: &'a Settings,
}

impl<'a, R: RemoteQuery> SessionCorrelator<'a, R> {
    pub fn new(remote: &'a R, settings: &'a Settings) -> Self {
        Self { remote, settings }
    }

    pub async fn build_report(&self, host: &str) -> Result<Vec<EnrichedSession>, InventoryError> {
        let sessions = sessions::list_sessions(self.remote, host).await?;
        log::info!("[{}] {} human sessions", host, sessions.len());

        let mut report = Vec::with_capacity(sessions.len());
        for session in sessions {
            let enriched = match session.session_kind {
                SessionKind::Console => self.enrich_console(host, session).await,
                SessionKind::Remote => EnrichedSession::remote(session),
            };
            report.push(enriched);
        }
        Ok(report)
    }

    async fn enrich_console(&self, host: &str, session: NormalizedSession) -> EnrichedSession {
        log::debug!(
            "[{}] enriching console session {} for {}",
            host,
            session.session_id,
            session.user_name
        );
        let resolver = LogonTimeResolver::new(
            self.remote,
            self.settings.binding_filter,
            self.settings.collision_policy,
        );
        let prober = LockStateProber::new(self.remote, &self.settings.lock_process);

        let (logon_time, lock_state) = tokio::join!(
            resolver.resolve_logon_time(host, &session.user_name),
            prober.probe_lock_state(host, &session.user_name),
        );

        let logon_time = logon_time.unwrap_or_else(|e| {
            log::warn!("[{}] no logon time for {}: {}", host, session.user_name, e);
            None
        });

        EnrichedSession {
            status: lock_state.label(self.settings.probe_rendering).to_string(),
            user_name: session.user_name,
            login_type: LoginType::Local,
            logon_time,
            lock_state: Some(lock_state),
        }
    }
}
