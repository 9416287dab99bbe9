use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, TimeZone};
use std::collections::HashMap;

use super::keys::{self, AccountKey};
use crate::config::settings::{BindingFilter, CollisionPolicy};
use crate::error::InventoryError;
use crate::models::session::{LogonBinding, LogonSession};
use crate::remote::RemoteQuery;

/// Two-stage join over one snapshot of the binding and logon-session sets.
#[derive(Debug, Default)]
pub struct LogonIndex {
    /// Account name (lowercase) -> logon ids, in binding order.
    by_user: HashMap<String, Vec<String>>,
    /// Every bound logon id, in binding order.
    all: Vec<String>,
    /// Interactive logon id -> raw start time.
    start_times: HashMap<String, Option<String>>,
}

impl LogonIndex {
    /// Bindings whose keys cannot be decoded are skipped, so one bad entry
    /// never costs another user their logon time.
    pub fn build(bindings: &[LogonBinding], sessions: &[LogonSession]) -> Self {
        let mut index = LogonIndex::default();

        for binding in bindings {
            let (account, logon_id) = match decode_binding(binding) {
                Ok(decoded) => decoded,
                Err(e) => {
                    log::warn!("Skipping logon binding: {}", e);
                    continue;
                }
            };
            log::debug!(
                "Binding {}\\{} -> logon session {}",
                account.domain.as_deref().unwrap_or(""),
                account.name,
                logon_id
            );
            index
                .by_user
                .entry(account.name.to_lowercase())
                .or_default()
                .push(logon_id.clone());
            index.all.push(logon_id);
        }

        for session in sessions.iter().filter(|s| s.is_interactive()) {
            index
                .start_times
                .insert(session.logon_id.clone(), session.start_time.clone());
        }

        index
    }

    pub fn candidates(&self, user_name: &str, filter: BindingFilter) -> &[String] {
        match filter {
            BindingFilter::MatchUser => self
                .by_user
                .get(&user_name.to_lowercase())
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            BindingFilter::All => self.all.as_slice(),
        }
    }

    /// Start time of the interactive logon selected for `user_name`, if any.
    pub fn logon_time(
        &self,
        user_name: &str,
        filter: BindingFilter,
        policy: CollisionPolicy,
    ) -> Result<Option<DateTime<Local>>, InventoryError> {
        let mut matched = self
            .candidates(user_name, filter)
            .iter()
            .filter_map(|id| self.start_times.get(id).map(|start| (id, start)));

        let selected = match policy {
            CollisionPolicy::FirstMatch => matched.next(),
            CollisionPolicy::LastMatch => matched.last(),
        };

        match selected {
            Some((_, Some(raw))) => decode_wmi_datetime(raw).map(Some),
            Some((id, None)) => {
                log::debug!("Logon session {} has no start time", id);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

fn decode_binding(binding: &LogonBinding) -> Result<(AccountKey, String), InventoryError> {
    let account = AccountKey::parse(&binding.antecedent)?;
    let logon_id = keys::parse_logon_id(&binding.dependent)?;
    Ok((account, logon_id))
}

/// Resolves when a user's local interactive logon started.
pub struct LogonTimeResolver<'a, R> {
    remote: &'a R,
    filter: BindingFilter,
    policy: CollisionPolicy,
}

impl<'a, R: RemoteQuery> LogonTimeResolver<'a, R> {
    pub fn new(remote: &'a R, filter: BindingFilter, policy: CollisionPolicy) -> Self {
        Self {
            remote,
            filter,
            policy,
        }
    }

    pub async fn resolve_logon_time(
        &self,
        host: &str,
        user_name: &str,
    ) -> Result<Option<DateTime<Local>>, InventoryError> {
        let bindings = self.remote.logon_bindings(host).await?;
        let sessions = self.remote.logon_sessions(host).await?;
        log::debug!(
            "[{}] {} logon bindings, {} logon sessions",
            host,
            bindings.len(),
            sessions.len()
        );

        let index = LogonIndex::build(&bindings, &sessions);
        index.logon_time(user_name, self.filter, self.policy)
    }
}

/// Decode a CIM/DMTF datetime such as `20261019083012.500000+060`
/// (local wall time, microseconds, UTC offset in minutes).
pub fn decode_wmi_datetime(raw: &str) -> Result<DateTime<Local>, InventoryError> {
    let err = || InventoryError::decode("WMI datetime", raw);

    if raw.len() != 25 || !raw.is_ascii() {
        return Err(err());
    }
    let (stamp, rest) = raw.split_at(14);
    if !stamp.chars().all(|c| c.is_ascii_digit()) || !rest.starts_with('.') {
        return Err(err());
    }

    let micros: i64 = rest[1..7].parse().map_err(|_| err())?;
    let sign = match &rest[7..8] {
        "+" => 1,
        "-" => -1,
        _ => return Err(err()),
    };
    let offset_minutes: i32 = rest[8..11].parse().map_err(|_| err())?;

    let naive = NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S").map_err(|_| err())?
        + Duration::microseconds(micros);
    let offset = FixedOffset::east_opt(sign * offset_minutes * 60).ok_or_else(err)?;
    let stamped = offset.from_local_datetime(&naive).single().ok_or_else(err)?;

    Ok(stamped.with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::{MockRemote, binding, logon};
    use chrono::Utc;

    #[test]
    fn test_decode_wmi_datetime() {
        let decoded = decode_wmi_datetime("20261019083012.500000+060").unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 10, 19, 7, 30, 12).unwrap()
            + Duration::milliseconds(500);
        assert_eq!(decoded.with_timezone(&Utc), expected);

        let west = decode_wmi_datetime("20261019083012.000000-300").unwrap();
        assert_eq!(
            west.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 10, 19, 13, 30, 12).unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_wmi_datetime("").is_err());
        assert!(decode_wmi_datetime("2026-10-19T08:30:12Z").is_err());
        assert!(decode_wmi_datetime("20261019083012.500000*060").is_err());
        assert!(decode_wmi_datetime("2026101908****.******+***").is_err());
        assert!(decode_wmi_datetime("20261319083012.500000+060").is_err());
    }

    #[test]
    fn test_only_interactive_sessions_are_joined() {
        let bindings = vec![binding("alice", "100"), binding("alice", "200")];
        let sessions = vec![
            logon("100", 2, "20261019080000.000000+000"),
            logon("200", 3, "20261019090000.000000+000"),
        ];
        let index = LogonIndex::build(&bindings, &sessions);
        let time = index
            .logon_time("alice", BindingFilter::MatchUser, CollisionPolicy::LastMatch)
            .unwrap()
            .unwrap();
        assert_eq!(
            time.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_collision_policy() {
        let bindings = vec![binding("alice", "100"), binding("alice", "300")];
        let sessions = vec![
            logon("300", 2, "20261019070000.000000+000"),
            logon("100", 2, "20261019080000.000000+000"),
        ];
        let index = LogonIndex::build(&bindings, &sessions);

        // Binding order decides, not recency.
        let last = index
            .logon_time("alice", BindingFilter::MatchUser, CollisionPolicy::LastMatch)
            .unwrap()
            .unwrap();
        assert_eq!(last.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap());

        let first = index
            .logon_time("alice", BindingFilter::MatchUser, CollisionPolicy::FirstMatch)
            .unwrap()
            .unwrap();
        assert_eq!(first.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_binding_filter() {
        let bindings = vec![binding("alice", "100"), binding("dwm-1", "500")];
        let sessions = vec![
            logon("100", 2, "20261019080000.000000+000"),
            logon("500", 2, "20261019090000.000000+000"),
        ];
        let index = LogonIndex::build(&bindings, &sessions);

        assert_eq!(index.candidates("ALICE", BindingFilter::MatchUser), ["100".to_string()]);
        assert_eq!(index.candidates("nobody", BindingFilter::MatchUser).len(), 0);
        assert_eq!(index.candidates("nobody", BindingFilter::All).len(), 2);

        // Collecting every binding lets another account's logon win.
        let all = index
            .logon_time("alice", BindingFilter::All, CollisionPolicy::LastMatch)
            .unwrap()
            .unwrap();
        assert_eq!(all.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_start_time_is_absent() {
        let bindings = vec![binding("alice", "100")];
        let sessions = vec![LogonSession {
            logon_id: "100".to_string(),
            logon_type: 2,
            start_time: None,
        }];
        let index = LogonIndex::build(&bindings, &sessions);
        assert_eq!(
            index
                .logon_time("alice", BindingFilter::MatchUser, CollisionPolicy::LastMatch)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_malformed_binding_is_decode_error() {
        let garbled = LogonBinding {
            antecedent: "alice".to_string(),
            dependent: "100".to_string(),
        };
        let err = decode_binding(&garbled).unwrap_err();
        assert!(matches!(err, InventoryError::Decode { .. }));
    }

    #[test]
    fn test_undecodable_binding_only_skips_itself() {
        let service = LogonBinding {
            antecedent: r#"\\.\root\cimv2:Win32_Account.Domain="NT AUTHORITY",Name="SYSTEM""#
                .to_string(),
            dependent: r#"\\.\root\cimv2:Win32_LogonSession.LogonId="0x3e7""#.to_string(),
        };
        let bindings = vec![binding("alice", "100"), service, binding("bob", "200")];
        let sessions = vec![
            logon("100", 2, "20261019080000.000000+000"),
            logon("200", 2, "20261019090000.000000+000"),
        ];
        let index = LogonIndex::build(&bindings, &sessions);

        assert_eq!(index.candidates("alice", BindingFilter::All).len(), 2);
        let alice = index
            .logon_time("alice", BindingFilter::MatchUser, CollisionPolicy::LastMatch)
            .unwrap()
            .unwrap();
        assert_eq!(alice.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap());
        assert!(
            index
                .logon_time("bob", BindingFilter::MatchUser, CollisionPolicy::LastMatch)
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_resolver_queries_both_sets() {
        let remote = MockRemote::reachable("").with_logons(
            vec![binding("alice", "100")],
            vec![logon("100", 2, "20261019080000.000000+000")],
        );
        let resolver = LogonTimeResolver::new(&remote, BindingFilter::MatchUser, CollisionPolicy::LastMatch);

        let time = resolver.resolve_logon_time("ws042", "alice").await.unwrap();
        assert!(time.is_some());
        assert!(time.unwrap() <= Local::now());
        assert_eq!(remote.calls(), vec!["logon_bindings", "logon_sessions"]);

        let time = resolver.resolve_logon_time("ws042", "bob").await.unwrap();
        assert_eq!(time, None);
    }

    #[tokio::test]
    async fn test_resolver_propagates_query_failure() {
        let mut remote = MockRemote::reachable("");
        remote.sessions = None;
        let resolver = LogonTimeResolver::new(&remote, BindingFilter::MatchUser, CollisionPolicy::LastMatch);
        let err = resolver.resolve_logon_time("ws042", "alice").await.unwrap_err();
        assert!(matches!(err, InventoryError::RemoteQuery { .. }));
    }
}
