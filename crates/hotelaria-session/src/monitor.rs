//! Expiry monitoring
//!
//! A background task that periodically compares "now" against the stored
//! expiry and classifies the remaining lifetime of the access token. The
//! classification is fed to the coordinator, which decides whether to warn
//! or force a logout; the monitor itself never mutates session state.
//!
//! The coordinator owns the task handle: it spawns the monitor when a
//! token becomes present (login, renewal, resumed session) and aborts it
//! on logout, so no ticking happens while logged out and a restarted
//! monitor always reads the current token's expiry from the store.

use std::sync::{Arc, Weak};
use std::time::Duration;

use hotelaria_auth::CredentialStore;
use tracing::{debug, warn};

use crate::coordinator::SessionCoordinator;

/// How much life the access token has left, as seen at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No access token present; nothing to monitor
    Inactive,
    /// More than the warning threshold remains
    Fresh,
    /// Within the warning threshold but not yet expired
    ExpiringSoon,
    /// The expiry instant has passed
    Expired,
}

/// Classify the remaining token lifetime. Pure; no I/O.
///
/// `expires_at` is `None` when no access token is stored. Boundaries:
/// exactly at the threshold counts as expiring soon, exactly at the expiry
/// instant counts as expired.
pub fn classify(expires_at: Option<u64>, now_millis: u64, threshold: Duration) -> Classification {
    let Some(expires_at) = expires_at else {
        return Classification::Inactive;
    };

    if expires_at <= now_millis {
        return Classification::Expired;
    }

    let remaining = expires_at - now_millis;
    if remaining <= threshold.as_millis() as u64 {
        Classification::ExpiringSoon
    } else {
        Classification::Fresh
    }
}

/// Current wall-clock time as unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Spawn the expiry monitor task.
///
/// The first check runs immediately on spawn, not after one interval, so a
/// token already in its final minute is caught at activation. Every tick
/// reads the store fresh; the task never caches an expiry across ticks.
/// The task holds only a weak reference to the coordinator and exits if
/// the coordinator is gone.
///
/// Returns the `JoinHandle`; the coordinator aborts it on logout.
pub(crate) fn spawn_monitor(
    coordinator: Weak<SessionCoordinator>,
    store: Arc<CredentialStore>,
    interval: Duration,
    threshold: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            // First tick completes immediately
            ticker.tick().await;

            let Some(coordinator) = coordinator.upgrade() else {
                break;
            };

            let expires_at = store.expires_at().await;
            let classification = classify(expires_at, now_millis(), threshold);

            match classification {
                Classification::Inactive => {
                    // Logged out from under us; the abort is on its way
                    warn!("monitor tick with no access token present");
                }
                Classification::Fresh => {
                    debug!(?expires_at, "token fresh");
                }
                Classification::ExpiringSoon | Classification::Expired => {
                    debug!(?expires_at, ?classification, "token near end of life");
                    coordinator.observe(classification).await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn no_token_is_inactive() {
        assert_eq!(classify(None, 1_000_000, MINUTE), Classification::Inactive);
    }

    #[test]
    fn far_from_expiry_is_fresh() {
        // 61 seconds remaining, threshold 60
        assert_eq!(
            classify(Some(1_061_000), 1_000_000, MINUTE),
            Classification::Fresh
        );
    }

    #[test]
    fn within_threshold_is_expiring_soon() {
        // 45 seconds remaining
        assert_eq!(
            classify(Some(1_045_000), 1_000_000, MINUTE),
            Classification::ExpiringSoon
        );
    }

    #[test]
    fn exactly_at_threshold_is_expiring_soon() {
        assert_eq!(
            classify(Some(1_060_000), 1_000_000, MINUTE),
            Classification::ExpiringSoon
        );
    }

    #[test]
    fn exactly_at_expiry_is_expired() {
        assert_eq!(
            classify(Some(1_000_000), 1_000_000, MINUTE),
            Classification::Expired
        );
    }

    #[test]
    fn past_expiry_is_expired() {
        assert_eq!(
            classify(Some(900_000), 1_000_000, MINUTE),
            Classification::Expired
        );
    }

    #[test]
    fn one_millisecond_left_is_expiring_soon() {
        assert_eq!(
            classify(Some(1_000_001), 1_000_000, MINUTE),
            Classification::ExpiringSoon
        );
    }

    #[tokio::test]
    async fn monitor_exits_once_the_coordinator_is_gone() {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            CredentialStore::load(dir.path().join("credentials.json"))
                .await
                .unwrap(),
        );

        // A fresh token, so nothing would ever push a classification to
        // the coordinator on its own
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let exp = now_millis() / 1000 + 3600;
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#).as_bytes());
        store
            .save(&format!("{header}.{payload}.sig"), "rt_1")
            .await
            .unwrap();

        let config = crate::config::SessionConfig {
            credentials_path: dir.path().join("credentials.json"),
            ..crate::config::SessionConfig::default()
        };
        let client = hotelaria_auth::SessionClient::new("http://127.0.0.1:9");
        let coordinator = SessionCoordinator::with_parts(config, Arc::clone(&store), client);
        let weak = Arc::downgrade(&coordinator);
        drop(coordinator);

        let handle = spawn_monitor(weak, store, Duration::from_millis(10), MINUTE);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor kept ticking with the coordinator dropped")
            .unwrap();
    }
}
