//! Session coordinator
//!
//! The state machine gluing expiry classifications and user actions to the
//! auth client and credential store. The transition logic is a pure
//! function (`handle_event`): it receives the current phase and an event
//! and returns the next phase plus the action the caller must execute.
//! `SessionCoordinator` is the async wrapper that owns the phase, executes
//! the actions, and runs the monitor and countdown tasks.
//!
//! The coordinator is the only component that decides logout-or-not; the
//! store and the client report outcomes upward and never mutate session
//! phase themselves. It is an explicitly owned instance handed to the UI
//! layer, not an ambient singleton.

use std::sync::{Arc, Weak};
use std::time::Duration;

use common::Secret;
use hotelaria_auth::{CredentialStore, SessionClient, UserProfile};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::monitor::{self, Classification};

/// Session phase.
///
/// `Warning` carries the countdown so the phase alone fully describes what
/// the UI should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Nobody logged in; login screen territory
    Unauthenticated,
    /// Valid token, no expiry concern
    Authenticated,
    /// Token inside the warning threshold; dialog open, countdown running
    Warning { seconds_remaining: u32 },
    /// A renewal call is in flight
    Renewing,
}

/// Events that drive phase transitions.
#[derive(Debug)]
pub enum SessionEvent {
    /// Login completed and credentials were persisted
    LoginSucceeded,
    /// Monitor: token inside the warning threshold
    ExpiringSoon,
    /// Monitor: expiry instant has passed
    Expired,
    /// One second of the warning countdown elapsed
    CountdownTick,
    /// User clicked "renew" in the warning dialog
    RenewRequested,
    /// Renewal response arrived and the new pair was persisted
    RenewSucceeded,
    /// Renewal failed (rejected refresh token, transport, or save failure)
    RenewFailed,
    /// User explicitly signed out
    SignOut,
}

/// Actions the caller executes after a transition
#[derive(Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// (Re)start the expiry monitor against the stored expiry
    StartMonitor,
    /// Open the warning dialog and start the countdown
    ShowWarning { seconds: u32 },
    /// Issue the renewal network call
    StartRenew,
    /// Clear credentials, stop all timers, land on the login screen
    ForceLogout,
    /// No-op
    None,
}

/// Handle a phase transition. Pure function: no I/O.
///
/// `countdown_start` is the value the warning countdown begins at
/// (60 seconds in production).
pub fn handle_event(
    phase: Phase,
    event: SessionEvent,
    countdown_start: u32,
) -> (Phase, SessionAction) {
    match (phase, event) {
        (Phase::Unauthenticated, SessionEvent::LoginSucceeded) => {
            (Phase::Authenticated, SessionAction::StartMonitor)
        }

        (Phase::Authenticated, SessionEvent::ExpiringSoon) => (
            Phase::Warning {
                seconds_remaining: countdown_start,
            },
            SessionAction::ShowWarning {
                seconds: countdown_start,
            },
        ),

        // The dialog owns the countdown once opened; repeated monitor
        // classifications must not reopen or reset it
        (Phase::Warning { seconds_remaining }, SessionEvent::ExpiringSoon) => {
            (Phase::Warning { seconds_remaining }, SessionAction::None)
        }

        (Phase::Warning { seconds_remaining }, SessionEvent::CountdownTick) => {
            let remaining = seconds_remaining.saturating_sub(1);
            if remaining == 0 {
                // Countdown ran out with no user action
                (Phase::Unauthenticated, SessionAction::ForceLogout)
            } else {
                (
                    Phase::Warning {
                        seconds_remaining: remaining,
                    },
                    SessionAction::None,
                )
            }
        }

        (Phase::Warning { .. }, SessionEvent::RenewRequested) => {
            (Phase::Renewing, SessionAction::StartRenew)
        }

        // Only one renewal in flight; extra requests are dropped, not queued
        (Phase::Renewing, SessionEvent::RenewRequested) => (Phase::Renewing, SessionAction::None),

        (Phase::Renewing, SessionEvent::RenewSucceeded) => {
            (Phase::Authenticated, SessionAction::StartMonitor)
        }

        (Phase::Renewing, SessionEvent::RenewFailed) => {
            (Phase::Unauthenticated, SessionAction::ForceLogout)
        }

        // A renewal already in flight decides the session's fate; monitor
        // classifications wait for its outcome
        (Phase::Renewing, SessionEvent::ExpiringSoon | SessionEvent::Expired) => {
            (Phase::Renewing, SessionAction::None)
        }

        // Missed the warning window entirely (e.g. browser tab inactive
        // for a whole tick): skip the warning, log out
        (Phase::Authenticated | Phase::Warning { .. }, SessionEvent::Expired) => {
            (Phase::Unauthenticated, SessionAction::ForceLogout)
        }

        // Explicit sign-out always wins, including over an in-flight renewal
        (Phase::Authenticated | Phase::Warning { .. } | Phase::Renewing, SessionEvent::SignOut) => {
            (Phase::Unauthenticated, SessionAction::ForceLogout)
        }

        // Anything else (stale countdown ticks, renewal responses arriving
        // after a transition away from Renewing, events while logged out):
        // stay put
        (phase, _event) => (phase, SessionAction::None),
    }
}

/// UI-facing view of the session, published through a watch channel.
///
/// The warning dialog renders `seconds_remaining` and is visible exactly
/// when `warning_visible`; it never owns a timer of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub warning_visible: bool,
    pub seconds_remaining: u32,
}

impl SessionSnapshot {
    fn from_phase(phase: &Phase) -> Self {
        match phase {
            Phase::Unauthenticated => Self {
                authenticated: false,
                warning_visible: false,
                seconds_remaining: 0,
            },
            Phase::Authenticated | Phase::Renewing => Self {
                authenticated: true,
                warning_visible: false,
                seconds_remaining: 0,
            },
            Phase::Warning { seconds_remaining } => Self {
                authenticated: true,
                warning_visible: true,
                seconds_remaining: *seconds_remaining,
            },
        }
    }
}

struct Inner {
    phase: Phase,
    monitor: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

/// Owner of the session phase and its background tasks.
///
/// Constructed once at application start and shared via `Arc`; the UI
/// layer calls `login`/`renew`/`logout` and renders from `subscribe()`.
/// Background tasks hold only weak references, so dropping the last
/// external `Arc` winds everything down.
pub struct SessionCoordinator {
    config: SessionConfig,
    store: Arc<CredentialStore>,
    client: SessionClient,
    inner: Mutex<Inner>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    weak: Weak<SessionCoordinator>,
}

impl SessionCoordinator {
    /// Load the credential store and build the coordinator.
    pub async fn new(config: SessionConfig) -> Result<Arc<Self>> {
        let store = CredentialStore::load(config.credentials_path.clone())
            .await
            .map_err(Error::Auth)?;
        let client = SessionClient::new(config.base_url.clone());
        Ok(Self::with_parts(config, Arc::new(store), client))
    }

    /// Build a coordinator from pre-constructed parts.
    pub fn with_parts(
        config: SessionConfig,
        store: Arc<CredentialStore>,
        client: SessionClient,
    ) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::from_phase(&Phase::Unauthenticated));
        Arc::new_cyclic(|weak| Self {
            config,
            store,
            client,
            inner: Mutex::new(Inner {
                phase: Phase::Unauthenticated,
                monitor: None,
                countdown: None,
            }),
            snapshot_tx,
            weak: weak.clone(),
        })
    }

    /// Current phase.
    pub async fn phase(&self) -> Phase {
        self.inner.lock().await.phase.clone()
    }

    /// Subscribe to session snapshots for rendering.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The credential store backing this session.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Validate a persisted credential at startup.
    ///
    /// Returns the user's profile when a live session was resumed. Any
    /// problem with the persisted credential (absent, already expired,
    /// rejected by the profile endpoint, backend unreachable) silently
    /// downgrades to signed-out: stale credentials are cleared and the
    /// user lands on the login screen with no error surfaced.
    pub async fn resume(&self) -> Result<Option<UserProfile>> {
        let creds = self.store.read().await;
        let (access, expires_at) = match (creds.access_token, creds.expires_at) {
            (Some(access), Some(expires_at)) => (access, expires_at),
            _ => {
                self.clear_silently().await;
                return Ok(None);
            }
        };

        if expires_at <= monitor::now_millis() {
            debug!(expires_at, "persisted token already expired, clearing");
            self.clear_silently().await;
            return Ok(None);
        }

        match self.client.fetch_profile(&access).await {
            Ok(profile) => {
                let mut inner = self.inner.lock().await;
                if self.apply(&mut inner, SessionEvent::LoginSucceeded)
                    == SessionAction::StartMonitor
                {
                    self.start_monitor(&mut inner);
                }
                info!(user = %profile.username, "resumed persisted session");
                Ok(Some(profile))
            }
            Err(e) => {
                debug!(error = %e, "persisted token failed validation, clearing");
                self.clear_silently().await;
                Ok(None)
            }
        }
    }

    /// Log in with username/email and a pre-masked password.
    ///
    /// On success the credential pair is persisted (expiry derived from
    /// the token) and the monitor starts. Rejected credentials and
    /// transport errors propagate with no state change; the caller shows
    /// them inline on the login form.
    pub async fn login(
        &self,
        username: &str,
        email: &str,
        password: Secret<String>,
    ) -> Result<UserProfile> {
        let response = self.client.login(username, email, &password).await?;
        let expires_at = self
            .store
            .save(&response.access_token, &response.refresh_token)
            .await?;

        let mut inner = self.inner.lock().await;
        if self.apply(&mut inner, SessionEvent::LoginSucceeded) == SessionAction::StartMonitor {
            self.start_monitor(&mut inner);
        }
        info!(user = %response.user.username, expires_at, "logged in");
        Ok(response.user)
    }

    /// Renew the session from the warning dialog.
    ///
    /// No-op unless the session is in `Warning` (a second click while a
    /// renewal is in flight is dropped). Any failure is terminal: the
    /// session is logged out and `SessionExpired` is returned for the UI
    /// to surface. A response arriving after the session left `Renewing`
    /// (explicit logout won the race) is discarded.
    pub async fn renew(&self) -> Result<()> {
        let refresh = {
            let mut inner = self.inner.lock().await;
            if self.apply(&mut inner, SessionEvent::RenewRequested) != SessionAction::StartRenew {
                return Ok(());
            }
            // The countdown stops once the user chose to renew
            if let Some(handle) = inner.countdown.take() {
                handle.abort();
            }
            self.store.refresh_token().await
        };

        let Some(refresh) = refresh else {
            warn!("no refresh token available for renewal");
            let mut inner = self.inner.lock().await;
            self.fail_renewal(&mut inner).await;
            return Err(Error::SessionExpired);
        };

        let outcome = self.client.renew(&Secret::new(refresh)).await;

        let mut inner = self.inner.lock().await;
        if inner.phase != Phase::Renewing {
            debug!("discarding renewal response after phase change");
            return Ok(());
        }

        let pair = match outcome {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "session renewal failed");
                self.fail_renewal(&mut inner).await;
                return Err(Error::SessionExpired);
            }
        };

        match self.store.save(&pair.access_token, &pair.refresh_token).await {
            Ok(expires_at) => {
                if self.apply(&mut inner, SessionEvent::RenewSucceeded)
                    == SessionAction::StartMonitor
                {
                    self.start_monitor(&mut inner);
                }
                info!(expires_at, "session renewed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "renewed token could not be saved");
                self.fail_renewal(&mut inner).await;
                Err(Error::SessionExpired)
            }
        }
    }

    /// Explicit user logout.
    ///
    /// Local credentials are always cleared and the timers stopped; the
    /// server-side call is best-effort and cannot fail this operation.
    /// In-flight renewals are abandoned (their responses get discarded).
    pub async fn logout(&self) {
        let access = self.store.access_token().await;
        {
            let mut inner = self.inner.lock().await;
            if self.apply(&mut inner, SessionEvent::SignOut) != SessionAction::ForceLogout {
                return;
            }
            info!("signing out");
            self.force_logout(&mut inner).await;
        }
        self.client.logout(access.as_deref()).await;
    }

    /// Intake for monitor classifications.
    pub(crate) async fn observe(&self, classification: Classification) {
        let mut inner = self.inner.lock().await;
        match classification {
            Classification::ExpiringSoon => {
                if let SessionAction::ShowWarning { seconds } =
                    self.apply(&mut inner, SessionEvent::ExpiringSoon)
                {
                    info!(seconds, "token expiring soon, warning opened");
                    self.start_countdown(&mut inner);
                }
            }
            Classification::Expired => {
                if self.apply(&mut inner, SessionEvent::Expired) == SessionAction::ForceLogout {
                    warn!("token expired before renewal, forcing logout");
                    self.force_logout(&mut inner).await;
                }
            }
            Classification::Inactive | Classification::Fresh => {}
        }
    }

    /// Run the transition function and publish the resulting snapshot.
    fn apply(&self, inner: &mut Inner, event: SessionEvent) -> SessionAction {
        let phase = std::mem::replace(&mut inner.phase, Phase::Unauthenticated);
        let (next, action) = handle_event(phase, event, self.config.countdown_start);
        inner.phase = next;
        self.snapshot_tx
            .send_replace(SessionSnapshot::from_phase(&inner.phase));
        action
    }

    fn start_monitor(&self, inner: &mut Inner) {
        if let Some(handle) = inner.monitor.take() {
            handle.abort();
        }
        inner.monitor = Some(monitor::spawn_monitor(
            self.weak.clone(),
            Arc::clone(&self.store),
            self.config.tick_interval(),
            self.config.warning_threshold(),
        ));
    }

    fn start_countdown(&self, inner: &mut Inner) {
        if let Some(handle) = inner.countdown.take() {
            handle.abort();
        }
        let weak = self.weak.clone();
        inner.countdown = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // interval's first tick completes immediately; consume it so
            // the dialog shows the full countdown for its first second
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                if !coordinator.countdown_tick().await {
                    break;
                }
            }
        }));
    }

    /// One second of warning countdown. Returns false when the countdown
    /// task should stop ticking.
    async fn countdown_tick(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match self.apply(&mut inner, SessionEvent::CountdownTick) {
            SessionAction::ForceLogout => {
                info!("warning countdown elapsed with no user action, forcing logout");
                self.force_logout(&mut inner).await;
                false
            }
            _ => matches!(inner.phase, Phase::Warning { .. }),
        }
    }

    async fn fail_renewal(&self, inner: &mut Inner) {
        if self.apply(inner, SessionEvent::RenewFailed) == SessionAction::ForceLogout {
            self.force_logout(inner).await;
        }
    }

    /// Clear credentials and stop the timers. Never fails.
    ///
    /// The task aborts come last: this may run inside the monitor or
    /// countdown task itself, and aborting the running task before the
    /// store write would cancel the clear at its next await point.
    async fn force_logout(&self, inner: &mut Inner) {
        self.clear_silently().await;
        if let Some(handle) = inner.monitor.take() {
            handle.abort();
        }
        if let Some(handle) = inner.countdown.take() {
            handle.abort();
        }
    }

    async fn clear_silently(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear credentials");
        }
    }
}
