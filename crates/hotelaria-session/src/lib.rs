//! Session lifecycle for the hotelaria admin console
//!
//! Ties the credential store and auth client together into a supervised
//! session: validate a persisted token at startup, watch it for expiry,
//! warn the user one minute out with a countdown, renew on request, and
//! force a clean logout when the token lapses or the countdown runs dry.
//!
//! Session flow:
//! 1. Build a `SessionConfig` (file plus env overrides)
//! 2. Construct a `SessionCoordinator` and call `resume()`
//! 3. UI renders from `subscribe()` snapshots
//! 4. User actions go through `login()`, `renew()`, `logout()`
//! 5. The monitor and countdown tasks run in the background and feed
//!    classifications back into the coordinator

pub mod config;
pub mod coordinator;
pub mod error;
pub mod monitor;

pub use config::SessionConfig;
pub use coordinator::{
    Phase, SessionAction, SessionCoordinator, SessionEvent, SessionSnapshot, handle_event,
};
pub use error::{Error, Result};
pub use monitor::{Classification, classify};
