//! Authentication library for the hotelaria admin console
//!
//! Provides expiry-claim decoding, credential file storage, and the REST
//! client for the backend's auth endpoints. This crate is a standalone
//! library with no session-lifecycle logic; the coordinator in
//! `hotelaria-session` decides when to log in, renew, or log out.
//!
//! Credential flow:
//! 1. UI calls `client::SessionClient::login()` with masked credentials
//! 2. Coordinator stores the pair via `credentials::CredentialStore::save()`,
//!    which derives the expiry from the token's `exp` claim
//! 3. Expiry monitor reads `CredentialStore::expires_at()` on each tick
//! 4. Near expiry, coordinator calls `SessionClient::renew()` and saves the
//!    new pair
//! 5. On logout, `SessionClient::logout()` is best-effort and
//!    `CredentialStore::clear()` always runs

pub mod claims;
pub mod client;
pub mod constants;
pub mod credentials;
pub mod error;

pub use claims::decode_expiry_millis;
pub use client::{LoginResponse, Permission, SessionClient, TokenPair, UserProfile};
pub use constants::*;
pub use credentials::{CredentialStore, Credentials};
pub use error::{Error, Result};
