//! Storage key and endpoint constants
//!
//! The three storage keys match the browser console's localStorage keys so
//! a credential file written by this crate maps one-to-one onto what the
//! web client persists. The access-token key is the only configurable one
//! (the web client reads it from `VITE_TOKEN_STORAGE_KEY`); the other two
//! are fixed names.

/// Default storage key for the raw access token
pub const ACCESS_TOKEN_KEY: &str = "hotelaria_auth_token";

/// Storage key for the raw refresh token
pub const REFRESH_TOKEN_KEY: &str = "hotelaria_refresh_token";

/// Storage key for the expiry instant (decimal milliseconds since epoch)
pub const EXPIRES_AT_KEY: &str = "hotelaria_expires_at";

/// Login endpoint: username + pre-masked password, returns tokens + profile
pub const LOGIN_PATH: &str = "/auth/login";

/// Profile endpoint: validates the bearer token and returns user data
pub const PROFILE_PATH: &str = "/auth/profile";

/// Refresh endpoint: exchanges the refresh token for a new token pair
pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// Logout endpoint: best-effort server-side session termination
pub const LOGOUT_PATH: &str = "/auth/logout";
