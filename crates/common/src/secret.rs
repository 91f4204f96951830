//! Secret wrapper for credentials in transit
//!
//! Passwords and refresh tokens pass through several layers (login form,
//! session client, coordinator) before reaching the wire. Wrapping them in
//! `Secret` keeps them out of Debug output and tracing fields, and zeroes
//! the backing memory on drop.

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value - redacted in Debug/Display/logs
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Create a new secret value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug() {
        let password = Secret::new(String::from("hunter2"));
        let debug = format!("{:?}", password);
        assert_eq!(debug, "[REDACTED]");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn secret_redacts_display() {
        let token = Secret::new(String::from("rt_opaque_value"));
        assert_eq!(format!("{token}"), "[REDACTED]");
    }

    #[test]
    fn secret_exposes_value() {
        let password = Secret::new(String::from("hunter2"));
        assert_eq!(password.expose(), "hunter2");
    }

    #[test]
    fn secret_from_str() {
        let s: Secret<String> = "abc".into();
        assert_eq!(s.expose(), "abc");
    }
}
