//! Session configuration
//!
//! Config precedence: env vars > config file > defaults. Only the backend
//! base URL and the credential file location are deployment concerns; the
//! timing knobs exist so tests don't have to wait out real minutes and
//! default to the production values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::{Error, Result};
use serde::Deserialize;

/// Session core configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Backend base URL, e.g. `https://backend.hospital.example`
    pub base_url: String,
    /// Where the credential file lives
    pub credentials_path: PathBuf,
    /// Seconds between expiry monitor checks
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Warn when the token has at most this many seconds left
    #[serde(default = "default_warning_threshold_secs")]
    pub warning_threshold_secs: u64,
    /// Countdown shown in the warning dialog, in seconds
    #[serde(default = "default_countdown_start")]
    pub countdown_start: u32,
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_warning_threshold_secs() -> u64 {
    60
}

fn default_countdown_start() -> u32 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            credentials_path: PathBuf::from("credentials.json"),
            tick_interval_secs: default_tick_interval_secs(),
            warning_threshold_secs: default_warning_threshold_secs(),
            countdown_start: default_countdown_start(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// `HOTELARIA_API_URL` and `HOTELARIA_CREDENTIALS_PATH` override the
    /// file values when set.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: SessionConfig = toml::from_str(&contents)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Build a config from defaults plus environment variables only.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("HOTELARIA_API_URL") {
            self.base_url = url;
        }
        if let Ok(path) = std::env::var("HOTELARIA_CREDENTIALS_PATH") {
            self.credentials_path = PathBuf::from(path);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        if self.tick_interval_secs == 0 {
            return Err(Error::Config("tick_interval_secs must be positive".into()));
        }
        if self.warning_threshold_secs == 0 {
            // A zero threshold never warns and jumps straight to logout
            return Err(Error::Config(
                "warning_threshold_secs must be positive".into(),
            ));
        }
        if self.countdown_start == 0 {
            return Err(Error::Config("countdown_start must be positive".into()));
        }
        Ok(())
    }

    /// Monitor tick interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Warning threshold before expiry.
    pub fn warning_threshold(&self) -> Duration {
        Duration::from_secs(self.warning_threshold_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_production_timing() {
        let config = SessionConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(60));
        assert_eq!(config.warning_threshold(), Duration::from_secs(60));
        assert_eq!(config.countdown_start, 60);
    }

    #[test]
    fn loads_toml_with_defaulted_timing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://backend.hospital.example"
credentials_path = "/var/lib/hotelaria/credentials.json"
"#
        )
        .unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "https://backend.hospital.example");
        assert_eq!(
            config.credentials_path,
            PathBuf::from("/var/lib/hotelaria/credentials.json")
        );
        assert_eq!(config.tick_interval_secs, 60);
    }

    #[test]
    fn loads_toml_with_explicit_timing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://backend.hospital.example"
credentials_path = "credentials.json"
tick_interval_secs = 5
warning_threshold_secs = 10
countdown_start = 15
"#
        )
        .unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.warning_threshold(), Duration::from_secs(10));
        assert_eq!(config.countdown_start, 15);
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://backend.hospital.example"
credentials_path = "credentials.json"
tick_interval_secs = 0
"#
        )
        .unwrap();

        assert!(SessionConfig::load(file.path()).is_err());
    }

    #[test]
    fn rejects_zero_warning_threshold() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://backend.hospital.example"
credentials_path = "credentials.json"
warning_threshold_secs = 0
"#
        )
        .unwrap();

        assert!(SessionConfig::load(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(SessionConfig::load(Path::new("/nonexistent/session.toml")).is_err());
    }
}
