//! Credential storage for the console session
//!
//! Persists the access token, refresh token, and derived expiry instant as
//! a small JSON file, the desktop counterpart of the web console's three
//! localStorage keys. All writes use atomic temp-file + rename so a reader
//! (the expiry monitor, on its own tick) never observes a half-updated
//! credential. A tokio Mutex serializes writes from login, renewal, and
//! logout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::claims::decode_expiry_millis;
use crate::error::{Error, Result};

/// The persisted credential triple. Any field may be absent.
///
/// `expires_at` is a unix timestamp in milliseconds, derived from the
/// access token's `exp` claim at save time. The pair (`access_token`,
/// `expires_at`) always describes the same token: `save` is the only way
/// to set either, and it sets both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Raw bearer token authorizing API calls
    #[serde(
        rename = "hotelaria_auth_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,
    /// Opaque token used to mint a new access token
    #[serde(
        rename = "hotelaria_refresh_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
    /// Expiry of `access_token` as unix milliseconds
    #[serde(
        rename = "hotelaria_expires_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<u64>,
}

impl Credentials {
    /// Whether a usable credential is present (token plus its expiry).
    pub fn is_present(&self) -> bool {
        self.access_token.is_some() && self.expires_at.is_some()
    }
}

/// File-backed credential store.
///
/// The Mutex serializes all writes. Reads acquire the lock briefly to
/// clone the in-memory state, so monitor-tick reads don't block on a
/// concurrent save.
pub struct CredentialStore {
    path: PathBuf,
    state: Mutex<Credentials>,
}

impl CredentialStore {
    /// Load credentials from the given file path.
    ///
    /// If the file doesn't exist, creates it empty (cold start, nobody
    /// logged in yet) so future loads don't need the cold-start path.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let credentials: Credentials = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing credential file: {e}")))?;
            info!(
                path = %path.display(),
                present = credentials.is_present(),
                "loaded credentials"
            );
            credentials
        } else {
            info!(path = %path.display(), "credential file not found, starting empty");
            let empty = Credentials::default();
            write_atomic(&path, &empty).await?;
            empty
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Persist a freshly issued token pair.
    ///
    /// Derives `expires_at` from the access token's `exp` claim and writes
    /// all three fields as one atomic update. If the token can't be
    /// decoded, nothing is written and the previous state is untouched;
    /// the caller must not treat the login/renewal as completed.
    ///
    /// Returns the derived expiry in unix milliseconds.
    pub async fn save(&self, access_token: &str, refresh_token: &str) -> Result<u64> {
        let expires_at = decode_expiry_millis(access_token)?;

        let mut state = self.state.lock().await;
        *state = Credentials {
            access_token: Some(access_token.to_owned()),
            refresh_token: Some(refresh_token.to_owned()),
            expires_at: Some(expires_at),
        };
        write_atomic(&self.path, &state).await?;
        debug!(expires_at, "saved credentials");
        Ok(expires_at)
    }

    /// Snapshot of the current credential state.
    pub async fn read(&self) -> Credentials {
        let state = self.state.lock().await;
        state.clone()
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.access_token.clone()
    }

    /// Current refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.refresh_token.clone()
    }

    /// Expiry of the current access token, if one is present.
    ///
    /// Returns `None` when no access token is stored, even if a stray
    /// expiry value survived in the file: without a token the expiry is
    /// meaningless for monitoring.
    pub async fn expires_at(&self) -> Option<u64> {
        let state = self.state.lock().await;
        state.access_token.as_ref().and(state.expires_at)
    }

    /// Remove all three fields. Idempotent: clearing an empty store is a
    /// no-op that still succeeds.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = Credentials::default();
        write_atomic(&self.path, &state).await?;
        debug!("cleared credentials");
        Ok(())
    }
}

/// Write credentials to the file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target, so a crash mid-write leaves the old contents intact.
/// Permissions are 0600 since the file holds live tokens.
async fn write_atomic(path: &Path, data: &Credentials) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    /// Build an unsigned JWT expiring at `exp_seconds`.
    fn token_expiring_at(exp_seconds: u64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp_seconds}}}"#).as_bytes());
        format!("{header}.{payload}.sig")
    }

    #[tokio::test]
    async fn save_derives_expiry_from_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(dir.path().join("credentials.json"))
            .await
            .unwrap();

        let expires = store
            .save(&token_expiring_at(1_700_000_000), "rt_1")
            .await
            .unwrap();

        assert_eq!(expires, 1_700_000_000_000);
        let creds = store.read().await;
        assert_eq!(creds.expires_at, Some(1_700_000_000_000));
        assert_eq!(creds.refresh_token.as_deref(), Some("rt_1"));
    }

    #[tokio::test]
    async fn roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::load(path.clone()).await.unwrap();
        store
            .save(&token_expiring_at(1_800_000_000), "rt_persisted")
            .await
            .unwrap();

        let store2 = CredentialStore::load(path).await.unwrap();
        let creds = store2.read().await;
        assert!(creds.is_present());
        assert_eq!(creds.refresh_token.as_deref(), Some("rt_persisted"));
        assert_eq!(creds.expires_at, Some(1_800_000_000_000));
    }

    #[tokio::test]
    async fn malformed_token_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(dir.path().join("credentials.json"))
            .await
            .unwrap();
        store
            .save(&token_expiring_at(1_700_000_000), "rt_old")
            .await
            .unwrap();

        let result = store.save("not-a-jwt", "rt_new").await;
        assert!(matches!(result, Err(Error::Decode(_))));

        // Previous credential survives intact
        let creds = store.read().await;
        assert_eq!(creds.refresh_token.as_deref(), Some("rt_old"));
        assert_eq!(creds.expires_at, Some(1_700_000_000_000));
    }

    #[tokio::test]
    async fn fields_are_never_half_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::load(path.clone()).await.unwrap();
        store
            .save(&token_expiring_at(1_700_000_000), "rt_1")
            .await
            .unwrap();

        // Both the in-memory snapshot and the file agree: token and expiry
        // are present together or absent together.
        let creds = store.read().await;
        assert_eq!(creds.access_token.is_some(), creds.expires_at.is_some());

        let on_disk: Credentials =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(on_disk.access_token.is_some(), on_disk.expires_at.is_some());

        store.clear().await.unwrap();
        let creds = store.read().await;
        assert!(creds.access_token.is_none());
        assert!(creds.expires_at.is_none());
        assert!(creds.refresh_token.is_none());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(dir.path().join("credentials.json"))
            .await
            .unwrap();

        // Clear on an already-empty store succeeds
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.read().await.is_present());

        store
            .save(&token_expiring_at(1_700_000_000), "rt_1")
            .await
            .unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.access_token().await.is_none());
    }

    #[tokio::test]
    async fn expires_at_meaningless_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        // A file with a stray expiry but no token (e.g. hand-edited)
        tokio::fs::write(&path, r#"{"hotelaria_expires_at": 123456}"#)
            .await
            .unwrap();

        let store = CredentialStore::load(path).await.unwrap();
        assert_eq!(store.expires_at().await, None);
        assert!(!store.read().await.is_present());
    }

    #[tokio::test]
    async fn cold_start_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        assert!(!path.exists());
        let store = CredentialStore::load(path.clone()).await.unwrap();
        assert!(!store.read().await.is_present());
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::load(path.clone()).await.unwrap();
        store
            .save(&token_expiring_at(1_700_000_000), "rt_1")
            .await
            .unwrap();

        let metadata = tokio::fs::metadata(&path).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }

    #[test]
    fn storage_keys_match_constants() {
        let creds = Credentials {
            access_token: Some("at".into()),
            refresh_token: Some("rt".into()),
            expires_at: Some(1),
        };
        let json = serde_json::to_string(&creds).unwrap();
        assert!(json.contains(crate::constants::ACCESS_TOKEN_KEY));
        assert!(json.contains(crate::constants::REFRESH_TOKEN_KEY));
        assert!(json.contains(crate::constants::EXPIRES_AT_KEY));
    }
}
