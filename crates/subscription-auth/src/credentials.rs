//! Credential model and on-disk storage
//!
//! The store owns a single JSON file holding one credential set. Loading
//! never fails: a missing, unreadable or malformed file reads as "not
//! authenticated". Writes go through a temp file + rename so a crash never
//! leaves a half-written credential behind.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::constants::{CREDENTIAL_DIR, CREDENTIAL_FILE, EXPIRY_MARGIN_MILLIS};
use crate::error::{Error, Result};

/// Persisted authentication state.
///
/// `expires_at` is an absolute unix timestamp in milliseconds, computed
/// when the token response was received.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
}

impl Credential {
    /// Both tokens present. A parsed credential failing this is treated as absent.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Whether the access token outlives `now_millis` by more than the
    /// refresh margin.
    pub fn is_fresh_at(&self, now_millis: u64) -> bool {
        self.expires_at > now_millis.saturating_add(EXPIRY_MARGIN_MILLIS)
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(now_millis())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Current wall-clock time as unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// File-backed store for the single local credential.
///
/// No locking: two processes refreshing at once both write, and the last
/// rename wins. Either generation is structurally valid.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted at `root`, e.g. a per-account or per-test directory.
    pub fn in_dir(root: &Path) -> Self {
        Self::new(root.join(CREDENTIAL_FILE))
    }

    /// `$HOME/.subscription-auth/oauth.json`
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CREDENTIAL_DIR).join(CREDENTIAL_FILE))
            .ok_or_else(|| Error::Io("could not resolve home directory".into()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credential, or `None` if there is no usable one.
    pub async fn load(&self) -> Option<Credential> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored credential");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read credential file");
                return None;
            }
        };

        match serde_json::from_str::<Credential>(&contents) {
            Ok(credential) if credential.is_valid() => Some(credential),
            Ok(_) => {
                warn!(path = %self.path.display(), "credential file has empty tokens, ignoring");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse credential file");
                None
            }
        }
    }

    /// Persist `credential`, replacing any previous generation.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        write_atomic(&self.path, credential).await
    }

    /// Delete the credential file. Already absent counts as success.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared credentials");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(format!("removing credential file: {e}"))),
        }
    }
}

/// Distinguishes temp files of concurrent saves within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write the credential to `path` via a sibling temp file and rename.
///
/// The temp file is created 0600 on unix, so tokens are never readable by
/// other users, even before the rename.
async fn write_atomic(path: &Path, credential: &Credential) -> Result<()> {
    let json = serde_json::to_string_pretty(credential)
        .map_err(|e| Error::Io(format!("serializing credential: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::Io(format!("creating credential directory: {e}")))?;

    let tmp_path = dir.join(format!(
        ".{CREDENTIAL_FILE}.tmp.{}.{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    if let Err(e) = write_private(&tmp_path, json.as_bytes()).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Error::Io(format!("writing temp credential file: {e}")));
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Error::Io(format!("renaming temp credential file: {e}")));
    }

    debug!(path = %path.display(), "persisted credential");
    Ok(())
}

/// Create `path` (owner read/write only on unix) and write `bytes` to it.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}
