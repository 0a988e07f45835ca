//! Lock record stored in each entry file.

use crate::error::{ProviderError, ProviderResult};
use crate::key::MUTEX_PREFIX;
use crate::provider::ttl;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Contents of a file-backed lock entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Full storage key, prefix included.
    pub key: String,

    /// Holder token compared for ownership.
    pub token: String,

    /// Who wrote the record (e.g., `user@HOST`), for diagnostics only.
    pub owner: String,

    /// Process ID of the writer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// When the record was last written (RFC3339).
    pub created_at: DateTime<Utc>,

    /// When the record stops counting as held; absent means never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LockRecord {
    /// Record for `token` written now, expiring `expiry_secs` from now.
    ///
    /// A deadline past the range of `DateTime` is stored as never expiring.
    pub fn new(key: &str, token: &str, expiry_secs: u64) -> Self {
        let created_at = Utc::now();
        let expires_at = ttl(expiry_secs)
            .and_then(|ttl| Duration::from_std(ttl).ok())
            .and_then(|ttl| created_at.checked_add_signed(ttl));

        Self {
            key: key.to_string(),
            token: token.to_string(),
            owner: owner_string(),
            pid: Some(std::process::id()),
            created_at,
            expires_at,
        }
    }

    /// Parse a record from a file; `Ok(None)` if the file does not exist.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ProviderResult<Option<Self>> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ProviderError::io(path, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ProviderError::Corrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> ProviderResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ProviderError::Backend(format!("failed to serialize lock record: {}", e)))
    }

    /// Whether the record's expiry has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time since the record was last written.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl std::fmt::Display for LockRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.key.strip_prefix(MUTEX_PREFIX).unwrap_or(&self.key);
        let expiry = match self.expires_at {
            Some(at) => format!(
                "expires in {}s",
                at.signed_duration_since(Utc::now()).num_seconds().max(0)
            ),
            None => "never expires".to_string(),
        };
        write!(
            f,
            "{} (holder: {}, owner: {}, age: {}, {})",
            name,
            self.token,
            self.owner,
            self.age_string(),
            expiry
        )
    }
}

/// Get the owner string recorded next to the token.
pub(crate) fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
