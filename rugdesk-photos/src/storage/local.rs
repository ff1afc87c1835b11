//! Filesystem-backed object store
//!
//! Objects live under `{root}/{path}`. Signed URLs point at the service's
//! `/objects/{path}` route and carry an expiry plus an HMAC-SHA256 signature
//! over the path and the expiry, keyed by the signing secret.

use super::{validate_object_path, ObjectStore, PutOptions, SignedUrl, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const HMAC_BLOCK_LEN: usize = 64;

/// Longest lifetime a signed URL may be issued for (7 days)
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    base_url: String,
    signing_secret: String,
}

impl LocalObjectStore {
    /// # Arguments
    /// * `root` - Directory holding the objects (created on first put)
    /// * `base_url` - Public base URL of the service serving `/objects`
    /// * `signing_secret` - Secret mixed into URL signatures
    pub fn new(
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
        signing_secret: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signing_secret: signing_secret.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let segments = validate_object_path(path)?;
        Ok(segments
            .into_iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }

    /// Hex HMAC-SHA256 of `"{path}\n{expires_unix}"` under the signing secret
    pub fn signature(&self, path: &str, expires_unix: i64) -> String {
        let message = format!("{}\n{}", path, expires_unix);
        hmac_sha256_hex(self.signing_secret.as_bytes(), message.as_bytes())
    }

    /// Sign `path` relative to an explicit clock reading
    pub fn sign_at(
        &self,
        path: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<SignedUrl, StorageError> {
        validate_object_path(path)?;
        if !path.chars().all(is_url_safe) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        let ttl = ttl.min(MAX_SIGNED_URL_TTL);
        let expires_at = now + chrono::Duration::seconds(ttl.as_secs() as i64);
        let expires_unix = expires_at.timestamp();
        let signature = self.signature(path, expires_unix);

        Ok(SignedUrl {
            url: format!(
                "{}/objects/{}?expires={}&signature={}",
                self.base_url, path, expires_unix, signature
            ),
            expires_at,
        })
    }

    /// Check a signature produced by [`sign_at`](Self::sign_at) and its expiry
    pub fn verify(&self, path: &str, expires_unix: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() > expires_unix {
            return false;
        }
        let expected = self.signature(path, expires_unix);
        expected.len() == signature.len()
            && expected
                .bytes()
                .zip(signature.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    /// Read an object's bytes
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// RFC 2104 HMAC over SHA-256, hex encoded
fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    let mut block = [0u8; HMAC_BLOCK_LEN];
    if key.len() > HMAC_BLOCK_LEN {
        let digest = Sha256::digest(key);
        block[..digest.len()].copy_from_slice(&digest);
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let inner_pad: Vec<u8> = block.iter().map(|b| b ^ 0x36).collect();
    let outer_pad: Vec<u8> = block.iter().map(|b| b ^ 0x5c).collect();

    let inner = Sha256::new()
        .chain_update(&inner_pad)
        .chain_update(message)
        .finalize();
    let outer = Sha256::new()
        .chain_update(&outer_pad)
        .chain_update(inner)
        .finalize();
    format!("{:x}", outer)
}

fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '~')
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: PutOptions,
    ) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut open_options = tokio::fs::OpenOptions::new();
        open_options.write(true);
        if options.overwrite {
            open_options.create(true).truncate(true);
        } else {
            open_options.create_new(true);
        }

        let mut file = match open_options.open(&target).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::Conflict(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!(path, error = %e, "Object write failed, removing partial file");
            let _ = tokio::fs::remove_file(&target).await;
            return Err(e.into());
        }

        debug!(path, size = bytes.len(), "Object stored");
        Ok(path.to_string())
    }

    async fn sign(&self, path: &str, ttl: Duration) -> Result<SignedUrl, StorageError> {
        self.sign_at(path, ttl, Utc::now())
    }
}
