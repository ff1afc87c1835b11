//! Service configuration resolution for rugdesk-photos
//!
//! Combines the bootstrap TOML with CLI and environment overrides into the
//! runtime settings the service starts with.

use rand::distributions::Alphanumeric;
use rand::Rng;
use rugdesk_common::config::{resolve_root_folder, TomlConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the URL signing secret
pub const SIGNING_SECRET_ENV_VAR: &str = "RUGDESK_SIGNING_SECRET";

/// Minimum accepted secret length
const MIN_SECRET_LEN: usize = 16;
const GENERATED_SECRET_LEN: usize = 48;
const OBJECTS_DIR: &str = "objects";

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub root_folder: PathBuf,
    pub signing_secret: String,
    /// Base URL embedded in signed links
    pub public_base_url: String,
    pub default_ttl: Duration,
    pub toml: TomlConfig,
}

impl ServiceConfig {
    /// Resolve settings from the loaded TOML and CLI overrides
    ///
    /// # Arguments
    /// * `toml` - Bootstrap configuration (possibly defaults)
    /// * `root_folder_arg` - `--root-folder` value, if given
    /// * `port_arg` - `--port` value, if given
    pub fn resolve(
        toml: TomlConfig,
        root_folder_arg: Option<&Path>,
        port_arg: Option<u16>,
    ) -> rugdesk_common::Result<Self> {
        let port = port_arg.unwrap_or(toml.server.port);
        let addr = format!("{}:{}", toml.server.host, port);
        let listen_addr: SocketAddr = addr.parse().map_err(|e| {
            rugdesk_common::Error::Config(format!("Invalid listen address {}: {}", addr, e))
        })?;

        let root_folder = resolve_root_folder(root_folder_arg, &toml);
        let signing_secret = resolve_signing_secret(&toml);
        let public_base_url = toml
            .signing
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", listen_addr));

        Ok(Self {
            listen_addr,
            root_folder,
            signing_secret,
            public_base_url,
            default_ttl: Duration::from_secs(toml.signing.default_ttl_seconds),
            toml,
        })
    }

    /// Directory holding stored objects
    pub fn objects_dir(&self) -> PathBuf {
        self.root_folder.join(OBJECTS_DIR)
    }
}

/// Resolve the URL signing secret
///
/// **Priority:** ENV → TOML → random per-process secret
///
/// A generated secret invalidates every outstanding signed URL on restart.
pub fn resolve_signing_secret(toml: &TomlConfig) -> String {
    let env_secret = std::env::var(SIGNING_SECRET_ENV_VAR).ok();
    let toml_secret = toml.signing.secret.as_ref();

    if env_secret.as_deref().is_some_and(is_valid_secret)
        && toml_secret.is_some_and(|s| is_valid_secret(s))
    {
        warn!("Signing secret found in environment and TOML. Using environment (highest priority).");
    }

    if let Some(secret) = env_secret {
        if is_valid_secret(&secret) {
            info!("Signing secret loaded from environment variable");
            return secret;
        }
        warn!(
            "{} is shorter than {} characters, ignoring",
            SIGNING_SECRET_ENV_VAR, MIN_SECRET_LEN
        );
    }

    if let Some(secret) = toml_secret {
        if is_valid_secret(secret) {
            info!("Signing secret loaded from TOML config");
            return secret.clone();
        }
        warn!(
            "signing.secret is shorter than {} characters, ignoring",
            MIN_SECRET_LEN
        );
    }

    warn!("No signing secret configured, generated a per-process secret; signed URLs will not survive a restart");
    generate_secret()
}

fn is_valid_secret(secret: &str) -> bool {
    secret.trim().len() >= MIN_SECRET_LEN
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}
