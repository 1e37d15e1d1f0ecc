//! Deployment settings: layered file + environment configuration.
//!
//! A `moor.toml` supplies defaults; `MOOR_*` environment variables override
//! field by field.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::client::Network;
use crate::signer::Signer;

/// Everything the CLI scenarios need to run a deployment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub network: Network,
    /// Base64 ed25519 secret key. Required for anything that submits.
    pub secret_key: Option<String>,
    /// Sender address; also the default recipient of the upgrade capability.
    pub address: Option<String>,
    /// Shared storage object id of the already-deployed connection package.
    pub storage: Option<String>,
    /// Manager config object id (manager variant only).
    pub manager_config: Option<String>,
    /// Allowed source network identifiers.
    pub sources: Vec<String>,
    /// Allowed destination network identifiers.
    pub destinations: Vec<String>,
    /// Hub token identifier, e.g. `0x1.icon/cx…`.
    pub token_id: Option<String>,
    /// Version argument passed to the configure entry points.
    pub version: u64,
    /// Move package directory to compile and publish.
    pub package_path: Option<PathBuf>,
}

/// On-disk shape of `moor.toml`. Every field optional; env fills the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSettings {
    pub network: Option<Network>,
    pub secret_key: Option<String>,
    pub address: Option<String>,
    pub storage: Option<String>,
    pub manager_config: Option<String>,
    pub sources: Option<Vec<String>>,
    pub destinations: Option<Vec<String>>,
    pub token_id: Option<String>,
    pub version: Option<u64>,
    pub package_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings for a run rooted at `project_root`.
    ///
    /// Resolution order: `<project_root>/moor.toml`, then the user config
    /// dir (`~/.config/moor/moor.toml`), then `MOOR_*` env overrides on top.
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let file = read_settings_file(project_root)?;
        let env: BTreeMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("MOOR_"))
            .collect();
        Self::from_parts(file, &env)
    }

    /// Combine an optional settings file with env overrides. Env wins.
    pub fn from_parts(
        file: Option<FileSettings>,
        env: &BTreeMap<String, String>,
    ) -> anyhow::Result<Self> {
        let file = file.unwrap_or_default();

        let network = match env.get("MOOR_NETWORK") {
            Some(name) => Network::parse(name)?,
            None => file.network.unwrap_or_default(),
        };

        let version = match env.get("MOOR_VERSION") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("MOOR_VERSION is not an unsigned integer: {raw}"))?,
            None => file.version.unwrap_or(1),
        };

        Ok(Self {
            network,
            secret_key: env.get("MOOR_SECRET_KEY").cloned().or(file.secret_key),
            address: env.get("MOOR_ADDRESS").cloned().or(file.address),
            storage: env.get("MOOR_STORAGE").cloned().or(file.storage),
            manager_config: env
                .get("MOOR_MANAGER_CONFIG")
                .cloned()
                .or(file.manager_config),
            sources: env
                .get("MOOR_SOURCES")
                .map(|raw| parse_list(raw))
                .or(file.sources)
                .unwrap_or_default(),
            destinations: env
                .get("MOOR_DESTINATIONS")
                .map(|raw| parse_list(raw))
                .or(file.destinations)
                .unwrap_or_default(),
            token_id: env.get("MOOR_TOKEN_ID").cloned().or(file.token_id),
            version,
            package_path: env
                .get("MOOR_PACKAGE_PATH")
                .map(PathBuf::from)
                .or(file.package_path),
        })
    }

    /// Build the signing context, failing with a pointer at what is missing.
    pub fn signer(&self) -> anyhow::Result<Signer> {
        let secret = self
            .secret_key
            .as_deref()
            .context("no secret key configured (MOOR_SECRET_KEY or moor.toml `secret_key`)")?;
        let address = self
            .address
            .as_deref()
            .context("no sender address configured (MOOR_ADDRESS or moor.toml `address`)")?;
        Signer::from_base64(secret, address)
    }

    /// Required-field accessor for the shared storage handle.
    pub fn require_storage(&self) -> anyhow::Result<&str> {
        self.storage
            .as_deref()
            .context("no storage object configured (MOOR_STORAGE)")
    }

    /// Required-field accessor for the hub token identifier.
    pub fn require_token_id(&self) -> anyhow::Result<&str> {
        self.token_id
            .as_deref()
            .context("no token identifier configured (MOOR_TOKEN_ID)")
    }
}

/// Comma-separated env list, whitespace-tolerant, empties dropped.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_settings_file(project_root: &Path) -> anyhow::Result<Option<FileSettings>> {
    let mut candidates = vec![project_root.join("moor.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("moor").join("moor.toml"));
    }

    for path in candidates {
        if path.is_file() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let parsed: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded settings file");
            return Ok(Some(parsed));
        }
    }
    Ok(None)
}
