//! Protocol dataset loading.
//!
//! A protocols file is a JSON array of entries:
//! `[{ "id": "lido", "name": "Lido", "base_rewards": 3.8, "protocol_rewards": 0.7,
//!    "compounding_frequency": "daily" }, ...]`.
//!
//! Load from: env `RESTAKE_PROTOCOLS_PATH`, or `./config/protocols.json`, or `./protocols.json`.
//! With none present the built-in dataset is used. A file that exists but does not parse
//! or validate is an error.

use crate::protocol::builtin::builtin_entries;
use crate::protocol::registry::{ProtocolEntry, ProtocolRegistry, RegistryError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const CONFIG_PATH_ENV: &str = "RESTAKE_PROTOCOLS_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("invalid parameters for {id}: {reason}")]
    InvalidParameters { id: String, reason: String },
}

/// Protocol entries plus where they came from (`None` = built-in).
#[derive(Clone, Debug)]
pub struct ProtocolConfig {
    pub entries: Vec<ProtocolEntry>,
    pub source: Option<PathBuf>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            entries: builtin_entries(),
            source: None,
        }
    }
}

impl ProtocolConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<ProtocolEntry> = serde_json::from_str(&content)?;
        for entry in &entries {
            validate(entry)?;
        }
        info!(path = %path.display(), count = entries.len(), "loaded protocols");
        Ok(Self {
            entries,
            source: Some(path.to_path_buf()),
        })
    }

    /// Load config: env RESTAKE_PROTOCOLS_PATH, then ./config/protocols.json, then ./protocols.json.
    pub fn load() -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::search(
            from_env.as_deref(),
            &[
                Path::new("./config/protocols.json"),
                Path::new("./protocols.json"),
            ],
        )
    }

    /// First existing path wins; an env path that does not exist is logged and skipped.
    fn search(from_env: Option<&Path>, candidates: &[&Path]) -> Result<Self, ConfigError> {
        if let Some(p) = from_env {
            if p.exists() {
                return Self::load_from_path(p);
            }
            warn!(
                env = CONFIG_PATH_ENV,
                path = %p.display(),
                "protocols file not found; continuing search"
            );
        }
        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Explicit path wins; otherwise the usual search order.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    pub fn into_registry(self) -> Result<ProtocolRegistry, ConfigError> {
        Ok(ProtocolRegistry::from_entries(self.entries)?)
    }
}

fn validate(entry: &ProtocolEntry) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidParameters {
        id: entry.id.clone(),
        reason,
    };
    let p = &entry.params;
    if entry.id.trim().is_empty() {
        return Err(invalid("empty id".into()));
    }
    let rates = [
        ("base_rewards", Some(p.base_rewards)),
        ("protocol_rewards", Some(p.protocol_rewards)),
        ("mev_rewards", p.mev_rewards),
    ];
    for (field, value) in rates {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(invalid(format!("{field} is not finite")));
            }
        }
    }
    if let Some(risk) = entry.risk_score {
        if !risk.is_finite() || risk < 0.0 {
            return Err(invalid(format!("risk_score must be finite and >= 0, got {risk}")));
        }
    }
    let modifiers = [
        ("validator_effectiveness", p.validator_effectiveness),
        ("network_participation", p.network_participation),
    ];
    for (field, value) in modifiers {
        if let Some(v) = value {
            let in_range = v > 0.0 && v <= 1.0;
            if !in_range {
                return Err(invalid(format!("{field} must be in (0, 1], got {v}")));
            }
        }
    }
    Ok(())
}
