//! Immutable protocol id → reward parameters table.

use crate::apy::{compute_breakdown, ApyBreakdown, RewardParameters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("protocol {0} not found")]
    NotFound(String),
    #[error("duplicate protocol id: {0}")]
    DuplicateKey(String),
}

/// One registry row: identifier, display name, and reward parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolEntry {
    pub id: String,
    /// Human-readable name; falls back to `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Relative risk, lower is better. Counts as 0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(flatten)]
    pub params: RewardParameters,
}

impl ProtocolEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, params: RewardParameters) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            risk_score: None,
            params,
        }
    }

    pub fn with_risk_score(mut self, risk_score: f64) -> Self {
        self.risk_score = Some(risk_score);
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Read-only registry. Built once; there are no mutation methods.
#[derive(Clone, Debug, Default)]
pub struct ProtocolRegistry {
    entries: BTreeMap<String, ProtocolEntry>,
}

impl ProtocolRegistry {
    /// Build from entries. Fails on the first repeated identifier.
    pub fn from_entries(
        entries: impl IntoIterator<Item = ProtocolEntry>,
    ) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if map.contains_key(&entry.id) {
                return Err(RegistryError::DuplicateKey(entry.id));
            }
            map.insert(entry.id.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, id: &str) -> Result<&RewardParameters, RegistryError> {
        self.entry(id).map(|e| &e.params)
    }

    pub fn entry(&self, id: &str) -> Result<&ProtocolEntry, RegistryError> {
        debug!(protocol = %id, "registry lookup");
        self.entries
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Look up `id` and compute its static breakdown.
    pub fn apy_breakdown(&self, id: &str) -> Result<ApyBreakdown, RegistryError> {
        self.get(id).map(compute_breakdown)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProtocolEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
