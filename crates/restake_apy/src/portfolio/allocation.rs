//! Caller-owned allocation state and weighted APY blending.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Tolerance used when checking that weights sum to 100.
pub const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("protocol {0} is not in the allocation")]
    NotSelected(String),
    #[error("protocol {0} listed more than once")]
    Duplicate(String),
    #[error("invalid weight for {id}: {weight}")]
    InvalidWeight { id: String, weight: f64 },
    #[error("invalid allocation entry {0:?}, expected id=weight")]
    Parse(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub id: String,
    /// Percent of the staked amount.
    pub weight: f64,
}

/// Selected protocols in selection order, with percentage weights.
///
/// The rebalancing operations keep the weights summing to 100; `blended_apy` does not
/// check it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    entries: Vec<AllocationEntry>,
}

/// Weighted sum `Σ apy_i * w_i / 100` over `(apy, weight)` pairs.
pub fn blend(pairs: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    pairs
        .into_iter()
        .map(|(apy, weight)| apy * weight / 100.0)
        .sum()
}

impl Allocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// One protocol holding the whole amount.
    pub fn single(id: impl Into<String>) -> Self {
        Self {
            entries: vec![AllocationEntry {
                id: id.into(),
                weight: 100.0,
            }],
        }
    }

    /// Weights taken as given (not normalized).
    pub fn from_weights<I, S>(weights: I) -> Result<Self, AllocationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut entries: Vec<AllocationEntry> = Vec::new();
        for (id, weight) in weights {
            let id = id.into();
            if !weight.is_finite() || weight < 0.0 {
                return Err(AllocationError::InvalidWeight { id, weight });
            }
            if entries.iter().any(|e| e.id == id) {
                return Err(AllocationError::Duplicate(id));
            }
            entries.push(AllocationEntry { id, weight });
        }
        Ok(Self { entries })
    }

    /// Parse `id=weight` pairs, e.g. `["eigenLayer=60", "lido=40"]`.
    pub fn parse_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self, AllocationError> {
        let mut weights = Vec::with_capacity(pairs.len());
        for raw in pairs {
            let raw = raw.as_ref();
            let (id, weight) = raw
                .split_once('=')
                .ok_or_else(|| AllocationError::Parse(raw.to_string()))?;
            let id = id.trim();
            if id.is_empty() {
                return Err(AllocationError::Parse(raw.to_string()));
            }
            let weight: f64 = weight
                .trim()
                .parse()
                .map_err(|_| AllocationError::Parse(raw.to_string()))?;
            weights.push((id.to_string(), weight));
        }
        Self::from_weights(weights)
    }

    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn weight(&self, id: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.weight)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.total() - 100.0).abs() <= tolerance
    }

    /// Rescale weights to sum to 100. No-op when the total is zero.
    pub fn normalize(&mut self) {
        let sum = self.total();
        if sum <= 0.0 || (sum - 100.0).abs() <= WEIGHT_EPSILON {
            return;
        }
        let factor = 100.0 / sum;
        for e in &mut self.entries {
            e.weight *= factor;
        }
    }

    /// Select or deselect `id`.
    ///
    /// Selecting splits 100 equally over all selected protocols. Deselecting hands the
    /// removed weight out equally to the protocols that remain.
    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            let removed = self.entries.remove(pos);
            if !self.entries.is_empty() {
                let share = removed.weight / self.entries.len() as f64;
                for e in &mut self.entries {
                    e.weight += share;
                }
            }
        } else {
            self.entries.push(AllocationEntry {
                id: id.to_string(),
                weight: 0.0,
            });
            let share = 100.0 / self.entries.len() as f64;
            for e in &mut self.entries {
                e.weight = share;
            }
        }
    }

    /// Move `id` to `value` percent, taking the difference equally from the others
    /// (floored at zero), then rescale to 100.
    ///
    /// Returns `Ok(false)` without changing anything when `id` is the only selection.
    pub fn set_weight(&mut self, id: &str, value: f64) -> Result<bool, AllocationError> {
        if value.is_nan() {
            return Err(AllocationError::InvalidWeight {
                id: id.to_string(),
                weight: value,
            });
        }
        let old = self
            .weight(id)
            .ok_or_else(|| AllocationError::NotSelected(id.to_string()))?;
        if self.entries.len() == 1 {
            return Ok(false);
        }
        let value = value.clamp(0.0, 100.0);
        let per_other = (value - old) / (self.entries.len() - 1) as f64;
        for e in &mut self.entries {
            if e.id == id {
                e.weight = value;
            } else {
                e.weight = (e.weight - per_other).max(0.0);
            }
        }
        self.normalize();
        Ok(true)
    }

    /// `Σ apy * weight / 100`; protocols without an APY count as 0.
    pub fn blended_apy(&self, apys: &BTreeMap<String, f64>) -> f64 {
        blend(
            self.entries
                .iter()
                .map(|e| (apys.get(&e.id).copied().unwrap_or(0.0), e.weight)),
        )
    }

    /// Per-protocol share of `amount`.
    pub fn split_amount(&self, amount: f64) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|e| (e.id.clone(), amount * e.weight / 100.0))
            .collect()
    }
}
