//! SHA-256 fingerprint over canonical (key-sorted, compact) snapshot JSON.

use crate::report::ReportSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Canonical JSON: object keys sorted at every depth, no whitespace.
pub fn canonical_json(value: &Value) -> Result<String, VerifyError> {
    Ok(serde_json::to_string(&sorted(value))?)
}

fn sorted(v: &Value) -> Value {
    match v {
        Value::Object(m) => {
            let mut pairs: Vec<(&String, &Value)> = m.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (k, inner) in pairs {
                out.insert(k.clone(), sorted(inner));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

pub fn snapshot_hash(snapshot: &ReportSnapshot) -> Result<String, VerifyError> {
    let json = serde_json::to_value(snapshot)?;
    let canonical = canonical_json(&json)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationResult {
    pub snapshot_hash: String,
    pub expected_hash: Option<String>,
    pub matches: bool,
}

/// Compare a snapshot against expected hex (e.g. `.sha256` file content). Case-insensitive.
pub fn verify_snapshot(
    snapshot: &ReportSnapshot,
    expected_hex: Option<&str>,
) -> Result<VerificationResult, VerifyError> {
    let snapshot_hash = snapshot_hash(snapshot)?;
    let expected_hash = expected_hex.map(|e| e.trim().to_lowercase());
    let matches = expected_hash
        .as_deref()
        .is_some_and(|e| e == snapshot_hash.to_lowercase());
    Ok(VerificationResult {
        snapshot_hash,
        expected_hash,
        matches,
    })
}
