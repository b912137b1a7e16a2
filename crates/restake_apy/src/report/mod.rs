//! Report snapshot (HTML is generated in restake_apy_report crate).

use crate::apy::{ApyBreakdown, RewardParameters};
use crate::portfolio::Allocation;
use crate::protocol::RegistryError;
use crate::realtime::{ApyEngine, ApySnapshot};
use crate::verify::{snapshot_hash, VerifyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ReportBuildError {
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("verify: {0}")]
    Verify(#[from] VerifyError),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolReport {
    pub id: String,
    pub name: String,
    pub params: RewardParameters,
    pub breakdown: ApyBreakdown,
    pub realtime_apy: Option<f64>,
    pub weight: f64,
    /// Share of the staked amount, when an amount was given.
    pub amount: Option<f64>,
}

/// Everything the report shows; this is what the fingerprint covers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub version: u32,
    pub created_utc_rfc3339: String,
    pub protocols: Vec<ProtocolReport>,
    pub allocation: Allocation,
    pub staked_amount: Option<f64>,
    /// Blend of static totals.
    pub blended_apy: f64,
    /// Blend of realtime totals, when a realtime snapshot was supplied.
    pub blended_realtime_apy: Option<f64>,
}

impl ReportSnapshot {
    /// Snapshot for every protocol in `allocation`. Unknown ids are an error here.
    pub fn build(
        engine: &ApyEngine,
        allocation: &Allocation,
        realtime: Option<&ApySnapshot>,
        staked_amount: Option<f64>,
    ) -> Result<Self, RegistryError> {
        let mut protocols = Vec::with_capacity(allocation.len());
        let mut static_apys = BTreeMap::new();
        for entry in allocation.entries() {
            let protocol = engine.registry().entry(&entry.id)?;
            let breakdown = engine.apy_breakdown(&entry.id)?;
            static_apys.insert(entry.id.clone(), breakdown.total);
            protocols.push(ProtocolReport {
                id: entry.id.clone(),
                name: protocol.display_name().to_string(),
                params: protocol.params.clone(),
                breakdown,
                realtime_apy: realtime.and_then(|s| s.apys.get(&entry.id).copied()),
                weight: entry.weight,
                amount: staked_amount.map(|a| a * entry.weight / 100.0),
            });
        }
        let created_utc_rfc3339 = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Ok(Self {
            version: SNAPSHOT_VERSION,
            created_utc_rfc3339,
            blended_apy: allocation.blended_apy(&static_apys),
            blended_realtime_apy: realtime.map(|s| allocation.blended_apy(&s.apys)),
            protocols,
            allocation: allocation.clone(),
            staked_amount,
        })
    }
}

/// Data passed to the HTML report generator: snapshot + its fingerprint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportData {
    pub snapshot: ReportSnapshot,
    pub fingerprint_sha256: String,
}

impl ReportData {
    pub fn new(snapshot: ReportSnapshot) -> Result<Self, VerifyError> {
        let fingerprint_sha256 = snapshot_hash(&snapshot)?;
        Ok(Self {
            snapshot,
            fingerprint_sha256,
        })
    }

    pub fn build(
        engine: &ApyEngine,
        allocation: &Allocation,
        realtime: Option<&ApySnapshot>,
        staked_amount: Option<f64>,
    ) -> Result<Self, ReportBuildError> {
        let snapshot = ReportSnapshot::build(engine, allocation, realtime, staked_amount)?;
        Ok(Self::new(snapshot)?)
    }
}
