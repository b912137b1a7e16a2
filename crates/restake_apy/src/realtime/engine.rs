//! Registry-backed APY engine with a best-effort simulated realtime rate.

use crate::apy::{compute_breakdown, ApyBreakdown, RewardParameters};
use crate::protocol::{ProtocolRegistry, RegistryError};
use crate::realtime::jitter::{JitterError, JitterSource, UniformJitter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Artificial delay before each realtime computation, modelling a network fetch.
    pub simulated_latency_ms: u64,
    pub refresh_interval_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 0,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl RealtimeConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

/// Realtime APY per protocol at one refresh tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApySnapshot {
    /// 0 before the first tick.
    pub sequence: u64,
    pub apys: BTreeMap<String, f64>,
}

pub struct ApyEngine {
    registry: ProtocolRegistry,
    jitter: Box<dyn JitterSource>,
    config: RealtimeConfig,
}

impl ApyEngine {
    pub fn new(registry: ProtocolRegistry) -> Self {
        Self {
            registry,
            jitter: Box::new(UniformJitter::default()),
            config: RealtimeConfig::default(),
        }
    }

    pub fn with_jitter(mut self, jitter: impl JitterSource + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    pub fn with_config(mut self, config: RealtimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Static breakdown for `id`.
    pub fn apy_breakdown(&self, id: &str) -> Result<ApyBreakdown, RegistryError> {
        self.registry.apy_breakdown(id)
    }

    /// Jittered total APY for `id`.
    ///
    /// Only an unknown id is an error; a failed or unusable jitter draw falls back to
    /// the static total.
    pub async fn realtime_apy(&self, id: &str) -> Result<f64, RegistryError> {
        let params = self.registry.get(id)?;
        if self.config.simulated_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.simulated_latency_ms)).await;
        }
        match self.jittered_total(params) {
            Ok(total) => Ok(total),
            Err(e) => {
                warn!(protocol = %id, error = %e, "realtime apy failed, using static config");
                Ok(compute_breakdown(params).total)
            }
        }
    }

    fn jittered_total(&self, params: &RewardParameters) -> Result<f64, JitterError> {
        let factor = self.jitter.sample()?;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(JitterError::BadFactor(factor));
        }
        let total = compute_breakdown(&params.with_scaled_rewards(factor)).total;
        if !total.is_finite() {
            return Err(JitterError::BadFactor(factor));
        }
        debug!(factor, total, "jittered apy");
        Ok(total)
    }

    /// Realtime APY for each id; unknown ids are logged and left out.
    pub async fn realtime_snapshot(&self, ids: &[String], sequence: u64) -> ApySnapshot {
        let mut apys = BTreeMap::new();
        for id in ids {
            match self.realtime_apy(id).await {
                Ok(apy) => {
                    apys.insert(id.clone(), apy);
                }
                Err(e) => warn!(protocol = %id, error = %e, "skipping protocol"),
            }
        }
        ApySnapshot { sequence, apys }
    }
}

impl std::fmt::Debug for ApyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApyEngine")
            .field("protocols", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ids;
    use crate::realtime::jitter::{FixedJitter, SeededJitter};

    struct FailingJitter;

    impl JitterSource for FailingJitter {
        fn sample(&self) -> Result<f64, JitterError> {
            Err(JitterError::Source("rng unavailable".into()))
        }
    }

    fn engine() -> ApyEngine {
        ApyEngine::new(ProtocolRegistry::builtin().unwrap())
    }

    fn static_total(id: &str) -> f64 {
        engine().apy_breakdown(id).unwrap().total
    }

    #[tokio::test]
    async fn unit_factor_matches_static() {
        let e = engine().with_jitter(FixedJitter(1.0));
        let apy = e.realtime_apy(ids::EIGEN_LAYER).await.unwrap();
        assert!((apy - static_total(ids::EIGEN_LAYER)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn jitter_scales_base_and_protocol_only() {
        let e = engine().with_jitter(FixedJitter(1.05));
        let apy = e.realtime_apy(ids::EIGEN_LAYER).await.unwrap();
        let params = e.registry().get(ids::EIGEN_LAYER).unwrap();
        let expected = compute_breakdown(&RewardParameters {
            base_rewards: 4.2,
            protocol_rewards: 3.675,
            ..params.clone()
        })
        .total;
        assert!((apy - expected).abs() < 1e-9);
        assert!(apy > static_total(ids::EIGEN_LAYER));
    }

    #[tokio::test]
    async fn default_jitter_stays_in_band() {
        let e = engine();
        let lo = compute_breakdown(
            &e.registry()
                .get(ids::LIDO)
                .unwrap()
                .with_scaled_rewards(0.95),
        )
        .total;
        let hi = compute_breakdown(
            &e.registry()
                .get(ids::LIDO)
                .unwrap()
                .with_scaled_rewards(1.05),
        )
        .total;
        for _ in 0..200 {
            let apy = e.realtime_apy(ids::LIDO).await.unwrap();
            assert!(apy >= lo - 1e-12 && apy <= hi + 1e-12);
        }
    }

    #[tokio::test]
    async fn failing_source_falls_back() {
        let e = engine().with_jitter(FailingJitter);
        let apy = e.realtime_apy(ids::ROCKET_POOL).await.unwrap();
        assert!((apy - static_total(ids::ROCKET_POOL)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn non_finite_factor_falls_back() {
        for bad in [f64::NAN, f64::INFINITY, -1.0, 0.0] {
            let e = engine().with_jitter(FixedJitter(bad));
            let apy = e.realtime_apy(ids::STRIDE).await.unwrap();
            assert!((apy - static_total(ids::STRIDE)).abs() < 1e-12, "{bad}");
        }
    }

    #[tokio::test]
    async fn unknown_id_propagates() {
        let e = engine().with_jitter(FailingJitter);
        let err = e.realtime_apy("cosmosHub").await.unwrap_err();
        assert_eq!(err, RegistryError::NotFound("cosmosHub".into()));
        assert!(e.apy_breakdown("cosmosHub").is_err());
    }

    #[tokio::test]
    async fn seeded_engine_is_reproducible() {
        let a = engine().with_jitter(SeededJitter::new(9));
        let b = engine().with_jitter(SeededJitter::new(9));
        for _ in 0..5 {
            let x = a.realtime_apy(ids::EIGEN_LAYER).await.unwrap();
            let y = b.realtime_apy(ids::EIGEN_LAYER).await.unwrap();
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[tokio::test]
    async fn snapshot_skips_unknown() {
        let e = engine().with_jitter(FixedJitter(1.0));
        let wanted = vec![ids::LIDO.to_string(), "nope".to_string()];
        let snap = e.realtime_snapshot(&wanted, 3).await;
        assert_eq!(snap.sequence, 3);
        assert_eq!(snap.apys.len(), 1);
        assert!(snap.apys.contains_key(ids::LIDO));
    }

    #[test]
    fn refresh_interval_defaults_to_a_minute() {
        assert_eq!(RealtimeConfig::default().refresh_interval(), Duration::from_secs(60));
        let zero = RealtimeConfig {
            refresh_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(zero.refresh_interval(), Duration::from_secs(1));
        assert_eq!(engine().config().refresh_interval(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_simulated() {
        let e = engine().with_jitter(FixedJitter(1.0)).with_config(RealtimeConfig {
            simulated_latency_ms: 250,
            ..Default::default()
        });
        let start = tokio::time::Instant::now();
        e.realtime_apy(ids::LIDO).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
