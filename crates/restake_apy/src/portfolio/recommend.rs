//! Allocation suggestion from yield and risk scores.
//!
//! Each protocol scores `total_apy * 0.7 - risk_score * 0.3`; weights are the score
//! shares of the summed score, in percent.

use crate::apy::compute_breakdown;
use crate::portfolio::allocation::{Allocation, AllocationError};
use crate::protocol::{ProtocolRegistry, RegistryError};
use thiserror::Error;
use tracing::debug;

pub const APY_WEIGHT: f64 = 0.7;
pub const RISK_WEIGHT: f64 = 0.3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("no protocols to score")]
    Empty,
    #[error("protocol {id} has unusable score {score}")]
    InvalidScore { id: String, score: f64 },
    #[error("scores sum to {0}; nothing to allocate")]
    NonPositiveTotal(f64),
}

pub fn score(apy: f64, risk_score: f64) -> f64 {
    apy * APY_WEIGHT - risk_score * RISK_WEIGHT
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub allocation: Allocation,
    /// `(id, score)` in the order requested.
    pub scores: Vec<(String, f64)>,
}

impl Recommendation {
    /// Recommended stake per protocol for `amount`.
    pub fn recommended_amounts(&self, amount: f64) -> Vec<(String, f64)> {
        self.allocation.split_amount(amount)
    }
}

/// Score `ids` against their static total APY and risk, and weight them by score share.
///
/// A negative or non-finite score is an error, as is a summed score of zero.
pub fn recommend_allocation<S: AsRef<str>>(
    registry: &ProtocolRegistry,
    ids: &[S],
) -> Result<Recommendation, RecommendError> {
    if ids.is_empty() {
        return Err(RecommendError::Empty);
    }
    let mut scores = Vec::with_capacity(ids.len());
    for id in ids {
        let entry = registry.entry(id.as_ref())?;
        let apy = compute_breakdown(&entry.params).total;
        let s = score(apy, entry.risk_score.unwrap_or(0.0));
        if !s.is_finite() || s < 0.0 {
            return Err(RecommendError::InvalidScore {
                id: entry.id.clone(),
                score: s,
            });
        }
        scores.push((entry.id.clone(), s));
    }
    let total: f64 = scores.iter().map(|(_, s)| s).sum();
    if total <= 0.0 {
        return Err(RecommendError::NonPositiveTotal(total));
    }
    let allocation = Allocation::from_weights(
        scores
            .iter()
            .map(|(id, s)| (id.clone(), s / total * 100.0)),
    )?;
    debug!(protocols = scores.len(), total_score = total, "allocation recommended");
    Ok(Recommendation { allocation, scores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apy::{CompoundingFrequency, RewardParameters};
    use crate::protocol::{ids, ProtocolEntry};

    fn yearly(id: &str, apr: f64, risk: Option<f64>) -> ProtocolEntry {
        let entry = ProtocolEntry::new(
            id,
            id,
            RewardParameters {
                base_rewards: apr,
                protocol_rewards: 0.0,
                mev_rewards: None,
                validator_effectiveness: None,
                network_participation: None,
                compounding_frequency: CompoundingFrequency::Yearly,
            },
        );
        match risk {
            Some(r) => entry.with_risk_score(r),
            None => entry,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn score_weights_yield_against_risk() {
        assert!(approx(score(10.0, 5.0), 5.5));
        assert!(approx(score(5.0, 0.0), 3.5));
    }

    #[test]
    fn weights_are_score_shares() {
        let reg = ProtocolRegistry::from_entries([
            yearly("a", 10.0, Some(5.0)),
            yearly("b", 5.0, None),
        ])
        .unwrap();
        let rec = recommend_allocation(&reg, &["a", "b"]).unwrap();
        assert!(rec.allocation.is_normalized(1e-9));
        assert!(approx(rec.allocation.weight("a").unwrap(), 5.5 / 9.0 * 100.0));
        assert!(approx(rec.allocation.weight("b").unwrap(), 3.5 / 9.0 * 100.0));
        assert_eq!(rec.scores[0].0, "a");
        assert!(approx(rec.scores[0].1, 5.5));

        let amounts = rec.recommended_amounts(900.0);
        assert!(approx(amounts[0].1, 550.0));
        assert!(approx(amounts[1].1, 350.0));
    }

    #[test]
    fn builtin_without_risk_follows_apy() {
        let reg = ProtocolRegistry::builtin().unwrap();
        let rec = recommend_allocation(&reg, &[ids::EIGEN_LAYER, ids::LIDO]).unwrap();
        let eigen = reg.apy_breakdown(ids::EIGEN_LAYER).unwrap().total;
        let lido = reg.apy_breakdown(ids::LIDO).unwrap().total;
        let expected = eigen / (eigen + lido) * 100.0;
        assert!(approx(rec.allocation.weight(ids::EIGEN_LAYER).unwrap(), expected));
        assert_eq!(
            rec.allocation.ids().collect::<Vec<_>>(),
            vec![ids::EIGEN_LAYER, ids::LIDO]
        );
    }

    #[test]
    fn risk_outweighing_yield_is_rejected() {
        let reg = ProtocolRegistry::from_entries([
            yearly("safe", 5.0, None),
            yearly("wild", 5.0, Some(30.0)),
        ])
        .unwrap();
        let err = recommend_allocation(&reg, &["safe", "wild"]).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidScore { ref id, score } if id == "wild" && score < 0.0));
    }

    #[test]
    fn zero_total_is_rejected() {
        let reg = ProtocolRegistry::from_entries([yearly("flat", 0.0, None)]).unwrap();
        assert_eq!(
            recommend_allocation(&reg, &["flat"]).unwrap_err(),
            RecommendError::NonPositiveTotal(0.0)
        );
    }

    #[test]
    fn unknown_empty_and_duplicate() {
        let reg = ProtocolRegistry::builtin().unwrap();
        assert_eq!(
            recommend_allocation(&reg, &["unknown"]).unwrap_err(),
            RecommendError::Registry(RegistryError::NotFound("unknown".into()))
        );
        let none: [&str; 0] = [];
        assert_eq!(recommend_allocation(&reg, &none).unwrap_err(), RecommendError::Empty);
        assert_eq!(
            recommend_allocation(&reg, &[ids::LIDO, ids::LIDO]).unwrap_err(),
            RecommendError::Allocation(AllocationError::Duplicate(ids::LIDO.into()))
        );
    }
}
