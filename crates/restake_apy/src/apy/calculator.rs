//! Compounded APY from nominal reward rates, with validator/participation modifiers.

use serde::{Deserialize, Serialize};

/// How often a nominal annual rate compounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl CompoundingFrequency {
    pub const fn periods_per_year(self) -> u32 {
        match self {
            CompoundingFrequency::Daily => 365,
            CompoundingFrequency::Weekly => 52,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Yearly => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CompoundingFrequency::Daily => "daily",
            CompoundingFrequency::Weekly => "weekly",
            CompoundingFrequency::Monthly => "monthly",
            CompoundingFrequency::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for CompoundingFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reward configuration for one protocol. All rates are annual, in percent (4.0 = 4%).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardParameters {
    pub base_rewards: f64,
    pub protocol_rewards: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mev_rewards: Option<f64>,
    /// Multiplier in (0, 1]; 1.0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_effectiveness: Option<f64>,
    /// Multiplier in (0, 1]; 1.0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_participation: Option<f64>,
    pub compounding_frequency: CompoundingFrequency,
}

impl RewardParameters {
    /// Copy with `base_rewards` and `protocol_rewards` scaled by `factor`.
    /// MEV and the modifiers are left untouched.
    pub fn with_scaled_rewards(&self, factor: f64) -> Self {
        Self {
            base_rewards: self.base_rewards * factor,
            protocol_rewards: self.protocol_rewards * factor,
            ..self.clone()
        }
    }

    /// Combined effectiveness × participation multiplier applied to the total.
    pub fn modifier(&self) -> f64 {
        self.validator_effectiveness.unwrap_or(1.0) * self.network_participation.unwrap_or(1.0)
    }
}

/// Per-component APY and the modified total, in percent.
///
/// `total` is `(base + protocol + mev) * effectiveness * participation`, so it is
/// only equal to the component sum when both modifiers are 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApyBreakdown {
    pub base: f64,
    pub protocol: f64,
    pub mev: f64,
    pub total: f64,
}

impl ApyBreakdown {
    /// Sum of the unmodified components.
    pub fn raw_total(&self) -> f64 {
        self.base + self.protocol + self.mev
    }

    /// Largest single component; used to scale bar charts.
    pub fn max_component(&self) -> f64 {
        self.base.max(self.protocol).max(self.mev)
    }
}

/// Convert a nominal APR (percent) into APY (percent) with discrete compounding.
///
/// Total for `apr_percent > -100 * n`; yearly compounding returns `apr_percent` unchanged.
pub fn apr_to_apy(apr_percent: f64, frequency: CompoundingFrequency) -> f64 {
    let n = frequency.periods_per_year();
    if n == 1 {
        return apr_percent;
    }
    let periods = f64::from(n);
    // (1 + r)^n - 1 via ln_1p/exp_m1 so tiny rates keep their precision.
    (periods * (apr_percent / 100.0 / periods).ln_1p()).exp_m1() * 100.0
}

/// Compound each reward stream independently, sum, then apply the modifiers to the total only.
pub fn compute_breakdown(params: &RewardParameters) -> ApyBreakdown {
    let freq = params.compounding_frequency;
    let base = apr_to_apy(params.base_rewards, freq);
    let protocol = apr_to_apy(params.protocol_rewards, freq);
    let mev = params.mev_rewards.map_or(0.0, |m| apr_to_apy(m, freq));
    let total = (base + protocol + mev) * params.modifier();
    ApyBreakdown {
        base,
        protocol,
        mev,
        total,
    }
}
