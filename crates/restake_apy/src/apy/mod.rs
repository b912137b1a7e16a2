//! APR→APY conversion and per-protocol yield breakdown.

mod calculator;

pub use calculator::{
    apr_to_apy, compute_breakdown, ApyBreakdown, CompoundingFrequency, RewardParameters,
};
