//! Allocation weights across protocols, portfolio APY blending, and score-based suggestions.

mod allocation;
mod recommend;

pub use allocation::{blend, Allocation, AllocationEntry, AllocationError, WEIGHT_EPSILON};
pub use recommend::{
    recommend_allocation, score, Recommendation, RecommendError, APY_WEIGHT, RISK_WEIGHT,
};
