//! restake_apy — APY aggregation for multi-protocol restaking.
//!
//! Converts per-protocol APR inputs into compounded APY, applies validator and
//! participation modifiers, and blends protocols by allocation weight.
//! No chain access; the realtime rate is a jittered simulation.

pub mod apy;
pub mod portfolio;
pub mod protocol;
pub mod realtime;
pub mod report;
pub mod verify;

pub use apy::{apr_to_apy, compute_breakdown, ApyBreakdown, CompoundingFrequency, RewardParameters};
pub use portfolio::{blend, recommend_allocation, Allocation, AllocationError, Recommendation};
pub use protocol::{ids, ProtocolConfig, ProtocolEntry, ProtocolRegistry, RegistryError};
pub use realtime::{spawn_refresh, ApyEngine, ApySnapshot, JitterSource, RealtimeConfig};
pub use report::{ReportData, ReportSnapshot};
pub use verify::{snapshot_hash, verify_snapshot, VerificationResult};
