//! Simulated realtime APY: injected jitter, best-effort fallback, periodic refresh.

mod engine;
mod jitter;
mod refresh;

pub use engine::{ApyEngine, ApySnapshot, RealtimeConfig};
pub use jitter::{
    FixedJitter, JitterError, JitterSource, SeededJitter, UniformJitter, DEFAULT_JITTER_MAX,
    DEFAULT_JITTER_MIN,
};
pub use refresh::{spawn_refresh, RefreshHandle};
