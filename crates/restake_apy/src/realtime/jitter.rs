//! Multiplicative market-variation sources for the simulated realtime APY.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use thiserror::Error;

pub const DEFAULT_JITTER_MIN: f64 = 0.95;
pub const DEFAULT_JITTER_MAX: f64 = 1.05;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JitterError {
    #[error("invalid jitter bounds: [{min}, {max}]")]
    InvalidBounds { min: f64, max: f64 },
    #[error("jitter source state poisoned")]
    Poisoned,
    #[error("jitter factor not usable: {0}")]
    BadFactor(f64),
    #[error("jitter source: {0}")]
    Source(String),
}

/// Source of one multiplicative factor per realtime APY call.
pub trait JitterSource: Send + Sync {
    fn sample(&self) -> Result<f64, JitterError>;
}

fn check_bounds(min: f64, max: f64) -> Result<(), JitterError> {
    if min.is_finite() && max.is_finite() && min > 0.0 && min <= max {
        Ok(())
    } else {
        Err(JitterError::InvalidBounds { min, max })
    }
}

/// Uniform on `[min, max]` from the thread-local RNG.
#[derive(Clone, Copy, Debug)]
pub struct UniformJitter {
    min: f64,
    max: f64,
}

impl UniformJitter {
    pub fn new(min: f64, max: f64) -> Result<Self, JitterError> {
        check_bounds(min, max)?;
        Ok(Self { min, max })
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self {
            min: DEFAULT_JITTER_MIN,
            max: DEFAULT_JITTER_MAX,
        }
    }
}

impl JitterSource for UniformJitter {
    fn sample(&self) -> Result<f64, JitterError> {
        Ok(rand::thread_rng().gen_range(self.min..=self.max))
    }
}

/// Uniform on `[min, max]` from a seeded RNG; reproducible sequence across runs.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
    min: f64,
    max: f64,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            min: DEFAULT_JITTER_MIN,
            max: DEFAULT_JITTER_MAX,
        }
    }

    pub fn with_bounds(seed: u64, min: f64, max: f64) -> Result<Self, JitterError> {
        check_bounds(min, max)?;
        Ok(Self {
            min,
            max,
            ..Self::new(seed)
        })
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> Result<f64, JitterError> {
        let mut rng = self.rng.lock().map_err(|_| JitterError::Poisoned)?;
        Ok(rng.gen_range(self.min..=self.max))
    }
}

/// Always the same factor. `FixedJitter(1.0)` reproduces the static APY.
#[derive(Clone, Copy, Debug)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&self) -> Result<f64, JitterError> {
        Ok(self.0)
    }
}
