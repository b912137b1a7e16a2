//! Report fingerprinting and verification.

mod fingerprint;

pub use fingerprint::{
    canonical_json, snapshot_hash, verify_snapshot, VerificationResult, VerifyError,
};
