//! CAV Sim: simulated result providers
//!
//! Stand-ins for real detection and chain submission. Every random draw
//! happens once inside `generate`; the returned result is never recomputed.

pub mod hashing;
pub mod registrar;
pub mod verifier;

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use hashing::content_hash;
pub use registrar::SimulatedRegistrar;
pub use verifier::SimulatedVerifier;

/// Seedable random source shared by the simulated providers.
pub(crate) struct SimRng(Mutex<StdRng>);

impl SimRng {
    pub(crate) fn from_entropy() -> Self {
        Self(Mutex::new(StdRng::from_entropy()))
    }

    pub(crate) fn seeded(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
