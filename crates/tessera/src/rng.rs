//! secure randomness shared by shamir and the nonce store
//!
//! everything that needs entropy takes a [`RandomSource`] so tests can
//! inject a seeded chacha20 generator instead of the os source.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rand::{rngs::OsRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::{Error, Result};

/// a cryptographic byte source
pub trait RandomSource: Send + Sync {
    /// fill `dest` entirely or fail with `RandomnessUnavailable`
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// shared handle to a random source
pub type SharedRandom = Arc<dyn RandomSource>;

/// operating system entropy (getrandom)
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::RandomnessUnavailable(e.to_string()))
    }
}

/// deterministic chacha20 stream for tests and reproducible fixtures
pub struct SeededRandom {
    inner: Mutex<ChaCha20Rng>,
}

impl SeededRandom {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: Mutex::new(ChaCha20Rng::from_seed(seed)),
        }
    }

    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        self.inner
            .lock()
            .try_fill_bytes(dest)
            .map_err(|e| Error::RandomnessUnavailable(e.to_string()))
    }
}

/// process-wide os random handle
pub fn os_random() -> SharedRandom {
    static SHARED: OnceLock<SharedRandom> = OnceLock::new();
    SHARED
        .get_or_init(|| Arc::new(OsRandom) as SharedRandom)
        .clone()
}

/// uniform integer in `[0, bound)` by rejection sampling on single bytes
///
/// `bound` must be in `1..=256`.
pub fn random_below(rng: &dyn RandomSource, bound: usize) -> Result<usize> {
    debug_assert!((1..=256).contains(&bound));
    if bound == 256 {
        let mut b = [0u8; 1];
        rng.fill(&mut b)?;
        return Ok(b[0] as usize);
    }

    // largest multiple of bound that fits in a byte
    let limit = 256 - (256 % bound);
    let mut b = [0u8; 1];
    loop {
        rng.fill(&mut b)?;
        let v = b[0] as usize;
        if v < limit {
            return Ok(v % bound);
        }
    }
}

/// `n` random bytes as lowercase hex
pub fn random_hex(rng: &dyn RandomSource, n: usize) -> Result<String> {
    let mut bytes = vec![0u8; n];
    rng.fill(&mut bytes)?;
    Ok(hex::encode(bytes))
}
