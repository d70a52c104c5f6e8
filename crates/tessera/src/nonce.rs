//! anti-replay nonces for signed requests
//!
//! each nonce is 21 random bytes, base64url without padding, valid for a
//! fixed window (15 minutes unless configured) and redeemable once. the
//! store is in-memory only and does not survive restart.
//!
//! expired entries are dropped on redemption and by `tidy_if_due`, which
//! only sweeps once the advisory next-expiry hint has passed. the map is
//! split into shards so a sweep never holds one lock across the whole set.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use base64::Engine;
use parking_lot::Mutex;
use tracing::debug;

use crate::clock::{unix_millis, Clock, SystemClock};
use crate::config::NonceConfig;
use crate::rng::{os_random, SharedRandom};
use crate::Result;

/// random bytes per nonce (168 bits)
pub const NONCE_BYTES: usize = 21;

/// independent locks the map is spread across
const SHARDS: usize = 16;

type Shard = Mutex<HashMap<String, SystemTime>>;

pub struct NonceStore {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    rng: SharedRandom,
    shards: Box<[Shard]>,
    /// unix millis of the earliest known expiry, 0 when unknown
    next_expiry: AtomicU64,
}

impl NonceStore {
    /// store with the default 15 minute window
    pub fn new() -> Self {
        Self::with_parts(NonceConfig::default(), Arc::new(SystemClock), os_random())
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_parts(NonceConfig { ttl }, Arc::new(SystemClock), os_random())
    }

    /// fully injected constructor for hosts and tests
    pub fn with_parts(config: NonceConfig, clock: Arc<dyn Clock>, rng: SharedRandom) -> Self {
        let shards = (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            ttl: config.ttl,
            clock,
            rng,
            shards,
            next_expiry: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// issue a fresh nonce and its expiry
    pub fn issue(&self) -> Result<(String, SystemTime)> {
        let mut raw = [0u8; NONCE_BYTES];
        self.rng.fill(&mut raw)?;
        let nonce = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw);

        let now = self.clock.now();
        let expiry = now + self.ttl;
        self.shard(&nonce).lock().insert(nonce.clone(), expiry);

        let now_ms = unix_millis(now);
        let expiry_ms = unix_millis(expiry);
        let _ = self
            .next_expiry
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |hint| {
                (hint == 0 || hint < now_ms || expiry_ms < hint).then_some(expiry_ms)
            });

        Ok((nonce, expiry))
    }

    /// consume `nonce`; true only for a known nonce that has not expired
    ///
    /// the entry is removed either way, so a nonce never redeems twice.
    pub fn redeem(&self, nonce: &str) -> bool {
        let Some(expiry) = self.shard(nonce).lock().remove(nonce) else {
            return false;
        };
        self.clock.now() <= expiry
    }

    /// sweep expired nonces if the next-expiry hint has passed
    ///
    /// returns whether a sweep ran.
    pub fn tidy_if_due(&self) -> bool {
        let hint = self.next_expiry.load(Ordering::Acquire);
        if hint != 0 && unix_millis(self.clock.now()) <= hint {
            return false;
        }
        self.tidy();
        true
    }

    /// unconditional sweep, one shard at a time
    pub fn tidy(&self) {
        let now = self.clock.now();
        let mut next_run = now + self.ttl;
        let mut removed = 0usize;

        for shard in self.shards.iter() {
            let mut map = shard.lock();
            let before = map.len();
            map.retain(|_, expiry| {
                if *expiry < now {
                    return false;
                }
                if *expiry < next_run {
                    next_run = *expiry;
                }
                true
            });
            removed += before - map.len();
        }

        self.next_expiry
            .store(unix_millis(next_run), Ordering::Release);
        if removed > 0 {
            debug!("tidied {} expired nonces", removed);
        }
    }

    /// run `tidy_if_due` every `every` on a background thread
    pub fn spawn_tidy(self: &Arc<Self>, every: Duration) -> TidyHandle {
        let store = Arc::clone(self);
        let (stop, ticks) = mpsc::channel::<()>();
        let thread = thread::spawn(move || loop {
            match ticks.recv_timeout(every) {
                Err(RecvTimeoutError::Timeout) => {
                    store.tidy_if_due();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        TidyHandle {
            stop: Some(stop),
            thread: Some(thread),
        }
    }

    /// outstanding nonces, expired ones included until swept
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.lock().is_empty())
    }

    fn shard(&self, nonce: &str) -> &Shard {
        let mut h = DefaultHasher::new();
        nonce.hash(&mut h);
        &self.shards[h.finish() as usize % SHARDS]
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// background tidy thread, stopped on `stop()` or drop
pub struct TidyHandle {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TidyHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for TidyHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
