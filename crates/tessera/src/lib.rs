//! # tessera
//!
//! durable trust primitives for a secret-management agent.
//!
//! three independent pieces, composed only at the edge by the host process:
//!
//! ```text
//!   secret ──split──▶ [share₁ … shareₙ]      (shamir over GF(256))
//!   [shareᵢ …]──combine──▶ secret            (any k of n)
//!
//!   token ──▶ <dir>/<name>.tmp.<rand> ──rename──▶ <dir>/<name>
//!                                               (atomic sink)
//!
//!   issue() ──▶ (nonce, expiry)    redeem(nonce) ──▶ true once, then false
//!                                               (nonce store)
//! ```
//!
//! ## security properties
//!
//! - any `threshold - 1` shares are independent of the secret
//! - polynomial coefficients are zeroized before `split` returns
//! - readers of a sink path see the old token or the new one, never a torn write
//! - a nonce redeems successfully at most once, and never after its expiry
//!
//! ## usage
//!
//! ```rust,no_run
//! use tessera::{shamir, NonceStore, FileSink, SinkConfig};
//!
//! let shares = shamir::split(b"master key", 5, 3)?;
//! let secret = shamir::combine(&shares[..3])?;
//! assert_eq!(secret, b"master key");
//!
//! let sink = FileSink::new(SinkConfig::new("/run/agent/token", 0o640))?;
//! sink.write_token(b"s.token")?;
//!
//! let nonces = NonceStore::new();
//! let (nonce, _expiry) = nonces.issue()?;
//! assert!(nonces.redeem(&nonce));
//! # Ok::<(), tessera::Error>(())
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod gf256;
pub mod nonce;
pub mod polynomial;
pub mod rng;
pub mod shamir;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{NonceConfig, ShamirConfig, SinkConfig};
pub use error::{Error, Result};
pub use nonce::{NonceStore, TidyHandle};
pub use polynomial::Polynomial;
pub use rng::{os_random, OsRandom, RandomSource, SeededRandom, SharedRandom};
pub use shamir::{combine, split, split_with};
pub use sink::{write, FileSink, SinkJob};
