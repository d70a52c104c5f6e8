//! shamir secret sharing over GF(256)
//!
//! a secret of `L` bytes becomes `parts` shares of `L + 1` bytes. every
//! secret byte gets its own random polynomial of degree `threshold - 1`
//! whose intercept is that byte; share `s` holds the evaluations at a
//! distinct nonzero `x_s`, with `x_s` appended as the final byte.
//!
//! ```text
//! share = [ f_0(x) | f_1(x) | … | f_{L-1}(x) | x ]
//! ```
//!
//! shares carry no version byte or mac. any `threshold` of them recover the
//! secret, fewer are statistically independent of it.

use base64::Engine;
use zeroize::Zeroize;

use crate::polynomial::{interpolate, Polynomial};
use crate::rng::{os_random, random_below, RandomSource};
use crate::{Error, Result};

/// most shares a secret can be split into, one per nonzero field element
pub const MAX_PARTS: usize = 255;

/// fewest shares that make a meaningful threshold
pub const MIN_THRESHOLD: usize = 2;

/// split `secret` into `parts` shares, any `threshold` of which recover it,
/// drawing randomness from the operating system
pub fn split(secret: &[u8], parts: usize, threshold: usize) -> Result<Vec<Vec<u8>>> {
    split_with(&*os_random(), secret, parts, threshold)
}

/// [`split`] with an injected random source
pub fn split_with(
    rng: &dyn RandomSource,
    secret: &[u8],
    parts: usize,
    threshold: usize,
) -> Result<Vec<Vec<u8>>> {
    validate_split(secret, parts, threshold)?;

    let x_coordinates = distinct_x_coordinates(rng, parts)?;

    let len = secret.len();
    let mut shares: Vec<Vec<u8>> = x_coordinates
        .iter()
        .map(|&x| {
            let mut share = vec![0u8; len + 1];
            share[len] = x;
            share
        })
        .collect();

    let degree = (threshold - 1) as u8;
    for (idx, &byte) in secret.iter().enumerate() {
        // dropped (and zeroized) at the end of every iteration
        let poly = match Polynomial::random(byte, degree, rng) {
            Ok(poly) => poly,
            Err(e) => {
                shares.iter_mut().for_each(|s| s.zeroize());
                return Err(e);
            }
        };

        for (share, &x) in shares.iter_mut().zip(&x_coordinates) {
            share[idx] = poly.evaluate(x);
        }
    }

    Ok(shares)
}

fn validate_split(secret: &[u8], parts: usize, threshold: usize) -> Result<()> {
    if parts < threshold {
        return Err(Error::invalid(format!(
            "parts ({parts}) cannot be less than threshold ({threshold})"
        )));
    }
    if parts > MAX_PARTS {
        return Err(Error::invalid(format!(
            "parts ({parts}) cannot exceed {MAX_PARTS}"
        )));
    }
    if threshold < MIN_THRESHOLD {
        return Err(Error::invalid(format!(
            "threshold ({threshold}) must be at least {MIN_THRESHOLD}"
        )));
    }
    if secret.is_empty() {
        return Err(Error::invalid("cannot split an empty secret"));
    }
    Ok(())
}

/// `count` distinct nonzero bytes, uniformly at random without replacement
fn distinct_x_coordinates(rng: &dyn RandomSource, count: usize) -> Result<Vec<u8>> {
    // partial fisher-yates over 1..=255
    let mut pool: Vec<u8> = (1..=255u8).collect();
    for i in 0..count {
        let j = i + random_below(rng, pool.len() - i)?;
        pool.swap(i, j);
    }
    pool.truncate(count);
    Ok(pool)
}

/// recover the secret from a set of shares
///
/// the shares must all have the same length (at least 2 bytes) and carry
/// distinct x-coordinates. passing fewer than the split threshold
/// yields garbage rather than an error: shares are not self-describing.
pub fn combine<S: AsRef<[u8]>>(shares: &[S]) -> Result<Vec<u8>> {
    if shares.len() < 2 {
        return Err(Error::NotEnoughShares { have: shares.len() });
    }

    let share_len = shares[0].as_ref().len();
    for share in shares.iter().skip(1) {
        let got = share.as_ref().len();
        if got != share_len {
            return Err(Error::ShareLengthMismatch {
                expected: share_len,
                got,
            });
        }
    }
    if share_len < 2 {
        return Err(Error::ShareTooShort { len: share_len });
    }

    let secret_len = share_len - 1;

    let mut seen = [false; 256];
    let mut xs = Vec::with_capacity(shares.len());
    for share in shares {
        let x = share.as_ref()[secret_len];
        if x == 0 {
            return Err(Error::invalid("share x-coordinate must be nonzero"));
        }
        if seen[x as usize] {
            return Err(Error::DuplicateShare { x });
        }
        seen[x as usize] = true;
        xs.push(x);
    }

    let mut secret = vec![0u8; secret_len];
    let mut ys = vec![0u8; shares.len()];
    for (idx, out) in secret.iter_mut().enumerate() {
        for (y, share) in ys.iter_mut().zip(shares) {
            *y = share.as_ref()[idx];
        }
        *out = interpolate(&xs, &ys, 0);
    }
    ys.zeroize();

    Ok(secret)
}

/// x-coordinate of a well-formed share
pub fn share_x(share: &[u8]) -> Option<u8> {
    share.last().copied()
}

/// standard base64, the form shares are handed to operators in
pub fn encode_share(share: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(share)
}

pub fn decode_share(s: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s.trim())
        .map_err(|e| Error::invalid(format!("share is not valid base64: {e}")))
}
