//! polynomials over GF(256) for shamir sharing
//!
//! coefficients are secret material: they are wiped when the polynomial is
//! dropped and never leave this type except by reference.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::gf256::{add, div, mult};
use crate::rng::RandomSource;
use crate::Result;

/// `f(x) = c[0] + c[1]·x + … + c[d]·x^d`
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Polynomial {
    coefficients: Vec<u8>,
}

impl Polynomial {
    /// polynomial of the given degree with a fixed intercept and uniformly
    /// random higher coefficients
    pub fn random(intercept: u8, degree: u8, rng: &dyn RandomSource) -> Result<Self> {
        let mut coefficients = vec![0u8; degree as usize + 1];
        coefficients[0] = intercept;
        if let Err(e) = rng.fill(&mut coefficients[1..]) {
            coefficients.zeroize();
            return Err(e);
        }
        Ok(Self { coefficients })
    }

    pub fn from_coefficients(coefficients: Vec<u8>) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[u8] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// evaluate with horner's method
    pub fn evaluate(&self, x: u8) -> u8 {
        let mut acc = 0u8;
        for &c in self.coefficients.iter().rev() {
            acc = add(mult(acc, x), c);
        }
        acc
    }
}

/// lagrange interpolation of the points `(xs[i], ys[i])`, evaluated at `x`
///
/// the x samples must be pairwise distinct; a repeated sample divides by
/// zero and panics. `combine` checks for duplicates before calling this.
pub fn interpolate(xs: &[u8], ys: &[u8], x: u8) -> u8 {
    debug_assert_eq!(xs.len(), ys.len());

    let mut result = 0u8;
    for (i, (&xi, &yi)) in xs.iter().zip(ys).enumerate() {
        let mut basis = 1u8;
        for (j, &xj) in xs.iter().enumerate() {
            if i == j {
                continue;
            }
            // (x - xj) / (xi - xj), subtraction is xor
            let num = add(x, xj);
            let den = add(xi, xj);
            basis = mult(basis, div(num, den));
        }
        result = add(result, mult(yi, basis));
    }
    result
}
