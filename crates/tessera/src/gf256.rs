//! arithmetic in GF(2^8) with the AES polynomial (x^8 + x^4 + x^3 + x + 1)
//!
//! multiplication and division go through log/exp tables over the
//! generator 0x03. the tables are computed by a `const fn`, so they are
//! baked into the binary and shared read-only by every thread.

/// number of nonzero field elements, the order of the multiplicative group
pub const ORDER: usize = 255;

struct Tables {
    log: [u8; 256],
    exp: [u8; ORDER],
}

const fn build_tables() -> Tables {
    let mut log = [0u8; 256];
    let mut exp = [0u8; ORDER];

    let mut x: u8 = 1;
    let mut i = 0;
    while i < ORDER {
        exp[i] = x;
        log[x as usize] = i as u8;

        // x * 3 = x ^ xtime(x)
        let mut doubled = x << 1;
        if x & 0x80 != 0 {
            doubled ^= 0x1b;
        }
        x ^= doubled;
        i += 1;
    }

    Tables { log, exp }
}

static TABLES: Tables = build_tables();

/// discrete logarithms base 0x03; entry 0 is unused and holds 0
pub fn log_table() -> &'static [u8; 256] {
    &TABLES.log
}

/// powers of 0x03, `exp_table()[i] = 3^i`
pub fn exp_table() -> &'static [u8; ORDER] {
    &TABLES.exp
}

/// field addition, which is also subtraction
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

#[inline]
pub fn mult(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let sum = TABLES.log[a as usize] as usize + TABLES.log[b as usize] as usize;
    TABLES.exp[sum % ORDER]
}

/// field division
///
/// # Panics
///
/// panics when `b` is zero. callers validate their inputs so this only
/// fires on a programming error.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    assert!(b != 0, "division by zero in GF(256)");
    if a == 0 {
        return 0;
    }
    let diff = TABLES.log[a as usize] as usize + ORDER - TABLES.log[b as usize] as usize;
    TABLES.exp[diff % ORDER]
}

/// multiplicative inverse, `None` for zero
pub fn inverse(a: u8) -> Option<u8> {
    (a != 0).then(|| div(1, a))
}
