//! Bit-twiddling primitives used throughout move generation and the magic
//! tables. Kept free of any board-specific knowledge so it can be unit
//! tested (and benchmarked) in isolation.

use std::sync::atomic::{AtomicU8, Ordering};

/// Which implementation `popcount` currently dispatches to. Chosen once at
/// first use and cached; queryable so callers/tests can confirm the
/// hardware path was actually taken.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PopcountBackend {
    /// `u64::count_ones`, which LLVM lowers to the hardware `POPCNT`
    /// instruction whenever the target feature is available.
    Hardware,
    /// The classic SWAR bit-parallel fallback, used when we want a
    /// branch-free implementation without relying on codegen.
    Swar,
}

const UNSET: u8 = 0;
const HARDWARE: u8 = 1;
const SWAR: u8 = 2;

static BACKEND: AtomicU8 = AtomicU8::new(UNSET);

fn detect_backend() -> PopcountBackend {
    if cfg!(target_feature = "popcnt") {
        PopcountBackend::Hardware
    } else {
        PopcountBackend::Swar
    }
}

/// Returns the backend `popcount` is currently using, initializing the
/// detection on first call.
pub fn popcount_backend() -> PopcountBackend {
    match BACKEND.load(Ordering::Relaxed) {
        HARDWARE => PopcountBackend::Hardware,
        SWAR => PopcountBackend::Swar,
        _ => {
            let backend = detect_backend();
            let tag = match backend {
                PopcountBackend::Hardware => HARDWARE,
                PopcountBackend::Swar => SWAR,
            };
            BACKEND.store(tag, Ordering::Relaxed);
            backend
        }
    }
}

/// Counts the number of set bits in `x`.
///
/// ```
/// use chesscore::bits::popcount;
/// assert_eq!(popcount(0b1001), 2);
/// assert_eq!(popcount(0xFFFF_FFFF_FFFF_FFFF), 64);
/// assert_eq!(popcount(0), 0);
/// ```
#[inline]
pub fn popcount(x: u64) -> u32 {
    match popcount_backend() {
        PopcountBackend::Hardware => x.count_ones(),
        PopcountBackend::Swar => popcount_swar(x),
    }
}

/// The SWAR (SIMD-within-a-register) popcount identity, used as a fallback
/// when hardware `popcnt` isn't available.
#[inline]
pub fn popcount_swar(mut x: u64) -> u32 {
    const M1: u64 = 0x5555_5555_5555_5555;
    const M2: u64 = 0x3333_3333_3333_3333;
    const M4: u64 = 0x0f0f_0f0f_0f0f_0f0f;
    const H01: u64 = 0x0101_0101_0101_0101;

    x -= (x >> 1) & M1;
    x = (x & M2) + ((x >> 2) & M2);
    x = (x + (x >> 4)) & M4;
    ((x.wrapping_mul(H01)) >> 56) as u32
}

/// Index (0..63) of the least significant set bit. Undefined for `x == 0`.
///
/// ```
/// use chesscore::bits::lsb;
/// assert_eq!(lsb(0x80), 7);
/// ```
#[inline]
pub fn lsb(x: u64) -> u32 {
    debug_assert_ne!(x, 0, "lsb of zero is undefined");
    x.trailing_zeros()
}

/// Index of the most significant set bit. Undefined for `x == 0`.
#[inline]
pub fn msb(x: u64) -> u32 {
    debug_assert_ne!(x, 0, "msb of zero is undefined");
    63 - x.leading_zeros()
}

/// Isolates and clears the least significant bit of `*x`, returning
/// `(bit_index, isolated_bit_mask)`. Undefined for `*x == 0`.
///
/// ```
/// use chesscore::bits::lsb_pop;
/// let mut bb = 0b1010u64;
/// let (idx, bit) = lsb_pop(&mut bb);
/// assert_eq!(idx, 1);
/// assert_eq!(bit, 0b10);
/// assert_eq!(bb, 0b1000);
/// ```
#[inline]
pub fn lsb_pop(x: &mut u64) -> (u32, u64) {
    debug_assert_ne!(*x, 0, "lsb_pop of zero is undefined");
    let bit = *x & x.wrapping_neg();
    let idx = bit.trailing_zeros();
    *x &= *x - 1;
    (idx, bit)
}

/// `true` iff `x` has more than one bit set. Cheaper than `popcount(x) > 1`.
#[inline]
pub fn more_than_one(x: u64) -> bool {
    (x & x.wrapping_sub(1)) != 0
}

/// Byte-swap a 16-bit value.
#[inline]
pub fn bswap16(x: u16) -> u16 {
    x.swap_bytes()
}

/// Byte-swap a 32-bit value.
#[inline]
pub fn bswap32(x: u32) -> u32 {
    x.swap_bytes()
}

/// Byte-swap a 64-bit value.
///
/// ```
/// use chesscore::bits::bswap64;
/// assert_eq!(bswap64(0x0102030405060708), 0x0807060504030201);
/// ```
#[inline]
pub fn bswap64(x: u64) -> u64 {
    x.swap_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popcount_matches_swar_and_hardware() {
        for x in [0u64, 1, 2, 3, 0xFFFF_FFFF_FFFF_FFFF, 0x5555_5555, 0xDEAD_BEEF_u64] {
            assert_eq!(popcount(x), x.count_ones());
            assert_eq!(popcount_swar(x), x.count_ones());
        }
    }

    #[test]
    fn lsb_and_msb() {
        assert_eq!(lsb(0x80), 7);
        assert_eq!(msb(0x80), 7);
        assert_eq!(lsb(0b10100), 2);
        assert_eq!(msb(0b10100), 4);
    }

    #[test]
    fn lsb_pop_clears_bit() {
        let mut bb = 0b1100u64;
        let (idx, bit) = lsb_pop(&mut bb);
        assert_eq!(idx, 2);
        assert_eq!(bit, 0b100);
        assert_eq!(bb, 0b1000);
    }

    #[test]
    fn more_than_one_t() {
        assert!(!more_than_one(0));
        assert!(!more_than_one(1));
        assert!(more_than_one(3));
    }

    #[test]
    fn bswap_t() {
        assert_eq!(bswap64(0x0102030405060708), 0x0807060504030201);
        assert_eq!(bswap32(0x01020304), 0x04030201);
        assert_eq!(bswap16(0x0102), 0x0201);
    }
}
