//! Boundary and addressing primitives.
//!
//! All functions here are total over their integer domains.

/// Clamp a coordinate to `[0, max_index]`.
///
/// This is the only boundary policy: out-of-range neighbors take the value of
/// the nearest edge sample, independently per axis.
#[inline(always)]
pub const fn clamp(coord: i64, max_index: i64) -> i64 {
    if coord < 0 {
        0
    } else if coord > max_index {
        max_index
    } else {
        coord
    }
}

/// Row-major flat index.
#[inline(always)]
pub const fn flat_index(x: i64, y: i64, width: i64) -> i64 {
    y * width + x
}

/// Ceiling division for non-negative operands.
#[inline(always)]
pub const fn div_up(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}

/// Smallest power of two that is `>= n` (`1` for `n == 0`).
#[inline]
pub const fn next_pow2(n: usize) -> usize {
    n.next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-3, 4), 0);
        assert_eq!(clamp(0, 4), 0);
        assert_eq!(clamp(2, 4), 2);
        assert_eq!(clamp(4, 4), 4);
        assert_eq!(clamp(9, 4), 4);
        assert_eq!(clamp(i64::MIN, 0), 0);
        assert_eq!(clamp(i64::MAX, 0), 0);
    }

    #[test]
    fn test_flat_index() {
        assert_eq!(flat_index(3, 2, 5), 13);
        assert_eq!(flat_index(0, 0, 5), 0);
    }

    #[test]
    fn test_div_up() {
        assert_eq!(div_up(10, 5), 2);
        assert_eq!(div_up(11, 5), 3);
        assert_eq!(div_up(0, 5), 0);
    }

    #[test]
    fn test_next_pow2() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(5), 8);
        assert_eq!(next_pow2(8), 8);
        assert_eq!(next_pow2(9), 16);
    }
}
