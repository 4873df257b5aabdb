//! Numeric sample types.

/// A grid sample.
///
/// The average of a window is computed with the element's own arithmetic:
/// integral types truncate toward zero, floating point types divide exactly.
/// Sums wrap on overflow for integral types, matching device arithmetic.
///
/// Every element has a lossless 64-bit encoding so that shared scratch and
/// output cells can be stored in atomics and handed to many lanes at once.
pub trait Element: Copy + Send + Sync + PartialEq + std::fmt::Debug + 'static {
    /// Additive identity.
    fn zero() -> Self;

    /// Accumulate `other` into `self`.
    fn add(self, other: Self) -> Self;

    /// Divide by the number of samples in a window.
    fn div_count(self, count: usize) -> Self;

    /// Encode into 64 bits.
    fn to_bits(self) -> u64;

    /// Decode from [`Element::to_bits`].
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_int_element {
    ($($t:ty => $u:ty),* $(,)?) => {
        $(
            impl Element for $t {
                #[inline]
                fn zero() -> Self {
                    0
                }

                #[inline]
                fn add(self, other: Self) -> Self {
                    self.wrapping_add(other)
                }

                #[inline]
                fn div_count(self, count: usize) -> Self {
                    self / (count as $t)
                }

                #[inline]
                fn to_bits(self) -> u64 {
                    self as $u as u64
                }

                #[inline]
                fn from_bits(bits: u64) -> Self {
                    bits as $u as $t
                }
            }
        )*
    };
}

macro_rules! impl_float_element {
    ($($t:ty => $u:ty),* $(,)?) => {
        $(
            impl Element for $t {
                #[inline]
                fn zero() -> Self {
                    0.0
                }

                #[inline]
                fn add(self, other: Self) -> Self {
                    self + other
                }

                #[inline]
                fn div_count(self, count: usize) -> Self {
                    self / (count as $t)
                }

                #[inline]
                fn to_bits(self) -> u64 {
                    <$t>::to_bits(self) as u64
                }

                #[inline]
                fn from_bits(bits: u64) -> Self {
                    <$t>::from_bits(bits as $u)
                }
            }
        )*
    };
}

impl_int_element!(i32 => u32, i64 => u64, u32 => u32, u64 => u64);
impl_float_element!(f32 => u32, f64 => u64);
