//! Window summation shared by every evaluator.

use ringstencil_core::{Element, Window};

/// Mean of the `W::TOTAL_RANGE` samples produced by `sample(k, j)`, where
/// `k` runs over `0..W::RANGE_X` (columns) and `j` over `0..W::RANGE_Y`
/// (rows).
///
/// Samples are accumulated in the row-major order of the unswapped window.
/// Every evaluator funnels through here, so floating point results are
/// bit-identical across strategies, including column sweeps over a
/// [`Transposed`](ringstencil_core::shape::Transposed) window.
#[inline(always)]
pub fn window_average<T, W>(mut sample: impl FnMut(usize, usize) -> T) -> T
where
    T: Element,
    W: Window,
{
    let mut sum = T::zero();
    if W::SWAPPED {
        for k in 0..W::RANGE_X {
            for j in 0..W::RANGE_Y {
                sum = sum.add(sample(k, j));
            }
        }
    } else {
        for j in 0..W::RANGE_Y {
            for k in 0..W::RANGE_X {
                sum = sum.add(sample(k, j));
            }
        }
    }
    sum.div_count(W::TOTAL_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringstencil_core::shape::{Rect, Transposed};

    #[test]
    fn test_average_of_ramp() {
        type W = Rect<-1, -1, 1, 1>;
        let avg = window_average::<i32, W>(|k, j| (j * 3 + k) as i32);
        assert_eq!(avg, 36 / 9);
    }

    #[test]
    fn test_visit_order_follows_unswapped_rows() {
        type W = Rect<0, 0, 2, 1>;
        let mut seen = Vec::new();
        window_average::<i64, W>(|k, j| {
            seen.push((k, j));
            0
        });
        assert_eq!(seen, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);

        // Swapped: kernel column k is an original row.
        let mut swapped = Vec::new();
        window_average::<i64, Transposed<W>>(|k, j| {
            swapped.push((j, k));
            0
        });
        assert_eq!(swapped, seen);
    }

    #[test]
    fn test_identity_window_is_exact() {
        type W = Rect<0, 0, 0, 0>;
        assert_eq!(window_average::<f32, W>(|_, _| 0.1f32), 0.1f32);
    }
}
