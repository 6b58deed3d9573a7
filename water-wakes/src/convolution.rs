//! Kernel convolution of the height field.
//!
//! Every output cell reads a `(2P+1)²` window of heights, so the result is
//! written into a separate buffer. Window offsets that leave the grid on a
//! single axis are mirrored back across the nearest edge:
//!
//! ```text
//! idx >= N  ->  2N - idx - 1
//! idx <  0  ->  -idx
//! ```
//!
//! Offsets that leave the grid on both axes at once are handled by
//! [`CornerPolicy`].

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::kernel::KernelTable;

/// Treatment of window offsets outside the grid on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerPolicy {
    /// Such offsets contribute nothing. Near the grid corners this
    /// under-counts the kernel mass.
    #[default]
    Drop,
    /// Reflect both axes independently.
    Mirror,
}

/// Mirror `idx` into `0..n`, or `None` if one reflection is not enough.
#[inline]
fn reflect(idx: isize, n: isize) -> Option<usize> {
    let mirrored = if idx >= n {
        2 * n - idx - 1
    } else if idx < 0 {
        -idx
    } else {
        idx
    };
    (0..n).contains(&mirrored).then_some(mirrored as usize)
}

/// Source cell for window position `(row, col)`, which may lie off the grid.
#[inline]
fn resolve(row: isize, col: isize, n: isize, policy: CornerPolicy) -> Option<(usize, usize)> {
    let row_inside = (0..n).contains(&row);
    let col_inside = (0..n).contains(&col);
    match (row_inside, col_inside) {
        (true, true) => Some((row as usize, col as usize)),
        (false, true) => reflect(row, n).map(|r| (r, col as usize)),
        (true, false) => reflect(col, n).map(|c| (row as usize, c)),
        (false, false) => match policy {
            CornerPolicy::Drop => None,
            CornerPolicy::Mirror => Some((reflect(row, n)?, reflect(col, n)?)),
        },
    }
}

/// Weighted window sum centred on `(j, i)`.
#[inline]
fn convolve_cell(
    height: &Array2<f64>,
    kernel: &KernelTable,
    policy: CornerPolicy,
    j: usize,
    i: usize,
) -> f64 {
    let n = height.nrows() as isize;
    let p = kernel.radius() as isize;
    let weights = kernel.weights();

    let mut sum = 0.0;
    for k in -p..=p {
        for l in -p..=p {
            let row = j as isize + k;
            let col = i as isize + l;
            if let Some(cell) = resolve(row, col, n, policy) {
                sum += weights[[(k + p) as usize, (l + p) as usize]] * height[cell];
            }
        }
    }
    sum
}

/// Fill `out` with the kernel convolution of `height`.
///
/// # Panics
/// If `height` is not square or `out` has a different shape.
pub fn convolve(
    height: &Array2<f64>,
    kernel: &KernelTable,
    policy: CornerPolicy,
    out: &mut Array2<f64>,
) {
    assert_eq!(height.nrows(), height.ncols(), "height field must be square");
    assert_eq!(height.dim(), out.dim(), "output buffer shape mismatch");

    for ((j, i), value) in out.indexed_iter_mut() {
        *value = convolve_cell(height, kernel, policy, j, i);
    }
}

/// Same as [`convolve`], with output cells computed across the rayon pool.
pub fn convolve_parallel(
    height: &Array2<f64>,
    kernel: &KernelTable,
    policy: CornerPolicy,
    out: &mut Array2<f64>,
) {
    assert_eq!(height.nrows(), height.ncols(), "height field must be square");
    assert_eq!(height.dim(), out.dim(), "output buffer shape mismatch");

    Zip::indexed(out).par_for_each(|(j, i), value| {
        *value = convolve_cell(height, kernel, policy, j, i);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::DEFAULT_SIGMA;
    use approx::assert_relative_eq;

    fn ones(n: usize) -> Array2<f64> {
        Array2::from_elem((n, n), 1.0)
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(3, 5), Some(3));
        assert_eq!(reflect(5, 5), Some(4));
        assert_eq!(reflect(6, 5), Some(3));
        assert_eq!(reflect(-1, 5), Some(1));
        assert_eq!(reflect(-4, 5), Some(4));
        assert_eq!(reflect(-5, 5), None);
        assert_eq!(reflect(10, 5), None);
    }

    #[test]
    fn test_interior_sees_full_mass() {
        let kernel = KernelTable::build(1, DEFAULT_SIGMA).unwrap();
        let mut out = Array2::zeros((5, 5));
        convolve(&ones(5), &kernel, CornerPolicy::Drop, &mut out);
        assert_relative_eq!(out[[2, 2]], kernel.mass(), epsilon = 1e-12);
        // Edge cells, one axis out: every offset is mirrored back in
        assert_relative_eq!(out[[0, 2]], kernel.mass(), epsilon = 1e-12);
    }

    #[test]
    fn test_corner_drop_undercounts() {
        let kernel = KernelTable::build(1, DEFAULT_SIGMA).unwrap();
        let mut out = Array2::zeros((5, 5));
        convolve(&ones(5), &kernel, CornerPolicy::Drop, &mut out);

        // At (0, 0) only offset (-1, -1) leaves the grid on both axes
        let expected = kernel.mass() - kernel.weight(-1, -1);
        assert_relative_eq!(out[[0, 0]], expected, epsilon = 1e-12);
        assert_relative_eq!(out[[4, 4]], kernel.mass() - kernel.weight(1, 1), epsilon = 1e-12);
    }

    #[test]
    fn test_corner_mirror_keeps_mass() {
        let kernel = KernelTable::build(1, DEFAULT_SIGMA).unwrap();
        let mut out = Array2::zeros((5, 5));
        convolve(&ones(5), &kernel, CornerPolicy::Mirror, &mut out);
        for &value in out.iter() {
            assert_relative_eq!(value, kernel.mass(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_impulse_spreads_kernel() {
        let kernel = KernelTable::build(2, DEFAULT_SIGMA).unwrap();
        let mut height = Array2::zeros((9, 9));
        height[[4, 4]] = 1.0;
        let mut out = Array2::zeros((9, 9));
        convolve(&height, &kernel, CornerPolicy::Drop, &mut out);

        for k in -2..=2_isize {
            for l in -2..=2_isize {
                let cell = [(4 + k) as usize, (4 + l) as usize];
                assert_eq!(out[cell], kernel.weight(-k, -l));
            }
        }
        assert_eq!(out[[0, 0]], 0.0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let kernel = KernelTable::build(3, DEFAULT_SIGMA).unwrap();
        let height = Array2::from_shape_fn((12, 12), |(j, i)| ((j * 7 + i * 3) % 5) as f64 - 2.0);

        for policy in [CornerPolicy::Drop, CornerPolicy::Mirror] {
            let mut serial = Array2::zeros((12, 12));
            let mut parallel = Array2::zeros((12, 12));
            convolve(&height, &kernel, policy, &mut serial);
            convolve_parallel(&height, &kernel, policy, &mut parallel);
            assert_eq!(serial, parallel);
        }
    }
}
