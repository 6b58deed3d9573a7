//! Order-0 Bessel function of the first kind.
//!
//! Two polynomial regimes (Abramowitz & Stegun 9.4.1 and 9.4.3):
//!
//! ```text
//! |x| <= 3:  J0(x) ≈ Σ a_n (x/3)^(2n)
//! |x| >  3:  J0(x) ≈ f0(3/x) · cos(θ0(x)) / √x
//! ```
//!
//! The small-argument polynomial has an absolute error below 5e-8 and the
//! asymptotic form below 1.6e-8, which is far tighter than the kernel
//! quadrature that consumes it.

/// Branch point between the power series and the asymptotic form.
const BRANCH: f64 = 3.0;

const SERIES: [f64; 7] = [
    1.0,
    -2.249_999_7,
    1.265_620_8,
    -0.316_386_6,
    0.044_447_9,
    -0.003_944_4,
    0.000_210_0,
];

const MODULUS: [f64; 7] = [
    0.797_884_56,
    -0.000_000_77,
    -0.005_527_40,
    -0.000_095_12,
    0.001_372_37,
    -0.000_728_05,
    0.000_144_76,
];

const PHASE: [f64; 7] = [
    -0.785_398_16,
    -0.041_663_97,
    -0.000_039_54,
    0.002_625_73,
    -0.000_541_25,
    -0.000_293_33,
    0.000_135_58,
];

/// Horner evaluation of `c[0] + c[1] t + c[2] t² + ...`.
#[inline]
fn horner(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * t + c)
}

/// Approximate `J0(x)`.
///
/// Arguments at or below `-3` fall outside the range the asymptotic
/// coefficients were fitted on. They are logged and evaluated through the
/// same branch on `|x|`, since `J0` is even.
///
/// # Example
/// ```
/// use water_wakes::bessel::bessel_j0;
/// assert!((bessel_j0(0.0) - 1.0).abs() < 1e-6);
/// ```
pub fn bessel_j0(x: f64) -> f64 {
    if x <= -BRANCH {
        tracing::warn!(x, "bessel_j0 argument below asymptotic domain");
    }

    let ax = x.abs();
    if ax <= BRANCH {
        let y = (x / BRANCH).powi(2);
        return horner(&SERIES, y);
    }

    let z = BRANCH / ax;
    let f0 = horner(&MODULUS, z);
    let theta0 = ax + horner(&PHASE, z);
    f0 * theta0.cos() / ax.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_value_at_origin() {
        assert_abs_diff_eq!(bessel_j0(0.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_continuous_at_branch() {
        let below = bessel_j0(BRANCH - 1e-9);
        let above = bessel_j0(BRANCH + 1e-9);
        assert!(
            (below - above).abs() < 1e-3,
            "discontinuity at x=3: {} vs {}",
            below,
            above
        );
    }

    #[test]
    fn test_known_values() {
        // Tabulated J0 values
        assert_abs_diff_eq!(bessel_j0(1.0), 0.765_197_686_6, epsilon = 1e-6);
        assert_abs_diff_eq!(bessel_j0(2.404_825_557_7), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bessel_j0(5.0), -0.177_596_771_3, epsilon = 1e-6);
        assert_abs_diff_eq!(bessel_j0(10.0), -0.245_935_764_5, epsilon = 1e-6);
    }

    #[test]
    fn test_even_symmetry() {
        for &x in &[0.5, 2.0, 3.0, 4.5, 12.0] {
            assert_abs_diff_eq!(bessel_j0(-x), bessel_j0(x), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_large_argument_decays() {
        let envelope = (2.0 / (std::f64::consts::PI * 400.0)).sqrt();
        assert!(bessel_j0(400.0).abs() <= envelope + 1e-6);
    }
}
