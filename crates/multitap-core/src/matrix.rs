//! Orthogonal feedback matrices for the FDN reverb.
//!
//! The exponential of a skew-symmetric matrix is orthogonal, so building
//! the feedback matrix as `A = exp(S)` gives an energy-preserving loop for
//! any choice of the free upper-triangle parameters. All matrices are
//! flattened row-major `N×N`.
//!
//! This runs once per reverb instance; the result is cached as an
//! immutable coefficient table.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Highest power of `S` summed in the Taylor expansion.
pub const TAYLOR_ORDER: usize = 14;

/// Number of free parameters in an `n×n` skew-symmetric matrix.
pub const fn skew_param_count(n: usize) -> usize {
    n * (n - 1) / 2
}

/// Skew-symmetric matrix from its strict upper triangle, filled row by row.
///
/// # Panics
///
/// Panics if `params.len() != n·(n-1)/2`.
pub fn skew_symmetric(params: &[f32], n: usize) -> Vec<f64> {
    assert_eq!(
        params.len(),
        skew_param_count(n),
        "skew-symmetric {n}x{n} needs {} parameters",
        skew_param_count(n)
    );
    let mut s = vec![0.0; n * n];
    let mut idx = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            let w = f64::from(params[idx]);
            s[i * n + j] = w;
            s[j * n + i] = -w;
            idx += 1;
        }
    }
    s
}

/// `exp(S)` by the truncated Taylor series `Σ_{k=0}^{order} S^k / k!`.
pub fn matrix_exp(s: &[f64], n: usize, order: usize) -> Vec<f64> {
    let mut result = identity(n);
    let mut term = identity(n);
    let mut next = vec![0.0; n * n];

    for k in 1..=order {
        // next = term · S / k
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for l in 0..n {
                    sum += term[i * n + l] * s[l * n + j];
                }
                next[i * n + j] = sum / k as f64;
            }
        }
        for (r, t) in result.iter_mut().zip(next.iter()) {
            *r += t;
        }
        core::mem::swap(&mut term, &mut next);
    }
    result
}

/// Orthogonal feedback matrix `exp(S)` from skew parameters, as `f32`.
///
/// # Example
///
/// ```rust
/// use multitap_core::matrix::{is_orthogonal, orthogonal_from_skew};
///
/// let a = orthogonal_from_skew(&[-0.5182, 0.2144, 0.1097, 0.3421, -0.1985, 0.4210], 4);
/// assert!(is_orthogonal(&a, 4, 1e-5));
/// ```
pub fn orthogonal_from_skew(params: &[f32], n: usize) -> Vec<f32> {
    let s = skew_symmetric(params, n);
    matrix_exp(&s, n, TAYLOR_ORDER)
        .into_iter()
        .map(|v| v as f32)
        .collect()
}

/// Checks `A · Aᵀ ≈ I` within `tolerance` per element.
pub fn is_orthogonal(a: &[f32], n: usize, tolerance: f32) -> bool {
    for i in 0..n {
        for j in 0..n {
            let dot: f32 = (0..n).map(|k| a[i * n + k] * a[j * n + k]).sum();
            let expected = if i == j { 1.0 } else { 0.0 };
            if (dot - expected).abs() > tolerance {
                return false;
            }
        }
    }
    true
}

fn identity(n: usize) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skew_symmetric_layout() {
        let s = skew_symmetric(&[1.0, 2.0, 3.0], 3);
        assert_eq!(s, vec![0.0, 1.0, 2.0, -1.0, 0.0, 3.0, -2.0, -3.0, 0.0]);
    }

    #[test]
    fn test_exp_of_zero_is_identity() {
        let a = orthogonal_from_skew(&[0.0; 6], 4);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(a[i * 4 + j], if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_2x2_is_rotation() {
        // exp([[0, θ], [-θ, 0]]) = [[cos θ, sin θ], [-sin θ, cos θ]]
        let theta = 0.7_f32;
        let a = orthogonal_from_skew(&[theta], 2);
        assert!((a[0] - libm::cosf(theta)).abs() < 1e-6);
        assert!((a[1] - libm::sinf(theta)).abs() < 1e-6);
        assert!((a[2] + libm::sinf(theta)).abs() < 1e-6);
    }

    #[test]
    fn test_eight_line_matrix_is_orthogonal() {
        let params: Vec<f32> = (0..28).map(|i| ((i * 37 % 17) as f32 - 8.0) * 0.05).collect();
        let a = orthogonal_from_skew(&params, 8);
        assert!(is_orthogonal(&a, 8, 1e-5));
    }

    #[test]
    #[should_panic]
    fn test_wrong_parameter_count_panics() {
        let _ = skew_symmetric(&[1.0, 2.0], 3);
    }
}
