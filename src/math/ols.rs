//! Least squares helpers.
//!
//! The only regression this crate runs itself is the degree-1 trend fit behind
//! the `ev_growth_slope` feature:
//!
//! ```text
//! minimize Σ (y_i - (a + b·x_i))^2,   x_i = 0, 1, …, n-1
//! ```
//!
//! Implementation choices:
//! - We solve through SVD so a degenerate design (n < 2) fails cleanly instead
//!   of panicking. (Nalgebra's `QR::solve` is intended for square systems.)
//! - Problem sizes are tiny (at most a handful of rows, 2 columns).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Slope of the least-squares line through `(i, values[i])`.
///
/// Returns `0.0` for fewer than two values or a system that cannot be solved.
pub fn trend_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mut design = Vec::with_capacity(n * 2);
    for i in 0..n {
        design.push(1.0);
        design.push(i as f64);
    }
    let x = DMatrix::from_row_slice(n, 2, &design);
    let y = DVector::from_row_slice(values);

    solve_least_squares(&x, &y).map(|beta| beta[1]).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn trend_slope_matches_polyfit() {
        // Exact line.
        assert!((trend_slope(&[10.0, 20.0, 30.0, 40.0]) - 10.0).abs() < 1e-9);

        // Noisy: polyfit([0,1,2], [1,3,2], 1) -> slope 0.5
        assert!((trend_slope(&[1.0, 3.0, 2.0]) - 0.5).abs() < 1e-9);

        // Flat.
        assert!(trend_slope(&[7.0, 7.0, 7.0]).abs() < 1e-9);
    }

    #[test]
    fn trend_slope_degenerate_inputs() {
        assert_eq!(trend_slope(&[]), 0.0);
        assert_eq!(trend_slope(&[42.0]), 0.0);
    }
}
