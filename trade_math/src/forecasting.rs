//! Building blocks for autoregressive model fitting
//!
//! Contains:
//! - Differencing and its inverse (integration)
//! - Ordinary least squares via the normal equations
//! - Stationarity / invertibility check for lag polynomials

use crate::{MathError, Result};

/// Difference `values` `d` times
pub fn difference(values: &[f64], d: usize) -> Vec<f64> {
    let mut current = values.to_vec();
    for _ in 0..d {
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    current
}

/// Last value of the series at each differencing level `0..d`
///
/// These anchors are what [`integrate`] needs to undo `d` differences.
pub fn integration_anchors(values: &[f64], d: usize) -> Result<Vec<f64>> {
    if values.len() <= d {
        return Err(MathError::InsufficientData(format!(
            "Need more than {} values to difference {} times",
            d, d
        )));
    }

    let mut anchors = Vec::with_capacity(d);
    let mut current = values.to_vec();
    for _ in 0..d {
        anchors.push(current[current.len() - 1]);
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }

    Ok(anchors)
}

/// Undo differencing of a continuation
///
/// `diffs` continues the `anchors.len()`-times differenced series; the result
/// continues the original series.
pub fn integrate(diffs: &[f64], anchors: &[f64]) -> Vec<f64> {
    let mut current = diffs.to_vec();
    for &anchor in anchors.iter().rev() {
        let mut level = anchor;
        for value in current.iter_mut() {
            level += *value;
            *value = level;
        }
    }
    current
}

/// Solve `min ||X b - y||²` through the normal equations
///
/// `design` holds one row per observation. Fails with
/// [`MathError::CalculationError`] when `XᵀX` is singular.
pub fn least_squares(design: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
    if design.is_empty() || design.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            design.len(),
            target.len()
        )));
    }

    let k = design[0].len();
    if k == 0 || design.iter().any(|row| row.len() != k) {
        return Err(MathError::InvalidInput(
            "Design rows must share a non-zero width".to_string(),
        ));
    }
    if design.len() < k {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations for {} coefficients",
            k, k
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y) in design.iter().zip(target) {
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    solve_linear_system(xtx, xty)
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .enumerate()
        .map(|(i, row)| row[i].abs())
        .fold(1.0_f64, f64::max);
    let tolerance = 1e-10 * scale;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() <= tolerance {
            return Err(MathError::CalculationError(
                "Singular system in least squares".to_string(),
            ));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|j| a[row][j] * solution[j]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares produced non-finite coefficients".to_string(),
        ));
    }

    Ok(solution)
}

/// Whether `1 - c₁z - … - cₚzᵖ` has all roots outside the unit circle
///
/// Runs the Durbin-Levinson recursion backwards: the polynomial is stationary
/// iff every reflection coefficient has modulus below one. For MA
/// invertibility pass the negated MA coefficients.
pub fn is_stationary_polynomial(coefficients: &[f64]) -> bool {
    let mut current = coefficients.to_vec();

    while let Some(&reflection) = current.last() {
        if !reflection.is_finite() || reflection.abs() >= 1.0 {
            return false;
        }

        let k = current.len();
        let denom = 1.0 - reflection * reflection;
        let next: Vec<f64> = (0..k - 1)
            .map(|j| (current[j] + reflection * current[k - 2 - j]) / denom)
            .collect();
        current = next;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_difference_and_integrate_roundtrip() {
        let series = [1.0, 4.0, 9.0, 16.0, 25.0];
        let d2 = difference(&series, 2);
        assert_eq!(d2, vec![2.0, 2.0, 2.0]);

        let anchors = integration_anchors(&series, 2).unwrap();
        assert_eq!(anchors, vec![25.0, 9.0]);

        // Continuing the constant second difference extends the squares
        let continued = integrate(&[2.0, 2.0], &anchors);
        assert_eq!(continued, vec![36.0, 49.0]);
    }

    #[test]
    fn test_integration_anchors_too_short() {
        assert!(integration_anchors(&[1.0], 1).is_err());
        assert!(integration_anchors(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_least_squares_recovers_line() {
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let target: Vec<f64> = (0..10).map(|i| 3.0 + 0.5 * i as f64).collect();

        let beta = least_squares(&design, &target).unwrap();
        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(beta[1], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_least_squares_singular() {
        // Second column duplicates the intercept
        let design: Vec<Vec<f64>> = (0..10).map(|_| vec![1.0, 50.0]).collect();
        let target = vec![50.0; 10];

        assert!(matches!(
            least_squares(&design, &target),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_stationary_polynomial() {
        assert!(is_stationary_polynomial(&[]));
        assert!(is_stationary_polynomial(&[0.5]));
        assert!(!is_stationary_polynomial(&[1.0]));
        assert!(!is_stationary_polynomial(&[-1.2]));
        // AR(2) inside the stationarity triangle
        assert!(is_stationary_polynomial(&[0.5, 0.3]));
        // phi1 + phi2 > 1 is explosive
        assert!(!is_stationary_polynomial(&[0.7, 0.4]));
    }
}
