//! Normal-equation solver
//!
//! Solves small dense systems `A·θ = b` by Gaussian elimination with partial
//! pivoting. Polynomial design matrices become ill-conditioned quickly, so
//! each pivot is the largest-magnitude entry left in its column, and a pivot
//! that is negligible relative to the column's original scale is reported as
//! a singular system instead of being divided by.

use crate::error::{EngineError, EngineResult};

/// Relative pivot magnitude below which the system is treated as singular
pub const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Solve `a · x = b` for a square system.
pub fn solve_linear_system(a: &[Vec<f64>], b: &[f64]) -> EngineResult<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(EngineError::numerical(format!(
            "normal equations must be a non-empty square system, got {}x{} with {} right-hand values",
            a.len(),
            a.first().map_or(0, Vec::len),
            n
        )));
    }

    // Column scales of the original matrix, used for the singularity test
    let column_scale: Vec<f64> = (0..n)
        .map(|col| a.iter().fold(0.0_f64, |m, row| m.max(row[col].abs())))
        .collect();

    let mut augmented: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| augmented[i][col].abs().total_cmp(&augmented[j][col].abs()))
            .unwrap_or(col);

        let pivot = augmented[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() <= column_scale[col] * SINGULAR_TOLERANCE {
            return Err(EngineError::numerical(format!(
                "normal equations are singular (pivot {:e} in column {})",
                pivot, col
            )));
        }
        augmented.swap(col, pivot_row);

        let pivot_values = augmented[col].clone();
        for row in augmented.iter_mut().skip(col + 1) {
            let factor = row[col] / pivot_values[col];
            if factor == 0.0 {
                continue;
            }
            for (entry, &p) in row.iter_mut().zip(&pivot_values).skip(col) {
                *entry -= factor * p;
            }
        }
    }

    let mut solution = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| augmented[i][j] * solution[j]).sum();
        solution[i] = (augmented[i][n] - tail) / augmented[i][i];
    }

    if let Some(idx) = solution.iter().position(|v| !v.is_finite()) {
        return Err(EngineError::numerical(format!(
            "solved coefficient {} is not finite",
            idx
        )));
    }

    Ok(solution)
}

/// Build the normal equations for a polynomial basis `1, x, …, x^degree`
/// and solve them. Coefficients are returned lowest power first.
///
/// The system is solved in the standardised variable
/// `t = (x − centre) / spread`, where the power sums stay near unit scale
/// even for x far from zero, and the solution is expanded back to powers of x.
pub fn polynomial_least_squares(xs: &[f64], ys: &[f64], degree: usize) -> EngineResult<Vec<f64>> {
    let size = degree + 1;

    let centre = xs.iter().sum::<f64>() / xs.len() as f64;
    let spread = xs.iter().fold(0.0_f64, |m, &x| m.max((x - centre).abs()));
    // Also catches an empty dataset, where centre and spread are NaN
    if !(spread > centre.abs() * SINGULAR_TOLERANCE) {
        return Err(EngineError::numerical(format!(
            "normal equations are singular (x values span {:e} around {})",
            spread, centre
        )));
    }

    // Power sums Σ t^k for k in 0..=2·degree fill TᵀT; Σ t^k·y fills Tᵀy
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut moment_sums = vec![0.0; size];
    for (&x, &y) in xs.iter().zip(ys) {
        let t = (x - centre) / spread;
        let mut power = 1.0;
        for k in 0..power_sums.len() {
            power_sums[k] += power;
            if k < size {
                moment_sums[k] += power * y;
            }
            power *= t;
        }
    }

    let xtx: Vec<Vec<f64>> = (0..size)
        .map(|i| (0..size).map(|j| power_sums[i + j]).collect())
        .collect();

    let standardised = solve_linear_system(&xtx, &moment_sums)?;
    Ok(expand_standardised(&standardised, centre, spread))
}

/// Rewrite `Σ cₖ·tᵏ` with `t = (x − centre) / spread` as `Σ aₖ·xᵏ`.
fn expand_standardised(coefficients: &[f64], centre: f64, spread: f64) -> Vec<f64> {
    let mut expanded = vec![0.0; coefficients.len()];
    // Coefficients of tᵏ in powers of x, lowest first
    let mut t_power = vec![1.0];
    for (k, &c) in coefficients.iter().enumerate() {
        if k > 0 {
            let mut next = vec![0.0; t_power.len() + 1];
            for (j, &p) in t_power.iter().enumerate() {
                next[j] -= p * centre / spread;
                next[j + 1] += p / spread;
            }
            t_power = next;
        }
        for (a, &p) in expanded.iter_mut().zip(&t_power) {
            *a += c * p;
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solves_two_by_two() {
        // 2a + 4b = 8, 4a + 10b = 20  ->  a = 0, b = 2
        let a = vec![vec![2.0, 4.0], vec![4.0, 10.0]];
        let x = solve_linear_system(&a, &[8.0, 20.0]).unwrap();
        assert_eq!(x, vec![0.0, 2.0]);
    }

    #[test]
    fn test_pivoting_handles_zero_leading_entry() {
        // Naive elimination would divide by the zero in the top-left corner
        let a = vec![
            vec![0.0, 2.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![2.0, 1.0, 3.0],
        ];
        let b = [5.0, 6.0, 13.0];
        let x = solve_linear_system(&a, &b).unwrap();
        for (row, rhs) in a.iter().zip(b) {
            let lhs: f64 = row.iter().zip(&x).map(|(c, v)| c * v).sum();
            assert!((lhs - rhs).abs() < 1e-12);
        }
    }

    #[test]
    fn test_singular_system_is_numerical_failure() {
        let a = vec![vec![3.0, 6.0], vec![6.0, 12.0]];
        let err = solve_linear_system(&a, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, EngineError::NumericalFailure(_)));
    }

    #[test]
    fn test_empty_system_rejected() {
        assert!(solve_linear_system(&[], &[]).is_err());
    }

    #[test]
    fn test_polynomial_recovers_exact_quadratic() {
        let xs: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 1.0 - 2.0 * x + 0.5 * x * x).collect();
        let coeffs = polynomial_least_squares(&xs, &ys, 2).unwrap();
        assert!((coeffs[0] - 1.0).abs() < 1e-9);
        assert!((coeffs[1] + 2.0).abs() < 1e-9);
        assert!((coeffs[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_polynomial_far_from_origin() {
        // Year-indexed data: raw powers of x cancel catastrophically
        let xs: Vec<f64> = (2000..=2020).map(f64::from).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|x| 1.0 + 0.5 * (x - 2000.0) + 0.1 * (x - 2000.0).powi(2))
            .collect();

        // y = 0.1x² − 399.5x + 399001 in powers of x
        let coeffs = polynomial_least_squares(&xs, &ys, 2).unwrap();
        assert!((coeffs[0] - 399_001.0).abs() < 1e-4);
        assert!((coeffs[1] + 399.5).abs() < 1e-7);
        assert!((coeffs[2] - 0.1).abs() < 1e-10);

        for degree in 2..=6 {
            let coeffs = polynomial_least_squares(&xs, &ys, degree).unwrap();
            for (&x, &y) in xs.iter().zip(&ys) {
                let fitted = coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c);
                assert!((fitted - y).abs() < 1e-5, "degree {} at x = {}", degree, x);
            }
        }
    }

    #[test]
    fn test_expand_standardised_shifts_basis() {
        // 3 + 2t with t = (x − 1) / 2  ->  2 + x
        assert_eq!(expand_standardised(&[3.0, 2.0], 1.0, 2.0), vec![2.0, 1.0]);
        // t² with t = x − 1  ->  1 − 2x + x²
        assert_eq!(expand_standardised(&[0.0, 0.0, 1.0], 1.0, 1.0), vec![1.0, -2.0, 1.0]);
    }

    #[test]
    fn test_identical_x_values_are_singular() {
        let xs = [0.1, 0.1, 0.1];
        let ys = [1.0, 2.0, 3.0];
        let err = polynomial_least_squares(&xs, &ys, 1).unwrap_err();
        assert!(matches!(err, EngineError::NumericalFailure(_)));
    }
}
