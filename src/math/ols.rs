//! Least squares solver.
//!
//! Every model family we fit is linear in its coefficients once any nonlinear
//! parameter is fixed, so all fits reduce to small problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! We solve them through SVD: the design matrix is tall (more rows than
//! columns) and can be badly scaled, e.g. latencies multiplied by round counts.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ≈ Σ β_j · basis_j(x)` and return `(β, SSE)`.
///
/// `basis` fills one design row per abscissa; the row length is `p`.
pub fn fit_linear_basis<F>(xs: &[f64], ys: &[f64], p: usize, basis: F) -> Option<(Vec<f64>, f64)>
where
    F: Fn(f64, &mut [f64]),
{
    let n = xs.len();
    if n == 0 || n != ys.len() || p == 0 {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &x) in xs.iter().enumerate() {
        basis(x, &mut row);
        if row.iter().any(|v| !v.is_finite()) {
            return None;
        }
        for (j, &v) in row.iter().enumerate() {
            design[(i, j)] = v;
        }
    }
    let target = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &target)?;
    let residual = &design * &beta - &target;
    let sse = residual.norm_squared();

    sse.is_finite().then(|| (beta.iter().copied().collect(), sse))
}
