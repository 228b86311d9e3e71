//! Rate grid generation for the exponential family.
//!
//! `y = a·e^(b·x) + c` is fitted by a deterministic search over the rate `b`
//! (for each `b` the remaining coefficients come from OLS).
//!
//! Why grid search?
//! - It avoids the start-point sensitivity of local nonlinear solvers.
//! - It is deterministic given the same inputs.
//! - With a single nonlinear parameter, a modest grid is cheap.

use crate::error::AppError;

/// Smallest and largest `|b · x_max|` covered by the grid.
const MIN_EXPONENT: f64 = 1e-4;
const MAX_EXPONENT: f64 = 30.0;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::new(
            crate::error::EXIT_NUMERIC,
            format!("Invalid grid range: min={min}, max={max} (must be finite, >0, and max>min)."),
        ));
    }
    if steps < 2 {
        return Err(AppError::new(crate::error::EXIT_NUMERIC, "Grid steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// Ascending grid of signed rates scaled to the abscissa range of `xs`.
///
/// `steps` magnitudes are generated for each sign; zero is excluded because
/// the exponential column would duplicate the intercept.
pub fn rate_grid(xs: &[f64], steps: usize) -> Result<Vec<f64>, AppError> {
    let span = xs.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    if !(span.is_finite() && span > 0.0) {
        return Err(AppError::new(
            crate::error::EXIT_NUMERIC,
            "Cannot build a rate grid: abscissa range is zero.",
        ));
    }

    let magnitudes = log_space(MIN_EXPONENT / span, MAX_EXPONENT / span, steps)?;
    let mut grid: Vec<f64> = magnitudes.iter().rev().map(|m| -m).collect();
    grid.extend(magnitudes);
    Ok(grid)
}
