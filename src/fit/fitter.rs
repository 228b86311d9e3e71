//! Curve fitting for a single 2D slice.
//!
//! Given the `(x, runtime)` points of one slice and the tracked variable that
//! produced it, we:
//! - apply the data-size sentinels (too few points never reach a solver)
//! - dispatch on the variable's model family
//! - derive the leading coefficient used to rank protocols
//!
//! Failures are never propagated: every slice ends in a `FitOutcome`.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{FitOutcome, ModelFamily, SliceFit, TrackedVariable};
use crate::fit::rate_grid::rate_grid;
use crate::math::{fit_linear_basis, golden_section_min};
use crate::models::{fill_design_row, linear_param_count};

/// Below this many points a slice is treated as empty.
pub const MIN_NONEMPTY_POINTS: usize = 2;

/// Minimum number of points before any model is fitted.
///
/// The nonlinear families need the spare degrees of freedom; the floor is
/// applied to every family so results stay comparable.
pub const MIN_FIT_POINTS: usize = 5;

/// Rate magnitudes per sign for the exponential grid.
const RATE_STEPS: usize = 64;

/// Golden-section iterations when polishing the best grid rate.
const RATE_REFINE_ITERS: usize = 120;

/// Reason reported for bandwidth fits with a negative numerator.
pub const PREPROCESSING_REASON: &str = "preprocessing phase";

/// Fit the points of one 2D slice.
///
/// `comm_rounds` is only used for latency slices: abscissas are multiplied by
/// it before fitting and the ranked slope is divided by it afterwards.
pub fn fit_slice(variable: TrackedVariable, points: &[(f64, f64)], comm_rounds: Option<f64>) -> FitOutcome {
    let n = points.len();
    if n < MIN_NONEMPTY_POINTS {
        return FitOutcome::NoData;
    }
    if n < MIN_FIT_POINTS {
        return FitOutcome::Insufficient { n_points: n };
    }

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

    let family = variable.model_family();
    let outcome = match family {
        ModelFamily::Linear => fit_latency(&xs, &ys, comm_rounds),
        ModelFamily::Quadratic => fit_ols(family, &xs, &ys).map(|coefficients| (coefficients[0], coefficients)),
        ModelFamily::Inverse => return fit_inverse(&xs, &ys),
        ModelFamily::Exponential => fit_exponential(&xs, &ys).map(|coefficients| (coefficients[0], coefficients)),
    };

    match outcome {
        Some((leading, coefficients))
            if coefficients.len() == family.param_count()
                && leading.is_finite()
                && coefficients.iter().all(|c| c.is_finite()) =>
        {
            debug!(variable = variable.tag(), ?family, ?coefficients, leading, "slice fitted");
            FitOutcome::Fitted(SliceFit {
                family,
                coefficients,
                leading,
                n_points: n,
            })
        }
        _ => FitOutcome::Failed {
            reason: format!("{family:?} fit did not converge").to_lowercase(),
        },
    }
}

fn fit_ols(family: ModelFamily, xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
    let p = linear_param_count(family);
    fit_linear_basis(xs, ys, p, |x, row| fill_design_row(family, x, 0.0, row)).map(|(beta, _)| beta)
}

fn fit_latency(xs: &[f64], ys: &[f64], comm_rounds: Option<f64>) -> Option<(f64, Vec<f64>)> {
    let rounds = comm_rounds.filter(|r| r.is_finite() && *r > 0.0);
    if rounds.is_none() {
        warn!("communication rounds unavailable; fitting latency slice without rescaling");
    }
    let scale = rounds.unwrap_or(1.0);

    let scaled: Vec<f64> = xs.iter().map(|x| x * scale).collect();
    let coefficients = fit_ols(ModelFamily::Linear, &scaled, ys)?;
    Some((coefficients[0] / scale, coefficients))
}

fn fit_inverse(xs: &[f64], ys: &[f64]) -> FitOutcome {
    if xs.iter().any(|&x| x == 0.0) {
        return FitOutcome::Failed {
            reason: "zero bandwidth in slice".to_string(),
        };
    }
    let Some(coefficients) = fit_ols(ModelFamily::Inverse, xs, ys) else {
        return FitOutcome::Failed {
            reason: "inverse fit did not converge".to_string(),
        };
    };
    let leading = coefficients[0];
    if leading < 0.0 {
        // Bandwidth-bound runtimes cannot shrink as bandwidth drops; a negative
        // numerator means the slice is dominated by offline preprocessing.
        return FitOutcome::Rejected {
            reason: PREPROCESSING_REASON.to_string(),
        };
    }
    FitOutcome::Fitted(SliceFit {
        family: ModelFamily::Inverse,
        coefficients,
        leading,
        n_points: xs.len(),
    })
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    rate: f64,
    coefficients: Vec<f64>,
    sse: f64,
}

/// Fit `y = a·e^(b·x) + c`, returning `[a, b, c]`.
fn fit_exponential(xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
    let grid = rate_grid(xs, RATE_STEPS).ok()?;

    // Evaluate each rate independently (parallel).
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &rate)| {
            solve_at_rate(xs, ys, rate).map(|(coefficients, sse)| Candidate {
                idx,
                rate,
                coefficients,
                sse,
            })
        })
        .collect();

    // Deterministic selection: pick the minimum SSE; break ties by original grid index.
    let mut best = candidates.first()?;
    for c in &candidates[1..] {
        if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
            best = c;
        }
    }

    let lo = grid[best.idx.saturating_sub(1)];
    let hi = grid[(best.idx + 1).min(grid.len() - 1)];
    let refined = golden_section_min(
        |rate| solve_at_rate(xs, ys, rate).map_or(f64::NAN, |(_, sse)| sse),
        lo,
        hi,
        RATE_REFINE_ITERS,
    );

    if let Some((rate, sse)) = refined {
        if sse < best.sse {
            if let Some((coefficients, _)) = solve_at_rate(xs, ys, rate) {
                return Some(coefficients);
            }
        }
    }
    debug!(rate = best.rate, sse = best.sse, "exponential fit kept grid rate");
    Some(best.coefficients.clone())
}

/// OLS for `(a, c)` at a fixed rate; returns `([a, rate, c], SSE)`.
fn solve_at_rate(xs: &[f64], ys: &[f64], rate: f64) -> Option<(Vec<f64>, f64)> {
    let (beta, sse) = fit_linear_basis(xs, ys, 2, |x, row| {
        fill_design_row(ModelFamily::Exponential, x, rate, row)
    })?;
    Some((vec![beta[0], rate, beta[1]], sse))
}
