//! Model evaluation for the linear / quadratic / exponential / inverse families.
//!
//! The fitter only needs a design row per abscissa. The exponential family is
//! only linear once its rate `b` is fixed, so its design row takes the rate as
//! an extra argument and yields `(a, c)`.

use crate::domain::ModelFamily;

/// Number of linear coefficients solved by OLS for `family`.
pub fn linear_param_count(family: ModelFamily) -> usize {
    match family {
        ModelFamily::Linear | ModelFamily::Inverse | ModelFamily::Exponential => 2,
        ModelFamily::Quadratic => 3,
    }
}

/// Fill a design row for the given family.
///
/// `rate` is only read by the exponential family.
///
/// # Panics
/// Panics if `out` is shorter than `linear_param_count(family)`.
pub fn fill_design_row(family: ModelFamily, x: f64, rate: f64, out: &mut [f64]) {
    match family {
        ModelFamily::Linear => {
            out[0] = x;
            out[1] = 1.0;
        }
        ModelFamily::Quadratic => {
            out[0] = x * x;
            out[1] = x;
            out[2] = 1.0;
        }
        ModelFamily::Exponential => {
            out[0] = (rate * x).exp();
            out[1] = 1.0;
        }
        ModelFamily::Inverse => {
            out[0] = 1.0 / x;
            out[1] = 1.0;
        }
    }
}
