//! One-dimensional minimization.
//!
//! Used to polish the nonlinear parameter of a model after a coarse grid
//! search has bracketed the minimum.

/// Inverse golden ratio.
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Minimize `f` on `[lo, hi]` by golden-section search.
///
/// Returns the best `(x, f(x))` seen. `f` may return non-finite values for
/// infeasible points; those never win.
pub fn golden_section_min<F>(f: F, lo: f64, hi: f64, iters: usize) -> Option<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return None;
    }

    let mut a = lo;
    let mut b = hi;
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..iters {
        if (b - a).abs() <= f64::EPSILON * (a.abs() + b.abs()).max(1.0) {
            break;
        }
        if less(fc, fd) {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = f(d);
        }
    }

    let (x, fx) = if less(fc, fd) { (c, fc) } else { (d, fd) };
    fx.is_finite().then_some((x, fx))
}

/// `a < b`, treating non-finite values as +∞.
fn less(a: f64, b: f64) -> bool {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a < b,
        (true, false) => true,
        _ => false,
    }
}
