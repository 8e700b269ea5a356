//! Numerically stable primitives for log-domain forward recursions.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Natural log of a probability, mapping zero to NEG_INFINITY.
///
/// Negative inputs yield NaN so that malformed tables surface in validation.
pub fn safe_ln(p: f64) -> f64 {
    if p == 0.0 {
        f64::NEG_INFINITY
    } else if p < 0.0 {
        f64::NAN
    } else {
        p.ln()
    }
}

/// Normalize log-scores into probabilities in place.
///
/// When every score is -inf (or any is NaN) the output is all zeros.
pub fn softmax_in_place(values: &mut [f64]) {
    let total = log_sum_exp(values);
    let degenerate = total == f64::NEG_INFINITY || total.is_nan();
    for v in values.iter_mut() {
        *v = if degenerate { 0.0 } else { (*v - total).exp() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log_sum_exp_basic() {
        let v = [0.0, 0.0];
        let out = log_sum_exp(&v);
        assert!(approx_eq(out, 2.0f64.ln(), 1e-12));
    }

    #[test]
    fn log_sum_exp_dominance() {
        let v = [-1000.0, 0.0];
        let out = log_sum_exp(&v);
        assert!(approx_eq(out, 0.0, 1e-12));
    }

    #[test]
    fn log_sum_exp_all_neg_inf() {
        let v = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        let out = log_sum_exp(&v);
        assert!(out.is_infinite() && out.is_sign_negative());
    }

    #[test]
    fn log_sum_exp_empty() {
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
    }

    #[test]
    fn log_sum_exp_nan_propagates() {
        let out = log_sum_exp(&[0.0, f64::NAN]);
        assert!(out.is_nan());
    }

    #[test]
    fn log_add_exp_matches_lse() {
        let a = 1.234;
        let b = -0.75;
        let out = log_add_exp(a, b);
        let lse = log_sum_exp(&[a, b]);
        assert!(approx_eq(out, lse, 1e-12));
    }

    #[test]
    fn log_add_exp_infinity_rules() {
        let out = log_add_exp(f64::INFINITY, 1.0);
        assert!(out.is_infinite() && out.is_sign_positive());

        let out2 = log_add_exp(f64::NEG_INFINITY, 2.0);
        assert!(approx_eq(out2, 2.0, 1e-12));
    }

    #[test]
    fn safe_ln_edges() {
        assert_eq!(safe_ln(0.0), f64::NEG_INFINITY);
        assert!(safe_ln(-0.5).is_nan());
        assert!(approx_eq(safe_ln(1.0), 0.0, 1e-15));
        assert!(approx_eq(safe_ln(0.25), 0.25f64.ln(), 1e-15));
    }

    #[test]
    fn softmax_sums_to_one() {
        let mut values = [-1.0, -2.0, -0.5];
        softmax_in_place(&mut values);
        let sum: f64 = values.iter().sum();
        assert!(approx_eq(sum, 1.0, 1e-12));
        assert!(values[2] > values[0] && values[0] > values[1]);
    }

    #[test]
    fn softmax_all_impossible_is_zero() {
        let mut values = [f64::NEG_INFINITY; 2];
        softmax_in_place(&mut values);
        assert_eq!(values, [0.0, 0.0]);
    }
}
