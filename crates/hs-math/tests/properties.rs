//! Property-based tests for hs-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use hs_math::{log_add_exp, log_sum_exp, softmax_in_place, LogSumExp};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

/// Helper to check approximate equality.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// log_sum_exp properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Order of the inputs does not matter.
    #[test]
    fn log_sum_exp_commutative(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let ab = log_sum_exp(&[a, b]);
        let ba = log_sum_exp(&[b, a]);
        prop_assert!(
            approx_eq(ab, ba, TOL),
            "lse([{},{}])={} != lse([{},{}])={}",
            a,
            b,
            ab,
            b,
            a,
            ba
        );
    }

    /// Grouping does not matter.
    #[test]
    fn log_sum_exp_associative(a in -50.0..50.0f64, b in -50.0..50.0f64, c in -50.0..50.0f64) {
        let direct = log_sum_exp(&[a, b, c]);
        let grouped = log_sum_exp(&[log_sum_exp(&[a, b]), c]);
        prop_assert!(approx_eq(direct, grouped, TOL),
            "lse([{},{},{}])={} != grouped {}", a, b, c, direct, grouped);
    }

    /// No underflow with very negative values, the regime of long sequences.
    #[test]
    fn log_sum_exp_no_underflow(a in -1.0e6..-700.0f64, b in -1.0e6..-700.0f64) {
        let result = log_sum_exp(&[a, b]);
        prop_assert!(result.is_finite(), "lse([{},{}])={} should be finite", a, b, result);
        prop_assert!(result >= a.max(b) - TOL);
    }

    /// log_add_exp matches log_sum_exp for 2 elements.
    #[test]
    fn log_add_exp_matches_log_sum_exp(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let lae = log_add_exp(a, b);
        let lse = log_sum_exp(&[a, b]);
        prop_assert!(approx_eq(lae, lse, TOL), "log_add_exp({},{})={} != {}", a, b, lae, lse);
    }
}

// ============================================================================
// Streaming accumulator properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The single-pass accumulator agrees with the two-pass slice version.
    #[test]
    fn accumulator_matches_slice(values in prop::collection::vec(-800.0..50.0f64, 1..64)) {
        let acc: LogSumExp = values.iter().copied().collect();
        let expected = log_sum_exp(&values);
        prop_assert!(approx_eq(acc.value(), expected, 1e-9),
            "streaming {} != slice {}", acc.value(), expected);
    }

    /// Softmax output is a probability simplex.
    #[test]
    fn softmax_is_simplex(values in prop::collection::vec(-500.0..0.0f64, 1..16)) {
        let mut out = values.clone();
        softmax_in_place(&mut out);
        let sum: f64 = out.iter().sum();
        prop_assert!(approx_eq(sum, 1.0, 1e-9), "softmax sums to {}", sum);
        prop_assert!(out.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}
