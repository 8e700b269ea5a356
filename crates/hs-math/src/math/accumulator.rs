//! Single-pass log-sum-exp accumulator.
//!
//! Folds a stream of log-values without buffering them, rescaling the
//! running sum whenever a new maximum arrives. Used where a slice is not
//! available, e.g. evaluating a hypothetical forward step without a scratch
//! vector. Feeding the same values in the same order always gives the same
//! bits, whether they come from a buffer or an iterator.

/// Streaming `log(sum(exp(x_i)))`.
///
/// Follows the same special-value rules as [`crate::log_sum_exp`]: any NaN
/// poisons the result, any +inf dominates, and an empty or all -inf stream
/// yields NEG_INFINITY.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogSumExp {
    max: f64,
    sum: f64,
    saw_nan: bool,
    saw_pos_inf: bool,
}

impl Default for LogSumExp {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSumExp {
    /// Create an empty accumulator.
    pub const fn new() -> Self {
        Self {
            max: f64::NEG_INFINITY,
            sum: 0.0,
            saw_nan: false,
            saw_pos_inf: false,
        }
    }

    /// Add one log-value to the running total.
    #[inline]
    pub fn add(&mut self, x: f64) {
        if x.is_nan() {
            self.saw_nan = true;
            return;
        }
        if x == f64::NEG_INFINITY {
            return;
        }
        if x == f64::INFINITY {
            self.saw_pos_inf = true;
            return;
        }
        if x <= self.max {
            self.sum += (x - self.max).exp();
        } else {
            // New maximum: rescale what we have so far. With max = -inf the
            // old sum is zero and the product stays zero.
            self.sum = self.sum * (self.max - x).exp() + 1.0;
            self.max = x;
        }
    }

    /// Current value of the accumulated log-sum-exp.
    pub fn value(&self) -> f64 {
        if self.saw_nan {
            return f64::NAN;
        }
        if self.saw_pos_inf {
            return f64::INFINITY;
        }
        if self.max == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        self.max + self.sum.ln()
    }
}

impl Extend<f64> for LogSumExp {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<f64> for LogSumExp {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = LogSumExp::new();
        acc.extend(iter);
        acc
    }
}
