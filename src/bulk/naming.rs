use crate::foundation::math::decimal_digits;

/// Prefix used when the caller leaves it blank.
pub const DEFAULT_PREFIX: &str = "variation";

/// Smallest zero-padding width for step numbers.
pub const MIN_PAD_WIDTH: usize = 5;

/// Zero-padding width for a run of `total` images: `max(5, digits(total))`.
pub fn pad_width(total: u64) -> usize {
    decimal_digits(total).max(MIN_PAD_WIDTH)
}

/// File name for the 1-based `step` of a run of `total` images, e.g. `v-00003.png`.
///
/// Names sort lexicographically in step order within one run.
pub fn output_filename(prefix: &str, step: u64, total: u64) -> String {
    let width = pad_width(total);
    format!("{prefix}-{step:0width$}.png")
}

/// Trim a user-entered prefix, falling back to [`DEFAULT_PREFIX`] when nothing is left.
pub fn normalize_prefix(prefix: &str) -> String {
    let p = prefix.trim();
    if p.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        p.to_string()
    }
}

/// Steps completed so far out of the run total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Completed steps; 0 before the first step.
    pub current: u64,
    /// Combinations in the run.
    pub total: u64,
}

impl Progress {
    /// Progress after `step` completed steps.
    pub fn new(step: u64, total: u64) -> Self {
        Self {
            current: step,
            total,
        }
    }

    /// Completed fraction in `[0, 1]`; an empty total counts as done.
    pub fn fraction(self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.current as f64 / self.total as f64
    }

    /// Return `true` once every step ran.
    pub fn is_done(self) -> bool {
        self.current >= self.total
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bulk/naming.rs"]
mod tests;
