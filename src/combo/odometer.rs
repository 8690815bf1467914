use crate::foundation::error::{EneftyError, EneftyResult};

/// One variant index per participating layer, in participating-layer order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination(pub Vec<usize>);

impl Combination {
    /// Variant indices.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// The full cartesian product of `[0, c0) x [0, c1) x ...`, addressable by a 0-based index.
///
/// Ordering is odometer order: the last layer varies fastest and the first layer is the most
/// significant digit. The same counts always yield the same sequence, which is what lets a run
/// resume from a bare cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinationSpace {
    counts: Vec<usize>,
    total: u64,
}

impl CombinationSpace {
    /// Build a space from per-layer variant counts.
    ///
    /// Every count must be at least 1, there must be at least one layer, and the product must fit
    /// in a `u64`.
    pub fn new(counts: Vec<usize>) -> EneftyResult<Self> {
        if counts.is_empty() {
            return Err(EneftyError::validation("no layers to combine"));
        }
        let mut total: u64 = 1;
        for (i, &c) in counts.iter().enumerate() {
            if c == 0 {
                return Err(EneftyError::validation(format!(
                    "layer {i} has no variants to combine"
                )));
            }
            total = total
                .checked_mul(c as u64)
                .ok_or_else(|| EneftyError::validation("combination count overflows u64"))?;
        }
        Ok(Self { counts, total })
    }

    /// Per-layer variant counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Number of combinations (product of counts).
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Decode the combination at `index`, `None` past the end.
    pub fn nth(&self, index: u64) -> Option<Combination> {
        if index >= self.total {
            return None;
        }
        let mut digits = vec![0usize; self.counts.len()];
        let mut rest = index;
        for (d, &c) in digits.iter_mut().zip(&self.counts).rev() {
            let c = c as u64;
            *d = (rest % c) as usize;
            rest /= c;
        }
        Some(Combination(digits))
    }

    /// Lazily walk every combination from the start.
    pub fn iter(&self) -> Odometer<'_> {
        self.iter_from(0)
    }

    /// Lazily walk combinations starting at `start` (clamped to the end).
    pub fn iter_from(&self, start: u64) -> Odometer<'_> {
        let start = start.min(self.total);
        let digits = self
            .nth(start)
            .map(|c| c.0)
            .unwrap_or_else(|| vec![0; self.counts.len()]);
        Odometer {
            counts: &self.counts,
            digits,
            position: start,
            total: self.total,
        }
    }
}

/// Lazy iterator over a [`CombinationSpace`].
#[derive(Clone, Debug)]
pub struct Odometer<'a> {
    counts: &'a [usize],
    digits: Vec<usize>,
    position: u64,
    total: u64,
}

impl Odometer<'_> {
    /// Index of the combination the next call to `next` returns.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Iterator for Odometer<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.position >= self.total {
            return None;
        }
        let out = Combination(self.digits.clone());
        for (d, &c) in self.digits.iter_mut().zip(self.counts).rev() {
            *d += 1;
            if *d < c {
                break;
            }
            *d = 0;
        }
        self.position += 1;
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.position;
        match usize::try_from(left) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Materialize the whole product for `counts`.
///
/// Prefer [`CombinationSpace`] for large inputs; this is a convenience for small stacks.
pub fn enumerate(counts: &[usize]) -> EneftyResult<Vec<Combination>> {
    let space = CombinationSpace::new(counts.to_vec())?;
    Ok(space.iter().collect())
}

#[cfg(test)]
#[path = "../../tests/unit/combo/odometer.rs"]
mod tests;
