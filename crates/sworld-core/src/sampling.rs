//! Weighted random sampling over drop tables.
//!
//! [`AliasTable`] wraps `rand_distr`'s alias method: O(n) construction and
//! O(1) draws. [`DropTable`] layers level filtering on top of it and maps a
//! draw back to the position of the entry in the unfiltered list.

use rand::Rng;
use rand_distr::Distribution;
use rand_distr::weighted::{Error as WeightError, WeightedAliasIndex};

/// Errors raised while building a sampling table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SamplingError {
    /// No weights were supplied.
    #[error("cannot sample from an empty weight list")]
    Empty,

    /// A weight was negative, NaN, or infinite.
    #[error("weight at index {index} is not a finite non-negative number")]
    InvalidWeight {
        /// Position of the offending weight.
        index: usize,
    },

    /// Every weight was zero.
    #[error("weights sum to zero")]
    ZeroTotal,

    /// The alias table could not be built from otherwise valid weights.
    #[error("alias table rejected the weights: {source}")]
    Table {
        /// The underlying distribution error.
        #[from]
        source: WeightError,
    },
}

/// Alias-method table over a fixed weight vector.
#[derive(Debug, Clone)]
pub struct AliasTable {
    index: WeightedAliasIndex<f64>,
    len: usize,
}

impl AliasTable {
    /// Build a table whose draws return index `i` with probability
    /// `weights[i] / sum(weights)`.
    pub fn new(weights: &[f64]) -> Result<Self, SamplingError> {
        if weights.is_empty() {
            return Err(SamplingError::Empty);
        }
        if let Some(index) = weights.iter().position(|w| !w.is_finite() || *w < 0.0) {
            return Err(SamplingError::InvalidWeight { index });
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(SamplingError::ZeroTotal);
        }

        Ok(Self {
            index: WeightedAliasIndex::new(weights.to_vec())?,
            len: weights.len(),
        })
    }

    /// Number of outcomes.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false for a successfully built table.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Draw one index.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }
}

/// A level-filtered table over a zone's drop entries.
///
/// Only entries whose minimum level does not exceed the portal level take
/// part in the draw. `indices` remembers where each surviving entry sits in
/// the unfiltered list, so a draw is reported in the caller's numbering.
#[derive(Debug, Clone)]
pub struct DropTable {
    indices: Vec<usize>,
    table: Option<AliasTable>,
}

impl DropTable {
    /// Compile a table from `(min_level, weight)` pairs for a portal of
    /// the given level. No entry passing the filter yields an empty table
    /// that never drops anything.
    pub fn compile<I>(entries: I, level: u32) -> Result<Self, SamplingError>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let (indices, weights): (Vec<usize>, Vec<f64>) = entries
            .into_iter()
            .enumerate()
            .filter(|(_, (min_level, _))| *min_level <= level)
            .map(|(index, (_, weight))| (index, weight))
            .unzip();

        if indices.is_empty() {
            return Ok(Self {
                indices,
                table: None,
            });
        }
        let table = AliasTable::new(&weights).map_err(|err| match err {
            SamplingError::InvalidWeight { index } => SamplingError::InvalidWeight {
                index: indices.get(index).copied().unwrap_or(index),
            },
            other => other,
        })?;
        Ok(Self {
            indices,
            table: Some(table),
        })
    }

    /// Positions (in the unfiltered list) of the entries that can drop.
    pub fn eligible(&self) -> &[usize] {
        &self.indices
    }

    /// Draw an entry, returned as its position in the unfiltered list.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let table = self.table.as_ref()?;
        self.indices.get(table.sample(rng)).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::cast_precision_loss)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn histogram(table: &AliasTable, draws: usize, seed: u64) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts = vec![0; table.len()];
        for _ in 0..draws {
            counts[table.sample(&mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn rejects_bad_weights() {
        assert_eq!(AliasTable::new(&[]).unwrap_err(), SamplingError::Empty);
        assert_eq!(
            AliasTable::new(&[1.0, -2.0]).unwrap_err(),
            SamplingError::InvalidWeight { index: 1 }
        );
        assert_eq!(
            AliasTable::new(&[1.0, f64::NAN]).unwrap_err(),
            SamplingError::InvalidWeight { index: 1 }
        );
        assert_eq!(
            AliasTable::new(&[0.0, 0.0]).unwrap_err(),
            SamplingError::ZeroTotal
        );
    }

    #[test]
    fn single_outcome_always_drawn() {
        let table = AliasTable::new(&[3.5]).unwrap();
        assert_eq!(histogram(&table, 100, 1), vec![100]);
    }

    #[test]
    fn zero_weight_never_drawn() {
        let table = AliasTable::new(&[1.0, 0.0, 1.0]).unwrap();
        let counts = histogram(&table, 10_000, 7);
        assert_eq!(counts[1], 0);
        assert!(counts[0] > 0 && counts[2] > 0);
    }

    #[test]
    fn frequencies_follow_weights() {
        let weights = [10.0, 50.0, 15.0, 25.0];
        let table = AliasTable::new(&weights).unwrap();
        let draws = 100_000;
        let counts = histogram(&table, draws, 42);
        for (count, weight) in counts.iter().zip(weights) {
            let observed = *count as f64 / draws as f64;
            let expected = weight / 100.0;
            assert!(
                (observed - expected).abs() < 0.01,
                "observed {observed} expected {expected}"
            );
        }
    }

    #[test]
    fn filter_maps_back_to_original_positions() {
        // Only the entries at positions 0 and 3 are reachable at level 1.
        let entries = [(0, 1.0), (2, 100.0), (5, 100.0), (1, 1.0)];
        let table = DropTable::compile(entries, 1).unwrap();
        assert_eq!(table.eligible(), &[0, 3]);

        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [0_usize; 4];
        for _ in 0..1_000 {
            seen[table.sample(&mut rng).unwrap()] += 1;
        }
        assert_eq!(seen[1], 0);
        assert_eq!(seen[2], 0);
        assert!(seen[0] > 0 && seen[3] > 0);
    }

    #[test]
    fn nothing_eligible_never_drops() {
        let table = DropTable::compile([(3, 1.0), (4, 1.0)], 1).unwrap();
        assert!(table.eligible().is_empty());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(table.sample(&mut rng), None);
    }

    #[test]
    fn invalid_weight_reported_in_original_numbering() {
        let err = DropTable::compile([(9, 1.0), (0, 1.0), (0, -1.0)], 0).unwrap_err();
        assert_eq!(err, SamplingError::InvalidWeight { index: 2 });
    }
}
