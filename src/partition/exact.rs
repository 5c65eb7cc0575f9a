use crate::error::{BenchError, Result};
use crate::partition::pair_hash;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const FRACTION_SUM_TOLERANCE: f64 = 1e-9;

/// Ordered output fractions for an exact split. They may sum to less than
/// one, in which case the remainder is a discarded residual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fractions(Vec<f64>);

impl Fractions {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(BenchError::parameter(
                "must specify fractions to split into (e.g. 0.1,0.8)",
            ));
        }
        for &v in &values {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(BenchError::parameter(format!(
                    "fraction {} is outside [0, 1]",
                    v
                )));
            }
        }
        let total: f64 = values.iter().sum();
        if total > 1.0 + FRACTION_SUM_TOLERANCE {
            return Err(BenchError::parameter(format!(
                "fractions sum to {}, which is more than 1",
                total
            )));
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pair-count boundaries: bucket `i` takes ranks `[cuts[i], cuts[i + 1])`.
    fn cuts(&self, pairs: usize) -> Vec<usize> {
        let mut cuts = Vec::with_capacity(self.0.len() + 1);
        cuts.push(0);
        let mut cumulative = 0.0;
        for &f in &self.0 {
            cumulative += f;
            let cut = ((cumulative * pairs as f64).round() as usize).min(pairs);
            cuts.push(cut);
        }
        cuts
    }
}

/// Pair name to bucket, fixed once per pair.
#[derive(Debug, Clone, Default)]
pub struct PartitionAssignment {
    buckets: HashMap<Vec<u8>, usize>,
    sizes: Vec<usize>,
    dropped: usize,
}

impl PartitionAssignment {
    /// Ranks the distinct pair names by their seeded hash and cuts the ranking
    /// at the cumulative fractions. Bucket sizes are exact to one pair.
    pub fn build<'a>(
        names: impl IntoIterator<Item = &'a [u8]>,
        fractions: &Fractions,
        seed: u64,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut ranked: Vec<(u64, &'a [u8])> = names
            .into_iter()
            .filter(|name| seen.insert(*name))
            .map(|name| (pair_hash(name, seed), name))
            .collect();
        ranked.sort_unstable();

        let cuts = fractions.cuts(ranked.len());
        let mut buckets = HashMap::with_capacity(ranked.len());
        let mut sizes = Vec::with_capacity(fractions.len());
        for (bucket, window) in cuts.windows(2).enumerate() {
            for &(_, name) in &ranked[window[0]..window[1]] {
                buckets.insert(name.to_vec(), bucket);
            }
            sizes.push(window[1] - window[0]);
        }
        let dropped = ranked.len() - cuts.last().copied().unwrap_or(0);

        Self {
            buckets,
            sizes,
            dropped,
        }
    }

    pub fn bucket_of(&self, pair_name: &[u8]) -> Option<usize> {
        self.buckets.get(pair_name).copied()
    }

    /// Pairs per bucket.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Pairs that fell in the residual and go nowhere.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn pair_count(&self) -> usize {
        self.sizes.iter().sum::<usize>() + self.dropped
    }
}

/// Result of an in-memory exact split: read indices per bucket.
#[derive(Debug, Clone)]
pub struct ExactPartition {
    pub buckets: Vec<Vec<usize>>,
    pub assignment: PartitionAssignment,
}
