use crate::error::{BenchError, Result};
use crate::io::bed::read_bed;
use crate::partition::{pair_uniform, PairFootprint};
use crate::types::{ContigDictionary, Locus, Region};
use serde::Serialize;
use std::path::Path;

/// Region to retention weight. A pair anchored in a region is kept with
/// probability equal to that region's weight; pairs outside every region
/// count as weight zero.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionWeightTable {
    entries: Vec<(Region, f64)>,
}

/// A kept read and the table index of the region that admitted its pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedRead {
    pub index: usize,
    pub tag: usize,
}

impl RegionWeightTable {
    pub fn new(entries: Vec<(Region, f64)>) -> Result<Self> {
        for (region, weight) in &entries {
            if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
                return Err(BenchError::parameter(format!(
                    "weight {} for {} is outside [0, 1]",
                    weight, region
                )));
            }
        }
        Ok(Self { entries })
    }

    /// BED file with the weight in the fourth column.
    pub fn load(path: &Path, dict: Option<&ContigDictionary>) -> Result<Self> {
        let mut entries = Vec::new();
        for line in read_bed(path, dict)? {
            let raw = line.extra.first().ok_or_else(|| {
                BenchError::parameter(format!(
                    "{}: {} has no weight column",
                    path.display(),
                    line.region
                ))
            })?;
            let weight = raw.parse::<f64>().map_err(|_| {
                BenchError::parameter(format!(
                    "{}: could not convert '{}' to a number",
                    path.display(),
                    raw
                ))
            })?;
            entries.push((line.region, weight));
        }
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Region, f64)] {
        &self.entries
    }

    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.entries.is_empty() {
            Err(BenchError::EmptyFractionSpec)
        } else {
            Ok(())
        }
    }

    /// First region containing `locus`, with its weight.
    pub fn lookup(&self, locus: &Locus) -> Option<(usize, f64)> {
        self.entries
            .iter()
            .position(|(r, _)| r.contains(locus))
            .map(|i| (i, self.entries[i].1))
    }

    /// Decides a pair from its footprint's anchor: `Some(tag)` when kept.
    pub fn admit(&self, pair_name: &[u8], footprint: &PairFootprint, seed: u64) -> Option<usize> {
        let (tag, weight) = self.lookup(&footprint.anchor()?)?;
        if weight <= 0.0 {
            return None;
        }
        (pair_uniform(pair_name, seed) < weight).then_some(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::test_support::{pair, pairs, supplementary};
    use crate::partition::DatasetPartitioner;
    use std::collections::HashMap;
    use std::io::Write;

    fn r(chrom: &str, start: u64, end: u64) -> Region {
        Region::new(chrom, start, end).unwrap()
    }

    #[test]
    fn zero_weight_region_is_excluded() {
        // R1 holds read0..read9, R2 holds read10..read19
        let reads = pairs(20, "chr1", 1000);
        let table =
            RegionWeightTable::new(vec![(r("chr1", 0, 10_000), 1.0), (r("chr1", 10_000, 20_000), 0.0)])
                .unwrap();
        let kept = DatasetPartitioner::new(42)
            .partition_weighted(&reads, &table)
            .unwrap();
        assert_eq!(kept.len(), 20);
        assert!(kept.iter().all(|t| t.tag == 0));
        let mut per_name: HashMap<&[u8], Vec<bool>> = HashMap::new();
        for t in &kept {
            let read = &reads[t.index];
            assert!(read.locus.as_ref().unwrap().pos < 10_000);
            per_name.entry(read.pair_name()).or_default().push(read.first_mate);
        }
        assert_eq!(per_name.len(), 10);
        assert!(per_name.values().all(|m| m.len() == 2 && m[0] != m[1]));
    }

    #[test]
    fn partial_weight_subsamples_whole_pairs() {
        let reads = pairs(2000, "chr2", 10);
        let table = RegionWeightTable::new(vec![(r("chr2", 0, 1_000_000), 0.3)]).unwrap();
        let kept = DatasetPartitioner::new(5)
            .partition_weighted(&reads, &table)
            .unwrap();
        assert_eq!(kept.len() % 2, 0);
        let pairs_kept = kept.len() / 2;
        assert!((450..750).contains(&pairs_kept), "kept {} pairs", pairs_kept);
    }

    #[test]
    fn reads_outside_table_are_dropped() {
        let reads = pairs(5, "chrX", 100);
        let table = RegionWeightTable::new(vec![(r("chr1", 0, 1000), 1.0)]).unwrap();
        let kept = DatasetPartitioner::new(1)
            .partition_weighted(&reads, &table)
            .unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn empty_table_fails() {
        let reads = pairs(2, "chr1", 100);
        let err = DatasetPartitioner::new(1)
            .partition_weighted(&reads, &RegionWeightTable::default())
            .unwrap_err();
        assert!(matches!(err, BenchError::EmptyFractionSpec));
    }

    #[test]
    fn supplementary_takes_the_weight_of_its_pair() {
        let [a, b] = pair("frag", "chr1", 5000, 5200);
        let reads = vec![a, supplementary("frag", "chr1", 100, 5200), b];
        let table =
            RegionWeightTable::new(vec![(r("chr1", 0, 1000), 0.0), (r("chr1", 1000, 10_000), 1.0)])
                .unwrap();
        let kept = DatasetPartitioner::new(9)
            .partition_weighted(&reads, &table)
            .unwrap();
        assert_eq!(
            kept,
            vec![
                TaggedRead { index: 0, tag: 1 },
                TaggedRead { index: 1, tag: 1 },
                TaggedRead { index: 2, tag: 1 },
            ]
        );

        let restricted = DatasetPartitioner::new(9).with_regions(vec![r("chr1", 0, 1000)]);
        assert!(restricted.partition_weighted(&reads, &table).unwrap().is_empty());
    }

    #[test]
    fn loads_weights_from_bed() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "chr1\t0\t100\t0.25").unwrap();
        writeln!(f, "chr1\t100\t200\t1").unwrap();
        f.flush().unwrap();
        let table = RegionWeightTable::load(f.path(), None).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(&Locus::new("chr1", 150)), Some((1, 1.0)));
        assert_eq!(table.lookup(&Locus::new("chr1", 250)), None);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "chr1\t0\t100\t2.5").unwrap();
        bad.flush().unwrap();
        assert!(RegionWeightTable::load(bad.path(), None).is_err());
    }
}
