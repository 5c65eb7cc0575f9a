//! Pair-preserving partitioning of read collections.
//!
//! Every decision is keyed on the pair's query name and taken from the pair's
//! primary alignments, so both mates (and any secondary or supplementary
//! records) always land in the same place.

pub mod bam;
pub mod exact;
pub mod weighted;

use crate::error::Result;
use crate::types::{Locus, Region};
use seahash::SeaHasher;
use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::Hasher;

pub use bam::{BamSplitter, SplitSummary};
pub use exact::{ExactPartition, Fractions, PartitionAssignment};
pub use weighted::{RegionWeightTable, TaggedRead};

/// The parts of an alignment record the partitioner looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub qname: Vec<u8>,
    pub first_mate: bool,
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
    /// Secondary (0x100) or supplementary (0x800) alignment.
    pub secondary: bool,
    /// Own mapped position, if mapped.
    pub locus: Option<Locus>,
    /// Exclusive end of the own alignment.
    pub end: Option<u64>,
    /// Mate's mapped position, if paired and the mate is mapped.
    pub mate_locus: Option<Locus>,
    /// Exclusive end of the mate's alignment, from its `MC` tag or estimated
    /// from this read's length.
    pub mate_end: Option<u64>,
}

impl ReadRecord {
    /// Query name without a trailing `/1` or `/2`.
    pub fn pair_name(&self) -> &[u8] {
        pair_name(&self.qname)
    }

    /// What this record alone says about where its pair aligns.
    pub fn footprint(&self) -> PairFootprint {
        PairFootprint {
            own: span(self.locus.as_ref(), self.end).into_iter().collect(),
            mates: span(self.mate_locus.as_ref(), self.mate_end)
                .into_iter()
                .collect(),
        }
    }
}

fn span(locus: Option<&Locus>, end: Option<u64>) -> Option<Region> {
    let locus = locus?;
    Some(Region {
        chrom: locus.chrom.clone(),
        start: locus.pos,
        end: end.unwrap_or(0).max(locus.pos + 1),
    })
}

/// Reference intervals covered by a pair's alignments. Intervals seen from a
/// record's own coordinates take precedence over estimates made from its mate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairFootprint {
    own: Vec<Region>,
    mates: Vec<Region>,
}

impl PairFootprint {
    fn merge(&mut self, other: PairFootprint) {
        for span in other.own {
            if !self.own.contains(&span) {
                self.own.push(span);
            }
        }
        for span in other.mates {
            if !self.mates.contains(&span) {
                self.mates.push(span);
            }
        }
    }

    fn spans(&self) -> impl Iterator<Item = &Region> + '_ {
        let own = &self.own;
        own.iter().chain(
            self.mates
                .iter()
                .filter(move |m| !own.iter().any(|o| o.chrom == m.chrom && o.start == m.start)),
        )
    }

    /// Leftmost alignment start; the position that represents the whole pair.
    pub fn anchor(&self) -> Option<Locus> {
        self.spans()
            .min_by(|a, b| (&a.chrom, a.start).cmp(&(&b.chrom, b.start)))
            .map(|s| Locus::new(s.chrom.clone(), s.start))
    }

    pub fn overlaps(&self, region: &Region) -> bool {
        self.spans().any(|s| s.overlaps(region))
    }
}

/// Pair name to footprint. Primary records decide; secondary and
/// supplementary records only count for names that have no primary.
#[derive(Debug, Clone, Default)]
pub struct PairIndex {
    pairs: HashMap<Vec<u8>, (bool, PairFootprint)>,
}

impl PairIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ReadRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.observe(record);
        }
        index
    }

    pub fn observe(&mut self, record: &ReadRecord) {
        let primary = !record.secondary;
        let footprint = record.footprint();
        match self.pairs.get_mut(record.pair_name()) {
            Some((known_primary, known)) if *known_primary == primary => known.merge(footprint),
            Some((known_primary, known)) => {
                if primary {
                    *known_primary = true;
                    *known = footprint;
                }
            }
            None => {
                self.pairs
                    .insert(record.pair_name().to_vec(), (primary, footprint));
            }
        }
    }

    /// Footprint of the record's pair; an unobserved record stands for itself.
    pub fn footprint(&self, record: &ReadRecord) -> Cow<'_, PairFootprint> {
        match self.pairs.get(record.pair_name()) {
            Some((_, footprint)) => Cow::Borrowed(footprint),
            None => Cow::Owned(record.footprint()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &PairFootprint)> + '_ {
        self.pairs
            .iter()
            .map(|(name, (_, footprint))| (name.as_slice(), footprint))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

pub fn pair_name(qname: &[u8]) -> &[u8] {
    match qname {
        [head @ .., b'/', b'1' | b'2'] => head,
        _ => qname,
    }
}

/// Reproducible hash of a pair name under `seed`.
pub fn pair_hash(name: &[u8], seed: u64) -> u64 {
    let mut hasher = SeaHasher::new();
    hasher.write_u64(seed);
    hasher.write(name);
    hasher.finish()
}

/// Maps a pair hash onto `[0, 1)`.
pub fn pair_uniform(name: &[u8], seed: u64) -> f64 {
    (pair_hash(name, seed) >> 11) as f64 / (1u64 << 53) as f64
}

/// Splits read collections without ever separating mates or duplicating a read.
#[derive(Debug, Clone)]
pub struct DatasetPartitioner {
    seed: u64,
    regions: Option<Vec<Region>>,
}

impl DatasetPartitioner {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            regions: None,
        }
    }

    /// Only pairs with an alignment overlapping one of `regions` are considered.
    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = if regions.is_empty() {
            None
        } else {
            Some(regions)
        };
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn regions(&self) -> Option<&[Region]> {
        self.regions.as_deref()
    }

    pub fn considers(&self, footprint: &PairFootprint) -> bool {
        match &self.regions {
            None => true,
            Some(regions) => regions.iter().any(|r| footprint.overlaps(r)),
        }
    }

    /// Disjoint split into one bucket per fraction; the residual is dropped.
    pub fn partition_exact(&self, reads: &[ReadRecord], fractions: &Fractions) -> ExactPartition {
        let index = PairIndex::from_records(reads);
        let considered: Vec<usize> = (0..reads.len())
            .filter(|&i| self.considers(&index.footprint(&reads[i])))
            .collect();
        let assignment = PartitionAssignment::build(
            considered.iter().map(|&i| reads[i].pair_name()),
            fractions,
            self.seed,
        );
        let mut buckets = vec![Vec::new(); fractions.len()];
        for &i in &considered {
            if let Some(b) = assignment.bucket_of(reads[i].pair_name()) {
                buckets[b].push(i);
            }
        }
        ExactPartition {
            buckets,
            assignment,
        }
    }

    /// Region-weighted subsample; each kept read carries the index of the
    /// table region that admitted its pair.
    pub fn partition_weighted(
        &self,
        reads: &[ReadRecord],
        table: &RegionWeightTable,
    ) -> Result<Vec<TaggedRead>> {
        table.ensure_not_empty()?;
        let index = PairIndex::from_records(reads);
        Ok(reads
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let footprint = index.footprint(r);
                if !self.considers(&footprint) {
                    return None;
                }
                table
                    .admit(r.pair_name(), &footprint, self.seed)
                    .map(|tag| TaggedRead { index: i, tag })
            })
            .collect())
    }
}
