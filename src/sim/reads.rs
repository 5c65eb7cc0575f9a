//! Coverage-driven read sampling with per-read error injection.

use crate::error::{BenchError, Result};
use crate::sim::random::RandomModel;
use bio::alphabets::dna;
use serde::Serialize;

/// A haplotype sequence and its relative sampling weight.
#[derive(Debug, Clone)]
pub struct Allele {
    pub sequence: Vec<u8>,
    pub weight: f64,
}

/// Error rates applied to every sampled read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorProfile {
    /// Per-base substitution probability.
    pub snv_rate: f64,
    /// Per-read probability of one inserted base.
    pub ins_rate: f64,
    /// Per-read probability of one deleted base.
    pub del_rate: f64,
}

impl ErrorProfile {
    pub fn new(snv_rate: f64, ins_rate: f64, del_rate: f64) -> Self {
        Self {
            snv_rate,
            ins_rate,
            del_rate,
        }
    }

    pub fn error_free() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("SNV", self.snv_rate),
            ("insertion", self.ins_rate),
            ("deletion", self.del_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(BenchError::parameter(format!(
                    "{} rate {} is outside [0, 1]",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsertSize {
    pub mean: f64,
    pub sd: f64,
}

impl InsertSize {
    pub fn new(mean: f64, sd: f64) -> Self {
        Self { mean, sd }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.mean.is_finite() || self.mean <= 0.0 {
            return Err(BenchError::parameter(format!(
                "insert size mean must be positive, got {}",
                self.mean
            )));
        }
        if !self.sd.is_finite() || self.sd < 0.0 {
            return Err(BenchError::parameter(format!(
                "insert size standard deviation must not be negative, got {}",
                self.sd
            )));
        }
        Ok(())
    }
}

/// Counts of injected errors, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SamplingStats {
    pub snvs: usize,
    pub insertions: usize,
    pub deletions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedRead {
    pub sequence: Vec<u8>,
    pub allele: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub mate1: Vec<u8>,
    /// Reverse complement of the downstream end of the fragment.
    pub mate2: Vec<u8>,
    pub allele: usize,
    /// Fragment start on the allele.
    pub offset: usize,
    pub insert_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SingleReads {
    pub reads: Vec<SimulatedRead>,
    pub stats: SamplingStats,
}

impl SingleReads {
    pub fn sequences(&self) -> Vec<Vec<u8>> {
        self.reads.iter().map(|r| r.sequence.clone()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PairedReads {
    pub pairs: Vec<ReadPair>,
    pub stats: SamplingStats,
}

impl PairedReads {
    pub fn into_mates(self) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
        self.pairs.into_iter().map(|p| (p.mate1, p.mate2)).unzip()
    }
}

/// Draws reads from one or more weighted alleles.
#[derive(Debug, Clone, Default)]
pub struct ReadSampler {
    alleles: Vec<Allele>,
}

impl ReadSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_allele(&mut self, sequence: impl Into<Vec<u8>>, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(BenchError::parameter(format!(
                "allele weight must be a non-negative number, got {}",
                weight
            )));
        }
        let mut sequence = sequence.into();
        sequence.make_ascii_uppercase();
        self.alleles.push(Allele { sequence, weight });
        Ok(())
    }

    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// `ceil(coverage * locus_length / read_length)`, where the locus length is
    /// the weight-averaged allele length.
    pub fn target_read_count(&self, coverage: f64, read_length: usize) -> usize {
        let total_weight: f64 = self.alleles.iter().map(|a| a.weight).sum();
        if total_weight <= 0.0 || read_length == 0 {
            return 0;
        }
        let locus_length: f64 = self
            .alleles
            .iter()
            .map(|a| a.weight * a.sequence.len() as f64)
            .sum::<f64>()
            / total_weight;
        (coverage * locus_length / read_length as f64).ceil() as usize
    }

    pub fn sample_single(
        &self,
        coverage: f64,
        errors: &ErrorProfile,
        read_length: usize,
        rng: &mut RandomModel,
    ) -> Result<SingleReads> {
        self.check(coverage, errors, read_length)?;
        let count = self.target_read_count(coverage, read_length);
        let mut out = SingleReads::default();
        for (allele_id, n) in self.apportion(count).into_iter().enumerate() {
            let seq = &self.alleles[allele_id].sequence;
            for _ in 0..n {
                let offset = rng.range_inclusive(0, seq.len() - read_length);
                let mut read = seq[offset..offset + read_length].to_vec();
                let tail = seq[offset + read_length..].iter().copied();
                inject_errors(&mut read, tail, errors, rng, &mut out.stats);
                out.reads.push(SimulatedRead {
                    sequence: read,
                    allele: allele_id,
                    offset,
                });
            }
        }
        Ok(out)
    }

    pub fn sample_paired(
        &self,
        coverage: f64,
        errors: &ErrorProfile,
        read_length: usize,
        insert: InsertSize,
        rng: &mut RandomModel,
    ) -> Result<PairedReads> {
        self.check(coverage, errors, read_length)?;
        let pair_count = self.target_read_count(coverage, read_length).div_ceil(2);
        let mut out = PairedReads::default();
        for (allele_id, n) in self.apportion(pair_count).into_iter().enumerate() {
            let seq = &self.alleles[allele_id].sequence;
            for _ in 0..n {
                let drawn = rng.normal(insert.mean, insert.sd).round();
                let insert_size = (drawn.max(0.0) as usize).clamp(read_length, seq.len());
                let offset = rng.range_inclusive(0, seq.len() - insert_size);
                let fragment_end = offset + insert_size;

                let mut mate1 = seq[offset..offset + read_length].to_vec();
                let tail1 = seq[offset + read_length..].iter().copied();
                inject_errors(&mut mate1, tail1, errors, rng, &mut out.stats);

                let window = fragment_end - read_length;
                let mut mate2 = dna::revcomp(&seq[window..fragment_end]);
                let tail2 = seq[..window].iter().rev().map(|&b| dna::complement(b));
                inject_errors(&mut mate2, tail2, errors, rng, &mut out.stats);

                out.pairs.push(ReadPair {
                    mate1,
                    mate2,
                    allele: allele_id,
                    offset,
                    insert_size,
                });
            }
        }
        Ok(out)
    }

    fn check(&self, coverage: f64, errors: &ErrorProfile, read_length: usize) -> Result<()> {
        if self.alleles.is_empty() {
            return Err(BenchError::parameter("no alleles to sample from"));
        }
        if self.alleles.iter().all(|a| a.weight == 0.0) {
            return Err(BenchError::parameter("all allele weights are zero"));
        }
        if read_length == 0 {
            return Err(BenchError::parameter("read length must be positive"));
        }
        if !coverage.is_finite() || coverage <= 0.0 {
            return Err(BenchError::parameter(format!(
                "coverage must be positive, got {}",
                coverage
            )));
        }
        errors.validate()?;
        let shortest = self
            .alleles
            .iter()
            .map(|a| a.sequence.len())
            .min()
            .unwrap_or(0);
        if read_length > shortest {
            return Err(BenchError::AlleleTooShort {
                read_length,
                allele_length: shortest,
            });
        }
        Ok(())
    }

    /// Splits `total` across alleles by weight (largest remainder). Zero-weight
    /// alleles always get nothing.
    fn apportion(&self, total: usize) -> Vec<usize> {
        let weight_sum: f64 = self.alleles.iter().map(|a| a.weight).sum();
        let quotas: Vec<f64> = self
            .alleles
            .iter()
            .map(|a| total as f64 * a.weight / weight_sum)
            .collect();
        let mut counts: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
        let mut remaining = total.saturating_sub(counts.iter().sum());

        let mut order: Vec<usize> = (0..quotas.len())
            .filter(|&i| self.alleles[i].weight > 0.0)
            .collect();
        order.sort_by(|&a, &b| {
            let ra = quotas[a] - quotas[a].floor();
            let rb = quotas[b] - quotas[b].floor();
            rb.total_cmp(&ra).then(a.cmp(&b))
        });
        for &i in order.iter().cycle() {
            if remaining == 0 {
                break;
            }
            counts[i] += 1;
            remaining -= 1;
        }
        counts
    }
}

/// SNV pass over every base, then at most one insertion, then at most one
/// deletion. The read keeps its length: insertions push the last base out,
/// deletions pull the next base in from `tail` (or a random base at the
/// allele boundary).
fn inject_errors(
    read: &mut Vec<u8>,
    mut tail: impl Iterator<Item = u8>,
    errors: &ErrorProfile,
    rng: &mut RandomModel,
    stats: &mut SamplingStats,
) {
    let read_length = read.len();

    for base in read.iter_mut() {
        if rng.chance(errors.snv_rate) {
            *base = rng.alternate_base(*base);
            stats.snvs += 1;
        }
    }

    if rng.chance(errors.ins_rate) {
        let pos = rng.range_inclusive(0, read_length);
        let base = rng.base();
        read.insert(pos, base);
        read.truncate(read_length);
        stats.insertions += 1;
    }

    if rng.chance(errors.del_rate) {
        let pos = rng.range(0, read_length);
        read.remove(pos);
        let pad = match tail.next() {
            Some(b) => b,
            None => rng.base(),
        };
        read.push(pad);
        stats.deletions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler(len: usize) -> (ReadSampler, Vec<u8>) {
        let seq = RandomModel::new(11).bases(len);
        let mut s = ReadSampler::new();
        s.add_allele(seq.clone(), 1.0).unwrap();
        (s, seq)
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn coverage_sets_read_count() {
        let (s, _) = sampler(1000);
        let mut rng = RandomModel::new(42);
        let reads = s
            .sample_single(10.0, &ErrorProfile::new(0.01, 0.05, 0.05), 100, &mut rng)
            .unwrap();
        assert_eq!(reads.reads.len(), 100);
        assert!(reads.reads.iter().all(|r| r.sequence.len() == 100));
    }

    #[test]
    fn paired_reads_have_equal_mates_and_length() {
        let (s, _) = sampler(2000);
        let mut rng = RandomModel::new(42);
        let pairs = s
            .sample_paired(
                15.0,
                &ErrorProfile::new(0.02, 0.3, 0.3),
                101,
                InsertSize::new(350.0, 50.0),
                &mut rng,
            )
            .unwrap();
        // ceil(15 * 2000 / 101) = 298 reads, 149 pairs
        assert_eq!(pairs.pairs.len(), 149);
        let (m1, m2) = pairs.into_mates();
        assert_eq!(m1.len(), m2.len());
        assert!(m1.iter().chain(m2.iter()).all(|r| r.len() == 101));
    }

    #[test]
    fn error_free_reads_are_substrings() {
        let (s, seq) = sampler(1500);
        let rc = dna::revcomp(&seq);
        let mut rng = RandomModel::new(3);
        let single = s
            .sample_single(5.0, &ErrorProfile::error_free(), 75, &mut rng)
            .unwrap();
        for r in &single.reads {
            assert_eq!(&seq[r.offset..r.offset + 75], r.sequence.as_slice());
        }
        let pairs = s
            .sample_paired(
                5.0,
                &ErrorProfile::error_free(),
                75,
                InsertSize::new(300.0, 40.0),
                &mut rng,
            )
            .unwrap();
        for p in &pairs.pairs {
            assert!(contains(&seq, &p.mate1));
            assert!(contains(&rc, &p.mate2));
            let end = p.offset + p.insert_size;
            assert_eq!(dna::revcomp(&seq[end - 75..end]), p.mate2);
        }
        assert_eq!(pairs.stats, SamplingStats::default());
    }

    #[test]
    fn read_longer_than_allele_fails() {
        let (s, _) = sampler(50);
        let mut rng = RandomModel::new(1);
        let err = s
            .sample_single(10.0, &ErrorProfile::error_free(), 51, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            BenchError::AlleleTooShort {
                read_length: 51,
                allele_length: 50
            }
        ));
    }

    #[test]
    fn zero_weight_alleles_are_never_sampled() {
        let mut s = ReadSampler::new();
        s.add_allele(RandomModel::new(1).bases(500), 1.0).unwrap();
        s.add_allele(RandomModel::new(2).bases(500), 0.0).unwrap();
        s.add_allele(RandomModel::new(3).bases(500), 3.0).unwrap();
        let mut rng = RandomModel::new(9);
        let reads = s
            .sample_single(8.0, &ErrorProfile::error_free(), 50, &mut rng)
            .unwrap();
        assert_eq!(reads.reads.len(), 80);
        assert!(reads.reads.iter().all(|r| r.allele != 1));
        assert_eq!(reads.reads.iter().filter(|r| r.allele == 0).count(), 20);
        assert_eq!(reads.reads.iter().filter(|r| r.allele == 2).count(), 60);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let (s, _) = sampler(800);
        let run = || {
            let mut rng = RandomModel::new(1234);
            s.sample_paired(
                10.0,
                &ErrorProfile::new(0.05, 0.5, 0.5),
                60,
                InsertSize::new(200.0, 30.0),
                &mut rng,
            )
            .unwrap()
            .into_mates()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn indel_errors_keep_read_length() {
        let mut rng = RandomModel::new(5);
        let mut stats = SamplingStats::default();
        for _ in 0..200 {
            let mut read = b"ACGTACGTAC".to_vec();
            inject_errors(
                &mut read,
                std::iter::empty(),
                &ErrorProfile::new(0.0, 1.0, 1.0),
                &mut rng,
                &mut stats,
            );
            assert_eq!(read.len(), 10);
        }
        assert_eq!(stats.insertions, 200);
        assert_eq!(stats.deletions, 200);
        assert_eq!(stats.snvs, 0);
    }
}
