use crate::error::{BenchError, Result};
use crate::io::alignments::{open_reader, open_writer, to_read_record};
use crate::partition::{
    DatasetPartitioner, Fractions, PairIndex, PartitionAssignment, RegionWeightTable,
};
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use log::info;
use rust_htslib::bam::record::Aux;
use rust_htslib::bam::Read;
use std::path::{Path, PathBuf};

/// Aux tag carrying the admitting region index in a fractionated BAM.
pub const FRACTION_TAG: &[u8] = b"FR";

const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg} {pos} records";

/// Record counts of one split or fractionation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub records_seen: u64,
    /// Records written, per output.
    pub written: Vec<u64>,
}

/// Streams a BAM file through a [`DatasetPartitioner`]. The input is only read.
pub struct BamSplitter {
    input: PathBuf,
    partitioner: DatasetPartitioner,
}

impl BamSplitter {
    pub fn new(input: impl Into<PathBuf>, partitioner: DatasetPartitioner) -> Self {
        Self {
            input: input.into(),
            partitioner,
        }
    }

    /// First pass over the input: where every pair aligns.
    fn index_pairs(&self) -> Result<PairIndex> {
        let progress = ProgressBarBuilder::new("Collecting read pairs")
            .with_template(SPINNER_TEMPLATE)
            .with_tick()
            .build()?;
        let mut index = PairIndex::new();
        let mut reader = open_reader(&self.input)?;
        let header = reader.header().clone();
        for result in reader.records() {
            let record = result.map_err(|e| BenchError::resource(&self.input, e))?;
            index.observe(&to_read_record(&record, &header));
            progress.inc(1);
        }
        progress.finish_with_message(format!("Collected {} pairs", index.len()));
        Ok(index)
    }

    /// One output per fraction. The first pass fixes the pair assignment,
    /// the second writes.
    pub fn split(&self, outputs: &[PathBuf], fractions: &Fractions) -> Result<SplitSummary> {
        if outputs.len() != fractions.len() {
            return Err(BenchError::parameter(format!(
                "{} output paths given for {} fractions",
                outputs.len(),
                fractions.len()
            )));
        }

        let index = self.index_pairs()?;
        let assignment = PartitionAssignment::build(
            index
                .iter()
                .filter(|(_, footprint)| self.partitioner.considers(footprint))
                .map(|(name, _)| name),
            fractions,
            self.partitioner.seed(),
        );
        info!(
            "assigned {} pairs, per output: {:?}, residual: {}",
            assignment.pair_count(),
            assignment.sizes(),
            assignment.dropped()
        );

        let mut reader = open_reader(&self.input)?;
        let header = reader.header().clone();
        let mut writers = outputs
            .iter()
            .map(|path| open_writer(path, &header))
            .collect::<Result<Vec<_>>>()?;

        let progress = ProgressBarBuilder::new("Writing subsampled BAMs")
            .with_template(SPINNER_TEMPLATE)
            .with_tick()
            .build()?;
        let mut summary = SplitSummary {
            records_seen: 0,
            written: vec![0; outputs.len()],
        };
        for result in reader.records() {
            let record = result.map_err(|e| BenchError::resource(&self.input, e))?;
            summary.records_seen += 1;
            progress.inc(1);
            let read = to_read_record(&record, &header);
            if !self.partitioner.considers(&index.footprint(&read)) {
                continue;
            }
            if let Some(bucket) = assignment.bucket_of(read.pair_name()) {
                writers[bucket]
                    .write(&record)
                    .map_err(|e| BenchError::resource(&outputs[bucket], e))?;
                summary.written[bucket] += 1;
            }
        }
        progress.finish_with_message("Split complete");
        Ok(summary)
    }

    /// Single output holding the weighted subsample, each record tagged with
    /// [`FRACTION_TAG`]. Like [`split`](Self::split) it reads the input twice.
    pub fn fractionate(&self, output: &Path, table: &RegionWeightTable) -> Result<SplitSummary> {
        table.ensure_not_empty()?;
        let index = self.index_pairs()?;

        let mut reader = open_reader(&self.input)?;
        let header = reader.header().clone();
        let mut writer = open_writer(output, &header)?;
        let progress = ProgressBarBuilder::new("Fractionating")
            .with_template(SPINNER_TEMPLATE)
            .with_tick()
            .build()?;

        let mut summary = SplitSummary {
            records_seen: 0,
            written: vec![0],
        };
        for result in reader.records() {
            let mut record = result.map_err(|e| BenchError::resource(&self.input, e))?;
            summary.records_seen += 1;
            progress.inc(1);
            let read = to_read_record(&record, &header);
            let footprint = index.footprint(&read);
            if !self.partitioner.considers(&footprint) {
                continue;
            }
            let Some(tag) = table.admit(read.pair_name(), &footprint, self.partitioner.seed())
            else {
                continue;
            };
            if record.aux(FRACTION_TAG).is_ok() {
                record
                    .remove_aux(FRACTION_TAG)
                    .map_err(|e| BenchError::resource(&self.input, e))?;
            }
            record
                .push_aux(FRACTION_TAG, Aux::I32(tag as i32))
                .map_err(|e| BenchError::resource(output, e))?;
            writer
                .write(&record)
                .map_err(|e| BenchError::resource(output, e))?;
            summary.written[0] += 1;
        }
        progress.finish_with_message(format!("Kept {} records", summary.written[0]));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::alignments::test_support::{write_pairs, write_records, Mapped};
    use crate::types::Region;
    use std::collections::{HashMap, HashSet};

    fn read_names(path: &Path) -> Vec<(Vec<u8>, bool)> {
        let mut reader = open_reader(path).unwrap();
        reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r.qname().to_vec(), r.is_first_in_template())
            })
            .collect()
    }

    fn input(dir: &Path, n: usize) -> PathBuf {
        let path = dir.join("input.bam");
        let pairs: Vec<(String, i32, i64, i64)> = (0..n)
            .map(|i| (format!("frag{}", i), 0, i as i64 * 100, i as i64 * 100 + 300))
            .collect();
        write_pairs(&path, &[("chr1", 1_000_000)], &pairs);
        path
    }

    #[test]
    fn split_keeps_pairs_together() {
        let dir = tempfile::tempdir().unwrap();
        let bam = input(dir.path(), 200);
        let outputs = vec![dir.path().join("a.bam"), dir.path().join("b.bam")];
        let fractions = Fractions::new(vec![0.5, 0.5]).unwrap();
        let summary = BamSplitter::new(&bam, DatasetPartitioner::new(42))
            .split(&outputs, &fractions)
            .unwrap();
        assert_eq!(summary.records_seen, 400);
        assert_eq!(summary.written, vec![200, 200]);

        let a = read_names(&outputs[0]);
        let b = read_names(&outputs[1]);
        let names_a: HashSet<_> = a.iter().map(|(n, _)| n.clone()).collect();
        let names_b: HashSet<_> = b.iter().map(|(n, _)| n.clone()).collect();
        assert!(names_a.is_disjoint(&names_b));
        for reads in [&a, &b] {
            let mut mates: HashMap<&Vec<u8>, usize> = HashMap::new();
            for (name, _) in reads.iter() {
                *mates.entry(name).or_default() += 1;
            }
            assert!(mates.values().all(|&c| c == 2));
        }
    }

    #[test]
    fn split_honours_region_restriction() {
        let dir = tempfile::tempdir().unwrap();
        let bam = input(dir.path(), 100);
        let outputs = vec![dir.path().join("only.bam")];
        let partitioner =
            DatasetPartitioner::new(1).with_regions(vec![Region::new("chr1", 0, 1000).unwrap()]);
        let summary = BamSplitter::new(&bam, partitioner)
            .split(&outputs, &Fractions::new(vec![1.0]).unwrap())
            .unwrap();
        // frag0..frag9 start below 1000; frag7..frag9 only via their first mate
        assert_eq!(summary.written, vec![20]);
    }

    #[test]
    fn fractionate_tags_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let bam = input(dir.path(), 50);
        let out = dir.path().join("fractioned.bam");
        let table = RegionWeightTable::new(vec![
            (Region::new("chr1", 0, 2000).unwrap(), 1.0),
            (Region::new("chr1", 2000, 10_000).unwrap(), 0.0),
        ])
        .unwrap();
        let summary = BamSplitter::new(&bam, DatasetPartitioner::new(3))
            .fractionate(&out, &table)
            .unwrap();
        assert_eq!(summary.written, vec![40]);

        let mut reader = open_reader(&out).unwrap();
        for r in reader.records() {
            let r = r.unwrap();
            assert!(r.pos() < 2000 || r.mpos() < 2000);
            assert_eq!(r.aux(FRACTION_TAG).unwrap(), Aux::I32(0));
        }
    }

    /// Pair `frag` at 5000/5200 with a supplementary piece of its first mate
    /// at 100, and pair `near` at 200/400.
    fn with_supplementary(dir: &Path) -> PathBuf {
        let path = dir.join("supplementary.bam");
        write_records(
            &path,
            &[("chr1", 100_000)],
            &[
                Mapped::new("frag", 0x1 | 0x2 | 0x40 | 0x800, 0, 100, 5200),
                Mapped::new("near", 0x1 | 0x2 | 0x40, 0, 200, 400),
                Mapped::new("near", 0x1 | 0x2 | 0x80, 0, 400, 200),
                Mapped::new("frag", 0x1 | 0x2 | 0x40, 0, 5000, 5200),
                Mapped::new("frag", 0x1 | 0x2 | 0x80, 0, 5200, 5000),
            ],
        );
        path
    }

    #[test]
    fn supplementary_records_follow_their_pair() {
        let dir = tempfile::tempdir().unwrap();
        let bam = with_supplementary(dir.path());

        let out = dir.path().join("fractioned.bam");
        let table = RegionWeightTable::new(vec![
            (Region::new("chr1", 0, 1000).unwrap(), 0.0),
            (Region::new("chr1", 1000, 10_000).unwrap(), 1.0),
        ])
        .unwrap();
        let summary = BamSplitter::new(&bam, DatasetPartitioner::new(11))
            .fractionate(&out, &table)
            .unwrap();
        assert_eq!(summary.written, vec![3]);
        let mut reader = open_reader(&out).unwrap();
        for r in reader.records() {
            let r = r.unwrap();
            assert_eq!(r.qname(), b"frag");
            assert_eq!(r.aux(FRACTION_TAG).unwrap(), Aux::I32(1));
        }

        let outputs = vec![dir.path().join("near.bam")];
        let partitioner =
            DatasetPartitioner::new(11).with_regions(vec![Region::new("chr1", 0, 1000).unwrap()]);
        let summary = BamSplitter::new(&bam, partitioner)
            .split(&outputs, &Fractions::new(vec![1.0]).unwrap())
            .unwrap();
        assert_eq!(summary.written, vec![2]);
        assert!(read_names(&outputs[0]).iter().all(|(n, _)| n == b"near"));
    }

    #[test]
    fn mismatched_outputs_are_rejected() {
        let splitter = BamSplitter::new("unused.bam", DatasetPartitioner::new(1));
        let fractions = Fractions::new(vec![0.5, 0.5]).unwrap();
        assert!(matches!(
            splitter.split(&[PathBuf::from("x.bam")], &fractions),
            Err(BenchError::Parameter(_))
        ));
    }
}
