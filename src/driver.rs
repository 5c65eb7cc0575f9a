//! Runs one benchmark mode end to end and records what it produced.

use crate::config::{
    BenchmarkMode, FractionSpec, GenomeSimulationConfig, PartitionConfig, ReadSweepConfig,
};
use crate::error::{BenchError, Result};
use crate::io::alignments::sample_qualities;
use crate::io::output::{
    write_breakpoints, write_fasta_reads, write_fastq, write_indels, write_json, write_sequence,
};
use crate::io::{FastaReference, ReferenceAccessor};
use crate::partition::{BamSplitter, DatasetPartitioner, SplitSummary};
use crate::sim::{QualityPool, RandomModel, ReadSampler, SyntheticGenomeBuilder};
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub const PAIRED_END_1: &str = "paired_end1.fastq";
pub const PAIRED_END_2: &str = "paired_end2.fastq";
pub const BREAKPOINT_LEDGER: &str = "connections.tsv";
pub const INDEL_LEDGER: &str = "indels.tsv";

const SWEEP_HEADER: &str =
    "run\tcoverage\tsnv\tdel\tins\tsingle_reads\tpairs\tsnv_injected\tins_injected\tdel_injected";

/// Summary of a finished run, also written as `<id>.manifest.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: &'static str,
    pub seed: u64,
    /// RFC 3339 start time.
    pub started_at: String,
    pub outputs: Vec<PathBuf>,
    /// Records written per output, for partitioning runs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records_written: Vec<u64>,
}

#[derive(Serialize)]
struct Manifest<'a> {
    #[serde(flatten)]
    report: &'a RunReport,
    run: &'a BenchmarkMode,
}

/// Owns the resolved seed. Every component downstream receives its random
/// stream from here.
#[derive(Debug, Clone)]
pub struct BenchmarkDriver {
    seed: u64,
}

impl BenchmarkDriver {
    /// `None` or `Some(0)` picks a time-based seed. The choice is logged so
    /// the run can be repeated.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = RandomModel::resolve_seed(seed);
        info!("Seed: {}", seed);
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run(&self, mode: &BenchmarkMode) -> Result<RunReport> {
        let started_at = Utc::now().to_rfc3339();
        info!("-----------------------------------------");
        info!("Mode: {}", mode.name());
        info!("Output id: {}", mode.string_id());
        mode.validate()?;

        let output_dir = mode.output_dir();
        fs::create_dir_all(output_dir).map_err(|e| BenchError::resource(output_dir, e))?;

        let (outputs, records_written) = match mode {
            BenchmarkMode::GenomeSimulation(config) => (self.simulate_genome(config)?, Vec::new()),
            BenchmarkMode::DatasetPartitioning(config) => {
                let (outputs, summary) = self.partition(config)?;
                (outputs, summary.written)
            }
            BenchmarkMode::ReadSweep(config) => (self.sweep(config)?, Vec::new()),
        };

        let report = RunReport {
            mode: mode.name(),
            seed: self.seed,
            started_at,
            outputs,
            records_written,
        };
        let manifest_path = output_dir.join(format!("{}.manifest.json", mode.string_id()));
        write_json(
            &manifest_path,
            &Manifest {
                report: &report,
                run: mode,
            },
        )?;
        info!("Manifest written to {}", manifest_path.display());
        Ok(report)
    }

    fn simulate_genome(&self, config: &GenomeSimulationConfig) -> Result<Vec<PathBuf>> {
        info!("Region: {}", config.region);
        info!(
            "Breaks: {}  Indels: {}  Coverage: {}",
            config.break_count, config.indel_count, config.coverage
        );
        info!(
            "SNV: {}  Del: {}  Ins: {}",
            config.errors.snv_rate, config.errors.del_rate, config.errors.ins_rate
        );
        info!(
            "Read length: {}  Insert: {} +/- {}",
            config.read_length, config.insert.mean, config.insert.sd
        );

        let pool = match &config.training_bam {
            Some(bam) => {
                info!("Sampling base qualities from {}", bam.display());
                sample_qualities(bam, &config.training_regions, config.quality_sample_limit)?
            }
            None => QualityPool::constant(),
        };

        let mut reference = FastaReference::open(&config.reference)?;
        let mut rng = RandomModel::new(self.seed);
        let genome = SyntheticGenomeBuilder::new(config.break_count, config.indel_count)
            .with_max_indel_length(config.max_indel_length)
            .build(&config.region, &mut reference, &mut rng)?;
        info!(
            "Simulated {} bp from {} bp ({} breakpoints, {} indels)",
            genome.sequence().len(),
            genome.original_length(),
            genome.breakpoints().len(),
            genome.indels().len()
        );

        let dir = &config.output_dir;
        let sim_fasta = dir.join(format!("{}.sim.fa", config.string_id));
        let breakpoint_path = dir.join(BREAKPOINT_LEDGER);
        let indel_path = dir.join(INDEL_LEDGER);
        let description = config.region.to_string();
        write_sequence(&sim_fasta, &config.string_id, Some(description.as_str()), genome.sequence())?;
        write_breakpoints(&breakpoint_path, genome.breakpoints())?;
        write_indels(&indel_path, genome.indels())?;

        let mut sampler = ReadSampler::new();
        sampler.add_allele(genome.sequence(), 1.0)?;
        let paired = sampler.sample_paired(
            config.coverage,
            &config.errors,
            config.read_length,
            config.insert,
            &mut rng,
        )?;
        debug!(
            "injected {} SNVs, {} insertions, {} deletions",
            paired.stats.snvs, paired.stats.insertions, paired.stats.deletions
        );
        info!("Sampled {} read pairs", paired.pairs.len());

        let (mate1, mate2) = paired.into_mates();
        let fastq1 = dir.join(PAIRED_END_1);
        let fastq2 = dir.join(PAIRED_END_2);
        write_fastq(&fastq1, &mate1, &pool, &mut rng)?;
        write_fastq(&fastq2, &mate2, &pool, &mut rng)?;

        info!(
            "Suggested alignment: bwa mem {} {} {} | samtools sort -o {}.bam",
            config.reference.display(),
            fastq1.display(),
            fastq2.display(),
            dir.join(&config.string_id).display()
        );

        Ok(vec![sim_fasta, breakpoint_path, indel_path, fastq1, fastq2])
    }

    fn partition(&self, config: &PartitionConfig) -> Result<(Vec<PathBuf>, SplitSummary)> {
        info!("Input: {}", config.input.display());
        let mut partitioner = DatasetPartitioner::new(self.seed);
        if !config.regions.is_empty() {
            info!("Restricting to {} region(s)", config.regions.len());
            partitioner = partitioner.with_regions(config.regions.clone());
        }
        let splitter = BamSplitter::new(&config.input, partitioner);

        match &config.fractions {
            FractionSpec::Exact(fractions) => {
                let outputs = exact_output_paths(config, fractions.values());
                info!("Fractions: {:?}", fractions.values());
                let summary = splitter.split(&outputs, fractions)?;
                for (path, n) in outputs.iter().zip(&summary.written) {
                    info!("Wrote {} records to {}", n, path.display());
                }
                Ok((outputs, summary))
            }
            FractionSpec::Weighted(table) => {
                info!("Weighted fractionation over {} region(s)", table.len());
                let output = config
                    .output_dir
                    .join(format!("{}.fractioned.bam", config.string_id));
                let summary = splitter.fractionate(&output, table)?;
                info!(
                    "Wrote {} of {} records to {}",
                    summary.written.first().copied().unwrap_or(0),
                    summary.records_seen,
                    output.display()
                );
                Ok((vec![output], summary))
            }
        }
    }

    fn sweep(&self, config: &ReadSweepConfig) -> Result<Vec<PathBuf>> {
        info!("Region: {}", config.region);
        info!("{}", config.coverages);
        info!("{}", config.snv_rates);
        info!("{}", config.del_rates);
        info!("{}", config.ins_rates);
        info!(
            "Runs: {}  Read length: {}  Insert: {} +/- {}",
            config.runs, config.read_length, config.insert.mean, config.insert.sd
        );

        let mut reference = FastaReference::open(&config.reference)?;
        let sequence = reference.fetch(&config.region)?;
        self.sweep_sequence(config, sequence)
    }

    /// The sweep over an already fetched region sequence.
    fn sweep_sequence(
        &self,
        config: &ReadSweepConfig,
        sequence: Vec<u8>,
    ) -> Result<Vec<PathBuf>> {
        let mut sampler = ReadSampler::new();
        sampler.add_allele(sequence, 1.0)?;

        let combinations = config.combinations();
        let total = (config.runs * combinations.len()) as u64;
        let progress = ProgressBarBuilder::new("Sampling")
            .with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .with_length(total)
            .build()?;

        let base = RandomModel::new(self.seed);
        let table_path = config
            .output_dir
            .join(format!("{}_sweep.tsv", config.string_id));
        let file = File::create(&table_path).map_err(|e| BenchError::resource(&table_path, e))?;
        let mut table = BufWriter::new(file);
        writeln!(table, "{}", SWEEP_HEADER).map_err(|e| BenchError::resource(&table_path, e))?;

        let mut outputs = vec![table_path.clone()];
        for run in 0..config.runs {
            for (combo, (coverage, errors)) in combinations.iter().enumerate() {
                let index = (run * combinations.len() + combo) as u64;
                let mut rng = base.sub_stream(index);
                let single =
                    sampler.sample_single(*coverage, errors, config.read_length, &mut rng)?;
                let paired = sampler.sample_paired(
                    *coverage,
                    errors,
                    config.read_length,
                    config.insert,
                    &mut rng,
                )?;

                writeln!(
                    table,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    run,
                    coverage,
                    errors.snv_rate,
                    errors.del_rate,
                    errors.ins_rate,
                    single.reads.len(),
                    paired.pairs.len(),
                    single.stats.snvs + paired.stats.snvs,
                    single.stats.insertions + paired.stats.insertions,
                    single.stats.deletions + paired.stats.deletions,
                )
                .map_err(|e| BenchError::resource(&table_path, e))?;

                if config.write_reads {
                    let stem = format!("{}_{}_{}", config.string_id, run, combo);
                    let single_path = config.output_dir.join(format!("{}_single.fa", stem));
                    let mate1_path = config.output_dir.join(format!("{}_1.fa", stem));
                    let mate2_path = config.output_dir.join(format!("{}_2.fa", stem));
                    write_fasta_reads(&single_path, &single.sequences())?;
                    let (mate1, mate2) = paired.into_mates();
                    write_fasta_reads(&mate1_path, &mate1)?;
                    write_fasta_reads(&mate2_path, &mate2)?;
                    outputs.extend([single_path, mate1_path, mate2_path]);
                }
                progress.inc(1);
            }
        }
        table
            .flush()
            .map_err(|e| BenchError::resource(&table_path, e))?;
        progress.finish_with_message("done");
        info!("Sweep table written to {}", table_path.display());
        Ok(outputs)
    }
}

/// `<id><fraction>_subsampled.bam` per fraction. Repeated fractions get a
/// 1-based ordinal so no two outputs share a path.
fn exact_output_paths(config: &PartitionConfig, fractions: &[f64]) -> Vec<PathBuf> {
    let repeated = |f: f64| fractions.iter().filter(|&&g| g == f).count() > 1;
    fractions
        .iter()
        .enumerate()
        .map(|(i, &f)| {
            let name = if repeated(f) {
                format!("{}{}.{}_subsampled.bam", config.string_id, f, i + 1)
            } else {
                format!("{}{}_subsampled.bam", config.string_id, f)
            };
            config.output_dir.join(name)
        })
        .collect()
}
