use crate::error::{BenchError, Result};
use crate::partition::{Fractions, RegionWeightTable};
use crate::sim::{ErrorProfile, ErrorRateSet, InsertSize};
use crate::types::Region;
use serde::Serialize;
use std::path::PathBuf;

/// Inputs of one synthetic genome run. Built once from flags and [`Config`]
/// defaults, then only read.
///
/// [`Config`]: crate::config::Config
#[derive(Debug, Clone, Serialize)]
pub struct GenomeSimulationConfig {
    pub reference: PathBuf,
    pub region: Region,
    pub break_count: usize,
    pub indel_count: usize,
    pub max_indel_length: usize,
    pub coverage: f64,
    pub errors: ErrorProfile,
    pub read_length: usize,
    pub insert: InsertSize,
    /// BAM whose quality strings are borrowed for the FASTQ output.
    pub training_bam: Option<PathBuf>,
    pub training_regions: Vec<Region>,
    pub quality_sample_limit: usize,
    pub output_dir: PathBuf,
    pub string_id: String,
}

fn check_read_length(read_length: usize) -> Result<()> {
    if read_length == 0 {
        return Err(BenchError::parameter("read length must be positive"));
    }
    Ok(())
}

fn check_coverage(coverage: f64) -> Result<()> {
    if !coverage.is_finite() || coverage <= 0.0 {
        return Err(BenchError::parameter(format!(
            "coverage must be positive, got {}",
            coverage
        )));
    }
    Ok(())
}

impl GenomeSimulationConfig {
    /// Rejects settings that could only fail once outputs exist.
    pub fn validate(&self) -> Result<()> {
        check_read_length(self.read_length)?;
        check_coverage(self.coverage)?;
        self.errors.validate()?;
        self.insert.validate()?;
        if self.indel_count > 0 && self.max_indel_length == 0 {
            return Err(BenchError::parameter("maximum indel length must be positive"));
        }
        Ok(())
    }
}

/// Exactly one fraction form is active per partition run.
#[derive(Debug, Clone, Serialize)]
pub enum FractionSpec {
    Exact(Fractions),
    Weighted(RegionWeightTable),
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionConfig {
    pub input: PathBuf,
    pub fractions: FractionSpec,
    /// Empty means every pair is considered.
    pub regions: Vec<Region>,
    pub output_dir: PathBuf,
    pub string_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadSweepConfig {
    pub reference: PathBuf,
    pub region: Region,
    pub runs: usize,
    pub coverages: ErrorRateSet,
    pub snv_rates: ErrorRateSet,
    pub del_rates: ErrorRateSet,
    pub ins_rates: ErrorRateSet,
    pub read_length: usize,
    pub insert: InsertSize,
    pub write_reads: bool,
    pub output_dir: PathBuf,
    pub string_id: String,
}

impl ReadSweepConfig {
    /// Rejects settings that could only fail once outputs exist.
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(BenchError::parameter("number of runs must be positive"));
        }
        check_read_length(self.read_length)?;
        self.insert.validate()?;
        for &coverage in self.coverages.values() {
            check_coverage(coverage)?;
        }
        for (_, errors) in self.combinations() {
            errors.validate()?;
        }
        Ok(())
    }

    /// Every (coverage, snv, del, ins) combination, coverage outermost.
    pub fn combinations(&self) -> Vec<(f64, ErrorProfile)> {
        let mut out = Vec::new();
        for &coverage in self.coverages.values() {
            for &snv in self.snv_rates.values() {
                for &del in self.del_rates.values() {
                    for &ins in self.ins_rates.values() {
                        out.push((coverage, ErrorProfile::new(snv, ins, del)));
                    }
                }
            }
        }
        out
    }
}

/// The run the driver executes, with its mode-specific configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", content = "config", rename_all = "snake_case")]
pub enum BenchmarkMode {
    GenomeSimulation(GenomeSimulationConfig),
    DatasetPartitioning(PartitionConfig),
    ReadSweep(ReadSweepConfig),
}

impl BenchmarkMode {
    pub fn name(&self) -> &'static str {
        match self {
            BenchmarkMode::GenomeSimulation(_) => "genome-simulation",
            BenchmarkMode::DatasetPartitioning(_) => "dataset-partitioning",
            BenchmarkMode::ReadSweep(_) => "read-sweep",
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        match self {
            BenchmarkMode::GenomeSimulation(c) => &c.output_dir,
            BenchmarkMode::DatasetPartitioning(c) => &c.output_dir,
            BenchmarkMode::ReadSweep(c) => &c.output_dir,
        }
    }

    /// Partition settings are checked as they are parsed.
    pub fn validate(&self) -> Result<()> {
        match self {
            BenchmarkMode::GenomeSimulation(c) => c.validate(),
            BenchmarkMode::DatasetPartitioning(_) => Ok(()),
            BenchmarkMode::ReadSweep(c) => c.validate(),
        }
    }

    pub fn string_id(&self) -> &str {
        match self {
            BenchmarkMode::GenomeSimulation(c) => &c.string_id,
            BenchmarkMode::DatasetPartitioning(c) => &c.string_id,
            BenchmarkMode::ReadSweep(c) => &c.string_id,
        }
    }
}
