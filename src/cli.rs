use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Benchmark harness for rearrangement and indel detection", long_about = None)]
pub struct Args {
    /// Log verbosity: 0 errors only, 1 warnings, 2 info, 3 debug, 4 trace
    #[arg(short = 'v', long = "verbose", global = true, default_value = "2")]
    pub verbose: u8,

    /// Read defaults from this config file instead of the user config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rearrange a reference region and simulate paired-end reads from it
    SimBreaks(SimBreaksArgs),

    /// Split a BAM file into disjoint fractions, or subsample it by region weights
    SplitBam(SplitBamArgs),

    /// Sample reads over every combination of coverage and error rates
    Sweep(SweepArgs),

    /// Write the current defaults to the user config file
    InitConfig,
}

#[derive(ClapArgs)]
pub struct SimBreaksArgs {
    /// Indexed reference FASTA
    #[arg(short = 'G', long = "reference")]
    pub reference: PathBuf,

    /// Region to rearrange: BED file or chrom:start-end
    #[arg(short = 'k', long = "region")]
    pub region: String,

    /// BAM to borrow base qualities from (first contig must be indexed)
    #[arg(short = 'b', long = "bam")]
    pub bam: Option<PathBuf>,

    /// Random seed; 0 or absent derives one from the clock
    #[arg(short = 's', long)]
    pub seed: Option<u64>,

    /// Prefix for output names
    #[arg(short = 'A', long = "string-id")]
    pub string_id: Option<String>,

    /// Number of rearrangements
    #[arg(short = 'R', long = "num-breaks")]
    pub num_breaks: Option<usize>,

    /// Number of small indels
    #[arg(short = 'X', long = "num-indels")]
    pub num_indels: Option<usize>,

    /// Longest simulated indel
    #[arg(long = "max-indel-length")]
    pub max_indel_length: Option<usize>,

    /// Read coverage; only the first value of a list is used
    #[arg(short = 'c', long = "coverage")]
    pub coverage: Option<String>,

    /// Per-base SNV error rate
    #[arg(short = 'E', long = "snv-rate")]
    pub snv_rate: Option<String>,

    /// Per-read deletion error rate
    #[arg(short = 'D', long = "del-rate")]
    pub del_rate: Option<String>,

    /// Per-read insertion error rate
    #[arg(short = 'I', long = "ins-rate")]
    pub ins_rate: Option<String>,

    #[arg(short = 'L', long = "read-length")]
    pub read_length: Option<usize>,

    #[arg(long = "isize-mean")]
    pub isize_mean: Option<f64>,

    #[arg(long = "isize-sd")]
    pub isize_sd: Option<f64>,

    /// Output directory
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(ClapArgs)]
pub struct SplitBamArgs {
    /// BAM file to split; it is never modified
    #[arg(short = 'b', long = "bam")]
    pub bam: PathBuf,

    /// Comma-separated fractions (e.g. 0.1,0.8), or a BED file of region weights
    #[arg(short = 'f', long = "fractions")]
    pub fractions: String,

    /// Only consider pairs in these regions: BED file or chrom:start-end
    #[arg(short = 'k', long = "region")]
    pub region: Option<String>,

    /// Random seed; 0 or absent derives one from the clock
    #[arg(short = 's', long)]
    pub seed: Option<u64>,

    /// Prefix for output names
    #[arg(short = 'A', long = "string-id")]
    pub string_id: Option<String>,

    /// Output directory
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(ClapArgs)]
pub struct SweepArgs {
    /// Indexed reference FASTA
    #[arg(short = 'G', long = "reference")]
    pub reference: PathBuf,

    /// Region to sample from: BED file or chrom:start-end
    #[arg(short = 'k', long = "region")]
    pub region: String,

    /// Random seed; 0 or absent derives one from the clock
    #[arg(short = 's', long)]
    pub seed: Option<u64>,

    /// Prefix for output names
    #[arg(short = 'A', long = "string-id")]
    pub string_id: Option<String>,

    /// Number of repetitions of the full sweep
    #[arg(short = 'n', long = "num-runs")]
    pub num_runs: Option<usize>,

    /// Comma-separated coverages
    #[arg(short = 'c', long = "coverage")]
    pub coverage: Option<String>,

    /// Comma-separated SNV error rates
    #[arg(short = 'E', long = "snv-rate")]
    pub snv_rate: Option<String>,

    /// Comma-separated deletion error rates
    #[arg(short = 'D', long = "del-rate")]
    pub del_rate: Option<String>,

    /// Comma-separated insertion error rates
    #[arg(short = 'I', long = "ins-rate")]
    pub ins_rate: Option<String>,

    #[arg(short = 'L', long = "read-length")]
    pub read_length: Option<usize>,

    #[arg(long = "isize-mean")]
    pub isize_mean: Option<f64>,

    #[arg(long = "isize-sd")]
    pub isize_sd: Option<f64>,

    /// Also write the sampled reads of every combination as FASTA
    #[arg(short = 'w', long = "write-reads")]
    pub write_reads: bool,

    /// Output directory
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_split_bam_flags() {
        let args = Args::try_parse_from([
            "snowbench", "split-bam", "-b", "in.bam", "-f", "0.5,0.5", "-s", "7", "-v", "3",
        ])
        .unwrap();
        assert_eq!(args.verbose, 3);
        match args.command {
            Commands::SplitBam(split) => {
                assert_eq!(split.bam, PathBuf::from("in.bam"));
                assert_eq!(split.fractions, "0.5,0.5");
                assert_eq!(split.seed, Some(7));
                assert!(split.region.is_none());
            }
            _ => panic!("expected split-bam"),
        }
    }

    #[test]
    fn sim_breaks_requires_reference_and_region() {
        assert!(Args::try_parse_from(["snowbench", "sim-breaks", "-k", "chr1:1-1000"]).is_err());
        let args = Args::try_parse_from([
            "snowbench", "sim-breaks", "-G", "ref.fa", "-k", "chr1:1-1000", "-R", "2", "-X", "3",
        ])
        .unwrap();
        match args.command {
            Commands::SimBreaks(sim) => {
                assert_eq!(sim.num_breaks, Some(2));
                assert_eq!(sim.num_indels, Some(3));
                assert!(sim.coverage.is_none());
            }
            _ => panic!("expected sim-breaks"),
        }
    }
}
