use crate::cli::SimBreaksArgs;
use crate::commands::rate_set;
use crate::config::{BenchmarkMode, Config, GenomeSimulationConfig};
use crate::driver::BenchmarkDriver;
use crate::io::alignments::open_reader;
use crate::io::bed::load_regions;
use crate::io::FastaReference;
use crate::sim::{ErrorProfile, InsertSize, RateKind};
use crate::types::{ContigDictionary, Region};
use anyhow::{Context, Result};
use log::warn;
use rust_htslib::bam::Read;

const MEGABASE: u64 = 1_000_000;

pub fn run(args: &SimBreaksArgs, config: &Config) -> Result<()> {
    let reference = FastaReference::open(&args.reference)
        .with_context(|| format!("Failed to open reference {}", args.reference.display()))?;
    let regions = load_regions(&args.region, Some(reference.dictionary()))?;
    if regions.len() > 1 {
        warn!(
            "{} regions given, simulating only the first ({})",
            regions.len(),
            regions[0]
        );
    }
    let region = regions[0].clone();

    let training_regions = match &args.bam {
        Some(bam) => {
            let reader = open_reader(bam)
                .with_context(|| format!("Failed to open training BAM {}", bam.display()))?;
            let dict = ContigDictionary::from_header(reader.header());
            training_windows(&dict, config.training_windows, config.training_window_size)
        }
        None => Vec::new(),
    };

    let coverage = rate_set(args.coverage.as_deref(), RateKind::Coverage, config.coverage)?;
    let snv = rate_set(args.snv_rate.as_deref(), RateKind::Snv, config.snv_rate)?;
    let del = rate_set(args.del_rate.as_deref(), RateKind::Deletion, config.del_rate)?;
    let ins = rate_set(args.ins_rate.as_deref(), RateKind::Insertion, config.ins_rate)?;

    let mode = BenchmarkMode::GenomeSimulation(GenomeSimulationConfig {
        reference: args.reference.clone(),
        region,
        break_count: args.num_breaks.unwrap_or(config.num_breaks),
        indel_count: args.num_indels.unwrap_or(config.num_indels),
        max_indel_length: args.max_indel_length.unwrap_or(config.max_indel_length),
        coverage: coverage.first(),
        errors: ErrorProfile::new(snv.first(), ins.first(), del.first()),
        read_length: args.read_length.unwrap_or(config.read_length),
        insert: InsertSize::new(
            args.isize_mean.unwrap_or(config.insert_mean),
            args.isize_sd.unwrap_or(config.insert_sd),
        ),
        training_bam: args.bam.clone(),
        training_regions,
        quality_sample_limit: config.quality_sample_limit,
        output_dir: args.output_dir.clone(),
        string_id: args
            .string_id
            .clone()
            .unwrap_or_else(|| config.string_id.clone()),
    });

    BenchmarkDriver::new(args.seed)
        .run(&mode)
        .context("Genome simulation failed")?;
    Ok(())
}

/// `count` windows of `size` bp at 1, 2, ... Mb on the first contig, dropping
/// any that run past its end.
fn training_windows(dict: &ContigDictionary, count: usize, size: u64) -> Vec<Region> {
    let Some(contig) = dict.first() else {
        return Vec::new();
    };
    let length = dict.length(contig).unwrap_or(0);
    (1..=count as u64)
        .filter_map(|mb| {
            let start = mb * MEGABASE;
            let end = start + size;
            (end <= length)
                .then(|| Region::new(contig, start, end).ok())
                .flatten()
        })
        .collect()
}
