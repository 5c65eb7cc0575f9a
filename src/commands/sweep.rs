use crate::cli::SweepArgs;
use crate::commands::rate_set;
use crate::config::{BenchmarkMode, Config, ReadSweepConfig};
use crate::driver::BenchmarkDriver;
use crate::io::bed::load_regions;
use crate::io::FastaReference;
use crate::sim::{InsertSize, RateKind};
use anyhow::{Context, Result};
use log::warn;

pub fn run(args: &SweepArgs, config: &Config) -> Result<()> {
    let region = {
        let reference = FastaReference::open(&args.reference)
            .with_context(|| format!("Failed to open reference {}", args.reference.display()))?;
        let mut regions = load_regions(&args.region, Some(reference.dictionary()))?;
        if regions.len() > 1 {
            warn!("{} regions given, sweeping only the first", regions.len());
        }
        regions.swap_remove(0)
    };

    let mode = BenchmarkMode::ReadSweep(ReadSweepConfig {
        reference: args.reference.clone(),
        region,
        runs: args.num_runs.unwrap_or(config.num_runs),
        coverages: rate_set(args.coverage.as_deref(), RateKind::Coverage, config.coverage)?,
        snv_rates: rate_set(args.snv_rate.as_deref(), RateKind::Snv, config.snv_rate)?,
        del_rates: rate_set(args.del_rate.as_deref(), RateKind::Deletion, config.del_rate)?,
        ins_rates: rate_set(args.ins_rate.as_deref(), RateKind::Insertion, config.ins_rate)?,
        read_length: args.read_length.unwrap_or(config.read_length),
        insert: InsertSize::new(
            args.isize_mean.unwrap_or(config.sweep_insert_mean),
            args.isize_sd.unwrap_or(config.sweep_insert_sd),
        ),
        write_reads: args.write_reads,
        output_dir: args.output_dir.clone(),
        string_id: args
            .string_id
            .clone()
            .unwrap_or_else(|| config.string_id.clone()),
    });

    BenchmarkDriver::new(args.seed)
        .run(&mode)
        .context("Read sweep failed")?;
    Ok(())
}
