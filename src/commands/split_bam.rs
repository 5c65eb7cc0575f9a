use crate::cli::SplitBamArgs;
use crate::config::{BenchmarkMode, Config, FractionSpec, PartitionConfig};
use crate::driver::BenchmarkDriver;
use crate::io::alignments::open_reader;
use crate::io::bed::load_regions;
use crate::partition::{Fractions, RegionWeightTable};
use crate::sim::error_rates::parse_number_list;
use crate::types::ContigDictionary;
use anyhow::{Context, Result};
use rust_htslib::bam::Read;
use std::path::Path;

pub fn run(args: &SplitBamArgs, config: &Config) -> Result<()> {
    let dict = {
        let reader = open_reader(&args.bam)
            .with_context(|| format!("Failed to open BAM file {}", args.bam.display()))?;
        ContigDictionary::from_header(reader.header())
    };

    let fractions = fraction_spec(&args.fractions, &dict)?;
    let regions = match &args.region {
        Some(input) => load_regions(input, Some(&dict))?,
        None => Vec::new(),
    };

    let mode = BenchmarkMode::DatasetPartitioning(PartitionConfig {
        input: args.bam.clone(),
        fractions,
        regions,
        output_dir: args.output_dir.clone(),
        string_id: args
            .string_id
            .clone()
            .unwrap_or_else(|| config.string_id.clone()),
    });

    BenchmarkDriver::new(args.seed)
        .run(&mode)
        .context("BAM split failed")?;
    Ok(())
}

/// A readable file is a weight table; anything else a fraction list.
fn fraction_spec(input: &str, dict: &ContigDictionary) -> Result<FractionSpec> {
    let path = Path::new(input);
    if path.is_file() {
        let table = RegionWeightTable::load(path, Some(dict))
            .with_context(|| format!("Failed to load region weights from {}", input))?;
        return Ok(FractionSpec::Weighted(table));
    }
    let values = parse_number_list(input)?;
    Ok(FractionSpec::Exact(Fractions::new(values)?))
}
