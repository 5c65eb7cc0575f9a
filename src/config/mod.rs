mod config;
mod modes;

pub use config::Config;
pub use modes::{
    BenchmarkMode, FractionSpec, GenomeSimulationConfig, PartitionConfig, ReadSweepConfig,
};
