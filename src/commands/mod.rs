pub mod init_config;
pub mod sim_breaks;
pub mod split_bam;
pub mod sweep;

use crate::sim::{ErrorRateSet, RateKind};
use anyhow::{Context, Result};

/// A comma-separated flag value, or the configured default when the flag is absent.
pub(crate) fn rate_set(input: Option<&str>, kind: RateKind, fallback: f64) -> Result<ErrorRateSet> {
    match input {
        Some(list) => ErrorRateSet::parse(list, kind)
            .with_context(|| format!("invalid value list '{}'", list)),
        None => Ok(ErrorRateSet::from_values(vec![fallback], kind)?),
    }
}
