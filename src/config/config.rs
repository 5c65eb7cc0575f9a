use crate::error::{BenchError, Result};
use crate::sim::error_rates::{DEFAULT_COVERAGE, DEFAULT_DEL_RATE, DEFAULT_INS_RATE, DEFAULT_SNV_RATE};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Operator defaults, read from `config.toml` in the platform config directory.
/// Command-line flags override every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub read_length: usize,
    pub insert_mean: f64,
    pub insert_sd: f64,
    pub sweep_insert_mean: f64,
    pub sweep_insert_sd: f64,
    pub num_breaks: usize,
    pub num_indels: usize,
    pub max_indel_length: usize,
    pub num_runs: usize,
    pub string_id: String,
    pub snv_rate: f64,
    pub del_rate: f64,
    pub ins_rate: f64,
    pub coverage: f64,
    /// Upper bound on quality strings taken from a training BAM.
    pub quality_sample_limit: usize,
    /// Training windows of `training_window_size` bp at 1, 2, ... Mb on the first contig.
    pub training_windows: usize,
    pub training_window_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_length: 101,
            insert_mean: 250.0,
            insert_sd: 50.0,
            sweep_insert_mean: 350.0,
            sweep_insert_sd: 50.0,
            num_breaks: 10,
            num_indels: 10,
            max_indel_length: 10,
            num_runs: 100,
            string_id: "noid".to_string(),
            snv_rate: DEFAULT_SNV_RATE,
            del_rate: DEFAULT_DEL_RATE,
            ins_rate: DEFAULT_INS_RATE,
            coverage: DEFAULT_COVERAGE,
            quality_sample_limit: 100_000,
            training_windows: 8,
            training_window_size: 1000,
        }
    }
}

impl Config {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "snowbench", "snowbench")
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The user's config file if present and valid, else built-in defaults.
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                if let Ok(content) = fs::read_to_string(&config_path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
            }
        }
        Config::default()
    }

    /// An explicitly named config file; unlike [`Config::load`] this fails loudly.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BenchError::resource(path, e))?;
        toml::from_str(&content).map_err(|e| {
            BenchError::parameter(format!("invalid config {}: {}", path.display(), e))
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(proj_dirs) = Self::project_dirs() {
            let config_dir = proj_dirs.config_dir();
            fs::create_dir_all(config_dir).map_err(|e| BenchError::resource(config_dir, e))?;

            let config_path = config_dir.join("config.toml");
            let content = toml::to_string_pretty(self)
                .map_err(|e| BenchError::parameter(format!("cannot serialise config: {}", e)))?;
            fs::write(&config_path, content).map_err(|e| BenchError::resource(&config_path, e))?;
        }
        Ok(())
    }
}
