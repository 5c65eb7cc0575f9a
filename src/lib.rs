pub mod cli;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod io;
pub mod partition;
pub mod sim;
pub mod types;
pub mod utils;

pub use driver::{BenchmarkDriver, RunReport};
pub use error::{BenchError, ErrorCategory};
