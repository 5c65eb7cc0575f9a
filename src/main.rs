use clap::Parser;
use log::LevelFilter;
use snowbench::cli::{self, Commands};
use snowbench::commands;
use snowbench::config::Config;
use snowbench::error::{BenchError, ErrorCategory};

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let args = cli::Args::parse();

    env_logger::Builder::new()
        .filter_level(level(args.verbose))
        .parse_default_env()
        .init();

    let config = match &args.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::load(),
    };

    let result = match &args.command {
        Commands::SimBreaks(sim) => commands::sim_breaks::run(sim, &config),
        Commands::SplitBam(split) => commands::split_bam::run(split, &config),
        Commands::Sweep(sweep) => commands::sweep::run(sweep, &config),
        Commands::InitConfig => commands::init_config::run(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        let category = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<BenchError>())
            .map(BenchError::category);
        if category == Some(ErrorCategory::Parameter) {
            eprintln!("Run with --help for usage.");
        }
        std::process::exit(1);
    }
}
