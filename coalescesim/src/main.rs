use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use clap::Parser;
use coalescelib::config::ComparisonConfig;
use coalescelib::workload::run_comparison;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Compares cache replacement policies under coherence pressure"))]
struct Args {
    /// JSON configuration file; the reference configuration is used when omitted
    config: Option<String>,

    /// Overrides the workload RNG seed from the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Emits the comparison report as pretty JSON instead of the table
    #[arg(short, long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    env_logger::init();
    let start = Instant::now();
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => {
            let config_file = File::open(path)
                .map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            serde_json::from_reader::<_, ComparisonConfig>(BufReader::new(config_file))
                .map_err(|e| format!("Couldn't parse the config file: {e}"))?
        }
        None => ComparisonConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.workload.seed = seed;
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
    }
    let reports = run_comparison(&config.cache, &config.workload)
        .map_err(|e| format!("Simulation failed: {e}"))?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports)
                .map_err(|e| format!("Couldn't serialise the output {e}"))?
        );
    } else {
        for report in &reports {
            println!("{report}");
        }
    }
    if args.performance {
        let total_time = Instant::now() - start;
        println!(
            "Total execution time (includes configuration, simulation, and output): {}s",
            total_time.as_nanos() as f64 / 1e9
        );
    }
    Ok(())
}
