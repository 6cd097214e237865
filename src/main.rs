#![warn(clippy::all)]

// main entry point
use clap::Parser;
use laggard::network::modules::registry;
use laggard::network::modules::stats::PacketProcessingStatistics;
use laggard::network::processing::{run_processing_loop, Pipeline};
use laggard::settings::bandwidth::BandwidthOptions;
use laggard::settings::lag::LagOptions;
use laggard::settings::Settings;
use laggard::simulation::{spawn_generator, CountingSink, TrafficProfile};
use log::{error, info, LevelFilter};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Runs synthetic traffic through the lag and bandwidth impairments.
#[derive(Parser, Debug)]
#[command(name = "laggard", version, about)]
struct Cli {
    /// Load settings from this TOML file (defaults to the user config file if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a commented template config to this path and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,

    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long)]
    seconds: Option<u64>,

    /// Synthetic packets generated per second
    #[arg(long, default_value_t = 1_000)]
    packets_per_second: u32,

    /// Payload size of every synthetic packet
    #[arg(long, default_value_t = 1_200)]
    packet_size: usize,

    /// Print final statistics as JSON on stdout
    #[arg(long)]
    json_stats: bool,

    #[command(flatten)]
    lag: LagOptions,

    #[command(flatten)]
    bandwidth: BandwidthOptions,
}

/// Final report printed with `--json-stats`.
#[derive(Serialize)]
struct Report<'a> {
    generated: u64,
    delivered: &'a CountingSink,
    mean_latency_ms: Option<f64>,
    pipeline: &'a PacketProcessingStatistics,
}

/// Initialize the application logger
///
/// Timestamped lines on stdout, `info` unless `RUST_LOG` says otherwise.
fn init_logger() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Settings file first, then any module switched on from the command line.
fn resolve_settings(cli: &Cli) -> laggard::Result<Settings> {
    let path = cli
        .config
        .clone()
        .or_else(|| Settings::default_config_path().filter(|p| p.exists()));

    let mut settings = match path {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            Settings::load_from_file(&path)?
        }
        None => Settings::default(),
    };

    if cli.lag.enabled {
        settings.lag = Some(cli.lag.clone());
    }
    if cli.bandwidth.enabled {
        settings.bandwidth = Some(cli.bandwidth.clone());
    }

    settings.validate()?;
    Ok(settings)
}

fn run(cli: Cli) -> laggard::Result<()> {
    if let Some(path) = &cli.write_default_config {
        Settings::create_default_config_file(path)?;
        info!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let settings = resolve_settings(&cli)?;

    let enabled: Vec<&str> = registry::get_enabled_modules(&settings)
        .into_iter()
        .filter_map(registry::find_module)
        .map(|m| m.display_name)
        .collect();
    if enabled.is_empty() {
        info!("No impairment enabled, packets pass straight through");
    } else {
        info!("Enabled modules: {}", enabled.join(", "));
    }

    let mut pipeline = Pipeline::new();
    pipeline.apply_settings(&settings)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            error!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    if let Some(seconds) = cli.seconds {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(seconds));
            running.store(false, Ordering::SeqCst);
        });
    }

    let (sender, receiver) = mpsc::channel();
    let generator = spawn_generator(
        sender,
        TrafficProfile {
            packets_per_second: cli.packets_per_second,
            packet_size: cli.packet_size,
        },
        Arc::clone(&running),
    );

    let mut sink = CountingSink::new();
    let result = run_processing_loop(&mut pipeline, &receiver, &mut sink, &running);

    // The loop may have bailed out early; make sure the generator winds down too.
    running.store(false, Ordering::SeqCst);
    drop(receiver);
    let generated = generator.join().unwrap_or_else(|_| {
        error!("Traffic generator panicked");
        0
    });
    result?;

    let statistics = pipeline.statistics();
    let statistics = statistics
        .read()
        .map_err(|_| laggard::LaggardError::lock_poisoned("packet processing statistics"))?;

    info!(
        "Generated {} packets, delivered {} (mean latency {:.2}ms, max {}ms)",
        generated,
        sink.packets(),
        sink.mean_latency_ms().unwrap_or_default(),
        sink.max_latency_ms
    );

    if cli.json_stats {
        let report = Report {
            generated,
            delivered: &sink,
            mean_latency_ms: sink.mean_latency_ms(),
            pipeline: &statistics,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize statistics: {}", e),
        }
    }

    Ok(())
}

/// Main entry point for the laggard demo driver
fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    info!("Laggard starting up");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
