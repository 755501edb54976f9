use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::style::Stylize;
use std::path::PathBuf;
use tht_core::onsets::load_onsets;
use tht_core::report::{load_report, save_report, RunReport};
use tht_core::scoring::LinearCorrection;
use tht_core::{ExpErrorStrategy, TactusHypothesisTracker, TrackerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tht")]
#[command(version)]
#[command(about = "Tracks tactus hypotheses over a sequence of onset times", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (trace, debug, info, warn, error). THT_LOG takes precedence.
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracker over a file of onset times in milliseconds
    Run(RunArgs),

    /// Print a previously saved report
    Show {
        /// Report file (.json or .bin)
        report: PathBuf,

        /// Only print the N most confident trackers
        #[arg(long)]
        top: Option<usize>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Onset file: a JSON array or whitespace/comma separated numbers
    onsets: PathBuf,

    /// JSON file with tracker parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_delta: Option<f64>,

    #[arg(long)]
    max_delta: Option<f64>,

    #[arg(long)]
    max_hypotheses: Option<usize>,

    /// Similarity epsilon used for trimming
    #[arg(long)]
    epsilon: Option<f64>,

    /// Save the report to this file
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Report encoding; inferred from the report extension when omitted
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Only print the N most confident trackers
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Bin,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("THT_LOG").unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Show { report, top } => {
            let report: RunReport<LinearCorrection> = load_report(&report)
                .with_context(|| format!("Could not load report '{}'", report.display()))?;
            print_report(&report, top);
            Ok(())
        }
    }
}

fn build_config(args: &RunArgs) -> Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::from_file(path)
            .with_context(|| format!("Could not read config '{}'", path.display()))?,
        None => TrackerConfig::default(),
    };
    if let Some(v) = args.min_delta {
        config.min_delta = v;
    }
    if let Some(v) = args.max_delta {
        config.max_delta = v;
    }
    if let Some(v) = args.max_hypotheses {
        config.max_hypotheses = v;
    }
    if let Some(v) = args.epsilon {
        config.similarity_epsilon = v;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    let onsets = load_onsets(&args.onsets)
        .with_context(|| format!("Could not read onsets '{}'", args.onsets.display()))?;
    info!(onsets = onsets.len(), "Loaded onsets");

    let tht = TactusHypothesisTracker::new(ExpErrorStrategy::default(), config.clone());
    let trackers = tht.run(&onsets)?;
    info!(trackers = trackers.len(), "Tracking finished");

    let report = RunReport::from_run(&config, onsets.len(), &trackers);
    print_report(&report, args.top);

    if let Some(path) = &args.report {
        let path = match args.format {
            Some(Format::Json) => path.with_extension("json"),
            Some(Format::Bin) => path.with_extension("bin"),
            None => path.clone(),
        };
        save_report(&report, &path)
            .with_context(|| format!("Could not save report '{}'", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    Ok(())
}

fn print_report(report: &RunReport<LinearCorrection>, top: Option<usize>) {
    println!(
        "{} {} trackers over {} onsets",
        "Tactus Hypothesis Tracker:".bold(),
        report.trackers.len(),
        report.onset_count
    );
    println!("---------------------------------------------------------------");

    let shown = top.unwrap_or(report.trackers.len());
    for tracker in report.trackers.iter().take(shown) {
        let conf = tracker.confidence.map_or("-".to_string(), |c| format!("{:.4}", c));
        println!("\n{} conf {}", format!("{:?}", tracker.name).cyan().bold(), conf.green());
        println!("  beta     rho {:>10.3}  delta {:>9.3}", tracker.beta.rho, tracker.beta.delta);
        println!("  current  rho {:>10.3}  delta {:>9.3}", tracker.current.rho, tracker.current.delta);
        println!("  corrections:");
        for (idx, c) in &tracker.corrections {
            println!(
                "    @{:<4} rho {:>10.3}  delta {:>9.3}  ({} onsets matched)",
                idx, c.corrected.rho, c.corrected.delta, c.matched_onsets
            );
        }
    }
}
