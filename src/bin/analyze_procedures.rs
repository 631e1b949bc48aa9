use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};

use csranging::DistanceEstimator;
use csranging::config::{CombiningMode, PeakSelection, RangingConfig};
use csranging::input::read_records;

#[derive(Parser, Debug)]
#[command(name = "analyze_procedures")]
#[command(about = "Summarize distance estimates of Channel Sounding procedure files", long_about = None)]
struct Args {
    /// JSON procedure files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Peak selection: first, strongest
    #[arg(short = 'p', long, value_enum)]
    peak_selection: Option<PeakSelection>,

    /// Antenna path combining: post-combining, pre-combining, selected-path
    #[arg(short = 'm', long, value_enum)]
    combining: Option<CombiningMode>,

    /// True distance in meters, enables error statistics
    #[arg(short = 't', long)]
    truth: Option<f64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f64>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct FileAnalysis {
    filename: String,
    procedure_count: usize,
    /// Procedures rejected before ranging
    rejected: usize,
    aborted: usize,
    confident: usize,
    distance_m: Option<StatsSummary>,
    /// Confident estimates only
    confident_distance_m: Option<StatsSummary>,
    doppler_rad_per_step: Option<StatsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    abs_error_m: Option<StatsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileAnalysis {
    fn failed(filename: String, error: String) -> Self {
        Self {
            filename,
            procedure_count: 0,
            rejected: 0,
            aborted: 0,
            confident: 0,
            distance_m: None,
            confident_distance_m: None,
            doppler_rad_per_step: None,
            abs_error_m: None,
            error: Some(error),
        }
    }

    fn confident_fraction(&self) -> f64 {
        let ranged = self.procedure_count - self.rejected;
        if ranged == 0 {
            0.0
        } else {
            self.confident as f64 / ranged as f64
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => RangingConfig::from_file(path)?,
        None => RangingConfig::default(),
    };
    if let Some(selection) = args.peak_selection {
        config.estimator.peak_selection = selection;
    }
    if let Some(mode) = args.combining {
        config.combining.mode = mode;
    }
    let mut estimator = DistanceEstimator::new(config)?;

    let results: Vec<FileAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &mut estimator, args.truth))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn analyze_file(path: &Path, estimator: &mut DistanceEstimator, truth: Option<f64>) -> FileAnalysis {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match analyze_file_impl(&filename, path, estimator, truth) {
        Ok(analysis) => analysis,
        Err(e) => FileAnalysis::failed(filename, e.to_string()),
    }
}

fn analyze_file_impl(
    filename: &str,
    path: &Path,
    estimator: &mut DistanceEstimator,
    truth: Option<f64>,
) -> anyhow::Result<FileAnalysis> {
    let records = read_records(path)?;
    log::info!("{}: {} procedures", filename, records.len());

    let mut distance_stats: Stats<f64> = Stats::new();
    let mut confident_stats: Stats<f64> = Stats::new();
    let mut doppler_stats: Stats<f64> = Stats::new();
    let mut error_stats: Stats<f64> = Stats::new();
    let mut rejected = 0;
    let mut aborted = 0;
    let mut confident = 0;
    let procedure_count = records.len();

    for record in records {
        let raw = record.into_raw();
        if raw.aborted {
            aborted += 1;
        }

        estimator.reset();
        let distance = estimator.estimate_distance(&raw);
        if estimator.path_estimates().is_empty() {
            log::debug!("Procedure {} rejected", raw.procedure_counter);
            rejected += 1;
            continue;
        }

        distance_stats.update(distance);
        doppler_stats.update(estimator.context().doppler_mean);
        if estimator.confidence_level() > 0.0 {
            confident += 1;
            confident_stats.update(distance);
        }
        if let Some(truth) = truth {
            error_stats.update((distance - truth).abs());
        }
    }

    Ok(FileAnalysis {
        filename: filename.to_string(),
        procedure_count,
        rejected,
        aborted,
        confident,
        distance_m: StatsSummary::from_stats(&distance_stats),
        confident_distance_m: StatsSummary::from_stats(&confident_stats),
        doppler_rad_per_step: StatsSummary::from_stats(&doppler_stats),
        abs_error_m: StatsSummary::from_stats(&error_stats),
        error: None,
    })
}

fn print_text(results: &[FileAnalysis]) {
    println!(
        "{:<40} {:>6} {:>6} {:>10} {:>10} {:>8}",
        "File", "Count", "Conf%", "Mean (m)", "Std (m)", "Rejected"
    );

    for result in results {
        if let Some(ref error) = result.error {
            println!("{:<40} ERROR: {}", result.filename, error);
            continue;
        }

        let mean = result
            .distance_m
            .as_ref()
            .map(|s| format!("{:.3}", s.mean))
            .unwrap_or_else(|| "-".to_string());
        let std_dev = result
            .distance_m
            .as_ref()
            .map(|s| format!("{:.3}", s.std_dev))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<40} {:>6} {:>6.1} {:>10} {:>10} {:>8}",
            result.filename,
            result.procedure_count,
            100.0 * result.confident_fraction(),
            mean,
            std_dev,
            result.rejected
        );
    }

    for result in results {
        if result.error.is_some() {
            continue;
        }
        if let Some(ref distance) = result.distance_m {
            eprintln!();
            eprintln!("Distance statistics for {}:", result.filename);
            eprintln!("  Range: {:.3} - {:.3} m", distance.min, distance.max);
            if let Some(ref conf) = result.confident_distance_m {
                eprintln!("  Confident: {:.3} ± {:.3} m", conf.mean, conf.std_dev);
            }
            if let Some(ref doppler) = result.doppler_rad_per_step {
                eprintln!("  Doppler: {:.5} ± {:.5} rad/step", doppler.mean, doppler.std_dev);
            }
            if let Some(ref error) = result.abs_error_m {
                eprintln!("  Abs error: mean {:.3} m, max {:.3} m", error.mean, error.max);
            }
            if result.aborted > 0 {
                eprintln!("  Aborted procedures: {}", result.aborted);
            }
        }
    }
}

fn print_csv(results: &[FileAnalysis]) {
    println!(
        "filename,procedure_count,rejected,aborted,confident,distance_mean,distance_std,confident_mean,doppler_mean,abs_error_mean,abs_error_max,error"
    );
    for result in results {
        let summary = |s: &Option<StatsSummary>, f: fn(&StatsSummary) -> f64| {
            s.as_ref().map(|s| format!("{:.4}", f(s))).unwrap_or_default()
        };
        let error = result.error.as_deref().unwrap_or("");

        println!(
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            result.filename,
            result.procedure_count,
            result.rejected,
            result.aborted,
            result.confident,
            summary(&result.distance_m, |s| s.mean),
            summary(&result.distance_m, |s| s.std_dev),
            summary(&result.confident_distance_m, |s| s.mean),
            summary(&result.doppler_rad_per_step, |s| s.mean),
            summary(&result.abs_error_m, |s| s.mean),
            summary(&result.abs_error_m, |s| s.max),
            error
        );
    }
}

fn print_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
