use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::PathBuf;
use std::thread;

use csranging::config::{CombiningMode, PeakSelection, RangingConfig};
use csranging::input::read_records;
use csranging::output::{OutputFormat, RangingOutput, create_formatter};
use csranging::session::{RangingSession, SessionCallback, SessionReason};
use csranging::RangingResult;

#[derive(Parser, Debug)]
#[command(name = "csranging")]
#[command(about = "Estimate distances from Channel Sounding procedure files", long_about = None)]
struct Args {
    /// JSON procedure files, processed in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, json, csv
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

    /// Antenna path used by selected-path combining
    #[arg(long)]
    antenna_path: Option<usize>,

    /// Suppress procedures without a confident estimate
    #[arg(long)]
    confident_only: bool,
}

/// Session callback that only logs notifications
struct LogCallback;

impl SessionCallback for LogCallback {
    fn on_opened(&mut self, reason: SessionReason) {
        log::info!("Session opened ({:?})", reason);
    }

    fn on_result(&mut self, result: &RangingResult) {
        log::trace!(
            "Procedure {}: {:.3} m ({}%)",
            result.procedure_counter,
            result.result_meters,
            result.confidence_level
        );
    }

    fn on_close(&mut self, reason: SessionReason) {
        log::info!("Session closed ({:?})", reason);
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
        Some(path) => RangingConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RangingConfig::default(),
    };
    if let Some(selection) = args.peak_selection {
        config.estimator.peak_selection = selection;
    }
    if let Some(mode) = args.combining {
        config.combining.mode = mode;
    }
    if let Some(path) = args.antenna_path {
        config.combining.selected_antenna_path = path;
    }

    log::info!(
        "FFT size {}, threshold {} dB, {:?}, {:?}",
        config.estimator.fft_size,
        config.estimator.threshold_db,
        config.estimator.peak_selection,
        config.combining.mode
    );

    let session = RangingSession::new(Box::new(LogCallback), SessionReason::LocalStackRequest, config)
        .context("Failed to open ranging session")?;

    let (output_tx, output_rx) = bounded(16);
    let files = args.files.clone();
    let worker = thread::spawn(move || run_session(session, files, output_tx));

    print_outputs(output_rx, &args);

    match worker.join() {
        Ok(result) => result,
        Err(_) => anyhow::bail!("Ranging worker panicked"),
    }
}

fn run_session(
    mut session: RangingSession,
    files: Vec<PathBuf>,
    output_tx: Sender<RangingOutput>,
) -> anyhow::Result<()> {
    for file in &files {
        let records =
            read_records(file).with_context(|| format!("Failed to read {}", file.display()))?;
        log::info!("{}: {} procedures", file.display(), records.len());

        for record in records {
            let raw = record.into_raw();
            if raw.aborted {
                log::debug!("Procedure {} was aborted", raw.procedure_counter);
            }
            let Some(result) = session.write_raw_data(&raw) else {
                continue;
            };
            let output = RangingOutput::from_estimator(&result, session.estimator());
            if output_tx.send(output).is_err() {
                log::warn!("Output receiver closed");
                session.close(SessionReason::LocalStackRequest);
                return Ok(());
            }
        }
    }

    session.close(SessionReason::LocalStackRequest);
    Ok(())
}

fn print_outputs(output_rx: Receiver<RangingOutput>, args: &Args) {
    let formatter = create_formatter(args.format, args.verbose > 0);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    for output in output_rx {
        if args.confident_only && output.confidence == 0.0 {
            continue;
        }
        println!("{}", formatter.format(&output));
    }
}
