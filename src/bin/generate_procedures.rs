use anyhow::{Context, Result};
use clap::Parser;
use csranging::simulation::{
    ChannelPlan, ImpairmentConfig, MultipathComponent, ProcedureGenerator, Scenario,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_procedures")]
#[command(about = "Generate synthetic Channel Sounding procedure files for ranging tests")]
struct Args {
    /// TOML scenario and impairment configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Distances in meters: comma-separated (e.g., "1,2.5,4") or range (e.g., "0.5-10:0.5")
    #[arg(short, long, default_value = "1-10:1")]
    distances: String,

    /// Number of files per distance
    #[arg(short, long, default_value_t = 1)]
    trials: u32,

    /// Procedures per file
    #[arg(short = 'n', long, default_value_t = 20)]
    procedures: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of antenna paths (CLI override)
    #[arg(long)]
    antenna_paths: Option<u8>,

    /// Visit the channels in random order
    #[arg(long)]
    hopped: bool,

    /// Write raw sample records instead of structured procedure data
    #[arg(long)]
    raw: bool,

    /// Output filename prefix
    #[arg(long, default_value = "synth")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,

    /// AWGN SNR in dB (CLI override)
    #[arg(long)]
    snr: Option<f64>,

    /// Phase drift in radians per step (CLI override)
    #[arg(long)]
    drift: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    scenario: Option<Scenario>,
    impairments: Option<ImpairmentConfig>,
    multipath: Option<Vec<MultipathComponent>>,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    distance_m: f64,
    trial: u32,
    seed: u64,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    procedures_per_file: u32,
    structured: bool,
    scenario: Scenario,
    impairments: ImpairmentConfig,
    files: Vec<ManifestEntry>,
}

fn parse_distances(s: &str) -> Result<Vec<f64>> {
    if s.contains(':') {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid range format. Use 'start-end:step'");
        }
        let step: f64 = parts[1].parse().context("Invalid step value")?;
        if step <= 0.0 {
            anyhow::bail!("Step must be positive");
        }
        let range_parts: Vec<&str> = parts[0].split('-').collect();
        if range_parts.len() != 2 {
            anyhow::bail!("Invalid range format. Use 'start-end:step'");
        }
        let start: f64 = range_parts[0].parse().context("Invalid start value")?;
        let end: f64 = range_parts[1].parse().context("Invalid end value")?;

        let count = ((end - start) / step + 1e-9).floor();
        if count < 0.0 {
            return Ok(Vec::new());
        }
        Ok((0..=count as usize).map(|i| start + i as f64 * step).collect())
    } else {
        s.split(',')
            .map(|p| p.trim().parse::<f64>().context("Invalid distance value"))
            .collect()
    }
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_scenario(toml: &TomlConfig, args: &Args) -> Scenario {
    let mut scenario = toml.scenario.clone().unwrap_or_default();
    if let Some(paths) = args.antenna_paths {
        scenario.num_antenna_paths = paths;
    }
    if args.hopped {
        scenario.channel_plan = match scenario.channel_plan {
            ChannelPlan::Sweep { first, last, step } => ChannelPlan::Hopped { first, last, step },
            other => other,
        };
    }
    scenario
}

fn build_impairments(toml: &TomlConfig, args: &Args, seed: u64) -> ImpairmentConfig {
    let mut config = toml.impairments.clone().unwrap_or_default().with_seed(seed);

    if let Some(snr) = args.snr {
        config = config.with_awgn(snr);
    }
    if let Some(drift) = args.drift {
        config = config.with_drift(drift);
    }
    if let Some(ref multipath) = toml.multipath
        && !multipath.is_empty()
    {
        config = config.with_multipath(multipath.clone());
    }

    config
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let distances = parse_distances(&args.distances)?;
    let base_seed = args.seed.unwrap_or(0);
    let base_scenario = build_scenario(&toml_config, &args);

    let mut manifest_entries = Vec::new();
    let total_files = distances.len() * args.trials as usize;
    let mut file_count = 0;

    for (d, &distance_m) in distances.iter().enumerate() {
        for trial in 0..args.trials {
            let seed = base_seed + trial as u64 * 1000 + d as u64;
            let scenario = Scenario {
                distance_m,
                ..base_scenario.clone()
            };
            let impairments = build_impairments(&toml_config, &args, seed);
            let mut generator = ProcedureGenerator::new(scenario, impairments);

            let json = if args.raw {
                let procedures: Vec<_> = (0..args.procedures).map(|_| generator.next_raw()).collect();
                serde_json::to_string_pretty(&procedures)
            } else {
                let procedures: Vec<_> = (0..args.procedures)
                    .map(|_| generator.next_procedure_data())
                    .collect();
                serde_json::to_string_pretty(&procedures)
            }
            .context("Failed to serialize procedures")?;

            let filename = format!(
                "{}_d{:05.2}_t{:02}.json",
                args.prefix, distance_m, trial
            );
            let filepath = args.output_dir.join(&filename);
            fs::write(&filepath, json)
                .with_context(|| format!("Failed to write {}", filepath.display()))?;

            manifest_entries.push(ManifestEntry {
                file: filename,
                distance_m,
                trial,
                seed,
            });

            file_count += 1;
            eprint!("\rGenerating: {}/{}", file_count, total_files);
        }
    }
    eprintln!();

    if args.manifest {
        let manifest = Manifest {
            procedures_per_file: args.procedures,
            structured: !args.raw,
            scenario: base_scenario,
            impairments: build_impairments(&toml_config, &args, base_seed),
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        total_files,
        args.output_dir.display()
    );
    Ok(())
}
