mod csv;
mod json;
mod text;

use chrono::Utc;
use serde::Serialize;

use crate::estimator::DistanceEstimator;
use crate::session::RangingResult;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One reported procedure with its estimator diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct RangingOutput {
    pub procedure_counter: i32,
    pub timestamp_ms: i64,
    pub distance_m: f64,
    pub raw_distance_m: f64,
    pub confidence: f64,
    pub num_antenna_paths: usize,
    pub num_channels: usize,
    pub delta_f: u8,
    pub doppler_rad_per_step: f64,
    /// Strongest reported peak over all estimated sequences
    pub peak_db: Option<f64>,
    pub noise_floor_db: Option<f64>,
}

impl RangingOutput {
    pub fn from_estimator(result: &RangingResult, estimator: &DistanceEstimator) -> Self {
        let context = estimator.context();
        let estimates = estimator.path_estimates();
        let peak = estimates
            .iter()
            .max_by(|a, b| a.peak_db.total_cmp(&b.peak_db));
        Self {
            procedure_counter: result.procedure_counter,
            timestamp_ms: result.timestamp_ms,
            distance_m: result.result_meters,
            raw_distance_m: estimator.raw_distance(),
            confidence: estimator.confidence_level(),
            num_antenna_paths: context.num_antenna_paths(),
            num_channels: context.channels_cleaned.len(),
            delta_f: context.delta_f,
            doppler_rad_per_step: context.doppler_mean,
            peak_db: peak.map(|e| e.peak_db),
            noise_floor_db: peak.map(|e| e.noise_floor_db),
        }
    }
}

pub trait Formatter: Send {
    fn format(&self, output: &RangingOutput) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> RangingOutput {
        RangingOutput {
            procedure_counter: 7,
            timestamp_ms: 700,
            distance_m: 2.5,
            raw_distance_m: 2.5,
            confidence: 1.0,
            num_antenna_paths: 2,
            num_channels: 10,
            delta_f: 2,
            doppler_rad_per_step: 0.0,
            peak_db: Some(-3.2),
            noise_floor_db: None,
        }
    }

    #[test]
    fn test_csv_header_matches_fields() {
        let formatter = create_formatter(OutputFormat::Csv, false);
        let header = formatter.header().unwrap();
        let line = formatter.format(&sample_output());
        assert_eq!(header.split(',').count(), line.split(',').count());
        assert!(line.ends_with(",-3.2,"));
    }

    #[test]
    fn test_json_is_parseable() {
        let line = create_formatter(OutputFormat::Json, false).format(&sample_output());
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["procedure_counter"], 7);
        assert_eq!(value["distance_m"], 2.5);
        assert!(value["noise_floor_db"].is_null());
        assert!(value["ts"].is_string());
    }

    #[test]
    fn test_text_verbosity() {
        let short = TextFormatter::new(false).format(&sample_output());
        let long = TextFormatter::new(true).format(&sample_output());
        assert!(short.starts_with("#7 Distance:   2.50 m"));
        assert!(long.len() > short.len());
        assert!(long.contains("Δf: 2"));
    }
}
