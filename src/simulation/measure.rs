use crate::config::RangingConfig;
use crate::error::Result;
use crate::estimator::DistanceEstimator;

use super::{ImpairmentConfig, ProcedureGenerator, Scenario};

/// Distance error of one synthetic procedure
#[derive(Debug, Clone, Copy)]
pub struct DistanceMeasurement {
    pub truth_m: f64,
    pub estimate_m: f64,
    pub confident: bool,
}

impl DistanceMeasurement {
    pub fn error(&self) -> f64 {
        self.estimate_m - self.truth_m
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    pub count: usize,
    pub confident_fraction: f64,
    pub mean_abs_error: f64,
    pub max_abs_error: f64,
}

impl ErrorStats {
    pub fn from_measurements(measurements: &[DistanceMeasurement]) -> Self {
        if measurements.is_empty() {
            return Self::default();
        }
        let n = measurements.len() as f64;
        let confident = measurements.iter().filter(|m| m.confident).count();
        let errors: Vec<f64> = measurements.iter().map(|m| m.error().abs()).collect();
        Self {
            count: measurements.len(),
            confident_fraction: confident as f64 / n,
            mean_abs_error: errors.iter().sum::<f64>() / n,
            max_abs_error: errors.iter().fold(0.0, |a, &b| a.max(b)),
        }
    }
}

/// Estimate every procedure of `generator`'s scenario `trials` times
pub fn measure_distance(
    generator: &mut ProcedureGenerator,
    estimator: &mut DistanceEstimator,
    trials: usize,
) -> Vec<DistanceMeasurement> {
    let truth_m = generator.scenario().distance_m;
    (0..trials)
        .map(|_| {
            let raw = generator.next_raw();
            estimator.reset();
            let estimate_m = estimator.estimate_distance(&raw);
            DistanceMeasurement {
                truth_m,
                estimate_m,
                confident: estimator.confidence_level() > 0.0,
            }
        })
        .collect()
}

/// Sweep `scenario` over `distances`, running `trials` procedures at each
pub fn measure_error_across_distances(
    scenario: &Scenario,
    impairments: &ImpairmentConfig,
    config: &RangingConfig,
    distances: &[f64],
    trials: usize,
) -> Result<ErrorStats> {
    let mut estimator = DistanceEstimator::new(config.clone())?;
    let mut measurements = Vec::with_capacity(distances.len() * trials);

    for (i, &distance_m) in distances.iter().enumerate() {
        let scenario = Scenario {
            distance_m,
            ..scenario.clone()
        };
        // Distinct stream per distance, still reproducible
        let impairments = ImpairmentConfig {
            seed: impairments.seed.map(|s| s.wrapping_add(i as u64)),
            ..impairments.clone()
        };
        let mut generator = ProcedureGenerator::new(scenario, impairments);
        measurements.extend(measure_distance(&mut generator, &mut estimator, trials));
    }

    Ok(ErrorStats::from_measurements(&measurements))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_of_measurements() {
        let measurements = [
            DistanceMeasurement {
                truth_m: 2.0,
                estimate_m: 2.1,
                confident: true,
            },
            DistanceMeasurement {
                truth_m: 2.0,
                estimate_m: 1.7,
                confident: false,
            },
        ];
        let stats = ErrorStats::from_measurements(&measurements);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.confident_fraction, 0.5);
        assert!((stats.mean_abs_error - 0.2).abs() < 1e-9);
        assert!((stats.max_abs_error - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_empty_stats() {
        let stats = ErrorStats::from_measurements(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.max_abs_error, 0.0);
    }

    #[test]
    fn test_clean_sweep_is_accurate() {
        let stats = measure_error_across_distances(
            &Scenario::default(),
            &ImpairmentConfig::default().with_seed(1),
            &RangingConfig::default(),
            &[1.5, 3.0, 4.0],
            1,
        )
        .unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.confident_fraction, 1.0);
        assert!(stats.max_abs_error < 0.15, "{:?}", stats);
    }
}
