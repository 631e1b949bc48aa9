use num_complex::Complex64;

use crate::cleaning::CleaningContext;
use crate::config::{CombiningMode, RangingConfig};
use crate::constants::SENTINEL_DISTANCE_M;
use crate::error::Result;
use crate::ranging::{CirTap, PathEstimate, ZeroPaddedIfft, post_combine_choose_min};
use crate::sample::{ProcedurePcts, RawProcedureSample};

/// Outputs of the last estimation
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationOutput {
    /// Unclamped distance in meters, `SENTINEL_DISTANCE_M` when none
    pub raw_distance_m: f64,
    /// 1.0 when a peak cleared the threshold, else 0.0
    pub confidence: f64,
    /// Detected impulse-response components of every estimated sequence
    pub cir: Vec<CirTap>,
    pub path_estimates: Vec<PathEstimate>,
}

impl Default for EstimationOutput {
    fn default() -> Self {
        Self {
            raw_distance_m: SENTINEL_DISTANCE_M,
            confidence: 0.0,
            cir: Vec::new(),
            path_estimates: Vec::new(),
        }
    }
}

/// Distance estimator for one ranging session
///
/// Not meant to be shared: every call mutates the cleaning context and the
/// outputs. Call [`reset`](Self::reset) before each procedure to clear the
/// previous result.
///
/// # Example
/// ```
/// use csranging::{DistanceEstimator, RangingConfig};
/// use csranging::sample::RawProcedureSample;
///
/// let mut estimator = DistanceEstimator::new(RangingConfig::default()).unwrap();
/// // No tone data: the sentinel is left in place
/// let distance = estimator.estimate_distance(&RawProcedureSample::default());
/// assert_eq!(distance, 999.0);
/// assert_eq!(estimator.confidence_level(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct DistanceEstimator {
    config: RangingConfig,
    zp_ifft: ZeroPaddedIfft,
    context: CleaningContext,
    output: EstimationOutput,
}

impl DistanceEstimator {
    /// Create an estimator, validating `config`
    pub fn new(config: RangingConfig) -> Result<Self> {
        config.validate()?;
        let zp_ifft = ZeroPaddedIfft::new(&config.estimator)?;
        Ok(Self {
            config,
            zp_ifft,
            context: CleaningContext::default(),
            output: EstimationOutput::default(),
        })
    }

    pub fn config(&self) -> &RangingConfig {
        &self.config
    }

    /// Clear derived state and outputs
    pub fn reset(&mut self) {
        self.context = CleaningContext::default();
        self.output = EstimationOutput::default();
    }

    /// Estimate the distance of one procedure in meters
    ///
    /// Returns `max(raw_distance, 0)`. A procedure without usable tone data
    /// leaves every buffer untouched and returns the current raw distance
    /// (the sentinel after a reset).
    pub fn estimate_distance(&mut self, raw: &RawProcedureSample) -> f64 {
        let Some(pcts) = ProcedurePcts::parse(raw) else {
            return self.output.raw_distance_m;
        };

        self.context = CleaningContext::run(&pcts, &self.config.cleaning);
        self.output = EstimationOutput::default();
        self.run_ranging();

        log::debug!(
            "Procedure {}: {:.3} m, confidence {:.0}",
            raw.procedure_counter,
            self.output.raw_distance_m,
            self.output.confidence
        );

        self.output.raw_distance_m.max(0.0)
    }

    fn run_ranging(&mut self) {
        let delta_f = self.context.delta_f;
        let num_paths = self.context.num_antenna_paths();
        if num_paths == 0 {
            return;
        }

        let zp = &self.zp_ifft;
        let autocorr = &self.context.autocorr;
        let estimates: Vec<PathEstimate> = match self.config.combining.mode {
            CombiningMode::PostCombining => (0..num_paths)
                .map(|ap| zp.estimate(&autocorr[ap], delta_f, Some(ap)))
                .collect(),
            CombiningMode::PreCombining => {
                let combined = self.context.combined_autocorr();
                vec![zp.estimate(&combined, delta_f, None)]
            }
            CombiningMode::SelectedPath => {
                let ap = self.config.combining.selected_antenna_path.min(num_paths - 1);
                vec![zp.estimate(&autocorr[ap], delta_f, Some(ap))]
            }
        };

        for estimate in &estimates {
            log::debug!(
                "Antenna path {:?}: {:.3} m, noise {:.1} dB, peak {:.1} dB, {} peaks, {}",
                estimate.antenna_path,
                estimate.distance_m,
                estimate.noise_floor_db,
                estimate.peak_db,
                estimate.taps.len(),
                if estimate.confident {
                    "confident"
                } else {
                    "below threshold"
                }
            );
        }

        if let Some((distance, confident)) = post_combine_choose_min(&estimates) {
            self.output.raw_distance_m = distance;
            self.output.confidence = if confident { 1.0 } else { 0.0 };
        }
        self.output.cir = estimates.iter().flat_map(|e| e.taps.iter().copied()).collect();
        self.output.path_estimates = estimates;
    }

    pub fn confidence_level(&self) -> f64 {
        self.output.confidence
    }

    /// Last raw (unclamped) distance
    pub fn raw_distance(&self) -> f64 {
        self.output.raw_distance_m
    }

    pub fn channel_impulse_response(&self) -> &[CirTap] {
        &self.output.cir
    }

    pub fn path_estimates(&self) -> &[PathEstimate] {
        &self.output.path_estimates
    }

    pub fn output(&self) -> &EstimationOutput {
        &self.output
    }

    /// Cleaning state of the last accepted procedure
    pub fn context(&self) -> &CleaningContext {
        &self.context
    }

    /// Complex delay profile of one antenna path of the last procedure
    pub fn delay_profile(&self, antenna_path: usize) -> Option<Vec<Complex64>> {
        self.context
            .autocorr
            .get(antenna_path)
            .map(|r| self.zp_ifft.delay_profile(r))
    }
}
