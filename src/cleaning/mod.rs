//! Data cleaning: turns per-path tone samples into autocorrelation and
//! covariance estimates.
//!
//! Stages run in order over one [`CleaningContext`]:
//! reciprocal multiply, Doppler correction (in acquisition order), sort and
//! de-duplicate, minimum spacing, autocorrelation, covariance.

pub mod autocorr;
pub mod covariance;
pub mod doppler;
pub mod reciprocal;
pub mod sort;

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::config::CleaningConfig;
use crate::sample::ProcedurePcts;

pub use autocorr::{autocorrelation, lag_count, min_channel_spacing};
pub use covariance::covariance_matrix;
pub use doppler::{estimate_doppler, least_squares_2col};
pub use reciprocal::multiply_reciprocal;
pub use sort::{dedup_sorted, sort_permutation};

/// Derived state of one procedure
///
/// Owned by the estimator for the duration of one `estimate_distance` call
/// and rebuilt from scratch for every procedure.
#[derive(Debug, Clone)]
pub struct CleaningContext {
    /// Channel of every step, acquisition order
    pub step_channels: Vec<u8>,
    /// Stable permutation sorting `step_channels` ascending
    pub permutation: Vec<usize>,
    /// Reciprocal products per path, Doppler corrected. Acquisition order
    /// until sorting, then ascending channel order without duplicates.
    pub pct_cleaned: Vec<Vec<Complex64>>,
    /// Ascending, duplicate-free channels indexing `pct_cleaned`
    pub channels_cleaned: Vec<u8>,
    /// Mean Doppler rate across paths (rad/step)
    pub doppler_mean: f64,
    /// Minimum channel spacing (>= 1)
    pub delta_f: u8,
    /// Autocorrelation per path, `lag_count` long
    pub autocorr: Vec<Vec<Complex64>>,
    /// Forward-backward averaged covariance per path
    pub covariance: Vec<DMatrix<Complex64>>,
}

impl Default for CleaningContext {
    fn default() -> Self {
        Self {
            step_channels: Vec::new(),
            permutation: Vec::new(),
            pct_cleaned: Vec::new(),
            channels_cleaned: Vec::new(),
            doppler_mean: 0.0,
            delta_f: 1,
            autocorr: Vec::new(),
            covariance: Vec::new(),
        }
    }
}

impl CleaningContext {
    /// Run every cleaning stage over the samples of one procedure
    pub fn run(pcts: &ProcedurePcts, config: &CleaningConfig) -> Self {
        let mut ctx = Self {
            step_channels: pcts.step_channels.clone(),
            permutation: sort_permutation(&pcts.step_channels),
            pct_cleaned: multiply_reciprocal(&pcts.initiator, &pcts.reflector),
            ..Self::default()
        };

        ctx.fix_doppler();
        ctx.sort_and_dedup();
        ctx.delta_f = min_channel_spacing(&ctx.channels_cleaned);

        let lags = lag_count(config.autocorrelation_window, ctx.delta_f);
        ctx.autocorr = ctx
            .pct_cleaned
            .iter()
            .map(|pct| autocorrelation(&ctx.channels_cleaned, pct, ctx.delta_f, lags))
            .collect();
        ctx.covariance = ctx
            .pct_cleaned
            .iter()
            .map(|pct| covariance_matrix(&ctx.channels_cleaned, pct, ctx.delta_f, lags))
            .collect();

        log::trace!(
            "Cleaned {} steps to {} channels, delta_f {}, doppler {:.5} rad/step, {} lags",
            ctx.step_channels.len(),
            ctx.channels_cleaned.len(),
            ctx.delta_f,
            ctx.doppler_mean,
            lags
        );

        ctx
    }

    /// Estimate the common Doppler rate and remove it from every path
    fn fix_doppler(&mut self) {
        self.doppler_mean =
            estimate_doppler(&self.step_channels, &self.permutation, &self.pct_cleaned);
        doppler::remove_phase_ramp(&mut self.pct_cleaned, self.doppler_mean);
    }

    /// Reorder by ascending channel and drop revisited channels
    fn sort_and_dedup(&mut self) {
        let sorted_channels: Vec<u8> = self
            .permutation
            .iter()
            .map(|&p| self.step_channels[p])
            .collect();
        let sorted_pct: Vec<Vec<Complex64>> = self
            .pct_cleaned
            .iter()
            .map(|pct| self.permutation.iter().map(|&p| pct[p]).collect())
            .collect();
        let (channels, pct) = dedup_sorted(sorted_channels, sorted_pct);
        self.channels_cleaned = channels;
        self.pct_cleaned = pct;
    }

    /// Sum of the per-path autocorrelations
    pub fn combined_autocorr(&self) -> Vec<Complex64> {
        let len = self.autocorr.first().map_or(0, |r| r.len());
        let mut combined = vec![Complex64::new(0.0, 0.0); len];
        for path in &self.autocorr {
            for (acc, &value) in combined.iter_mut().zip(path.iter()) {
                *acc += value;
            }
        }
        combined
    }

    pub fn num_antenna_paths(&self) -> usize {
        self.pct_cleaned.len()
    }
}
