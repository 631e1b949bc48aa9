//! Zero-padded inverse FFT range estimator.
//!
//! The autocorrelation of the channel frequency response is mirrored into a
//! Hermitian sequence, zero padded to the FFT length and inverse transformed.
//! The padding interpolates the resulting delay profile, so the first
//! significant peak locates the direct path with sub-bin resolution.

use num_complex::Complex64;

use crate::config::EstimatorConfig;
use crate::constants::{CHANNEL_SPACING_HZ, SPEED_OF_LIGHT};
use crate::error::Result;

use super::fft::Radix2Fft;
use super::peaks::{PeakSearch, find_peaks_db, rotate_right};
use super::{CirTap, bins_for_distance};

/// Estimate produced from one autocorrelation sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PathEstimate {
    /// Source antenna path, `None` for combined autocorrelations
    pub antenna_path: Option<usize>,
    pub distance_m: f64,
    /// A peak cleared the noise threshold
    pub confident: bool,
    pub noise_floor_db: f64,
    pub peak_db: f64,
    /// Reported bin in the shifted delay profile
    pub peak_bin: usize,
    /// One tap per detected peak
    pub taps: Vec<CirTap>,
}

/// Mirror a one-sided autocorrelation into a centred, zero-padded sequence
///
/// Produces `[conj(R[K-1]) .. conj(R[1]), R[0], R[1] .. R[K-1]]` padded with
/// zeros to `fft_size` and rotated right by `(fft_size - (2K - 1)) / 2`.
/// Lags that do not fit in `fft_size` are dropped.
pub fn build_cfr_sequence(cfr: &[Complex64], fft_size: usize) -> Vec<Complex64> {
    let zero = Complex64::new(0.0, 0.0);
    let mut seq = vec![zero; fft_size];
    let k = cfr.len().min(fft_size.div_ceil(2));
    if k == 0 {
        return seq;
    }

    let used = 2 * k - 1;
    for lag in 1..k {
        seq[k - 1 - lag] = cfr[lag].conj();
        seq[k - 1 + lag] = cfr[lag];
    }
    seq[k - 1] = cfr[0];

    seq.rotate_right((fft_size - used) / 2);
    seq
}

/// Zero-padded IFFT estimator with noise-floor thresholding
#[derive(Debug, Clone)]
pub struct ZeroPaddedIfft {
    config: EstimatorConfig,
    fft: Radix2Fft,
}

impl ZeroPaddedIfft {
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            fft: Radix2Fft::new(config.fft_size)?,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    /// Circular shift in bins applied before the peak search
    pub fn shift_bins(&self, delta_f: u8) -> usize {
        let n = self.fft.size();
        let bins = bins_for_distance(self.config.shift_distance_m, n, delta_f).round();
        (bins as usize).min(n - 1)
    }

    /// Width of the noise window in bins, clamped to the unshifted bins
    pub fn noise_bins(&self, delta_f: u8, shift_bins: usize) -> usize {
        let n = self.fft.size();
        let bins = bins_for_distance(self.config.noise_estimation_interval_m.floor(), n, delta_f);
        (bins.floor() as usize).clamp(1, n - shift_bins)
    }

    /// Distance of a bin in the shifted delay profile
    pub fn bin_to_distance(&self, bin: usize, delta_f: u8, shift_bins: usize) -> f64 {
        let n = self.fft.size() as f64;
        let fs = delta_f.max(1) as f64 * CHANNEL_SPACING_HZ;
        let dt = 1.0 / (fs * n);
        let actual_shift = shift_bins as f64 / 2.0 / n / fs * SPEED_OF_LIGHT;
        SPEED_OF_LIGHT * dt * bin as f64 / 2.0 - actual_shift
    }

    /// Complex delay profile of an autocorrelation sequence
    pub fn delay_profile(&self, cfr: &[Complex64]) -> Vec<Complex64> {
        let n = self.fft.size();
        let input = build_cfr_sequence(cfr, n);
        let mut output = vec![Complex64::new(0.0, 0.0); n];
        self.fft.inverse(&input, &mut output);
        output
    }

    /// Estimate the distance from one autocorrelation sequence
    ///
    /// # Arguments
    /// * `cfr` - Autocorrelation, lag 0 first
    /// * `delta_f` - Lag spacing in channels
    /// * `antenna_path` - Recorded in the estimate and its taps
    pub fn estimate(
        &self,
        cfr: &[Complex64],
        delta_f: u8,
        antenna_path: Option<usize>,
    ) -> PathEstimate {
        let n = self.fft.size();
        let profile = self.delay_profile(cfr);
        let magnitude_db: Vec<f64> = profile.iter().map(|x| 20.0 * x.norm().log10()).collect();

        let shift = self.shift_bins(delta_f);
        let noise_bins = self.noise_bins(delta_f, shift);
        let noise_power: f64 = profile[n - shift - noise_bins..n - shift]
            .iter()
            .map(|x| x.norm_sqr())
            .sum();
        let noise_floor_db = 10.0 * (noise_power / noise_bins as f64).log10();

        let search: PeakSearch =
            find_peaks_db(&magnitude_db, noise_floor_db + self.config.threshold_db, shift);
        let (peak_bin, peak_db) = search
            .select(self.config.peak_selection)
            .unwrap_or((0, f64::NEG_INFINITY));

        let shifted_profile = rotate_right(&profile, shift);
        let taps = search
            .peaks
            .iter()
            .map(|&(bin, _)| CirTap {
                antenna_path,
                distance_m: self.bin_to_distance(bin, delta_f, shift),
                coefficient: shifted_profile[bin],
            })
            .collect();

        PathEstimate {
            antenna_path,
            distance_m: self.bin_to_distance(peak_bin, delta_f, shift),
            confident: search.valid,
            noise_floor_db,
            peak_db,
            peak_bin,
            taps,
        }
    }
}
