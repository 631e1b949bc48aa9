//! Configuration for the Channel Sounding distance estimator.
//!
//! Defaults are the standard estimator constants. A configuration
//! can be loaded from TOML; missing keys keep their defaults:
//!
//! ```toml
//! [estimator]
//! fft_size = 4096
//! threshold_db = 20.0
//! peak_selection = "strongest"
//!
//! [combining]
//! mode = "pre-combining"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RangingError, Result};

/// How the per-antenna-path data is combined into one distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CombiningMode {
    /// Estimate every path, report the minimum confident distance
    PostCombining,
    /// Sum the autocorrelations of all paths, estimate once
    PreCombining,
    /// Estimate only `selected_antenna_path`
    SelectedPath,
}

/// Which qualifying spectral peak is converted to a distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PeakSelection {
    /// Earliest qualifying peak (direct path)
    First,
    /// Qualifying peak with the largest magnitude
    Strongest,
}

/// Complete estimator configuration
///
/// # Example
/// ```
/// use csranging::config::{PeakSelection, RangingConfig};
///
/// let mut config = RangingConfig::default();
/// config.estimator.peak_selection = PeakSelection::Strongest;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangingConfig {
    /// Data cleaning configuration
    pub cleaning: CleaningConfig,
    /// Zero-padded IFFT estimator configuration
    pub estimator: EstimatorConfig,
    /// Antenna path combining configuration
    pub combining: CombiningConfig,
}

/// Data cleaning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Autocorrelation window in channel-index units. The number of lags is
    /// `autocorrelation_window / Δf`.
    pub autocorrelation_window: usize,
}

/// Zero-padded IFFT estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Inverse FFT length (power of two)
    pub fft_size: usize,
    /// Width of the noise estimation window in meters
    pub noise_estimation_interval_m: f64,
    /// Peak threshold above the noise floor in dB
    pub threshold_db: f64,
    /// Circular shift applied before peak search, in meters. Lets slightly
    /// negative distances show up as peaks instead of wrapping around.
    pub shift_distance_m: f64,
    /// Peak selection rule
    pub peak_selection: PeakSelection,
}

/// Antenna path combining configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombiningConfig {
    pub mode: CombiningMode,
    /// Path used by `CombiningMode::SelectedPath`
    pub selected_antenna_path: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            autocorrelation_window: 48,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            noise_estimation_interval_m: 20.0,
            threshold_db: 20.0,
            shift_distance_m: 1.0,
            peak_selection: PeakSelection::First,
        }
    }
}

impl Default for CombiningConfig {
    fn default() -> Self {
        Self {
            mode: CombiningMode::PostCombining,
            selected_antenna_path: 0,
        }
    }
}

impl RangingConfig {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| RangingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check that the parameters describe a runnable estimator
    pub fn validate(&self) -> Result<()> {
        let fft_size = self.estimator.fft_size;
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(RangingError::InvalidFftSize(fft_size));
        }

        let window = self.cleaning.autocorrelation_window;
        if window == 0 {
            return Err(RangingError::Config(
                "autocorrelation_window must be positive".to_string(),
            ));
        }
        if 2 * window - 1 > fft_size {
            return Err(RangingError::Config(format!(
                "autocorrelation_window {} does not fit in fft_size {}",
                window, fft_size
            )));
        }

        for (name, value) in [
            (
                "noise_estimation_interval_m",
                self.estimator.noise_estimation_interval_m,
            ),
            ("threshold_db", self.estimator.threshold_db),
            ("shift_distance_m", self.estimator.shift_distance_m),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RangingError::Config(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        // Must fit at the smallest spacing (Δf = 1); wider spacings are
        // clamped by the estimator.
        let bins = crate::ranging::bins_for_distance(
            self.estimator.noise_estimation_interval_m.floor()
                + self.estimator.shift_distance_m,
            fft_size,
            1,
        );
        if bins >= fft_size as f64 {
            return Err(RangingError::Config(format!(
                "noise window and shift ({:.0} bins) exceed fft_size {}",
                bins, fft_size
            )));
        }

        Ok(())
    }
}
