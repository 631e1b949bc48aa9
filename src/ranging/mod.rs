//! Spectral ranging: delay-profile estimation from the cleaned
//! autocorrelation and combining across antenna paths.

pub mod combining;
pub mod fft;
pub mod peaks;
pub mod zp_ifft;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{CHANNEL_SPACING_HZ, SPEED_OF_LIGHT};

pub use combining::post_combine_choose_min;
pub use fft::Radix2Fft;
pub use peaks::{PeakSearch, find_peaks_db};
pub use zp_ifft::{PathEstimate, ZeroPaddedIfft, build_cfr_sequence};

/// One detected component of the channel impulse response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CirTap {
    /// Source antenna path, `None` for combined estimates
    pub antenna_path: Option<usize>,
    pub distance_m: f64,
    pub coefficient: Complex64,
}

/// Number of delay-profile bins spanned by `distance_m`
///
/// One bin of an `fft_size` transform over a `delta_f` channel spacing
/// corresponds to `c / (2 * fft_size * delta_f * 1 MHz)` meters of range.
pub fn bins_for_distance(distance_m: f64, fft_size: usize, delta_f: u8) -> f64 {
    distance_m * 2.0 * fft_size as f64 * delta_f as f64 * CHANNEL_SPACING_HZ / SPEED_OF_LIGHT
}
