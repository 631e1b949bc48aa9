//! Physical and numeric constants shared by the ranging pipeline.

/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Channel index spacing of the CS channel map, in Hz.
///
/// Channel indices are 1 MHz apart, so a channel-index difference of `Δf`
/// corresponds to `Δf * CHANNEL_SPACING_HZ` Hz.
pub const CHANNEL_SPACING_HZ: f64 = 1e6;

/// Distance reported when no estimate could be made.
pub const SENTINEL_DISTANCE_M: f64 = 999.0;

/// Full-scale value of a 12-bit two's-complement IQ word.
pub const IQ_FULL_SCALE: f64 = 2048.0;

/// Number of significant bits in a PCT IQ word.
pub const IQ_SAMPLE_BITS: u32 = 12;

/// Maximum number of antenna paths in a CS procedure.
pub const MAX_ANTENNA_PATHS: usize = 4;

/// Relative determinant below which the Doppler normal equations are treated
/// as rank deficient.
pub const RANK_EPSILON: f64 = 1e-9;
