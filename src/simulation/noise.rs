use num_complex::Complex64;
use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;

/// Impairments applied to synthetic tone samples
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ImpairmentConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub drift: Option<DriftConfig>,
    pub multipath: Option<MultipathConfig>,
    /// Randomize the local oscillator phase of every step
    pub random_lo_phase: bool,
}

impl ImpairmentConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f64) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_drift(mut self, rate_rad_per_step: f64) -> Self {
        self.drift = Some(DriftConfig { rate_rad_per_step });
        self
    }

    pub fn with_multipath(mut self, components: Vec<MultipathComponent>) -> Self {
        self.multipath = Some(MultipathConfig { components });
        self
    }

    pub fn with_random_lo_phase(mut self) -> Self {
        self.random_lo_phase = true;
        self
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct AdditiveNoiseConfig {
    /// Per-side tone SNR
    pub snr_db: f64,
}

/// Phase drift of the reciprocal product between consecutive steps
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct DriftConfig {
    pub rate_rad_per_step: f64,
}

/// Reflection arriving `excess_distance_m` after the direct path
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct MultipathComponent {
    pub excess_distance_m: f64,
    pub amplitude: f64,
    #[serde(default)]
    pub phase_offset: f64,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct MultipathConfig {
    pub components: Vec<MultipathComponent>,
}

pub(super) fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Add complex white Gaussian noise at `snr_db` relative to `amplitude`
pub fn apply_additive_noise(
    tones: &mut [Complex64],
    amplitude: f64,
    config: &AdditiveNoiseConfig,
    rng: &mut ChaCha8Rng,
) {
    let std = amplitude * 10f64.powf(-config.snr_db / 20.0) / 2f64.sqrt();
    let Ok(normal) = Normal::new(0.0, std) else {
        return;
    };
    for tone in tones.iter_mut() {
        *tone += Complex64::new(normal.sample(rng), normal.sample(rng));
    }
}

/// Uniform random phases in [0, 2π)
pub fn random_phases(n: usize, rng: &mut ChaCha8Rng) -> Vec<f64> {
    (0..n).map(|_| rng.random::<f64>() * TAU).collect()
}

/// In-place Fisher-Yates shuffle
pub fn shuffle<T>(values: &mut [T], rng: &mut ChaCha8Rng) {
    for i in (1..values.len()).rev() {
        let j = ((rng.random::<f64>() * (i + 1) as f64) as usize).min(i);
        values.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_power_matches_snr() {
        let mut rng = create_rng(Some(1));
        let mut tones = vec![Complex64::new(0.0, 0.0); 20000];
        apply_additive_noise(&mut tones, 0.5, &AdditiveNoiseConfig { snr_db: 10.0 }, &mut rng);
        let power = tones.iter().map(|t| t.norm_sqr()).sum::<f64>() / tones.len() as f64;
        let expected = 0.25 / 10.0;
        assert!((power - expected).abs() < 0.1 * expected, "power {}", power);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = random_phases(8, &mut create_rng(Some(42)));
        let b = random_phases(8, &mut create_rng(Some(42)));
        assert_eq!(a, b);
        assert!(a.iter().all(|&p| (0.0..TAU).contains(&p)));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut values: Vec<u8> = (0..40).collect();
        shuffle(&mut values, &mut create_rng(Some(3)));
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(sorted, (0..40).collect::<Vec<u8>>());
        assert_ne!(values, sorted);
    }

    #[test]
    fn test_builder() {
        let config = ImpairmentConfig::default()
            .with_seed(5)
            .with_awgn(20.0)
            .with_drift(0.01)
            .with_random_lo_phase();
        assert_eq!(config.seed, Some(5));
        assert!(config.additive.is_some());
        assert!(config.drift.is_some());
        assert!(config.multipath.is_none());
        assert!(config.random_lo_phase);
    }
}
