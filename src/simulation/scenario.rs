//! Synthetic Channel Sounding procedures.
//!
//! Tones follow a free-space model: on channel `ch` each side observes the
//! one-way channel `H(f) = Σ a·exp(-j2πf·d/c)` at `f = 2402 MHz + ch MHz`,
//! rotated by its local oscillator phase. The reciprocal product of both
//! sides is then `H(f)²` plus any configured drift.

use num_complex::Complex64;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;

use crate::constants::{CHANNEL_SPACING_HZ, IQ_FULL_SCALE, MAX_ANTENNA_PATHS, SPEED_OF_LIGHT};
use crate::procedure::{
    ANTENNA_PERMUTATIONS, MAX_VALID_PERMUTATION_INDEX, ModeData, ModeTwoData, ModeZeroData,
    PctIqSample, ProcedureData, StepData, SubeventResult,
};
use crate::sample::{ComplexSample, RawProcedureSample, SingleSideData, StepTonePct};

use super::noise::{ImpairmentConfig, apply_additive_noise, create_rng, random_phases, shuffle};

/// Frequency of channel index 0
pub const BASE_FREQUENCY_HZ: f64 = 2402e6;

/// Order in which channels are visited
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelPlan {
    /// Ascending sweep `first, first + step, ..` up to `last`
    Sweep { first: u8, last: u8, step: u8 },
    /// The sweep channels in random order
    Hopped { first: u8, last: u8, step: u8 },
    /// Exactly these channels, revisits allowed
    Explicit { channels: Vec<u8> },
}

impl Default for ChannelPlan {
    fn default() -> Self {
        Self::Sweep {
            first: 2,
            last: 77,
            step: 1,
        }
    }
}

impl ChannelPlan {
    pub fn channels(&self, rng: &mut ChaCha8Rng) -> Vec<u8> {
        match self {
            Self::Sweep { first, last, step } => sweep(*first, *last, *step),
            Self::Hopped { first, last, step } => {
                let mut channels = sweep(*first, *last, *step);
                shuffle(&mut channels, rng);
                channels
            }
            Self::Explicit { channels } => channels.clone(),
        }
    }
}

fn sweep(first: u8, last: u8, step: u8) -> Vec<u8> {
    (first..=last).step_by(step.max(1) as usize).collect()
}

/// Geometry and channel plan of a synthetic procedure
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Scenario {
    pub distance_m: f64,
    pub num_antenna_paths: u8,
    /// Extra one-way distance per antenna path
    pub path_offsets_m: Vec<f64>,
    pub channel_plan: ChannelPlan,
    /// Tone magnitude before noise (full scale is 1.0)
    pub amplitude: f64,
    /// Only the initiator reports tones, already carrying the round trip
    pub one_sided: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            distance_m: 3.0,
            num_antenna_paths: 1,
            path_offsets_m: Vec::new(),
            channel_plan: ChannelPlan::default(),
            amplitude: 0.5,
            one_sided: false,
        }
    }
}

impl Scenario {
    pub fn at_distance(distance_m: f64) -> Self {
        Self {
            distance_m,
            ..Default::default()
        }
    }

    pub fn with_antenna_paths(mut self, num_antenna_paths: u8) -> Self {
        self.num_antenna_paths = num_antenna_paths;
        self
    }

    pub fn with_channel_plan(mut self, channel_plan: ChannelPlan) -> Self {
        self.channel_plan = channel_plan;
        self
    }

    pub fn with_path_offsets(mut self, path_offsets_m: Vec<f64>) -> Self {
        self.path_offsets_m = path_offsets_m;
        self
    }

    pub fn one_sided(mut self) -> Self {
        self.one_sided = true;
        self
    }

    fn num_paths(&self) -> usize {
        (self.num_antenna_paths as usize).clamp(1, MAX_ANTENNA_PATHS)
    }
}

/// Tones of one procedure before packing, acquisition order
#[derive(Clone, Debug)]
pub struct SyntheticTones {
    pub step_channels: Vec<u8>,
    pub initiator: Vec<Vec<Complex64>>,
    pub reflector: Vec<Vec<Complex64>>,
}

/// Seeded source of synthetic procedures
pub struct ProcedureGenerator {
    scenario: Scenario,
    impairments: ImpairmentConfig,
    rng: ChaCha8Rng,
    counter: i32,
}

impl ProcedureGenerator {
    pub fn new(scenario: Scenario, impairments: ImpairmentConfig) -> Self {
        let rng = create_rng(impairments.seed);
        Self {
            scenario,
            impairments,
            rng,
            counter: 0,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// One-way channel response of `path` at channel `ch`
    fn channel_response(&self, path: usize, ch: u8) -> Complex64 {
        let f = BASE_FREQUENCY_HZ + ch as f64 * CHANNEL_SPACING_HZ;
        let offset = self.scenario.path_offsets_m.get(path).copied().unwrap_or(0.0);
        let direct = self.scenario.distance_m + offset;
        let ray = |d: f64, a: f64, phi: f64| {
            Complex64::from_polar(a, -TAU * f * d / SPEED_OF_LIGHT + phi)
        };

        let mut h = ray(direct, 1.0, 0.0);
        if let Some(multipath) = &self.impairments.multipath {
            for c in &multipath.components {
                h += ray(direct + c.excess_distance_m, c.amplitude, c.phase_offset);
            }
        }
        h
    }

    /// Generate the tones of the next procedure
    pub fn next_tones(&mut self) -> SyntheticTones {
        let step_channels = self.scenario.channel_plan.channels(&mut self.rng);
        let num_steps = step_channels.len();
        let num_paths = self.scenario.num_paths();
        let amplitude = self.scenario.amplitude;
        let drift = self
            .impairments
            .drift
            .as_ref()
            .map_or(0.0, |d| d.rate_rad_per_step);

        let mut initiator = Vec::with_capacity(num_paths);
        let mut reflector = Vec::with_capacity(num_paths);
        for path in 0..num_paths {
            let lo = if self.impairments.random_lo_phase {
                random_phases(num_steps, &mut self.rng)
            } else {
                vec![0.0; num_steps]
            };

            let mut init = Vec::with_capacity(num_steps);
            let mut refl = Vec::with_capacity(num_steps);
            for (t, &ch) in step_channels.iter().enumerate() {
                let h = self.channel_response(path, ch);
                if self.scenario.one_sided {
                    // Initiator reports the round trip itself
                    init.push(h * h * Complex64::from_polar(amplitude, drift * t as f64));
                    continue;
                }
                let half_drift = drift * t as f64 / 2.0;
                init.push(h * Complex64::from_polar(amplitude, lo[t] + half_drift));
                refl.push(h * Complex64::from_polar(amplitude, half_drift - lo[t]));
            }

            if let Some(noise) = &self.impairments.additive {
                apply_additive_noise(&mut init, amplitude, noise, &mut self.rng);
                apply_additive_noise(&mut refl, amplitude, noise, &mut self.rng);
            }

            initiator.push(init);
            reflector.push(refl);
        }

        SyntheticTones {
            step_channels,
            initiator,
            reflector,
        }
    }

    /// Next procedure as a raw sample record
    pub fn next_raw(&mut self) -> RawProcedureSample {
        let tones = self.next_tones();
        let counter = self.next_counter();
        let side = |paths: &[Vec<Complex64>]| {
            let mut slots: Vec<Option<StepTonePct>> = paths
                .iter()
                .map(|p| {
                    Some(StepTonePct {
                        tone_pcts: p.iter().map(|&c| ComplexSample::from(c)).collect(),
                        tone_quality_indicator: vec![0; p.len()],
                    })
                })
                .collect();
            slots.push(Some(StepTonePct::default()));
            SingleSideData {
                step_tone_pcts: Some(slots),
                ..Default::default()
            }
        };

        RawProcedureSample {
            procedure_counter: counter,
            timestamp_ms: counter as i64 * 100,
            num_antenna_paths: tones.initiator.len() as u8,
            initiator_data: side(&tones.initiator),
            reflector_data: side(&tones.reflector),
            step_channels: tones.step_channels,
            ..Default::default()
        }
    }

    /// Next procedure as structured data with 12-bit IQ words
    ///
    /// Each subevent starts with a mode-0 step, then carries one mode-2 step
    /// per channel. Antenna permutation indices cycle through every valid
    /// permutation.
    pub fn next_procedure_data(&mut self) -> ProcedureData {
        let tones = self.next_tones();
        let counter = self.next_counter();
        let num_paths = tones.initiator.len() as u8;
        let max_index = MAX_VALID_PERMUTATION_INDEX[num_paths as usize - 1];

        let subevent = |paths: &[Vec<Complex64>]| {
            let mut steps = vec![StepData {
                step_channel: 0,
                step_mode_data: ModeData::Zero(ModeZeroData::default()),
            }];
            for (s, &ch) in tones.step_channels.iter().enumerate() {
                let index = (s % (max_index as usize + 1)) as u8;
                let order = &ANTENNA_PERMUTATIONS[index as usize][..num_paths as usize];
                let mut samples: Vec<PctIqSample> = Vec::with_capacity(order.len() + 1);
                if paths.first().is_some_and(|p| !p.is_empty()) {
                    for &p in order {
                        samples.push(quantize(paths[p as usize - 1][s]));
                    }
                    // Extension tone repeats the last switched path
                    samples.push(quantize(paths[order[order.len() - 1] as usize - 1][s]));
                }
                steps.push(StepData {
                    step_channel: ch,
                    step_mode_data: ModeData::Two(ModeTwoData {
                        antenna_permutation_index: index,
                        tone_quality_indicators: vec![0; samples.len()],
                        tone_pct_iq_samples: samples,
                    }),
                });
            }
            SubeventResult {
                timestamp_nanos: counter as i64 * 100_000_000,
                reference_power_level_dbm: 0,
                num_antenna_paths: num_paths,
                step_data: steps,
            }
        };

        ProcedureData {
            procedure_counter: counter,
            initiator_subevent_results: vec![subevent(&tones.initiator)],
            reflector_subevent_results: vec![subevent(&tones.reflector)],
            ..Default::default()
        }
    }

    fn next_counter(&mut self) -> i32 {
        let counter = self.counter;
        self.counter = self.counter.wrapping_add(1);
        counter
    }
}

/// Quantize one normalized component to a 12-bit two's-complement word
pub fn quantize_component(value: f64) -> u16 {
    let scaled = (value * IQ_FULL_SCALE).round().clamp(-IQ_FULL_SCALE, IQ_FULL_SCALE - 1.0);
    (scaled as i16 as u16) & 0x0FFF
}

fn quantize(c: Complex64) -> PctIqSample {
    PctIqSample {
        i_sample: quantize_component(c.re),
        q_sample: quantize_component(c.im),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::convert_procedure_data;
    use crate::sample::iq_word_to_value;

    #[test]
    fn test_quantize_round_trip() {
        for &v in &[0.0, 0.5, -0.5, -1.0, 0.25, -0.123] {
            let back = iq_word_to_value(quantize_component(v));
            assert!((back - v).abs() <= 0.5 / IQ_FULL_SCALE, "{} -> {}", v, back);
        }
        // Saturates at full scale
        assert_eq!(iq_word_to_value(quantize_component(1.5)), 2047.0 / 2048.0);
        assert_eq!(iq_word_to_value(quantize_component(-3.0)), -1.0);
    }

    #[test]
    fn test_channel_plans() {
        let mut rng = create_rng(Some(9));
        let sweep = ChannelPlan::Sweep {
            first: 0,
            last: 18,
            step: 2,
        };
        assert_eq!(sweep.channels(&mut rng), vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);

        let hopped = ChannelPlan::Hopped {
            first: 2,
            last: 77,
            step: 1,
        };
        let mut channels = hopped.channels(&mut rng);
        assert_ne!(channels, sweep_channels(2, 77));
        channels.sort();
        assert_eq!(channels, sweep_channels(2, 77));
    }

    fn sweep_channels(first: u8, last: u8) -> Vec<u8> {
        (first..=last).collect()
    }

    #[test]
    fn test_seeded_generators_agree() {
        let impairments = ImpairmentConfig::default()
            .with_seed(11)
            .with_awgn(15.0)
            .with_random_lo_phase();
        let mut a = ProcedureGenerator::new(Scenario::at_distance(2.0), impairments.clone());
        let mut b = ProcedureGenerator::new(Scenario::at_distance(2.0), impairments);
        assert_eq!(a.next_raw(), b.next_raw());
        assert_eq!(a.next_procedure_data(), b.next_procedure_data());
    }

    #[test]
    fn test_reciprocal_product_cancels_lo_phase() {
        let impairments = ImpairmentConfig::default()
            .with_seed(1)
            .with_random_lo_phase();
        let mut generator = ProcedureGenerator::new(Scenario::at_distance(1.0), impairments);
        let tones = generator.next_tones();
        for (s, &ch) in tones.step_channels.iter().enumerate() {
            let product = tones.initiator[0][s] * tones.reflector[0][s];
            let f = BASE_FREQUENCY_HZ + ch as f64 * CHANNEL_SPACING_HZ;
            let expected = Complex64::from_polar(0.25, -2.0 * TAU * f / SPEED_OF_LIGHT);
            assert!((product - expected).norm() < 1e-9);
        }
    }

    #[test]
    fn test_procedure_data_converts_back() {
        let scenario = Scenario::at_distance(2.0).with_antenna_paths(3);
        let mut generator = ProcedureGenerator::new(scenario, ImpairmentConfig::default());
        let data = generator.next_procedure_data();
        let raw = convert_procedure_data(&data);
        assert_eq!(raw.step_channels.len(), 76);
        assert_eq!(raw.num_antenna_paths, 3);
        for path in 0..3 {
            assert_eq!(raw.initiator_data.tone_pcts(path).len(), 76);
            assert_eq!(raw.reflector_data.tone_pcts(path).len(), 76);
        }
        assert_eq!(raw.initiator_data.tone_pcts(3).len(), 76);

        // Routed tones match the unquantized path tones
        let mut generator = ProcedureGenerator::new(
            Scenario::at_distance(2.0).with_antenna_paths(3),
            ImpairmentConfig::default(),
        );
        let tones = generator.next_tones();
        for path in 0..3 {
            for (s, sample) in raw.initiator_data.tone_pcts(path).iter().enumerate() {
                let c = Complex64::from(*sample);
                assert!((c - tones.initiator[path][s]).norm() < 1e-3);
            }
        }
    }

    #[test]
    fn test_one_sided_procedure() {
        let mut generator =
            ProcedureGenerator::new(Scenario::at_distance(2.0).one_sided(), ImpairmentConfig::default());
        let raw = generator.next_raw();
        assert!(raw.reflector_data.tone_pcts(0).is_empty());
        assert_eq!(raw.initiator_data.tone_pcts(0).len(), 76);

        let data = generator.next_procedure_data();
        let raw = convert_procedure_data(&data);
        assert!(raw.reflector_data.tone_pcts(0).is_empty());
    }
}
