//! Raw procedure record and ingestion into per-path tone sample arrays.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{IQ_FULL_SCALE, IQ_SAMPLE_BITS};

/// One normalized complex tone sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexSample {
    pub real: f64,
    pub imaginary: f64,
}

impl ComplexSample {
    pub fn new(real: f64, imaginary: f64) -> Self {
        Self { real, imaginary }
    }

    /// Build a sample from raw 12-bit I and Q words
    pub fn from_iq_words(i_sample: u16, q_sample: u16) -> Self {
        Self {
            real: iq_word_to_value(i_sample),
            imaginary: iq_word_to_value(q_sample),
        }
    }
}

impl From<ComplexSample> for Complex64 {
    fn from(s: ComplexSample) -> Self {
        Complex64::new(s.real, s.imaginary)
    }
}

impl From<Complex64> for ComplexSample {
    fn from(c: Complex64) -> Self {
        Self::new(c.re, c.im)
    }
}

/// Sign-extend a 12-bit two's-complement word
pub fn sign_extend_12bit(word: u16) -> i16 {
    let shift = 16 - IQ_SAMPLE_BITS;
    ((word << shift) as i16) >> shift
}

/// Convert a 12-bit IQ word to a value in [-1, 1)
pub fn iq_word_to_value(word: u16) -> f64 {
    sign_extend_12bit(word) as f64 / IQ_FULL_SCALE
}

/// Tone samples of one antenna path (or the extension tone slot)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTonePct {
    pub tone_pcts: Vec<ComplexSample>,
    pub tone_quality_indicator: Vec<u8>,
}

/// Everything one side of the exchange reported for a procedure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleSideData {
    pub reference_power_dbm: i8,
    /// One slot per antenna path plus the extension tone slot
    pub step_tone_pcts: Option<Vec<Option<StepTonePct>>>,
    pub packet_quality: Option<Vec<u8>>,
    pub packet_rssi_dbm: Option<Vec<i8>>,
    pub packet_nadm: Option<Vec<u8>>,
    pub measured_freq_offset: Option<Vec<i16>>,
    pub packet_pct1: Option<Vec<ComplexSample>>,
    pub packet_pct2: Option<Vec<ComplexSample>>,
}

impl SingleSideData {
    /// Tone samples of `path`, empty when absent
    pub fn tone_pcts(&self, path: usize) -> &[ComplexSample] {
        self.step_tone_pcts
            .as_ref()
            .and_then(|slots| slots.get(path))
            .and_then(|slot| slot.as_ref())
            .map(|pct| pct.tone_pcts.as_slice())
            .unwrap_or(&[])
    }

    /// Number of slots in the per-path structure
    pub fn slot_count(&self) -> usize {
        self.step_tone_pcts.as_ref().map_or(0, |slots| slots.len())
    }
}

/// Raw data of one ranging procedure, as delivered to the estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProcedureSample {
    pub procedure_counter: i32,
    pub timestamp_ms: i64,
    pub aborted: bool,
    pub num_antenna_paths: u8,
    /// Channel index (0-79) of every step carrying tone data
    pub step_channels: Vec<u8>,
    pub initiator_data: SingleSideData,
    pub reflector_data: SingleSideData,
    pub toa_tod_initiator: Option<Vec<i32>>,
    pub tod_toa_reflector: Option<Vec<i32>>,
}

/// Per-path tone samples of both sides, ready for cleaning
#[derive(Debug, Clone, Default)]
pub struct ProcedurePcts {
    pub step_channels: Vec<u8>,
    pub initiator: Vec<Vec<Complex64>>,
    pub reflector: Vec<Vec<Complex64>>,
    pub reference_power_initiator_dbm: i8,
    pub reference_power_reflector_dbm: i8,
}

impl ProcedurePcts {
    /// Extract the tone samples of a raw procedure
    ///
    /// Returns `None` when the procedure carries no usable tone data: no
    /// initiator tones on the first path (mode-1 only procedure), a missing
    /// per-path structure, or per-path sample counts that disagree with the
    /// number of steps. A reflector path without samples is replaced by the
    /// magnitude of the initiator samples.
    pub fn parse(raw: &RawProcedureSample) -> Option<Self> {
        let initiator = &raw.initiator_data;
        let reflector = &raw.reflector_data;

        if initiator.tone_pcts(0).is_empty() {
            log::debug!("No PCT on antenna path 0, skipping procedure");
            return None;
        }

        let slots = initiator.slot_count();
        if slots < 2 {
            log::warn!("Initiator tone structure has {} slots, need at least 2", slots);
            return None;
        }
        let num_paths = slots - 1;
        let num_steps = raw.step_channels.len();

        let mut pct_initiator = Vec::with_capacity(num_paths);
        let mut pct_reflector = Vec::with_capacity(num_paths);

        for path in 0..num_paths {
            let init_tones = initiator.tone_pcts(path);
            if init_tones.len() != num_steps {
                log::warn!(
                    "Initiator path {} has {} tones for {} steps",
                    path,
                    init_tones.len(),
                    num_steps
                );
                return None;
            }
            let init: Vec<Complex64> = init_tones.iter().map(|&s| s.into()).collect();

            let refl_tones = reflector.tone_pcts(path);
            let refl: Vec<Complex64> = if refl_tones.is_empty() {
                // One-sided PCT
                init.iter().map(|s| Complex64::new(s.norm(), 0.0)).collect()
            } else if refl_tones.len() == num_steps {
                refl_tones.iter().map(|&s| s.into()).collect()
            } else {
                log::warn!(
                    "Reflector path {} has {} tones for {} steps",
                    path,
                    refl_tones.len(),
                    num_steps
                );
                return None;
            };

            pct_initiator.push(init);
            pct_reflector.push(refl);
        }

        Some(Self {
            step_channels: raw.step_channels.clone(),
            initiator: pct_initiator,
            reflector: pct_reflector,
            reference_power_initiator_dbm: initiator.reference_power_dbm,
            reference_power_reflector_dbm: reflector.reference_power_dbm,
        })
    }

    pub fn num_antenna_paths(&self) -> usize {
        self.initiator.len()
    }

    pub fn num_steps(&self) -> usize {
        self.step_channels.len()
    }
}
