#![allow(dead_code)]

use csranging::constants::SPEED_OF_LIGHT;
use csranging::sample::{ComplexSample, RawProcedureSample, SingleSideData, StepTonePct};
use num_complex::Complex64;
use std::f64::consts::TAU;

/// Per-path tone slots followed by an empty extension tone slot
pub fn side(paths: Vec<Vec<Complex64>>) -> SingleSideData {
    let mut slots: Vec<Option<StepTonePct>> = paths
        .into_iter()
        .map(|tones| {
            Some(StepTonePct {
                tone_quality_indicator: vec![0; tones.len()],
                tone_pcts: tones.into_iter().map(ComplexSample::from).collect(),
            })
        })
        .collect();
    slots.push(Some(StepTonePct::default()));
    SingleSideData {
        step_tone_pcts: Some(slots),
        ..Default::default()
    }
}

/// One-way phase of `distance_m` on channel `ch`
pub fn one_way_phase(ch: u8, distance_m: f64) -> f64 {
    let f = 2402e6 + ch as f64 * 1e6;
    -TAU * f * distance_m / SPEED_OF_LIGHT
}

/// Two-sided procedure whose reciprocal product is a pure phase ramp
///
/// Every antenna path sees `distance_m`; path `a` carries a local oscillator
/// offset of `0.3 * a` that cancels in the product.
pub fn two_sided_procedure(channels: &[u8], distance_m: f64, num_paths: usize) -> RawProcedureSample {
    let tones = |a: usize, sign: f64| -> Vec<Complex64> {
        channels
            .iter()
            .map(|&ch| {
                Complex64::from_polar(1.0, one_way_phase(ch, distance_m) + sign * 0.3 * a as f64)
            })
            .collect()
    };
    RawProcedureSample {
        num_antenna_paths: num_paths as u8,
        step_channels: channels.to_vec(),
        initiator_data: side((0..num_paths).map(|a| tones(a, 1.0)).collect()),
        reflector_data: side((0..num_paths).map(|a| tones(a, -1.0)).collect()),
        ..Default::default()
    }
}

pub fn full_band() -> Vec<u8> {
    (2..78).collect()
}
