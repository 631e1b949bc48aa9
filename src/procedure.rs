//! Structured procedure data and its conversion into a raw sample record.
//!
//! A procedure arrives as per-side lists of subevents, each holding steps of
//! mode 0 (frequency offset calibration), mode 1 (round-trip timing),
//! mode 2 (phase-based tones) or mode 3 (both). Mode-2 tones are sent over a
//! permuted sequence of antenna paths and must be routed back to their path.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_ANTENNA_PATHS;
use crate::sample::{ComplexSample, RawProcedureSample, SingleSideData, StepTonePct};

/// Highest valid antenna permutation index per path count (N! - 1)
pub const MAX_VALID_PERMUTATION_INDEX: [u8; MAX_ANTENNA_PATHS] = [0, 1, 5, 23];

/// Antenna path order (1-based) for every permutation index
pub const ANTENNA_PERMUTATIONS: [[u8; MAX_ANTENNA_PATHS]; 24] = [
    [1, 2, 3, 4],
    [2, 1, 3, 4],
    [1, 3, 2, 4],
    [3, 1, 2, 4],
    [3, 2, 1, 4],
    [2, 3, 1, 4],
    [1, 2, 4, 3],
    [2, 1, 4, 3],
    [1, 4, 2, 3],
    [4, 1, 2, 3],
    [4, 2, 1, 3],
    [2, 4, 1, 3],
    [1, 4, 3, 2],
    [4, 1, 3, 2],
    [1, 3, 4, 2],
    [3, 1, 4, 2],
    [3, 4, 1, 2],
    [4, 3, 1, 2],
    [4, 2, 3, 1],
    [2, 4, 3, 1],
    [4, 3, 2, 1],
    [3, 4, 2, 1],
    [3, 2, 4, 1],
    [2, 3, 4, 1],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureAbortReason {
    #[default]
    Success,
    LocalHostOrRemote,
    InsufficientFilteredChannels,
    InstantHasPassed,
    Unspecified,
}

/// Raw 12-bit I/Q words of one tone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PctIqSample {
    pub i_sample: u16,
    pub q_sample: u16,
}

impl From<PctIqSample> for ComplexSample {
    fn from(s: PctIqSample) -> Self {
        ComplexSample::from_iq_words(s.i_sample, s.q_sample)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RttToaTodData {
    ToaTodInitiator(i32),
    TodToaReflector(i32),
}

impl RttToaTodData {
    pub fn value(&self) -> i32 {
        match self {
            Self::ToaTodInitiator(v) | Self::TodToaReflector(v) => *v,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeZeroData {
    pub packet_quality: u8,
    pub packet_rssi_dbm: i8,
    pub packet_antenna: u8,
    pub initiator_measured_freq_offset: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeOneData {
    pub packet_quality: u8,
    pub packet_nadm: u8,
    pub packet_rssi_dbm: i8,
    pub rtt_toa_tod_data: RttToaTodData,
    pub packet_antenna: u8,
    #[serde(default)]
    pub packet_pct1: Option<PctIqSample>,
    #[serde(default)]
    pub packet_pct2: Option<PctIqSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTwoData {
    pub antenna_permutation_index: u8,
    /// One tone per antenna path in permuted order, then the extension tone
    pub tone_pct_iq_samples: Vec<PctIqSample>,
    pub tone_quality_indicators: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeThreeData {
    pub mode_one_data: ModeOneData,
    pub mode_two_data: ModeTwoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ModeData {
    Zero(ModeZeroData),
    One(ModeOneData),
    Two(ModeTwoData),
    Three(ModeThreeData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    pub step_channel: u8,
    pub step_mode_data: ModeData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubeventResult {
    pub timestamp_nanos: i64,
    pub reference_power_level_dbm: i8,
    pub num_antenna_paths: u8,
    pub step_data: Vec<StepData>,
}

/// Both sides' results of one ranging procedure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcedureData {
    pub procedure_counter: i32,
    pub initiator_procedure_abort_reason: ProcedureAbortReason,
    pub reflector_procedure_abort_reason: ProcedureAbortReason,
    pub initiator_subevent_results: Vec<SubeventResult>,
    pub reflector_subevent_results: Vec<SubeventResult>,
}

/// Whether `permutation_index` exists for `num_antenna_paths` paths
pub fn is_valid_antenna_permutation(permutation_index: u8, num_antenna_paths: u8) -> bool {
    if !(1..=MAX_ANTENNA_PATHS as u8).contains(&num_antenna_paths) {
        return false;
    }
    permutation_index <= MAX_VALID_PERMUTATION_INDEX[num_antenna_paths as usize - 1]
}

/// Slot that tone `k` of a mode-2 step belongs to
///
/// Tone `num_antenna_paths` is the extension tone and keeps the last slot.
/// Returns `None` for tones outside the permutation table.
fn antenna_slot(permutation_index: u8, k: usize, num_antenna_paths: u8) -> Option<usize> {
    let num_paths = num_antenna_paths as usize;
    if k == num_paths {
        return Some(num_paths);
    }
    let path = ANTENNA_PERMUTATIONS
        .get(permutation_index as usize)?
        .get(k)
        .map(|&p| p as usize - 1)?;
    (path <= num_paths).then_some(path)
}

fn populate_mode_one(data: &ModeOneData, side: &mut SingleSideData, toa_tod: &mut Vec<i32>) {
    push(&mut side.packet_quality, data.packet_quality);
    push(&mut side.packet_rssi_dbm, data.packet_rssi_dbm);
    push(&mut side.packet_nadm, data.packet_nadm);
    if let Some(pct) = data.packet_pct1 {
        push(&mut side.packet_pct1, pct.into());
    }
    if let Some(pct) = data.packet_pct2 {
        push(&mut side.packet_pct2, pct.into());
    }
    toa_tod.push(data.rtt_toa_tod_data.value());
}

fn populate_mode_two(data: &ModeTwoData, num_antenna_paths: u8, side: &mut SingleSideData) {
    let index = data.antenna_permutation_index;
    if !is_valid_antenna_permutation(index, num_antenna_paths) {
        log::warn!(
            "Invalid antenna permutation data (index: {}, paths: {})",
            index,
            num_antenna_paths
        );
        return;
    }

    let slots = side.step_tone_pcts.get_or_insert_with(Vec::new);
    for (k, &iq) in data.tone_pct_iq_samples.iter().enumerate() {
        let Some(slot) = antenna_slot(index, k, num_antenna_paths) else {
            log::error!(
                "Tone {} has no antenna path for permutation {} with {} paths",
                k,
                index,
                num_antenna_paths
            );
            continue;
        };
        let Some(Some(target)) = slots.get_mut(slot) else {
            log::error!("Antenna slot {} missing from tone structure", slot);
            continue;
        };
        target.tone_pcts.push(iq.into());
        if let Some(&quality) = data.tone_quality_indicators.get(k) {
            target.tone_quality_indicator.push(quality);
        }
    }
}

fn push<T>(list: &mut Option<Vec<T>>, value: T) {
    list.get_or_insert_with(Vec::new).push(value);
}

fn populate_side(
    subevents: &[SubeventResult],
    is_initiator: bool,
    side: &mut SingleSideData,
    step_channels: &mut Vec<u8>,
    toa_tod: &mut Vec<i32>,
) {
    side.packet_quality = Some(Vec::new());
    side.packet_rssi_dbm = Some(Vec::new());
    side.packet_nadm = Some(Vec::new());
    side.measured_freq_offset = Some(Vec::new());
    side.packet_pct1 = Some(Vec::new());
    side.packet_pct2 = Some(Vec::new());
    side.step_tone_pcts = Some(Vec::new());

    for subevent in subevents {
        side.reference_power_dbm = subevent.reference_power_level_dbm;
        let num_paths = subevent.num_antenna_paths;

        // Created once, appended across subevents
        let slots = side.step_tone_pcts.get_or_insert_with(Vec::new);
        let wanted = if num_paths > 0 { num_paths as usize + 1 } else { 0 };
        if slots.len() < wanted {
            slots.resize_with(wanted, || Some(StepTonePct::default()));
        }

        for step in &subevent.step_data {
            let records_channel = match &step.step_mode_data {
                ModeData::Zero(data) => {
                    push(&mut side.packet_quality, data.packet_quality);
                    push(&mut side.packet_rssi_dbm, data.packet_rssi_dbm);
                    if is_initiator {
                        push(
                            &mut side.measured_freq_offset,
                            data.initiator_measured_freq_offset,
                        );
                    }
                    false
                }
                ModeData::One(data) => {
                    populate_mode_one(data, side, toa_tod);
                    true
                }
                ModeData::Two(data) => {
                    populate_mode_two(data, num_paths, side);
                    true
                }
                ModeData::Three(data) => {
                    populate_mode_one(&data.mode_one_data, side, toa_tod);
                    populate_mode_two(&data.mode_two_data, num_paths, side);
                    true
                }
            };
            if records_channel && is_initiator {
                step_channels.push(step.step_channel);
            }
        }
    }
}

/// Convert structured procedure data into a raw sample record
pub fn convert_procedure_data(data: &ProcedureData) -> RawProcedureSample {
    let mut raw = RawProcedureSample {
        procedure_counter: data.procedure_counter,
        aborted: data.initiator_procedure_abort_reason != ProcedureAbortReason::Success
            || data.reflector_procedure_abort_reason != ProcedureAbortReason::Success,
        ..Default::default()
    };

    if let Some(first) = data.initiator_subevent_results.first() {
        raw.timestamp_ms = first.timestamp_nanos / 1_000_000;
        raw.num_antenna_paths = first.num_antenna_paths;
    }

    let mut toa_tod_initiator = Vec::new();
    let mut tod_toa_reflector = Vec::new();
    populate_side(
        &data.initiator_subevent_results,
        true,
        &mut raw.initiator_data,
        &mut raw.step_channels,
        &mut toa_tod_initiator,
    );
    populate_side(
        &data.reflector_subevent_results,
        false,
        &mut raw.reflector_data,
        &mut raw.step_channels,
        &mut tod_toa_reflector,
    );

    if !toa_tod_initiator.is_empty() {
        raw.toa_tod_initiator = Some(toa_tod_initiator);
    }
    if !tod_toa_reflector.is_empty() {
        raw.tod_toa_reflector = Some(tod_toa_reflector);
    }

    raw
}

impl From<&ProcedureData> for RawProcedureSample {
    fn from(data: &ProcedureData) -> Self {
        convert_procedure_data(data)
    }
}
