mod measure;
mod noise;
mod scenario;

pub use measure::{
    DistanceMeasurement, ErrorStats, measure_distance, measure_error_across_distances,
};
pub use noise::{
    AdditiveNoiseConfig, DriftConfig, ImpairmentConfig, MultipathComponent, MultipathConfig,
    apply_additive_noise, random_phases, shuffle,
};
pub use scenario::{
    BASE_FREQUENCY_HZ, ChannelPlan, ProcedureGenerator, Scenario, SyntheticTones,
    quantize_component,
};
