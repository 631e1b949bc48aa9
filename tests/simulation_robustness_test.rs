use csranging::config::{CombiningMode, PeakSelection};
use csranging::simulation::{
    ChannelPlan, ImpairmentConfig, MultipathComponent, ProcedureGenerator, Scenario,
    measure_error_across_distances,
};
use csranging::{DistanceEstimator, RangingConfig};

fn strongest_config() -> RangingConfig {
    let mut config = RangingConfig::default();
    config.estimator.peak_selection = PeakSelection::Strongest;
    config
}

fn hopped() -> ChannelPlan {
    ChannelPlan::Hopped {
        first: 2,
        last: 77,
        step: 1,
    }
}

#[test]
fn test_awgn_robustness() {
    let distances = [1.0, 2.5, 4.0, 6.0, 8.0];
    for &(snr_db, max_error) in &[(20.0, 0.15), (10.0, 0.3)] {
        let stats = measure_error_across_distances(
            &Scenario::default(),
            &ImpairmentConfig::default()
                .with_seed(100)
                .with_awgn(snr_db)
                .with_random_lo_phase(),
            &strongest_config(),
            &distances,
            4,
        )
        .unwrap();
        assert_eq!(stats.count, 20);
        assert!(
            stats.max_abs_error < max_error,
            "SNR {} dB: {:?}",
            snr_db,
            stats
        );
    }
}

#[test]
fn test_clean_first_peak_sweep() {
    let stats = measure_error_across_distances(
        &Scenario::default(),
        &ImpairmentConfig::default().with_seed(1),
        &RangingConfig::default(),
        &[0.5, 1.5, 2.5, 3.5, 4.5, 5.5],
        1,
    )
    .unwrap();
    assert_eq!(stats.confident_fraction, 1.0);
    assert!(stats.max_abs_error < 0.1, "{:?}", stats);
}

#[test]
fn test_hopped_channels_with_drift() {
    let scenario = Scenario::at_distance(3.0).with_channel_plan(hopped());
    let impairments = ImpairmentConfig::default()
        .with_seed(21)
        .with_drift(0.01)
        .with_random_lo_phase();
    let mut generator = ProcedureGenerator::new(scenario, impairments);
    let mut estimator = DistanceEstimator::new(RangingConfig::default()).unwrap();

    for _ in 0..3 {
        estimator.reset();
        let distance = estimator.estimate_distance(&generator.next_raw());
        assert!((estimator.context().doppler_mean - 0.01).abs() < 1e-6);
        assert!((distance - 3.0).abs() < 0.1, "got {}", distance);
        assert_eq!(estimator.confidence_level(), 1.0);
    }
}

#[test]
fn test_sweep_order_drift_not_separable() {
    // Sweep order: drift is indistinguishable from distance, so it is
    // absorbed into the channel slope and not reported as Doppler
    let impairments = ImpairmentConfig::default().with_seed(4).with_drift(0.01);
    let mut generator = ProcedureGenerator::new(Scenario::at_distance(3.0), impairments);
    let mut estimator = DistanceEstimator::new(RangingConfig::default()).unwrap();
    estimator.estimate_distance(&generator.next_raw());
    assert!(estimator.context().doppler_mean.abs() < 1e-9);
}

#[test]
fn test_multipath_direct_path_selected() {
    let impairments = ImpairmentConfig::default()
        .with_seed(5)
        .with_multipath(vec![MultipathComponent {
            excess_distance_m: 10.0,
            amplitude: 0.3,
            phase_offset: 1.0,
        }]);
    let mut generator = ProcedureGenerator::new(Scenario::at_distance(2.0), impairments);
    let mut estimator = DistanceEstimator::new(RangingConfig::default()).unwrap();
    let distance = estimator.estimate_distance(&generator.next_raw());
    assert!((distance - 2.0).abs() < 0.2, "got {}", distance);
}

#[test]
fn test_pre_combining_with_noise() {
    let mut config = strongest_config();
    config.combining.mode = CombiningMode::PreCombining;
    let stats = measure_error_across_distances(
        &Scenario::default().with_antenna_paths(4),
        &ImpairmentConfig::default()
            .with_seed(77)
            .with_awgn(10.0)
            .with_random_lo_phase(),
        &config,
        &[2.0, 5.0],
        3,
    )
    .unwrap();
    assert!(stats.max_abs_error < 0.3, "{:?}", stats);
}
