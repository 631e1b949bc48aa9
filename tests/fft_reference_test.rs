use approx::assert_abs_diff_eq;
use csranging::RangingConfig;
use csranging::ranging::{Radix2Fft, ZeroPaddedIfft, build_cfr_sequence};
use num_complex::Complex64;
use rustfft::FftPlanner;

fn test_vector(n: usize) -> Vec<Complex64> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            Complex64::new((0.37 * x).sin() + 0.1 * x.cos(), (1.3 * x).cos() - 0.05 * x)
        })
        .collect()
}

fn assert_close(actual: &[Complex64], expected: &[Complex64], epsilon: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_abs_diff_eq!(a.re, e.re, epsilon = epsilon);
        assert_abs_diff_eq!(a.im, e.im, epsilon = epsilon);
    }
}

#[test]
fn test_forward_matches_rustfft() {
    for &n in &[2, 8, 64, 1024] {
        let input = test_vector(n);
        let mut output = vec![Complex64::new(0.0, 0.0); n];
        Radix2Fft::new(n).unwrap().forward(&input, &mut output);

        let mut expected = input.clone();
        FftPlanner::new().plan_fft_forward(n).process(&mut expected);
        assert_close(&output, &expected, 1e-9 * n as f64);
    }
}

#[test]
fn test_inverse_matches_scaled_rustfft() {
    let n = 4096;
    let input = test_vector(n);
    let mut output = vec![Complex64::new(0.0, 0.0); n];
    Radix2Fft::new(n).unwrap().inverse(&input, &mut output);

    let mut expected = input.clone();
    FftPlanner::new().plan_fft_inverse(n).process(&mut expected);
    for value in expected.iter_mut() {
        *value /= n as f64;
    }
    assert_close(&output, &expected, 1e-9);
}

#[test]
fn test_round_trip_identity() {
    let n = 512;
    let fft = Radix2Fft::new(n).unwrap();
    let input = test_vector(n);
    let mut spectrum = vec![Complex64::new(0.0, 0.0); n];
    let mut back = vec![Complex64::new(0.0, 0.0); n];
    fft.forward(&input, &mut spectrum);
    fft.inverse(&spectrum, &mut back);
    assert_close(&back, &input, 1e-9);
}

#[test]
fn test_delay_profile_matches_rustfft() {
    let config = RangingConfig::default();
    let zp = ZeroPaddedIfft::new(&config.estimator).unwrap();
    let cfr: Vec<Complex64> = (0..48)
        .map(|k| Complex64::from_polar(1.0 - k as f64 / 96.0, -0.25 * k as f64))
        .collect();

    let profile = zp.delay_profile(&cfr);

    let mut expected = build_cfr_sequence(&cfr, zp.fft_size());
    FftPlanner::new()
        .plan_fft_inverse(zp.fft_size())
        .process(&mut expected);
    for value in expected.iter_mut() {
        *value /= zp.fft_size() as f64;
    }
    assert_close(&profile, &expected, 1e-12);
}

#[test]
fn test_invalid_sizes_rejected() {
    assert!(Radix2Fft::new(0).is_err());
    assert!(Radix2Fft::new(1).is_err());
    assert!(Radix2Fft::new(48).is_err());
}
