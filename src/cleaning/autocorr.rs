use num_complex::Complex64;

/// Minimum positive spacing between consecutive sorted channels
///
/// Returns 1 when fewer than two channels are present.
pub fn min_channel_spacing(channels: &[u8]) -> u8 {
    channels
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]))
        .filter(|&d| d > 0)
        .min()
        .unwrap_or(1)
}

/// Number of autocorrelation lags for a window and channel spacing
pub fn lag_count(window: usize, delta_f: u8) -> usize {
    (window / delta_f.max(1) as usize).max(1)
}

/// Frequency-domain autocorrelation of one path
///
/// Lag `k` averages `conj(pct[i]) * pct[j]` over all pairs of channels that
/// are exactly `k * delta_f` apart. Lags without any pair are zero.
///
/// # Arguments
/// * `channels` - Ascending, duplicate-free channels
/// * `pct` - Cleaned tone products matching `channels`
/// * `delta_f` - Lag unit in channels
/// * `lags` - Number of lags to compute
pub fn autocorrelation(channels: &[u8], pct: &[Complex64], delta_f: u8, lags: usize) -> Vec<Complex64> {
    let delta_f = delta_f.max(1) as usize;
    let mut sums = vec![Complex64::new(0.0, 0.0); lags];
    let mut counts = vec![0usize; lags];

    for (i, &ch_i) in channels.iter().enumerate() {
        for (j, &ch_j) in channels.iter().enumerate().skip(i) {
            let diff = (ch_j - ch_i) as usize;
            if diff % delta_f != 0 {
                continue;
            }
            let k = diff / delta_f;
            if k < lags {
                sums[k] += pct[i].conj() * pct[j];
                counts[k] += 1;
            }
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count > 0 {
                sum / count as f64
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_spacing() {
        assert_eq!(min_channel_spacing(&[2, 6, 8, 14]), 2);
        assert_eq!(min_channel_spacing(&[3, 6, 9]), 3);
        assert_eq!(min_channel_spacing(&[7]), 1);
        assert_eq!(min_channel_spacing(&[]), 1);
    }

    #[test]
    fn test_lag_count() {
        assert_eq!(lag_count(48, 1), 48);
        assert_eq!(lag_count(48, 2), 24);
        assert_eq!(lag_count(48, 5), 9);
        assert_eq!(lag_count(48, 100), 1);
    }

    #[test]
    fn test_linear_phase_autocorrelation() {
        // conj(c_i) c_j depends only on the channel distance
        let slope = -0.3;
        let channels: Vec<u8> = (0..20).map(|i| 2 * i).collect();
        let pct: Vec<Complex64> = channels
            .iter()
            .map(|&ch| Complex64::from_polar(1.0, slope * ch as f64))
            .collect();
        let r = autocorrelation(&channels, &pct, 2, 24);
        assert_eq!(r.len(), 24);
        for (k, value) in r.iter().enumerate().take(20) {
            let expected = Complex64::from_polar(1.0, slope * 2.0 * k as f64);
            assert!((value - expected).norm() < 1e-12, "lag {}", k);
        }
        // Lags beyond the occupied span have no pairs
        for value in &r[20..] {
            assert_eq!(*value, Complex64::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_gaps_leave_lags_averaged() {
        let channels = [0u8, 1, 3];
        let pct = [
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 0.0),
            Complex64::new(4.0, 0.0),
        ];
        let r = autocorrelation(&channels, &pct, 1, 4);
        assert!((r[0].re - (1.0 + 4.0 + 16.0) / 3.0).abs() < 1e-12);
        assert!((r[1].re - 2.0).abs() < 1e-12);
        assert!((r[2].re - 8.0).abs() < 1e-12);
        assert!((r[3].re - 4.0).abs() < 1e-12);
    }
}
