use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// Sliding-window spatial-smoothing covariance of one path
///
/// A window of `size` taps spaced `delta_f` channels apart slides one channel
/// at a time from the first occupied channel until its last tap reaches the
/// last channel (at least one position). Missing channels contribute zero
/// and are excluded from the per-entry normalization. The result is
/// forward-backward averaged.
pub fn covariance_matrix(
    channels: &[u8],
    pct: &[Complex64],
    delta_f: u8,
    size: usize,
) -> DMatrix<Complex64> {
    let zero = Complex64::new(0.0, 0.0);
    let mut acc = DMatrix::<Complex64>::from_element(size, size, zero);
    let (Some(&first), Some(&last)) = (channels.first(), channels.last()) else {
        return acc;
    };
    if size == 0 {
        return acc;
    }

    let delta_f = delta_f.max(1) as usize;
    let first = first as usize;
    let last = last as usize;
    let span = (size - 1) * delta_f;
    let last_head = last.saturating_sub(span).max(first);

    let mut counts = DMatrix::<f64>::zeros(size, size);
    let mut segment = DVector::<Complex64>::from_element(size, zero);
    let mut present = DVector::<f64>::zeros(size);

    for head in first..=last_head {
        segment.fill(zero);
        present.fill(0.0);
        for tap in 0..size {
            let ch = head + tap * delta_f;
            if ch > last {
                break;
            }
            if let Ok(pos) = channels.binary_search_by(|&c| (c as usize).cmp(&ch)) {
                segment[tap] = pct[pos];
                present[tap] = 1.0;
            }
        }
        acc += &segment * segment.adjoint();
        counts += &present * present.transpose();
    }

    for (value, &count) in acc.iter_mut().zip(counts.iter()) {
        *value = if count > 0.0 { *value / count } else { zero };
    }

    DMatrix::from_fn(size, size, |i, j| {
        (acc[(i, j)] + acc[(size - 1 - i, size - 1 - j)].conj()) * 0.5
    })
}
