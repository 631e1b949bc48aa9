use crate::config::PeakSelection;

/// Result of a peak search over a circularly shifted spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSearch {
    /// (bin, dB value) pairs in ascending bin order, shifted frame
    pub peaks: Vec<(usize, f64)>,
    /// False when no peak reached the threshold and `peaks` holds only the
    /// global maximum
    pub valid: bool,
}

impl PeakSearch {
    /// Pick the reported peak according to `selection`
    ///
    /// Returns `None` only for an empty spectrum.
    pub fn select(&self, selection: PeakSelection) -> Option<(usize, f64)> {
        match selection {
            PeakSelection::First => self.peaks.first().copied(),
            PeakSelection::Strongest => self
                .peaks
                .iter()
                .copied()
                .fold(None, |best: Option<(usize, f64)>, peak| match best {
                    Some(b) if b.1 >= peak.1 => Some(b),
                    _ => Some(peak),
                }),
        }
    }
}

/// Rotate `values` right by `shift` positions
pub fn rotate_right<T: Copy>(values: &[T], shift: usize) -> Vec<T> {
    let mut out = values.to_vec();
    if !out.is_empty() {
        let len = out.len();
        out.rotate_right(shift % len);
    }
    out
}

/// Find local maxima of a dB spectrum after a circular shift
///
/// The spectrum is rotated right by `shift` bins, then every bin strictly
/// greater than both circular neighbours and at least `threshold_db`
/// qualifies. If none does, the first global maximum is returned and the
/// search is marked invalid.
pub fn find_peaks_db(spectrum_db: &[f64], threshold_db: f64, shift: usize) -> PeakSearch {
    let shifted = rotate_right(spectrum_db, shift);
    let n = shifted.len();
    if n == 0 {
        return PeakSearch {
            peaks: Vec::new(),
            valid: false,
        };
    }

    let mut peaks = Vec::new();
    for i in 0..n {
        let value = shifted[i];
        let prev = shifted[(i + n - 1) % n];
        let next = shifted[(i + 1) % n];
        if value > prev && value > next && value >= threshold_db {
            peaks.push((i, value));
        }
    }

    if !peaks.is_empty() {
        return PeakSearch { peaks, valid: true };
    }

    let mut argmax = 0;
    for (i, &value) in shifted.iter().enumerate() {
        if value > shifted[argmax] {
            argmax = i;
        }
    }
    PeakSearch {
        peaks: vec![(argmax, shifted[argmax])],
        valid: false,
    }
}
