use num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::{RangingError, Result};

/// Fixed-size iterative radix-2 FFT
///
/// The transform length is fixed at construction and must be a power of two.
/// The bit-reversal permutation is computed once; twiddle factors are
/// generated per stage by repeated multiplication.
#[derive(Debug, Clone)]
pub struct Radix2Fft {
    size: usize,
    log2_size: u32,
    bit_reverse: Vec<usize>,
}

impl Radix2Fft {
    /// Create a transform of length `size`
    ///
    /// Returns `RangingError::InvalidFftSize` unless `size` is a power of two
    /// of at least 2.
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(RangingError::InvalidFftSize(size));
        }
        let log2_size = size.trailing_zeros();
        let bit_reverse = (0..size).map(|i| bit_reverse(i, log2_size)).collect();
        Ok(Self {
            size,
            log2_size,
            bit_reverse,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn log2_size(&self) -> u32 {
        self.log2_size
    }

    /// Inverse transform, scaled by `1/size`
    ///
    /// # Panics
    /// If `input` or `output` is not exactly `size` long.
    pub fn inverse(&self, input: &[Complex64], output: &mut [Complex64]) {
        self.transform(input, output, 1.0);
        let scale = 1.0 / self.size as f64;
        for value in output.iter_mut() {
            *value *= scale;
        }
    }

    /// Forward transform, unscaled
    ///
    /// # Panics
    /// If `input` or `output` is not exactly `size` long.
    pub fn forward(&self, input: &[Complex64], output: &mut [Complex64]) {
        self.transform(input, output, -1.0);
    }

    fn transform(&self, input: &[Complex64], output: &mut [Complex64], sign: f64) {
        assert_eq!(input.len(), self.size, "FFT input length");
        assert_eq!(output.len(), self.size, "FFT output length");

        for (i, &value) in input.iter().enumerate() {
            output[self.bit_reverse[i]] = value;
        }

        for stage in 1..=self.log2_size {
            let m = 1usize << stage;
            let half = m / 2;
            let omega_m = Complex64::from_polar(1.0, sign * 2.0 * PI / m as f64);
            for k in (0..self.size).step_by(m) {
                let mut omega = Complex64::new(1.0, 0.0);
                for j in 0..half {
                    let t = omega * output[k + j + half];
                    let u = output[k + j];
                    output[k + j] = u + t;
                    output[k + j + half] = u - t;
                    omega *= omega_m;
                }
            }
        }
    }
}

fn bit_reverse(value: usize, bits: u32) -> usize {
    let mut out = 0;
    for ix in 0..bits {
        out |= ((value >> ix) & 1) << (bits - ix - 1);
    }
    out
}
