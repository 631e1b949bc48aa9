use num_complex::Complex64;

/// Multiply initiator and reflector tones step by step
///
/// The product cancels the unknown local oscillator phase offsets of the
/// two radios and leaves twice the propagation phase.
///
/// # Arguments
/// * `initiator` - Tone samples per antenna path
/// * `reflector` - Tone samples per antenna path, same shape as `initiator`
pub fn multiply_reciprocal(
    initiator: &[Vec<Complex64>],
    reflector: &[Vec<Complex64>],
) -> Vec<Vec<Complex64>> {
    initiator
        .iter()
        .zip(reflector.iter())
        .map(|(init, refl)| init.iter().zip(refl.iter()).map(|(a, b)| a * b).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oscillator_offset_cancels() {
        // Initiator sees +offset, reflector -offset, both see the path phase
        let offset = 1.234;
        let path = -0.4;
        let initiator = vec![vec![Complex64::from_polar(1.0, path + offset)]];
        let reflector = vec![vec![Complex64::from_polar(0.5, path - offset)]];
        let product = multiply_reciprocal(&initiator, &reflector);
        let expected = Complex64::from_polar(0.5, 2.0 * path);
        assert!((product[0][0] - expected).norm() < 1e-12);
    }

    #[test]
    fn test_shape_follows_input() {
        let initiator = vec![vec![Complex64::new(1.0, 0.0); 5]; 3];
        let reflector = vec![vec![Complex64::new(0.0, 1.0); 5]; 3];
        let product = multiply_reciprocal(&initiator, &reflector);
        assert_eq!(product.len(), 3);
        assert!(product.iter().all(|p| p.len() == 5));
        assert_eq!(product[2][4], Complex64::new(0.0, 1.0));
    }
}
