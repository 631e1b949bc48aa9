use super::zp_ifft::PathEstimate;

/// Combine per-path estimates into one (distance, confident) pair
///
/// The smallest distance among confident paths wins. Without any confident
/// path the first path's distance is reported as not confident. Returns
/// `None` when there are no estimates.
pub fn post_combine_choose_min(estimates: &[PathEstimate]) -> Option<(f64, bool)> {
    let first = estimates.first()?;
    let best = estimates
        .iter()
        .filter(|e| e.confident)
        .map(|e| e.distance_m)
        .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.min(d))));
    Some(match best {
        Some(distance) => (distance, true),
        None => (first.distance_m, false),
    })
}
