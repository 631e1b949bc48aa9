use super::{Formatter, RangingOutput};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &RangingOutput) -> String {
        if self.verbose {
            let peak = output
                .peak_db
                .map_or("-".to_string(), |p| format!("{:.1} dB", p));
            let noise = output
                .noise_floor_db
                .map_or("-".to_string(), |n| format!("{:.1} dB", n));
            format!(
                "#{} Distance: {:>6.2} m (raw: {:>7.3} m) conf: {:.0} [paths: {}, channels: {}, Δf: {}, doppler: {:.4} rad, peak: {}, noise: {}]",
                output.procedure_counter,
                output.distance_m,
                output.raw_distance_m,
                output.confidence,
                output.num_antenna_paths,
                output.num_channels,
                output.delta_f,
                output.doppler_rad_per_step,
                peak,
                noise
            )
        } else {
            format!(
                "#{} Distance: {:>6.2} m (raw: {:>7.3} m) confidence: {:.0}",
                output.procedure_counter, output.distance_m, output.raw_distance_m, output.confidence
            )
        }
    }
}
