use super::{Formatter, RangingOutput, iso8601_timestamp};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &RangingOutput) -> String {
        let peak = output
            .peak_db
            .map_or(String::new(), |p| format!("{:.1}", p));
        let noise = output
            .noise_floor_db
            .map_or(String::new(), |n| format!("{:.1}", n));
        format!(
            "{},{},{},{:.3},{:.3},{:.0},{},{},{},{:.5},{},{}",
            iso8601_timestamp(),
            output.procedure_counter,
            output.timestamp_ms,
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
    }

    fn header(&self) -> Option<&'static str> {
        Some(
            "ts,procedure_counter,timestamp_ms,distance_m,raw_distance_m,confidence,num_antenna_paths,num_channels,delta_f,doppler_rad_per_step,peak_db,noise_floor_db",
        )
    }
}
