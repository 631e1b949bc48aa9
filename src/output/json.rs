use serde::Serialize;

use super::{Formatter, RangingOutput, iso8601_timestamp};

pub struct JsonFormatter;

#[derive(Serialize)]
struct Line<'a> {
    ts: String,
    #[serde(flatten)]
    output: &'a RangingOutput,
}

impl Formatter for JsonFormatter {
    fn format(&self, output: &RangingOutput) -> String {
        let line = Line {
            ts: iso8601_timestamp(),
            output,
        };
        serde_json::to_string(&line).unwrap_or_else(|e| {
            log::error!("Failed to serialize output: {}", e);
            String::new()
        })
    }
}
