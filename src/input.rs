//! Procedure files: JSON holding one record or an array of records, each
//! either structured [`ProcedureData`] or a [`RawProcedureSample`].

use std::path::Path;

use serde_json::Value;

use crate::error::{RangingError, Result};
use crate::procedure::{ProcedureData, convert_procedure_data};
use crate::sample::RawProcedureSample;

#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureRecord {
    Structured(ProcedureData),
    Raw(RawProcedureSample),
}

impl ProcedureRecord {
    fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = &value else {
            return Err(RangingError::InvalidProcedure(
                "record is not a JSON object".to_string(),
            ));
        };
        let structured = map.contains_key("initiator_subevent_results")
            || map.contains_key("reflector_subevent_results");
        let record = if structured {
            serde_json::from_value(value).map(Self::Structured)
        } else {
            serde_json::from_value(value).map(Self::Raw)
        };
        record.map_err(|e| RangingError::InvalidProcedure(e.to_string()))
    }

    pub fn procedure_counter(&self) -> i32 {
        match self {
            Self::Structured(data) => data.procedure_counter,
            Self::Raw(raw) => raw.procedure_counter,
        }
    }

    pub fn into_raw(self) -> RawProcedureSample {
        match self {
            Self::Structured(data) => convert_procedure_data(&data),
            Self::Raw(raw) => raw,
        }
    }
}

pub fn parse_records(json: &str) -> Result<Vec<ProcedureRecord>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| RangingError::InvalidProcedure(e.to_string()))?;
    match value {
        Value::Array(items) => items.into_iter().map(ProcedureRecord::from_value).collect(),
        other => Ok(vec![ProcedureRecord::from_value(other)?]),
    }
}

pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<ProcedureRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_records(&content)
}
