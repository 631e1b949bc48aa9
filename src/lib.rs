pub mod cleaning;
pub mod config;
pub mod constants;
pub mod error;
pub mod estimator;
pub mod input;
pub mod output;
pub mod procedure;
pub mod ranging;
pub mod sample;
pub mod session;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::RangingConfig;
pub use error::{RangingError, Result};
pub use estimator::DistanceEstimator;
pub use procedure::{ProcedureData, convert_procedure_data};
pub use sample::RawProcedureSample;
pub use session::{RangingResult, RangingSession, SessionCallback, SessionReason};
