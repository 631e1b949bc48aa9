//! Ranging session: owns one estimator and reports results to a callback.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::config::RangingConfig;
use crate::error::Result;
use crate::estimator::DistanceEstimator;
use crate::procedure::{ProcedureData, convert_procedure_data};
use crate::sample::RawProcedureSample;

/// Why a session was opened or closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionReason {
    LocalStackRequest,
    HalInitiatedRequest,
    SystemPolicy,
    Unspecified,
}

/// Result kinds a session can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Meters,
}

/// Distance result of one procedure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangingResult {
    pub procedure_counter: i32,
    pub timestamp_ms: i64,
    /// Distance in meters, never negative
    pub result_meters: f64,
    /// Confidence in percent (0 or 100)
    pub confidence_level: u8,
}

/// Receiver of session notifications
pub trait SessionCallback: Send {
    fn on_opened(&mut self, reason: SessionReason);

    fn on_result(&mut self, result: &RangingResult);

    fn on_close(&mut self, reason: SessionReason);
}

/// Notification forwarded by [`ChannelCallback`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Opened(SessionReason),
    Result(RangingResult),
    Closed(SessionReason),
}

/// Callback that forwards every notification over a crossbeam channel
pub struct ChannelCallback {
    tx: Sender<SessionEvent>,
}

impl ChannelCallback {
    pub fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            log::warn!("Session event receiver disconnected");
        }
    }
}

impl SessionCallback for ChannelCallback {
    fn on_opened(&mut self, reason: SessionReason) {
        self.send(SessionEvent::Opened(reason));
    }

    fn on_result(&mut self, result: &RangingResult) {
        self.send(SessionEvent::Result(*result));
    }

    fn on_close(&mut self, reason: SessionReason) {
        self.send(SessionEvent::Closed(reason));
    }
}

/// One ranging session
pub struct RangingSession {
    callback: Box<dyn SessionCallback>,
    estimator: DistanceEstimator,
}

impl RangingSession {
    /// Open a session; `on_opened` is delivered before this returns
    pub fn new(
        mut callback: Box<dyn SessionCallback>,
        reason: SessionReason,
        config: RangingConfig,
    ) -> Result<Self> {
        let estimator = DistanceEstimator::new(config)?;
        callback.on_opened(reason);
        Ok(Self {
            callback,
            estimator,
        })
    }

    pub fn supported_result_types(&self) -> &'static [ResultType] {
        &[ResultType::Meters]
    }

    pub fn is_aborted_procedure_required(&self) -> bool {
        false
    }

    /// Estimate the distance of one raw procedure and report it
    ///
    /// Procedures without step channels are skipped and produce no result.
    pub fn write_raw_data(&mut self, raw: &RawProcedureSample) -> Option<RangingResult> {
        if raw.step_channels.is_empty() {
            log::warn!(
                "Procedure {} has no step channels, skipping",
                raw.procedure_counter
            );
            return None;
        }

        self.estimator.reset();
        let result_meters = self.estimator.estimate_distance(raw);
        let result = RangingResult {
            procedure_counter: raw.procedure_counter,
            timestamp_ms: raw.timestamp_ms,
            result_meters,
            confidence_level: (self.estimator.confidence_level() * 100.0).round() as u8,
        };

        log::debug!("Result: {:.3} m", result.result_meters);
        self.callback.on_result(&result);
        Some(result)
    }

    /// Convert structured procedure data, then handle it as raw data
    pub fn write_procedure_data(&mut self, data: &ProcedureData) -> Option<RangingResult> {
        let raw = convert_procedure_data(data);
        self.write_raw_data(&raw)
    }

    pub fn close(&mut self, reason: SessionReason) {
        self.callback.on_close(reason);
    }

    pub fn estimator(&self) -> &DistanceEstimator {
        &self.estimator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SENTINEL_DISTANCE_M;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_open_and_close_notifications() {
        let (tx, rx) = unbounded();
        let mut session = RangingSession::new(
            Box::new(ChannelCallback::new(tx)),
            SessionReason::LocalStackRequest,
            RangingConfig::default(),
        )
        .unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Opened(SessionReason::LocalStackRequest)
        );

        assert_eq!(session.supported_result_types(), &[ResultType::Meters]);
        assert!(!session.is_aborted_procedure_required());

        session.close(SessionReason::SystemPolicy);
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Closed(SessionReason::SystemPolicy)
        );
    }

    #[test]
    fn test_empty_step_channels_skipped() {
        let (tx, rx) = unbounded();
        let mut session = RangingSession::new(
            Box::new(ChannelCallback::new(tx)),
            SessionReason::Unspecified,
            RangingConfig::default(),
        )
        .unwrap();
        rx.try_recv().unwrap();

        assert!(session.write_raw_data(&RawProcedureSample::default()).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rejected_procedure_reports_sentinel() {
        let (tx, rx) = unbounded();
        let mut session = RangingSession::new(
            Box::new(ChannelCallback::new(tx)),
            SessionReason::Unspecified,
            RangingConfig::default(),
        )
        .unwrap();
        rx.try_recv().unwrap();

        let raw = RawProcedureSample {
            procedure_counter: 3,
            step_channels: vec![2, 4, 6],
            ..Default::default()
        };
        let result = session.write_raw_data(&raw).unwrap();
        assert_eq!(result.result_meters, SENTINEL_DISTANCE_M);
        assert_eq!(result.confidence_level, 0);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Result(result));
    }

    #[test]
    fn test_invalid_config_fails_before_open() {
        let (tx, rx) = unbounded();
        let mut config = RangingConfig::default();
        config.estimator.fft_size = 100;
        let session = RangingSession::new(
            Box::new(ChannelCallback::new(tx)),
            SessionReason::Unspecified,
            config,
        );
        assert!(session.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_receiver_does_not_panic() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut session = RangingSession::new(
            Box::new(ChannelCallback::new(tx)),
            SessionReason::Unspecified,
            RangingConfig::default(),
        )
        .unwrap();
        session.close(SessionReason::Unspecified);
    }
}
