//! Position tracker - accepts or rejects incoming readings.
//!
//! The tracker owns the single current [`TrackedPosition`] and decides, for
//! each incoming [`PositionReading`], whether it is a significant change
//! worth propagating downstream.
//!
//! # Filters
//!
//! Applied in order, after validation:
//!
//! 1. **First reading** - always accepted.
//! 2. **TooSoon** - less than `min_update_interval` since the last accepted fix.
//! 3. **LowAccuracy** - accuracy band worse than `min_quality`.
//! 4. **TooClose** - moved less than `min_distance_m` from the last accepted fix.
//!
//! Every decision is published to subscribers as an [`AcceptanceResult`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{ReentrantMutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::reading::{AccuracyQuality, PositionReading, TrackedPosition};
use crate::geo::distance;
use crate::notify::{NotificationHub, Subscriber};

/// Default minimum time between accepted readings.
pub const DEFAULT_MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

/// Default minimum movement between accepted readings, in meters.
pub const DEFAULT_MIN_DISTANCE_M: f64 = 20.0;

/// Default worst accuracy band still accepted.
pub const DEFAULT_MIN_QUALITY: AccuracyQuality = AccuracyQuality::Good;

/// Filter thresholds for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Minimum time between accepted readings (compared on reading timestamps).
    pub min_update_interval: Duration,
    /// Minimum distance in meters from the last accepted position.
    pub min_distance_m: f64,
    /// Worst accuracy band that is still accepted.
    pub min_quality: AccuracyQuality,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_update_interval: DEFAULT_MIN_UPDATE_INTERVAL,
            min_distance_m: DEFAULT_MIN_DISTANCE_M,
            min_quality: DEFAULT_MIN_QUALITY,
        }
    }
}

impl TrackerConfig {
    pub fn with_min_update_interval(mut self, interval: Duration) -> Self {
        self.min_update_interval = interval;
        self
    }

    pub fn with_min_distance_m(mut self, meters: f64) -> Self {
        self.min_distance_m = meters;
        self
    }

    pub fn with_min_quality(mut self, quality: AccuracyQuality) -> Self {
        self.min_quality = quality;
        self
    }
}

/// Why a reading was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Arrived before the minimum update interval elapsed.
    TooSoon,
    /// Accuracy band worse than the configured minimum.
    LowAccuracy,
    /// Too close to the last accepted position.
    TooClose,
    /// Failed validation (bad coordinate, accuracy, speed or timestamp).
    Invalid,
    /// The tracker has been stopped.
    Stopped,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSoon => write!(f, "too soon"),
            Self::LowAccuracy => write!(f, "low accuracy"),
            Self::TooClose => write!(f, "too close"),
            Self::Invalid => write!(f, "invalid reading"),
            Self::Stopped => write!(f, "tracker stopped"),
        }
    }
}

/// Result of [`PositionTracker::ingest`], also the event published to
/// position subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AcceptanceResult {
    Accepted(TrackedPosition),
    Rejected(RejectReason),
}

impl AcceptanceResult {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The accepted position, if any.
    pub fn position(&self) -> Option<&TrackedPosition> {
        match self {
            Self::Accepted(position) => Some(position),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Lifecycle of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No position accepted yet.
    Empty,
    /// Holding an accepted position.
    Tracking,
}

struct Inner {
    current: Option<TrackedPosition>,
    stopped: bool,
}

/// Owns the current position and filters incoming readings.
///
/// Shared across tasks behind an `Arc`. The state lock is never held while
/// subscribers run. Concurrent callers of [`PositionTracker::ingest`] see
/// their decisions published in the order they were made.
pub struct PositionTracker {
    config: TrackerConfig,
    inner: RwLock<Inner>,
    /// Spans decide + publish. Reentrant so a subscriber may ingest.
    publishing: ReentrantMutex<()>,
    hub: NotificationHub<AcceptanceResult>,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl PositionTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                current: None,
                stopped: false,
            }),
            publishing: ReentrantMutex::new(()),
            hub: NotificationHub::new("position"),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Registers a sink for acceptance and rejection events.
    pub fn subscribe<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<AcceptanceResult> + 'static,
    {
        self.hub.subscribe(sink);
    }

    pub fn unsubscribe<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<AcceptanceResult> + 'static,
    {
        self.hub.unsubscribe(sink);
    }

    /// The currently tracked position.
    pub fn current(&self) -> Option<TrackedPosition> {
        self.inner.read().current.clone()
    }

    pub fn state(&self) -> TrackerState {
        if self.inner.read().current.is_some() {
            TrackerState::Tracking
        } else {
            TrackerState::Empty
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.read().stopped
    }

    /// Quiesces the tracker: the last position is kept, later readings are
    /// neither applied nor published.
    pub fn stop(&self) {
        self.inner.write().stopped = true;
        debug!("Position tracker stopped");
    }

    /// Re-enables a stopped tracker.
    pub fn resume(&self) {
        self.inner.write().stopped = false;
        debug!("Position tracker resumed");
    }

    /// Evaluates a reading and, if accepted, makes it the current position.
    ///
    /// The decision is published to subscribers synchronously before this
    /// method returns, except while the tracker is stopped.
    pub fn ingest(&self, reading: PositionReading) -> AcceptanceResult {
        let _publishing = self.publishing.lock();
        let result = {
            let mut inner = self.inner.write();
            if inner.stopped {
                debug!("Reading ignored, tracker stopped");
                return AcceptanceResult::Rejected(RejectReason::Stopped);
            }

            match self.evaluate(inner.current.as_ref(), &reading) {
                Ok(()) => {
                    let position = TrackedPosition::from(reading);
                    inner.current = Some(position.clone());
                    AcceptanceResult::Accepted(position)
                }
                Err(reason) => AcceptanceResult::Rejected(reason),
            }
        };

        if let AcceptanceResult::Accepted(position) = &result {
            info!(
                latitude = position.coordinate.latitude,
                longitude = position.coordinate.longitude,
                accuracy = position.accuracy,
                quality = %position.accuracy_quality,
                "Position accepted"
            );
        }

        self.hub.publish(&result);
        result
    }

    fn evaluate(
        &self,
        last: Option<&TrackedPosition>,
        reading: &PositionReading,
    ) -> Result<(), RejectReason> {
        if let Err(e) = reading.validate() {
            warn!(error = %e, "Invalid position reading rejected");
            return Err(RejectReason::Invalid);
        }

        let Some(last) = last else {
            return Ok(());
        };

        let elapsed_ms = reading.timestamp_ms.saturating_sub(last.timestamp_ms);
        if elapsed_ms < self.config.min_update_interval.as_millis() as i64 {
            debug!(
                elapsed_ms,
                min_interval_ms = self.config.min_update_interval.as_millis() as u64,
                "Reading rejected: too soon"
            );
            return Err(RejectReason::TooSoon);
        }

        let quality = reading.accuracy_quality();
        if !quality.meets(self.config.min_quality) {
            debug!(
                accuracy = reading.accuracy,
                quality = %quality,
                min_quality = %self.config.min_quality,
                "Reading rejected: low accuracy"
            );
            return Err(RejectReason::LowAccuracy);
        }

        let moved_m = distance(&last.coordinate, &reading.coordinate);
        if moved_m < self.config.min_distance_m {
            debug!(
                moved_m,
                min_distance_m = self.config.min_distance_m,
                "Reading rejected: too close"
            );
            return Err(RejectReason::TooClose);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::notify::tests::Recorder;

    /// ~1 meter of latitude in degrees.
    const METER_DEG: f64 = 1.0 / 111_195.0;

    fn reading_at(lat_offset_m: f64, accuracy: f64, timestamp_ms: i64) -> PositionReading {
        PositionReading::new(
            Coordinate {
                latitude: -23.5505 + lat_offset_m * METER_DEG,
                longitude: -46.6333,
            },
            accuracy,
            timestamp_ms,
        )
    }

    #[test]
    fn test_first_reading_always_accepted() {
        let tracker = PositionTracker::default();
        assert_eq!(tracker.state(), TrackerState::Empty);

        // Even a very poor first fix is accepted
        let result = tracker.ingest(reading_at(0.0, 500.0, 0));
        assert!(result.is_accepted());
        assert_eq!(tracker.state(), TrackerState::Tracking);
        assert_eq!(
            tracker.current().unwrap().accuracy_quality,
            AccuracyQuality::VeryBad
        );
    }

    #[test]
    fn test_too_soon() {
        let tracker = PositionTracker::default();
        tracker.ingest(reading_at(0.0, 8.0, 0));

        let result = tracker.ingest(reading_at(0.0, 8.0, 30_000));
        assert_eq!(result, AcceptanceResult::Rejected(RejectReason::TooSoon));
    }

    #[test]
    fn test_too_close() {
        let tracker = PositionTracker::default();
        tracker.ingest(reading_at(0.0, 8.0, 0));

        let result = tracker.ingest(reading_at(5.0, 8.0, 70_000));
        assert_eq!(result, AcceptanceResult::Rejected(RejectReason::TooClose));
    }

    #[test]
    fn test_low_accuracy() {
        let tracker = PositionTracker::default();
        tracker.ingest(reading_at(0.0, 8.0, 0));

        let result = tracker.ingest(reading_at(50.0, 150.0, 70_000));
        assert_eq!(result, AcceptanceResult::Rejected(RejectReason::LowAccuracy));
    }

    #[test]
    fn test_significant_change_accepted() {
        let tracker = PositionTracker::default();
        tracker.ingest(reading_at(0.0, 8.0, 0));

        let result = tracker.ingest(reading_at(50.0, 25.0, 70_000));
        assert!(result.is_accepted());
        assert_eq!(tracker.current().unwrap().timestamp_ms, 70_000);
    }

    #[test]
    fn test_rejection_keeps_current_position() {
        let tracker = PositionTracker::default();
        tracker.ingest(reading_at(0.0, 8.0, 0));
        let before = tracker.current();

        tracker.ingest(reading_at(500.0, 8.0, 1_000));
        assert_eq!(tracker.current(), before);
    }

    #[test]
    fn test_invalid_reading_rejected_without_state_change() {
        let tracker = PositionTracker::default();
        let mut reading = reading_at(0.0, 8.0, 0);
        reading.coordinate.latitude = f64::NAN;

        let result = tracker.ingest(reading);
        assert_eq!(result, AcceptanceResult::Rejected(RejectReason::Invalid));
        assert_eq!(tracker.state(), TrackerState::Empty);
    }

    #[test]
    fn test_configurable_quality_threshold() {
        let config = TrackerConfig::default().with_min_quality(AccuracyQuality::Bad);
        let tracker = PositionTracker::new(config);
        tracker.ingest(reading_at(0.0, 8.0, 0));

        let result = tracker.ingest(reading_at(50.0, 150.0, 70_000));
        assert!(result.is_accepted());
    }

    #[test]
    fn test_configurable_interval_and_distance() {
        let config = TrackerConfig::default()
            .with_min_update_interval(Duration::from_secs(1))
            .with_min_distance_m(2.0);
        let tracker = PositionTracker::new(config);
        tracker.ingest(reading_at(0.0, 8.0, 0));

        assert!(tracker.ingest(reading_at(5.0, 8.0, 2_000)).is_accepted());
    }

    #[test]
    fn test_events_published_in_order() {
        let tracker = PositionTracker::default();
        let recorder = Recorder::new();
        tracker.subscribe(&recorder);

        tracker.ingest(reading_at(0.0, 8.0, 0));
        tracker.ingest(reading_at(0.0, 8.0, 1_000));

        let events = recorder.take();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_accepted());
        assert_eq!(events[1].reason(), Some(RejectReason::TooSoon));
    }

    #[test]
    fn test_concurrent_ingest_publishes_in_decision_order() {
        let tracker = PositionTracker::default();
        let recorder = Recorder::new();
        tracker.subscribe(&recorder);

        std::thread::scope(|scope| {
            for worker in 0..8u32 {
                let tracker = &tracker;
                scope.spawn(move || {
                    for i in 0..50u32 {
                        let step = f64::from(i * 8 + worker);
                        tracker.ingest(reading_at(step * 50.0, 8.0, (step * 61_000.0) as i64));
                    }
                });
            }
        });

        let accepted: Vec<i64> = recorder
            .take()
            .iter()
            .filter_map(|event| event.position().map(|p| p.timestamp_ms))
            .collect();
        assert!(!accepted.is_empty());
        // Each accepted fix is at least the minimum interval after the previous one
        assert!(accepted.windows(2).all(|pair| pair[1] - pair[0] >= 60_000));
        assert_eq!(accepted.last().copied(), tracker.current().map(|p| p.timestamp_ms));
    }

    #[test]
    fn test_stopped_tracker_retains_position_and_stays_silent() {
        let tracker = PositionTracker::default();
        let recorder = Recorder::new();
        tracker.subscribe(&recorder);

        tracker.ingest(reading_at(0.0, 8.0, 0));
        tracker.stop();
        let result = tracker.ingest(reading_at(500.0, 8.0, 120_000));

        assert_eq!(result, AcceptanceResult::Rejected(RejectReason::Stopped));
        assert_eq!(tracker.current().unwrap().timestamp_ms, 0);
        assert_eq!(recorder.take().len(), 1);

        tracker.resume();
        assert!(tracker.ingest(reading_at(500.0, 8.0, 120_000)).is_accepted());
    }

    #[test]
    fn test_acceptance_result_serializes_tagged() {
        let json = serde_json::to_value(AcceptanceResult::Rejected(RejectReason::TooClose)).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["detail"], "too_close");
    }
}
