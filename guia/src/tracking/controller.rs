//! Periodic acquire → filter → resolve → notify orchestration.
//!
//! # Cycle
//!
//! ```text
//! LocationSource ──► PositionTracker::ingest ──► ReverseGeocodeClient::resolve
//!                          │ (rejected: stop)            │
//!                          ▼                             ▼
//!                  position subscribers         AddressNormalizer ──► address hub
//! ```
//!
//! Failures are published on the error hub and never end the loop.
//!
//! An accepted position whose address lookup failed stays pending. Later
//! cycles retry the lookup for it while the tracker still holds that
//! position, even when their own reading is filtered out.
//!
//! # Lifecycle
//!
//! [`TrackingController::start`] spawns one loop task and returns a
//! [`TrackingHandle`]. Cycles never overlap, whether they come from that
//! loop, from a loop started earlier or from [`TrackingController::single_update`];
//! timer ticks that fire while a cycle is still outstanding are skipped. Stopping the
//! handle (explicitly or by dropping it) cancels the timer and quiesces the
//! tracker. A cycle that is in flight at that moment runs to completion but
//! neither feeds the tracker nor publishes anything.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::error::TrackingError;
use super::location::{LocationOptions, LocationSource};
use crate::address::{AddressKind, AddressNormalizer, NormalizedAddress};
use crate::geocode::{AsyncHttpClient, AsyncReqwestClient, RawAddressPayload, ReverseGeocodeClient};
use crate::notify::{NotificationHub, Subscriber};
use crate::position::{AcceptanceResult, PositionTracker, RejectReason, TrackedPosition};

/// Default time between tracking cycles.
pub const DEFAULT_TRACKING_INTERVAL: Duration = Duration::from_secs(20);

/// Shortest accepted interval; shorter requests are raised to this.
pub const MIN_TRACKING_INTERVAL: Duration = Duration::from_millis(100);

/// A resolved address for an accepted position.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressEvent {
    pub position: TrackedPosition,
    pub address: NormalizedAddress,
    pub kind: AddressKind,
    /// Provider response the address was derived from.
    pub payload: Arc<RawAddressPayload>,
}

/// What a single tracking cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// An address was published, for the accepted position or for an
    /// earlier position that was still waiting for one.
    Published(AddressEvent),
    /// The reading was filtered out and no address lookup was pending.
    Rejected(RejectReason),
    /// A step failed; the error was published on the error hub.
    Failed(TrackingError),
    /// Tracking was stopped while the cycle ran; nothing was published.
    Discarded,
}

impl CycleOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Published(_) => "published",
            Self::Rejected(_) => "rejected",
            Self::Failed(_) => "failed",
            Self::Discarded => "discarded",
        }
    }
}

/// Counts outstanding location requests for the duration of a scope.
struct AcquiringGuard<'a>(&'a AtomicUsize);

impl<'a> AcquiringGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for AcquiringGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Shared<L, C> {
    source: L,
    tracker: Arc<PositionTracker>,
    geocoder: Arc<ReverseGeocodeClient<C>>,
    normalizer: AddressNormalizer,
    options: LocationOptions,
    addresses: NotificationHub<AddressEvent>,
    errors: NotificationHub<TrackingError>,
    acquiring: AtomicUsize,
    generation: Arc<AtomicU64>,
    active: Mutex<Option<CancellationToken>>,
    /// Held for the whole of a cycle.
    cycle: tokio::sync::Mutex<()>,
    /// Accepted position with no published address yet.
    unresolved: Mutex<Option<TrackedPosition>>,
}

/// Drives periodic position acquisition and address resolution.
///
/// Cheap to clone; clones share the same hubs, tracker and geocoder.
///
/// # Example
///
/// ```ignore
/// let controller = TrackingController::new(source, tracker, geocoder, LocationOptions::default());
/// controller.subscribe_addresses(&display);
/// let handle = controller.start(DEFAULT_TRACKING_INTERVAL);
/// // ...
/// handle.shutdown().await;
/// ```
pub struct TrackingController<L, C = AsyncReqwestClient> {
    shared: Arc<Shared<L, C>>,
}

impl<L, C> Clone for TrackingController<L, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<L, C> TrackingController<L, C>
where
    L: LocationSource + 'static,
    C: AsyncHttpClient + 'static,
{
    pub fn new(
        source: L,
        tracker: Arc<PositionTracker>,
        geocoder: Arc<ReverseGeocodeClient<C>>,
        options: LocationOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                tracker,
                geocoder,
                normalizer: AddressNormalizer::new(),
                options,
                addresses: NotificationHub::new("address"),
                errors: NotificationHub::new("error"),
                acquiring: AtomicUsize::new(0),
                generation: Arc::new(AtomicU64::new(0)),
                active: Mutex::new(None),
                cycle: tokio::sync::Mutex::new(()),
                unresolved: Mutex::new(None),
            }),
        }
    }

    pub fn tracker(&self) -> &Arc<PositionTracker> {
        &self.shared.tracker
    }

    pub fn geocoder(&self) -> &Arc<ReverseGeocodeClient<C>> {
        &self.shared.geocoder
    }

    pub fn location_options(&self) -> &LocationOptions {
        &self.shared.options
    }

    /// Registers a sink for resolved addresses.
    pub fn subscribe_addresses<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<AddressEvent> + 'static,
    {
        self.shared.addresses.subscribe(sink);
    }

    pub fn unsubscribe_addresses<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<AddressEvent> + 'static,
    {
        self.shared.addresses.unsubscribe(sink);
    }

    /// Registers a sink for cycle failures.
    pub fn subscribe_errors<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<TrackingError> + 'static,
    {
        self.shared.errors.subscribe(sink);
    }

    pub fn unsubscribe_errors<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<TrackingError> + 'static,
    {
        self.shared.errors.unsubscribe(sink);
    }

    /// True while a location request is outstanding.
    pub fn is_acquiring(&self) -> bool {
        self.shared.acquiring.load(Ordering::SeqCst) > 0
    }

    /// Runs one cycle now and every `interval` after, until the returned
    /// handle is stopped or dropped.
    ///
    /// Starting again stops any loop started earlier from this controller.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, interval: Duration) -> TrackingHandle {
        let interval = if interval < MIN_TRACKING_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                min_ms = MIN_TRACKING_INTERVAL.as_millis() as u64,
                "Tracking interval too short, using minimum"
            );
            MIN_TRACKING_INTERVAL
        } else {
            interval
        };

        let token = CancellationToken::new();
        let generation = {
            let mut active = self.shared.active.lock();
            if let Some(previous) = active.replace(token.clone()) {
                previous.cancel();
            }
            self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        self.shared.tracker.resume();
        info!(interval_secs = interval.as_secs_f64(), "Tracking started");

        let shared = Arc::clone(&self.shared);
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            shared.run(interval, loop_token).await;
        });

        TrackingHandle {
            token,
            generation,
            current_generation: Arc::clone(&self.shared.generation),
            tracker: Arc::clone(&self.shared.tracker),
            task: Some(task),
        }
    }

    /// Runs exactly one cycle outside the periodic loop.
    pub async fn single_update(&self) -> CycleOutcome {
        let outcome = self.shared.run_cycle(None).await;
        debug!(outcome = outcome.label(), "Single update finished");
        outcome
    }
}

impl<L, C> Shared<L, C>
where
    L: LocationSource,
    C: AsyncHttpClient,
{
    async fn run(&self, interval: Duration, token: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles: u64 = 0;

        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => break,

                _ = ticker.tick() => {}
            }

            cycles += 1;
            let outcome = self.run_cycle(Some(&token)).await;
            trace!(cycle = cycles, outcome = outcome.label(), "Tracking cycle finished");
        }

        info!(cycles, "Tracking loop stopped");
    }

    async fn run_cycle(&self, token: Option<&CancellationToken>) -> CycleOutcome {
        let _cycle = self.cycle.lock().await;
        if is_discarded(token) {
            return CycleOutcome::Discarded;
        }

        let acquired = {
            let _acquiring = AcquiringGuard::enter(&self.acquiring);
            self.source.current_position(&self.options).await
        };
        let reading = match acquired {
            Ok(reading) => reading,
            Err(e) => return self.report(e.into(), token),
        };

        if is_discarded(token) {
            debug!("Tracking stopped while acquiring, reading dropped");
            return CycleOutcome::Discarded;
        }

        let position = match self.tracker.ingest(reading) {
            AcceptanceResult::Accepted(position) => {
                *self.unresolved.lock() = Some(position.clone());
                position
            }
            AcceptanceResult::Rejected(RejectReason::Invalid) => {
                return self.report(TrackingError::InvalidPositionReading, token)
            }
            AcceptanceResult::Rejected(RejectReason::Stopped) => {
                return CycleOutcome::Rejected(RejectReason::Stopped)
            }
            AcceptanceResult::Rejected(reason) => match self.pending_lookup() {
                Some(pending) => {
                    debug!(reason = %reason, "Reading filtered, retrying pending address lookup");
                    pending
                }
                None => {
                    debug!(reason = %reason, "No significant change, skipping address lookup");
                    return CycleOutcome::Rejected(reason);
                }
            },
        };

        let payload = match self.geocoder.resolve(position.coordinate).await {
            Ok(payload) => payload,
            Err(e) => {
                if !e.is_transient() {
                    *self.unresolved.lock() = None;
                }
                return self.report(e.into(), token);
            }
        };

        let event = AddressEvent {
            address: self.normalizer.normalize(&payload),
            kind: AddressKind::classify(&payload),
            position,
            payload,
        };

        if is_discarded(token) {
            debug!("Tracking stopped during cycle, address discarded");
            return CycleOutcome::Discarded;
        }

        let report = self.addresses.publish(&event);
        *self.unresolved.lock() = None;
        debug!(
            address = %event.address,
            kind = %event.kind,
            delivered = report.delivered,
            failed = report.failed,
            "Address published"
        );
        CycleOutcome::Published(event)
    }

    /// The tracker's current position, if its address is still missing.
    fn pending_lookup(&self) -> Option<TrackedPosition> {
        let mut unresolved = self.unresolved.lock();
        match (unresolved.as_ref(), self.tracker.current()) {
            (Some(pending), Some(current)) if *pending == current => Some(current),
            _ => {
                *unresolved = None;
                None
            }
        }
    }

    fn report(&self, error: TrackingError, token: Option<&CancellationToken>) -> CycleOutcome {
        if is_discarded(token) {
            debug!(error = %error, "Tracking stopped during cycle, failure discarded");
            return CycleOutcome::Discarded;
        }

        warn!(error = %error, "Tracking cycle failed");
        self.errors.publish(&error);
        CycleOutcome::Failed(error)
    }
}

fn is_discarded(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}

/// Owner of a running tracking loop.
///
/// Dropping the handle stops the loop.
pub struct TrackingHandle {
    token: CancellationToken,
    generation: u64,
    current_generation: Arc<AtomicU64>,
    tracker: Arc<PositionTracker>,
    task: Option<JoinHandle<()>>,
}

impl TrackingHandle {
    /// Cancels the timer and quiesces the tracker. Idempotent.
    ///
    /// The tracker is left alone if a newer loop has since been started.
    pub fn stop(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
        if self.current_generation.load(Ordering::SeqCst) == self.generation {
            self.tracker.stop();
        }
        info!("Tracking stopped");
    }

    /// True until stopped or until the loop task ends.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the loop and waits for its task to finish, including any cycle
    /// that was in flight.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Tracking loop task failed");
            }
        }
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::geocode::http::tests::MockAsyncHttpClient;
    use crate::geocode::{GeocodeError, GeocoderConfig};
    use crate::notify::tests::Recorder;
    use crate::position::{PositionReading, TrackerConfig};
    use crate::tracking::LocationError;
    use std::collections::VecDeque;

    const PAULISTA: &[u8] = r#"{
        "class": "place",
        "type": "house",
        "address": {
            "road": "Av. Paulista",
            "house_number": "1000",
            "suburb": "Bela Vista",
            "city": "São Paulo",
            "state": "São Paulo",
            "postcode": "01310-100",
            "country": "Brasil",
            "country_code": "br"
        }
    }"#
    .as_bytes();

    /// ~1 meter of latitude in degrees.
    const METER_DEG: f64 = 1.0 / 111_195.0;

    /// Replays a fixed sequence of location results.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<PositionReading, LocationError>>>,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<PositionReading, LocationError>>) -> Arc<Self> {
            Self::with_delay(script, Duration::ZERO)
        }

        fn with_delay(
            script: Vec<Result<PositionReading, LocationError>>,
            delay: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Most requests that were ever outstanding at once.
        fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    impl LocationSource for ScriptedSource {
        async fn current_position(
            &self,
            _options: &LocationOptions,
        ) -> Result<PositionReading, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let next = self.script.lock().pop_front();
            next.unwrap_or_else(|| Err(LocationError::Unavailable("script exhausted".into())))
        }
    }

    /// The n-th fix: 100 m further north and 70 s later than the previous.
    fn fix(n: u32) -> PositionReading {
        PositionReading::new(
            Coordinate {
                latitude: -23.5505 + f64::from(n) * 100.0 * METER_DEG,
                longitude: -46.6333,
            },
            8.0,
            1_000_000 + i64::from(n) * 70_000,
        )
    }

    /// A reading at the position of `fix(0)`, `steps` × 70 s later.
    fn stay(steps: u32) -> PositionReading {
        let mut reading = fix(0);
        reading.timestamp_ms += i64::from(steps) * 70_000;
        reading
    }

    type TestController = TrackingController<Arc<ScriptedSource>, MockAsyncHttpClient>;

    fn controller(source: &Arc<ScriptedSource>, http: &MockAsyncHttpClient) -> TestController {
        let geocoder = ReverseGeocodeClient::new(http.clone(), GeocoderConfig::default()).unwrap();
        TrackingController::new(
            Arc::clone(source),
            Arc::new(PositionTracker::new(TrackerConfig::default())),
            Arc::new(geocoder),
            LocationOptions::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_first_cycle_immediately() {
        let source = ScriptedSource::new(vec![Ok(fix(0))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        let addresses = Recorder::<AddressEvent>::new();
        controller.subscribe_addresses(&addresses);

        let handle = controller.start(DEFAULT_TRACKING_INTERVAL);
        tokio::time::sleep(Duration::from_millis(1)).await;

        let events = addresses.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].address.street.as_deref(), Some("Av. Paulista"));
        assert_eq!(events[0].kind, AddressKind::Residential);
        assert_eq!(events[0].position.timestamp_ms, 1_000_000);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_repeat_on_interval() {
        let source = ScriptedSource::new(vec![Ok(fix(0)), Ok(fix(1)), Ok(fix(2))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        let addresses = Recorder::<AddressEvent>::new();
        controller.subscribe_addresses(&addresses);

        let handle = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_secs(45)).await;

        assert_eq!(source.calls(), 3);
        assert_eq!(addresses.take().len(), 3);
        assert_eq!(http.call_count(), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_cycles_and_quiesces_tracker() {
        let source = ScriptedSource::new(vec![Ok(fix(0)), Ok(fix(1))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);

        let handle = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.stop();
        assert!(!handle.is_running());

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(source.calls(), 1);
        assert!(controller.tracker().is_stopped());
        assert!(controller.tracker().current().is_some());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_cycle_discarded_after_stop() {
        let source = ScriptedSource::new(vec![Ok(fix(0))]);
        let http =
            MockAsyncHttpClient::ok(PAULISTA.to_vec()).with_delay(Duration::from_secs(5));
        let controller = controller(&source, &http);
        let addresses = Recorder::<AddressEvent>::new();
        let errors = Recorder::<TrackingError>::new();
        controller.subscribe_addresses(&addresses);
        controller.subscribe_errors(&errors);

        let handle = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(http.call_count(), 1);
        handle.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(addresses.take().is_empty());
        assert!(errors.take().is_empty());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_reported_and_loop_continues() {
        let source = ScriptedSource::new(vec![Err(LocationError::Timeout), Ok(fix(0))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        let addresses = Recorder::<AddressEvent>::new();
        let errors = Recorder::<TrackingError>::new();
        controller.subscribe_addresses(&addresses);
        controller.subscribe_errors(&errors);

        let handle = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_secs(25)).await;

        assert_eq!(errors.take(), vec![TrackingError::LocationTimeout]);
        assert_eq!(addresses.take().len(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_handle_stops_loop() {
        let source = ScriptedSource::new(vec![Ok(fix(0)), Ok(fix(1))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);

        {
            let _handle = controller.start(Duration::from_secs(20));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let source = ScriptedSource::new(vec![Ok(fix(0)), Ok(fix(1))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        let addresses = Recorder::<AddressEvent>::new();
        controller.subscribe_addresses(&addresses);

        let handle = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.shutdown().await;
        assert!(controller.tracker().is_stopped());

        let handle = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!controller.tracker().is_stopped());
        assert_eq!(source.calls(), 2);
        assert_eq!(addresses.take().len(), 2);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_start_replaces_previous_loop() {
        let source = ScriptedSource::new(vec![Ok(fix(0)), Ok(fix(1)), Ok(fix(2))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);

        let first = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_millis(1)).await;
        let second = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(!first.is_running());
        drop(first);
        // The stale handle must not quiesce the tracker used by the new loop
        assert!(!controller.tracker().is_stopped());
        assert!(second.is_running());
        second.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_waits_for_cycle_in_flight() {
        let source =
            ScriptedSource::with_delay(vec![Ok(fix(0)), Ok(fix(1))], Duration::from_secs(5));
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        let positions = Recorder::<AcceptanceResult>::new();
        let addresses = Recorder::<AddressEvent>::new();
        controller.tracker().subscribe(&positions);
        controller.subscribe_addresses(&addresses);

        let first = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_secs(1)).await;
        let second = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(source.calls(), 2);
        assert_eq!(source.max_in_flight(), 1);
        // The reading acquired by the replaced loop never reaches the tracker
        let events = positions.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].position().map(|p| p.timestamp_ms), Some(1_070_000));
        assert_eq!(controller.tracker().current().unwrap().timestamp_ms, 1_070_000);
        let published = addresses.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].position.timestamp_ms, 1_070_000);

        drop(first);
        second.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_skips_ticks_without_overlap() {
        let script = (0..6).map(|n| Ok(fix(n))).collect();
        let source = ScriptedSource::with_delay(script, Duration::from_secs(30));
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);

        let handle = controller.start(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_secs(95)).await;

        // Cycles start at 0, 30, 60 and 90 s; the ticks due meanwhile are skipped
        assert_eq!(source.calls(), 4);
        assert_eq!(source.max_in_flight(), 1);
        assert!(controller.is_acquiring());
        assert_eq!(http.call_count(), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_update_waits_for_loop_cycle() {
        let source =
            ScriptedSource::with_delay(vec![Ok(fix(0)), Ok(fix(1))], Duration::from_secs(5));
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);

        let handle = controller.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(1)).await;
        let outcome = controller.single_update().await;

        assert!(matches!(outcome, CycleOutcome::Published(_)));
        assert_eq!(source.max_in_flight(), 1);
        assert_eq!(controller.tracker().current().unwrap().timestamp_ms, 1_070_000);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_retried_while_stationary() {
        let script = (0..4).map(|n| Ok(stay(n))).collect();
        let source = ScriptedSource::new(script);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec())
            .then(Err(GeocodeError::Http { status_code: 503 }));
        let controller = controller(&source, &http);
        let addresses = Recorder::<AddressEvent>::new();
        controller.subscribe_addresses(&addresses);

        let failed = controller.single_update().await;
        assert_eq!(
            failed,
            CycleOutcome::Failed(TrackingError::Http { status_code: 503 })
        );

        // Not far enough to be accepted, but the held position has no address
        let retried = controller.single_update().await;
        let CycleOutcome::Published(event) = retried else {
            panic!("expected the pending lookup to be retried, got {:?}", retried);
        };
        assert_eq!(event.position.timestamp_ms, 1_000_000);
        assert_eq!(addresses.take(), vec![event]);

        for _ in 0..2 {
            assert_eq!(
                controller.single_update().await,
                CycleOutcome::Rejected(RejectReason::TooClose)
            );
        }
        assert_eq!(http.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_address_reply_not_retried() {
        let source = ScriptedSource::new(vec![Ok(stay(0)), Ok(stay(1))]);
        let http = MockAsyncHttpClient::ok(br#"{"error": "Unable to geocode"}"#.to_vec());
        let controller = controller(&source, &http);

        let outcome = controller.single_update().await;
        assert_eq!(
            outcome,
            CycleOutcome::Failed(TrackingError::NoAddress("Unable to geocode".into()))
        );

        assert_eq!(
            controller.single_update().await,
            CycleOutcome::Rejected(RejectReason::TooClose)
        );
        assert_eq!(http.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_update_published() {
        let source = ScriptedSource::new(vec![Ok(fix(0))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        let addresses = Recorder::<AddressEvent>::new();
        controller.subscribe_addresses(&addresses);

        let outcome = controller.single_update().await;
        let CycleOutcome::Published(event) = outcome else {
            panic!("expected a published address, got {:?}", outcome);
        };
        assert_eq!(event.address.municipality.as_deref(), Some("São Paulo"));
        assert_eq!(addresses.take(), vec![event]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_update_rejected_skips_lookup() {
        let mut again = fix(0);
        again.timestamp_ms += 1_000;
        let source = ScriptedSource::new(vec![Ok(fix(0)), Ok(again)]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);

        controller.single_update().await;
        let outcome = controller.single_update().await;

        assert_eq!(outcome, CycleOutcome::Rejected(RejectReason::TooSoon));
        assert_eq!(http.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_geocode_failure_reported() {
        let source = ScriptedSource::new(vec![Ok(fix(0))]);
        let http = MockAsyncHttpClient::failing(GeocodeError::Http { status_code: 503 });
        let controller = controller(&source, &http);
        let errors = Recorder::<TrackingError>::new();
        controller.subscribe_errors(&errors);

        let outcome = controller.single_update().await;

        let expected = TrackingError::Http { status_code: 503 };
        assert_eq!(outcome, CycleOutcome::Failed(expected.clone()));
        assert_eq!(errors.take(), vec![expected]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_reading_reported() {
        let mut bad = fix(0);
        bad.coordinate.latitude = f64::NAN;
        let source = ScriptedSource::new(vec![Ok(bad)]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);

        let outcome = controller.single_update().await;

        assert_eq!(
            outcome,
            CycleOutcome::Failed(TrackingError::InvalidPositionReading)
        );
        assert_eq!(http.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_acquiring_while_waiting_for_position() {
        let source = ScriptedSource::with_delay(vec![Ok(fix(0))], Duration::from_secs(3));
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        assert!(!controller.is_acquiring());

        let observer = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            controller.is_acquiring()
        };
        let (outcome, during) = tokio::join!(controller.single_update(), observer);

        assert!(during);
        assert!(!controller.is_acquiring());
        assert!(matches!(outcome, CycleOutcome::Published(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_controller_publishes_no_positions() {
        let source = ScriptedSource::new(vec![Ok(fix(0))]);
        let http = MockAsyncHttpClient::ok(PAULISTA.to_vec());
        let controller = controller(&source, &http);
        let positions = Recorder::<AcceptanceResult>::new();
        controller.tracker().subscribe(&positions);

        controller.start(Duration::from_secs(20)).shutdown().await;
        positions.take();

        controller.tracker().ingest(fix(1));
        assert!(positions.take().is_empty());
    }
}
