//! Push-fed location source.
//!
//! A [`PositionFeed`] is the producer side: whatever delivers fixes (a GPS
//! daemon, a replayed log, stdin) pushes them in as they arrive. The paired
//! [`FeedLocationSource`] turns the stream into on-demand
//! [`LocationSource::current_position`] answers.
//!
//! # Semantics
//!
//! - A fix that has not been handed out yet is returned immediately.
//! - An already-delivered fix is reused only while it is younger than the
//!   request's `maximum_age`.
//! - Otherwise the request waits for the next push, up to `timeout`.
//! - A denied feed fails with `PermissionDenied` until a new fix is pushed; a
//!   closed feed fails with `Unavailable`.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::location::{LocationError, LocationOptions, LocationSource};
use crate::position::PositionReading;

#[derive(Debug, Clone)]
enum FeedState {
    Empty,
    Fix {
        reading: PositionReading,
        seq: u64,
        received_at: Instant,
    },
    Failed(LocationError),
}

/// Producer half of a position feed.
pub struct PositionFeed {
    tx: watch::Sender<FeedState>,
    seq: AtomicU64,
}

impl PositionFeed {
    /// Creates a feed and the source that reads from it.
    pub fn channel() -> (Self, FeedLocationSource) {
        let (tx, rx) = watch::channel(FeedState::Empty);
        let feed = Self {
            tx,
            seq: AtomicU64::new(0),
        };
        let source = FeedLocationSource {
            rx,
            delivered: AtomicU64::new(0),
        };
        (feed, source)
    }

    /// Publishes a new fix.
    pub fn push(&self, reading: PositionReading) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(seq, timestamp_ms = reading.timestamp_ms, "Position pushed to feed");
        self.tx.send_replace(FeedState::Fix {
            reading,
            seq,
            received_at: Instant::now(),
        });
    }

    /// Marks the feed as refused by the user or platform.
    pub fn deny(&self) {
        self.fail(LocationError::PermissionDenied);
    }

    /// Reports an acquisition failure to pending and future requests.
    pub fn fail(&self, error: LocationError) {
        debug!(error = %error, "Position feed failed");
        self.tx.send_replace(FeedState::Failed(error));
    }

    /// Ends the feed. Requests that cannot be answered from the last fix
    /// fail with `Unavailable`.
    pub fn close(self) {
        debug!("Position feed closed");
    }

    /// True while at least one source is attached.
    pub fn has_source(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Consumer half of a position feed.
pub struct FeedLocationSource {
    rx: watch::Receiver<FeedState>,
    delivered: AtomicU64,
}

impl FeedLocationSource {
    fn try_take(
        &self,
        state: &FeedState,
        options: &LocationOptions,
    ) -> Option<Result<PositionReading, LocationError>> {
        match state {
            FeedState::Empty => None,
            FeedState::Failed(error) => Some(Err(error.clone())),
            FeedState::Fix {
                reading,
                seq,
                received_at,
            } => {
                let fresh = *seq > self.delivered.load(Ordering::Acquire);
                let young_enough = !options.maximum_age.is_zero()
                    && received_at.elapsed() <= options.maximum_age;
                if fresh || young_enough {
                    self.delivered.fetch_max(*seq, Ordering::AcqRel);
                    Some(Ok(reading.clone()))
                } else {
                    None
                }
            }
        }
    }
}

impl LocationSource for FeedLocationSource {
    async fn current_position(
        &self,
        options: &LocationOptions,
    ) -> Result<PositionReading, LocationError> {
        let mut rx = self.rx.clone();
        let deadline = Instant::now() + options.timeout;

        loop {
            let state = rx.borrow_and_update().clone();
            if let Some(result) = self.try_take(&state, options) {
                return result;
            }

            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => {
                    return Err(LocationError::Unavailable(
                        "position feed closed".to_string(),
                    ))
                }
                Err(_) => {
                    debug!(
                        timeout_ms = options.timeout.as_millis() as u64,
                        "No position before timeout"
                    );
                    return Err(LocationError::Timeout);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use std::time::Duration;

    fn reading(timestamp_ms: i64) -> PositionReading {
        PositionReading::new(Coordinate::new(-23.5505, -46.6333).unwrap(), 8.0, timestamp_ms)
    }

    fn options() -> LocationOptions {
        LocationOptions::default().with_timeout(Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_pushed_fix() {
        let (feed, source) = PositionFeed::channel();
        feed.push(reading(1_000));

        let fix = source.current_position(&options()).await.unwrap();
        assert_eq!(fix.timestamp_ms, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivered_fix_not_reused_without_maximum_age() {
        let (feed, source) = PositionFeed::channel();
        feed.push(reading(1_000));
        source.current_position(&options()).await.unwrap();

        let result = source.current_position(&options()).await;
        assert_eq!(result, Err(LocationError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivered_fix_reused_within_maximum_age() {
        let (feed, source) = PositionFeed::channel();
        feed.push(reading(1_000));
        source.current_position(&options()).await.unwrap();

        let opts = options().with_maximum_age(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(source.current_position(&opts).await.is_ok());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            source.current_position(&opts).await,
            Err(LocationError::Timeout)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_next_push() {
        let (feed, source) = PositionFeed::channel();

        let producer = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            feed.push(reading(2_000));
        };
        let opts = options();
        let (result, ()) = tokio::join!(source.current_position(&opts), producer);
        assert_eq!(result.unwrap().timestamp_ms, 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied() {
        let (feed, source) = PositionFeed::channel();
        feed.deny();

        assert_eq!(
            source.current_position(&options()).await,
            Err(LocationError::PermissionDenied)
        );

        // A later fix clears the failure
        feed.push(reading(3_000));
        assert!(source.current_position(&options()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_feed_unavailable() {
        let (feed, source) = PositionFeed::channel();
        feed.push(reading(1_000));
        feed.close();

        // The undelivered fix is still handed out
        assert!(source.current_position(&options()).await.is_ok());
        assert!(matches!(
            source.current_position(&options()).await,
            Err(LocationError::Unavailable(_))
        ));
    }

    #[test]
    fn test_has_source() {
        let (feed, source) = PositionFeed::channel();
        assert!(feed.has_source());
        drop(source);
        assert!(!feed.has_source());
    }
}
