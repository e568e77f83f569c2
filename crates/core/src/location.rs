//! The location collaborator boundary.
//!
//! A source is any stream of fix results. The core consumes the point and
//! timestamp; accuracy is carried through for the shell to display. Errors
//! are terminal for the subscription; the session degrades to signal-loss
//! behavior instead of retrying.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_core::Stream;
use geo::Point;

/// One GPS fix as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub point: Point,
    pub at: DateTime<Utc>,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("positioning hardware unavailable")]
    Unavailable,
    #[error("location provider error: {0}")]
    Provider(String),
}

/// Replays a recorded trace, one fix per `interval` of wall-clock time.
///
/// Used by tests and the trace-replay tool in place of real hardware.
pub fn replay_source(
    fixes: Vec<LocationFix>,
    interval: Duration,
) -> impl Stream<Item = Result<LocationFix, LocationError>> + Send {
    futures_util::stream::unfold(fixes.into_iter(), move |mut remaining| async move {
        let fix = remaining.next()?;
        tokio::time::sleep(interval).await;
        Some((Ok(fix), remaining))
    })
}
