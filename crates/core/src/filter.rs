//! Position filtering and player speed estimation.
//!
//! Raw GPS fixes are noisy in two characteristic ways: sudden multi-hundred
//! meter jumps, and meter-scale jitter while standing still. The filters
//! here turn the raw stream into validated distance deltas and a smoothed
//! speed, rejecting both failure modes at the sample boundary.

use chrono::{DateTime, Utc};
use geo::Point;

use crate::config::{FilterConfig, FilterVariant};
use crate::geodesy;

/// Cumulative movement state for the player.
///
/// `cumulative_distance_m` only ever grows, and only by displacements that
/// passed validation. Speed is averaged over moving time alone, so standing
/// at a crossing never dilutes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerTrack {
    pub cumulative_distance_m: f64,
    pub cumulative_moving_time_s: f64,
    pub smoothed_speed_kmh: f64,
}

impl PlayerTrack {
    fn accept(&mut self, distance_m: f64, elapsed_s: f64, speed_mps: f64, resting_mps: f64) {
        self.cumulative_distance_m += distance_m;
        if speed_mps > resting_mps {
            self.cumulative_moving_time_s += elapsed_s;
        }
        if self.cumulative_moving_time_s > 0.0 {
            let km = self.cumulative_distance_m / 1000.0;
            let hours = self.cumulative_moving_time_s / 3600.0;
            self.smoothed_speed_kmh = km / hours;
        }
    }
}

/// Why a sample was discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Implied speed beyond a plausible human running pace.
    Implausible { speed_mps: f64 },
    /// Displacement too small to distinguish from stationary jitter.
    Jitter { distance_m: f64 },
}

/// Outcome of feeding one raw sample to a filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// The fix was absent; tracking state was reset.
    SignalLost,
    /// First valid sample, recorded as the reference point.
    Anchored,
    /// Arrived before the minimum sampling interval elapsed; ignored.
    Pending,
    /// Discarded as drift. Cumulative state is untouched.
    Rejected(RejectReason),
    /// Validated movement.
    Accepted { distance_m: f64, speed_kmh: f64 },
}

/// A strategy for turning raw fixes into validated movement.
pub trait SampleFilter: Send {
    fn observe(&mut self, fix: Option<Point>, at: DateTime<Utc>) -> Observation;
    fn track(&self) -> &PlayerTrack;
}

/// Build the filter a config asks for.
pub fn filter_for(config: FilterConfig) -> Box<dyn SampleFilter> {
    match config.variant {
        FilterVariant::TwoStage => Box::new(DriftFilter::new(config)),
        FilterVariant::Window { window_ms } => Box::new(WindowFilter::new(config, window_ms)),
    }
}

struct Anchor {
    position: Point,
    at: DateTime<Utc>,
}

/// Anchor-based two-stage filter.
///
/// Each accepted sample becomes the reference the next one is measured
/// against. A rejected sample advances the reference *time* but not the
/// reference position, so a GPS jump does not poison the next measurement.
pub struct DriftFilter {
    config: FilterConfig,
    anchor: Option<Anchor>,
    track: PlayerTrack,
}

impl DriftFilter {
    pub fn new(config: FilterConfig) -> Self {
        DriftFilter {
            config,
            anchor: None,
            track: PlayerTrack::default(),
        }
    }
}

impl SampleFilter for DriftFilter {
    fn observe(&mut self, fix: Option<Point>, at: DateTime<Utc>) -> Observation {
        let Some(position) = fix else {
            self.anchor = None;
            return Observation::SignalLost;
        };

        let Some(anchor) = self.anchor.as_mut() else {
            self.anchor = Some(Anchor { position, at });
            return Observation::Anchored;
        };

        let elapsed_s = (at - anchor.at).num_milliseconds() as f64 / 1000.0;
        if elapsed_s < self.config.min_interval_s {
            return Observation::Pending;
        }

        let distance_m = geodesy::distance_m(anchor.position, position);
        let speed_mps = distance_m / elapsed_s;

        if speed_mps > self.config.max_speed_mps {
            tracing::debug!(speed_mps, distance_m, "discarding fix: implied speed is a GPS jump");
            anchor.at = at;
            return Observation::Rejected(RejectReason::Implausible { speed_mps });
        }

        if distance_m < self.config.min_movement_m {
            anchor.at = at;
            return Observation::Rejected(RejectReason::Jitter { distance_m });
        }

        self.track
            .accept(distance_m, elapsed_s, speed_mps, self.config.resting_speed_mps);
        anchor.position = position;
        anchor.at = at;

        Observation::Accepted {
            distance_m,
            speed_kmh: self.track.smoothed_speed_kmh,
        }
    }

    fn track(&self) -> &PlayerTrack {
        &self.track
    }
}

/// Sliding-window filter.
///
/// Keeps the samples of the last `window_ms` and measures displacement from
/// the oldest to the newest each time a fix arrives. Sub-floor movement can
/// therefore add up across a few samples before being accepted, which gives
/// a smoother short-term speed response than the anchor design.
pub struct WindowFilter {
    config: FilterConfig,
    window_ms: i64,
    samples: Vec<(Point, DateTime<Utc>)>,
    track: PlayerTrack,
}

impl WindowFilter {
    pub fn new(config: FilterConfig, window_ms: u64) -> Self {
        WindowFilter {
            config,
            window_ms: window_ms as i64,
            samples: Vec::new(),
            track: PlayerTrack::default(),
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        self.samples
            .retain(|(_, at)| (now - *at).num_milliseconds() <= self.window_ms);
    }
}

impl SampleFilter for WindowFilter {
    fn observe(&mut self, fix: Option<Point>, at: DateTime<Utc>) -> Observation {
        let Some(position) = fix else {
            self.samples.clear();
            return Observation::SignalLost;
        };

        self.prune(at);
        self.samples.push((position, at));

        let (oldest, oldest_at) = self.samples[0];
        let elapsed_s = (at - oldest_at).num_milliseconds() as f64 / 1000.0;
        if self.samples.len() == 1 {
            return Observation::Anchored;
        }
        if elapsed_s <= 0.0 {
            return Observation::Pending;
        }

        let distance_m = geodesy::distance_m(oldest, position);
        let speed_mps = distance_m / elapsed_s;

        if speed_mps > self.config.max_speed_mps {
            tracing::debug!(speed_mps, distance_m, "discarding fix: window implies a GPS jump");
            // Drop the jumped sample so it cannot anchor future windows.
            self.samples.pop();
            return Observation::Rejected(RejectReason::Implausible { speed_mps });
        }

        if distance_m < self.config.min_movement_m {
            return Observation::Rejected(RejectReason::Jitter { distance_m });
        }

        self.track
            .accept(distance_m, elapsed_s, speed_mps, self.config.resting_speed_mps);
        // The accepted span is spent; the newest sample starts the next one.
        self.samples.clear();
        self.samples.push((position, at));

        Observation::Accepted {
            distance_m,
            speed_kmh: self.track.smoothed_speed_kmh,
        }
    }

    fn track(&self) -> &PlayerTrack {
        &self.track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn t(seconds: f64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt((seconds * 1000.0) as i64).unwrap()
    }

    fn east_of(origin: Point, meters: f64) -> Point {
        geodesy::destination(origin, 90.0, meters)
    }

    fn origin() -> Point {
        Point::new(-0.1276, 51.5072) // London
    }

    #[test]
    fn first_sample_anchors_without_accounting() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        assert_eq!(filter.observe(Some(origin()), t(0.0)), Observation::Anchored);
        assert_relative_eq!(filter.track().cumulative_distance_m, 0.0);
    }

    #[test]
    fn sub_interval_samples_are_ignored() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        filter.observe(Some(origin()), t(0.0));

        let nearby = east_of(origin(), 50.0);
        assert_eq!(filter.observe(Some(nearby), t(0.5)), Observation::Pending);

        // The 0.5 s sample advanced nothing: this one is still measured
        // against the original anchor and time.
        let further = east_of(origin(), 12.0);
        let obs = filter.observe(Some(further), t(2.0));
        match obs {
            Observation::Accepted { distance_m, .. } => {
                assert_relative_eq!(distance_m, 12.0, epsilon = 0.01);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn implausible_speed_is_rejected_regardless_of_size() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        filter.observe(Some(origin()), t(0.0));

        // 20 m in 2 s = 10 m/s, beyond any runner.
        let jumped = east_of(origin(), 20.0);
        match filter.observe(Some(jumped), t(2.0)) {
            Observation::Rejected(RejectReason::Implausible { speed_mps }) => {
                assert_relative_eq!(speed_mps, 10.0, epsilon = 0.01);
            }
            other => panic!("expected implausible rejection, got {other:?}"),
        }
        assert_relative_eq!(filter.track().cumulative_distance_m, 0.0);
    }

    #[test]
    fn jitter_is_rejected_even_at_plausible_speed() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        filter.observe(Some(origin()), t(0.0));

        let wiggle = east_of(origin(), 3.0);
        match filter.observe(Some(wiggle), t(2.0)) {
            Observation::Rejected(RejectReason::Jitter { distance_m }) => {
                assert_relative_eq!(distance_m, 3.0, epsilon = 0.01);
            }
            other => panic!("expected jitter rejection, got {other:?}"),
        }
        assert_relative_eq!(filter.track().cumulative_distance_m, 0.0);
    }

    #[test]
    fn rejection_advances_anchor_time_but_not_position() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        filter.observe(Some(origin()), t(0.0));

        // A 100 m jump in 2 s gets rejected...
        let jump = east_of(origin(), 100.0);
        assert!(matches!(
            filter.observe(Some(jump), t(2.0)),
            Observation::Rejected(RejectReason::Implausible { .. })
        ));

        // ...and the next fix is measured from the ORIGINAL position over
        // the time since the rejection.
        let real = east_of(origin(), 6.0);
        match filter.observe(Some(real), t(4.0)) {
            Observation::Accepted { distance_m, .. } => {
                assert_relative_eq!(distance_m, 6.0, epsilon = 0.01);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
        assert_relative_eq!(filter.track().cumulative_distance_m, 6.0, epsilon = 0.01);
    }

    #[test]
    fn speed_averages_over_moving_time_only() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        filter.observe(Some(origin()), t(0.0));

        // 12 m in 2 s: moving.
        filter.observe(Some(east_of(origin(), 12.0)), t(2.0));
        assert_relative_eq!(filter.track().smoothed_speed_kmh, 21.6, epsilon = 0.01);

        // Another 5.5 m but over a full minute: accepted distance, yet the
        // crawl is below the resting threshold so no moving time accrues.
        filter.observe(Some(east_of(origin(), 17.5)), t(62.0));
        let track = filter.track();
        assert_relative_eq!(track.cumulative_distance_m, 17.5, epsilon = 0.05);
        assert_relative_eq!(track.cumulative_moving_time_s, 2.0);
        // 17.5 m over 2 s of moving time.
        assert_relative_eq!(track.smoothed_speed_kmh, 17.5 / 2.0 * 3.6, epsilon = 0.1);
    }

    #[test]
    fn cumulative_distance_is_sum_of_accepted_steps() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        filter.observe(Some(origin()), t(0.0));

        let mut expected = 0.0;
        let mut offset = 0.0;
        for (i, step) in [12.0, 8.0, 15.0].iter().enumerate() {
            offset += step;
            let at = t(2.0 * (i as f64 + 1.0));
            match filter.observe(Some(east_of(origin(), offset)), at) {
                Observation::Accepted { distance_m, .. } => expected += distance_m,
                other => panic!("expected acceptance, got {other:?}"),
            }
        }
        assert_relative_eq!(
            filter.track().cumulative_distance_m,
            expected,
            epsilon = 1e-9
        );
        assert_relative_eq!(filter.track().cumulative_distance_m, 35.0, epsilon = 0.05);
    }

    #[test]
    fn signal_loss_resets_the_anchor() {
        let mut filter = DriftFilter::new(FilterConfig::two_stage());
        filter.observe(Some(origin()), t(0.0));
        filter.observe(Some(east_of(origin(), 12.0)), t(2.0));

        assert_eq!(filter.observe(None, t(3.0)), Observation::SignalLost);

        // Far away after the outage, but this is a fresh anchor, not a jump.
        let reacquired = east_of(origin(), 500.0);
        assert_eq!(
            filter.observe(Some(reacquired), t(60.0)),
            Observation::Anchored
        );
        assert_relative_eq!(filter.track().cumulative_distance_m, 12.0, epsilon = 0.05);
    }

    #[test]
    fn window_accumulates_sub_floor_movement() {
        let mut filter = WindowFilter::new(FilterConfig::windowed(), 1000);
        filter.observe(Some(origin()), t(0.0));

        // 3 m every half second: each step is under the 5 m floor, the
        // window span is not.
        assert!(matches!(
            filter.observe(Some(east_of(origin(), 3.0)), t(0.5)),
            Observation::Rejected(RejectReason::Jitter { .. })
        ));
        match filter.observe(Some(east_of(origin(), 6.0)), t(1.0)) {
            Observation::Accepted { distance_m, .. } => {
                assert_relative_eq!(distance_m, 6.0, epsilon = 0.01);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
        assert_relative_eq!(filter.track().cumulative_distance_m, 6.0, epsilon = 0.01);
    }

    #[test]
    fn window_rejects_sub_floor_spans() {
        let mut filter = WindowFilter::new(FilterConfig::windowed(), 1000);
        filter.observe(Some(origin()), t(0.0));

        // A 4 m span at an easy pace is still below the movement floor.
        assert!(matches!(
            filter.observe(Some(east_of(origin(), 4.0)), t(1.0)),
            Observation::Rejected(RejectReason::Jitter { .. })
        ));
        assert_relative_eq!(filter.track().cumulative_distance_m, 0.0);
    }

    #[test]
    fn window_drops_jumped_samples() {
        let mut filter = WindowFilter::new(FilterConfig::windowed(), 1000);
        filter.observe(Some(origin()), t(0.0));

        assert!(matches!(
            filter.observe(Some(east_of(origin(), 200.0)), t(0.5)),
            Observation::Rejected(RejectReason::Implausible { .. })
        ));
        assert_relative_eq!(filter.track().cumulative_distance_m, 0.0);

        // The jump did not displace the window; honest movement from the
        // pre-jump position still measures correctly.
        match filter.observe(Some(east_of(origin(), 7.0)), t(1.0)) {
            Observation::Accepted { distance_m, .. } => {
                assert_relative_eq!(distance_m, 7.0, epsilon = 0.01);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn window_forgets_stale_samples() {
        let mut filter = WindowFilter::new(FilterConfig::windowed(), 1000);
        filter.observe(Some(origin()), t(0.0));

        // 3 s later the t=0 sample has aged out; this re-anchors instead of
        // measuring a 9 m stride.
        assert_eq!(
            filter.observe(Some(east_of(origin(), 9.0)), t(3.0)),
            Observation::Anchored
        );
        assert_relative_eq!(filter.track().cumulative_distance_m, 0.0);
    }
}
