//! Session orchestration.
//!
//! `ChaseSession` is the single owner of all mutable game state; the
//! presentation side only ever sees broadcast events and read-only
//! snapshots. The synchronous `handle_fix`/`tick` pair is the whole state
//! machine; `spawn_session` wraps it in one tokio task so that location
//! callbacks and the pursuit timer are serialized by construction.

use chrono::{DateTime, Utc};
use futures_core::Stream;
use futures_util::StreamExt;
use geo::Point;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{ChaseConfig, FilterConfig};
use crate::events::GameEvent;
use crate::filter::{filter_for, Observation, SampleFilter};
use crate::ledger::RewardLedger;
use crate::location::{LocationError, LocationFix};
use crate::pursuit::{PursuitEngine, Tick};

/// Read-only view of the live session, published on every change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub player: Option<Point>,
    pub pursuer: Option<Point>,
    pub player_speed_kmh: f64,
    pub pursuer_speed_kmh: f64,
    pub separation_m: f64,
    pub distance_m: f64,
    pub coins: u64,
    pub captured: bool,
}

/// Final account of a finished run. Read-only once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_s: f64,
    pub distance_m: f64,
    pub coins: u64,
    pub captured: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct ChaseSession {
    filter: Box<dyn SampleFilter>,
    engine: PursuitEngine,
    ledger: RewardLedger,
    events: broadcast::Sender<GameEvent>,
    snapshot: watch::Sender<Snapshot>,
    player: Option<Point>,
    started_at: Option<DateTime<Utc>>,
    last_pursuer_speed_kmh: Option<f64>,
    outcome: Option<RunSummary>,
}

impl ChaseSession {
    pub fn new(chase: ChaseConfig, filter: FilterConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        let (snapshot, _) = watch::channel(Snapshot::default());
        ChaseSession {
            filter: filter_for(filter),
            engine: PursuitEngine::new(chase),
            ledger: RewardLedger::new(),
            events,
            snapshot,
            player: None,
            started_at: None,
            last_pursuer_speed_kmh: None,
            outcome: None,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Feed one location callback. `None` is signal loss, not an error.
    pub fn handle_fix(&mut self, fix: Option<Point>, at: DateTime<Utc>) {
        if self.outcome.is_some() {
            return;
        }

        self.player = fix;
        if let Some(position) = fix {
            if self.started_at.is_none() {
                self.started_at = Some(at);
            }
            if let Some(spawned) = self.engine.spawn_near(position) {
                self.emit(GameEvent::PursuerMoved { position: spawned });
            }
        }

        if let Observation::Accepted {
            distance_m,
            speed_kmh,
        } = self.filter.observe(fix, at)
        {
            self.emit(GameEvent::SpeedUpdated { kmh: speed_kmh });
            self.emit(GameEvent::DistanceAccrued { meters: distance_m });
            let coins = self.ledger.credit(distance_m);
            if coins > 0 {
                self.emit(GameEvent::CoinsAwarded { count: coins });
            }
        }

        self.publish();
    }

    /// Advance the pursuit by one tick. No-op once the run is over.
    pub fn tick(&mut self, at: DateTime<Utc>) {
        if self.outcome.is_some() {
            return;
        }

        let player_speed = self.filter.track().smoothed_speed_kmh;
        match self.engine.tick(self.player, player_speed) {
            Tick::Waiting | Tick::Holding | Tick::Over => {}
            Tick::Advanced {
                position,
                speed_kmh,
                separation_m,
            } => {
                self.emit(GameEvent::PursuerMoved { position });
                if self.last_pursuer_speed_kmh != Some(speed_kmh) {
                    self.last_pursuer_speed_kmh = Some(speed_kmh);
                    self.emit(GameEvent::PursuerSpeedUpdated { kmh: speed_kmh });
                }
                self.emit(GameEvent::SeparationUpdated {
                    meters: separation_m,
                });
            }
            Tick::Captured { separation_m } => {
                self.emit(GameEvent::Captured { separation_m });
                self.outcome = Some(self.summary(at, true));
            }
        }

        self.publish();
    }

    pub fn is_captured(&self) -> bool {
        self.engine.is_captured()
    }

    /// Final summary once the run ended; `None` while still live.
    pub fn outcome(&self) -> Option<RunSummary> {
        self.outcome.clone()
    }

    /// End the run. Idempotent; a captured run keeps its capture summary.
    pub fn finish(&mut self, at: DateTime<Utc>) -> RunSummary {
        if let Some(summary) = &self.outcome {
            return summary.clone();
        }
        let summary = self.summary(at, false);
        self.outcome = Some(summary.clone());
        summary
    }

    fn summary(&self, ended_at: DateTime<Utc>, captured: bool) -> RunSummary {
        let started_at = self.started_at.unwrap_or(ended_at);
        RunSummary {
            started_at,
            ended_at,
            duration_s: (ended_at - started_at).num_milliseconds() as f64 / 1000.0,
            distance_m: self.filter.track().cumulative_distance_m,
            coins: self.ledger.coins_awarded(),
            captured,
        }
    }

    fn emit(&self, event: GameEvent) {
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.snapshot.send_replace(Snapshot {
            player: self.player,
            pursuer: self.engine.position(),
            player_speed_kmh: self.filter.track().smoothed_speed_kmh,
            pursuer_speed_kmh: self.engine.speed_kmh(),
            separation_m: self.engine.separation_m(),
            distance_m: self.filter.track().cumulative_distance_m,
            coins: self.ledger.coins_awarded(),
            captured: self.engine.is_captured(),
        });
    }
}

/// Handle to a running session task.
pub struct SessionHandle {
    events: broadcast::Receiver<GameEvent>,
    snapshot: watch::Receiver<Snapshot>,
    stop: mpsc::Sender<()>,
    task: JoinHandle<RunSummary>,
}

impl SessionHandle {
    pub fn events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.resubscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.snapshot.borrow()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    /// Stop the session now. Fixes and ticks already queued behind the stop
    /// are discarded, never applied.
    pub async fn stop(self) -> Result<RunSummary, SessionError> {
        let _ = self.stop.send(()).await;
        Ok(self.task.await?)
    }

    /// Wait for the session to end on its own (capture).
    pub async fn finished(self) -> Result<RunSummary, SessionError> {
        Ok(self.task.await?)
    }
}

/// Run a session as a single background task.
///
/// The task is the only owner of the mutable state; fixes from `fixes` and
/// ticks from a fixed-rate interval are serialized through one `select!`
/// loop, so no two mutations ever race. Missed ticks are skipped rather
/// than bursted; after a scheduler stall the pursuer resumes at its normal
/// pace instead of teleporting. Must be called within a tokio runtime.
pub fn spawn_session<S>(chase: ChaseConfig, filter: FilterConfig, fixes: S) -> SessionHandle
where
    S: Stream<Item = Result<LocationFix, LocationError>> + Send + 'static,
{
    let session = ChaseSession::new(chase, filter);
    let events = session.subscribe_events();
    let snapshot = session.watch_snapshot();
    let (stop, mut stop_rx) = mpsc::channel::<()>(1);
    let tick_period = chase.tick_period;

    let task = tokio::spawn(async move {
        let mut session = session;
        let mut fixes = Box::pin(fixes);
        let mut stream_done = false;
        let mut ticker = tokio::time::interval(tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.recv() => break,
                maybe = fixes.next(), if !stream_done => match maybe {
                    Some(Ok(fix)) => session.handle_fix(Some(fix.point), fix.at),
                    Some(Err(err)) => {
                        // Terminal for the subscription; degrade to signal
                        // loss and let the shell report it.
                        tracing::warn!(error = %err, "location subscription ended");
                        stream_done = true;
                        session.handle_fix(None, Utc::now());
                    }
                    None => {
                        stream_done = true;
                        session.handle_fix(None, Utc::now());
                    }
                },
                _ = ticker.tick() => {
                    session.tick(Utc::now());
                    if session.is_captured() {
                        break;
                    }
                }
            }
        }

        session.finish(Utc::now())
    });

    SessionHandle {
        events,
        snapshot,
        stop,
        task,
    }
}
