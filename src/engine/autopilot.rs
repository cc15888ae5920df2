use std::sync::{Arc, Mutex};

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::state::AppCore;

use super::AnalysisEngine;

/// Status line shown while the autopilot is disabled.
pub const STANDBY: &str = "Standby";

/// Cosmetic status lines cycled while the autopilot runs. Purely display;
/// the pick carries no algorithmic meaning.
pub const STATUS_POOL: &[&str] = &[
    "Syncing satellites...",
    "Scouting weather fronts...",
    "Computing historical xG...",
    "Checking injury lists...",
    "Reading market pressure...",
    "Optimising probabilities...",
    "Cross-checking theoretical data...",
];

/// Timer-driven controller: while enabled, each tick analyzes the next
/// unanalyzed visible match or rotates the league filter. The running timer
/// task is held as an abortable handle; `sync` recreates it whenever the
/// relevant settings change, so duplicate timers never exist.
#[derive(Clone)]
pub struct Autopilot {
    engine: AnalysisEngine,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Autopilot {
    pub fn new(engine: AnalysisEngine) -> Self {
        Autopilot {
            engine,
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Align the timer task with the current settings. Always cancels the
    /// old task first; a fresh one is spawned only when the autopilot is
    /// enabled. Requests already issued are never aborted.
    pub fn sync(&self) {
        let settings = self.engine.core().settings();
        let mut guard = self.task.lock().unwrap();

        if let Some(handle) = guard.take() {
            handle.abort();
        }

        if !settings.autopilot {
            self.engine.core().set_status(STANDBY);
            info!("Autopilot disabled");
            return;
        }

        let period = settings.autopilot_speed.interval();
        info!("Autopilot enabled (tick every {period:?})");

        let engine = self.engine.clone();
        *guard = Some(tokio::spawn(async move {
            // First tick fires one full period after enable, not immediately.
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                run_tick(&engine);
            }
        }));
    }
}

/// One autopilot step: refresh the status line, then either start analysis
/// for the first pending visible match or rotate the league filter. At most
/// one request is initiated per tick.
pub(crate) fn run_tick(engine: &AnalysisEngine) {
    let core: &AppCore = engine.core();

    let status = STATUS_POOL[rand::thread_rng().gen_range(0..STATUS_POOL.len())];
    core.set_status(status);

    match core.next_pending() {
        Some(m) => {
            info!("Autopilot picked {} ({} vs {})", m.id, m.home_team, m.away_team);
            engine.spawn_analysis(m);
        }
        None => {
            let next = core.advance_league();
            info!("Autopilot rotating league filter to {}", next.as_str());
        }
    }
}
