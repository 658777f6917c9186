//! Periodic refresh for live views
//!
//! The engine never refreshes itself. A live dashboard that wants fresh
//! figures without user action runs an [`AnalyticsRefresher`], which calls
//! [`AnalyticsEngine::team_analytics`] on a fixed interval and broadcasts each
//! result to its subscribers.

use super::{AnalyticsEngine, TeamAnalytics, Timeframe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 16;

/// Broadcasts team analytics for one timeframe on a fixed interval
pub struct AnalyticsRefresher {
    engine: AnalyticsEngine,
    timeframe: Timeframe,
    interval: Duration,
    sender: broadcast::Sender<Arc<TeamAnalytics>>,
    running: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    shutdown: Arc<Notify>,
}

impl AnalyticsRefresher {
    pub fn new(engine: AnalyticsEngine, timeframe: Timeframe, interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            engine,
            timeframe,
            interval,
            sender,
            running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Refresher using the engine's configured interval and default timeframe
    pub fn from_config(engine: AnalyticsEngine) -> Self {
        let timeframe = engine.config().default_timeframe;
        let interval = engine.config().refresh_interval();
        Self::new(engine, timeframe, interval)
    }

    /// Receive every refreshed result from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TeamAnalytics>> {
        self.sender.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the refresh loop. The first refresh runs immediately.
    ///
    /// Failed refreshes are logged and the loop keeps going; subscribers
    /// simply see no update for that tick. Returns `None` if a loop is
    /// already running.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(timeframe = %self.timeframe, "Analytics refresh already running");
            return None;
        }
        // A loop from before the last stop() exits once it sees a newer generation
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);

        let engine = self.engine.clone();
        let timeframe = self.timeframe;
        let period = self.interval;
        let sender = self.sender.clone();
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);

        info!(timeframe = %timeframe, interval_ms = period.as_millis() as u64, "Starting analytics refresh");

        let active = move || {
            running.load(Ordering::SeqCst) && current.load(Ordering::SeqCst) == generation
        };

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            while active() {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.notified() => break,
                }
                if !active() {
                    break;
                }

                match engine.team_analytics(timeframe).await {
                    Ok(analytics) => {
                        // No subscribers is not an error
                        let delivered = sender.send(Arc::new(analytics)).unwrap_or(0);
                        debug!(timeframe = %timeframe, delivered, "Broadcast refreshed analytics");
                    }
                    Err(e) => {
                        error!(timeframe = %timeframe, error = %e, "Analytics refresh failed");
                    }
                }
            }

            debug!(timeframe = %timeframe, "Analytics refresh stopped");
        }))
    }

    /// Ask the loop to exit. It finishes any refresh already in progress.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }
}

impl Drop for AnalyticsRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}
