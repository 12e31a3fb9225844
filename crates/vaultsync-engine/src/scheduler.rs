//! Auto-sync scheduler
//!
//! Drives periodic full syncs from the schedule settings. The scheduler is
//! the serialization point the orchestrator itself does not provide: an
//! atomic in-flight flag makes a tick that arrives while the previous run
//! is still executing skip instead of overlapping it.
//!
//! User-initiated "sync now" requests bypass the timer entirely via
//! [`request_sync`](AutoSyncScheduler::request_sync).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tracing::{info, warn};

use vaultsync_core::domain::plan::SyncMode;

use crate::orchestrator::SyncOrchestrator;

/// Periodic sync driver.
pub struct AutoSyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
    enabled: bool,
    sync_requested: Arc<Notify>,
    syncing: Arc<AtomicBool>,
}

impl AutoSyncScheduler {
    /// Creates a scheduler from the orchestrator's current schedule
    /// settings. Settings changes require constructing a new scheduler.
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        let schedule = &orchestrator.settings().schedule;
        let interval = Duration::from_secs(u64::from(schedule.auto_sync_interval_minutes) * 60);
        let enabled = schedule.auto_sync_enabled;

        info!(
            enabled,
            interval_minutes = schedule.auto_sync_interval_minutes,
            "auto-sync scheduler created"
        );

        Self {
            orchestrator,
            interval,
            enabled,
            sync_requested: Arc::new(Notify::new()),
            syncing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The configured tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a sync run is currently in flight.
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Requests an immediate sync, bypassing the timer.
    pub fn request_sync(&self) {
        info!("immediate sync requested");
        self.sync_requested.notify_one();
    }

    /// Main loop: syncs every interval, or immediately on request, until
    /// a shutdown signal arrives (or the channel closes).
    ///
    /// Returns immediately when auto-sync is disabled in the settings.
    pub async fn run(&self, mut shutdown: mpsc::Receiver<()>) {
        if !self.enabled {
            info!("auto-sync disabled, scheduler not running");
            return;
        }

        let mut timer = tokio::time::interval(self.interval);
        // The first interval tick completes immediately; consume it so the
        // first automatic sync happens one full interval after startup
        // (sync-on-open is the application's separate trigger).
        timer.tick().await;

        info!("auto-sync scheduler running");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("auto-sync scheduler stopping");
                    break;
                }
                _ = timer.tick() => {
                    self.run_once().await;
                }
                _ = self.sync_requested.notified() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// Runs one guarded sync: skips when the previous run is still going.
    async fn run_once(&self) {
        if self.syncing.swap(true, Ordering::AcqRel) {
            warn!("previous sync still in flight, skipping this tick");
            return;
        }

        match self.orchestrator.sync(SyncMode::Full, None).await {
            Ok(result) => {
                info!(
                    pulled = result.pulled,
                    pushed = result.pushed,
                    conflicts = result.conflicts,
                    errors = result.errors.len(),
                    "auto-sync finished"
                );
            }
            Err(e) => {
                warn!(error = %e, "auto-sync failed");
            }
        }

        self.syncing.store(false, Ordering::Release);
    }
}
