use std::sync::Arc;
use std::time::Duration;

use pagewatch_core::Scanner;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Scan every configured page now and then once per `every`, forever.
///
/// Each page scan is a detached task: a slow page never delays other pages or
/// the next tick. Scans of the same page from consecutive ticks may overlap.
pub fn spawn_scheduler(scanner: Arc<Scanner>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut round: u64 = 0;
        loop {
            tick.tick().await;
            round += 1;
            debug!(round, every_secs = every.as_secs(), pages = scanner.config().pages.len(), "scheduler tick");
            for page in scanner.config().pages.iter().cloned() {
                let scanner = Arc::clone(&scanner);
                tokio::spawn(async move {
                    scanner.scan_once(&page).await;
                });
            }
        }
    })
}
