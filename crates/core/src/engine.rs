use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::collab::{Capturer, Comparator, Comparison};
use crate::config::ScanConfig;
use crate::decision::{change_fraction, classify};
use crate::model::{ArtifactRole, Fingerprint, MonitoredPage, ScanFailure, ScanOutcome};
use crate::notify::Notifier;
use crate::store::ArtifactStore;

/// Runs the capture, compare, decide, promote cycle for one page at a time.
///
/// The scanner is the only writer of the artifact store. Two cycles for the
/// same fingerprint are not serialized against each other; operators are
/// expected to configure an interval comfortably longer than one scan.
pub struct Scanner {
    config: Arc<ScanConfig>,
    store: Arc<dyn ArtifactStore>,
    capturer: Arc<dyn Capturer>,
    comparator: Arc<dyn Comparator>,
    notifier: Notifier,
}

impl Scanner {
    pub fn new(
        config: Arc<ScanConfig>,
        store: Arc<dyn ArtifactStore>,
        capturer: Arc<dyn Capturer>,
        comparator: Arc<dyn Comparator>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            store,
            capturer,
            comparator,
            notifier,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// One scan cycle. Every failure is folded into `ScanOutcome::Failed`.
    pub async fn scan_once(&self, page: &MonitoredPage) -> ScanOutcome {
        info!(page = %page.url, fingerprint = %page.fingerprint, "begin scan");
        let outcome = self.run_cycle(page).await;
        self.log_outcome(page, &outcome);
        outcome
    }

    async fn run_cycle(&self, page: &MonitoredPage) -> ScanOutcome {
        let fp = &page.fingerprint;
        let cfg = &*self.config;

        let current = match self.capturer.capture(&page.url, cfg.geometry, cfg.scale).await {
            Ok(bytes) => bytes,
            Err(e) => return ScanOutcome::Failed(ScanFailure::capture(e)),
        };
        if let Err(e) = self.store.put(fp, ArtifactRole::Current, &current) {
            return ScanOutcome::Failed(ScanFailure::storage(e));
        }

        let baseline = match self.store.get(fp, ArtifactRole::Baseline) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return match self.advance_baseline(fp) {
                    Ok(()) => ScanOutcome::FirstScan,
                    Err(e) => ScanOutcome::Failed(ScanFailure::storage(e)),
                };
            }
            Err(e) => return ScanOutcome::Failed(ScanFailure::storage(e)),
        };

        let comparison = match self.comparator.compare(&baseline, &current, cfg.fuzz_percent).await {
            Ok(c) => c,
            Err(e) => {
                // Keep the old baseline so the next cycle compares against it again.
                self.drop_artifacts(page, &[ArtifactRole::Current]);
                return ScanOutcome::Failed(ScanFailure::compare(e));
            }
        };

        let (mut outcome, diff_image) = match comparison {
            Comparison::Identical => (ScanOutcome::NoChange, None),
            Comparison::Differ {
                differing_pixels,
                diff_image,
            } => {
                let fraction = change_fraction(differing_pixels, cfg.geometry);
                (classify(fraction, cfg.threshold), Some(diff_image))
            }
        };

        if let ScanOutcome::ChangeAboveThreshold { change_fraction } = outcome {
            let stored = self
                .store
                .put(fp, ArtifactRole::Diff, &diff_image.unwrap_or_default())
                .and_then(|()| self.stored_diff(fp));
            let diff_image = match stored {
                Ok(bytes) => bytes,
                Err(e) => {
                    // Old baseline stays, so the next cycle sees the same change and alerts then.
                    self.drop_artifacts(page, &[ArtifactRole::Diff, ArtifactRole::Current]);
                    return ScanOutcome::Failed(ScanFailure::storage(e));
                }
            };
            if let Err(e) = self.notifier.notify(page, change_fraction, diff_image, cfg).await {
                // Not retried: the baseline still advances below.
                outcome = ScanOutcome::Failed(ScanFailure::notify(e));
            }
        }

        match self.advance_baseline(fp) {
            Ok(()) => outcome,
            Err(e) => ScanOutcome::Failed(ScanFailure::storage(e)),
        }
    }

    /// The diff image as persisted; this is what gets mailed.
    fn stored_diff(&self, fp: &Fingerprint) -> Result<Vec<u8>> {
        self.store
            .get(fp, ArtifactRole::Diff)?
            .ok_or_else(|| anyhow!("diff artifact for {fp} vanished after write"))
    }

    /// Best-effort cleanup on an abandoned cycle.
    fn drop_artifacts(&self, page: &MonitoredPage, roles: &[ArtifactRole]) {
        for role in roles {
            if let Err(e) = self.store.discard(&page.fingerprint, *role) {
                warn!(
                    page = %page.url,
                    fingerprint = %page.fingerprint,
                    role = %role,
                    error = %format!("{e:#}"),
                    "could not discard artifact"
                );
            }
        }
    }

    /// Drop any diff, then make the current capture the baseline.
    fn advance_baseline(&self, fp: &Fingerprint) -> Result<()> {
        self.store.discard(fp, ArtifactRole::Diff)?;
        self.store.promote(fp, ArtifactRole::Current, ArtifactRole::Baseline)
    }

    fn log_outcome(&self, page: &MonitoredPage, outcome: &ScanOutcome) {
        let threshold_pct = self.config.threshold * 100.0;
        match outcome {
            ScanOutcome::FirstScan => info!(
                page = %page.url,
                fingerprint = %page.fingerprint,
                "first scan, no previous screenshot to compare; baseline stored"
            ),
            ScanOutcome::NoChange => info!(page = %page.url, fingerprint = %page.fingerprint, "no change detected"),
            ScanOutcome::ChangeBelowThreshold { change_fraction } => info!(
                page = %page.url,
                fingerprint = %page.fingerprint,
                change_pct = change_fraction * 100.0,
                threshold_pct,
                "change detected, below threshold"
            ),
            ScanOutcome::ChangeAboveThreshold { change_fraction } => warn!(
                page = %page.url,
                fingerprint = %page.fingerprint,
                change_pct = change_fraction * 100.0,
                threshold_pct,
                "change detected, notification sent"
            ),
            ScanOutcome::Failed(failure) => warn!(
                page = %page.url,
                fingerprint = %page.fingerprint,
                stage = ?failure.stage(),
                error = %failure,
                "scan failed"
            ),
        }
    }
}
