use std::fmt;

use thiserror::Error;

use crate::hashing::url_fingerprint;

/// Storage key for everything belonging to one monitored page.
///
/// Hex-encoded SHA-256 of the page URL, so it is stable across restarts and
/// safe to use as a file name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_url(url: &str) -> Self {
        Self(url_fingerprint(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A page under watch. The fingerprint is derived once from the URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitoredPage {
    pub url: String,
    pub fingerprint: Fingerprint,
}

impl MonitoredPage {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let fingerprint = Fingerprint::of_url(&url);
        Self { url, fingerprint }
    }
}

/// Role an image plays for a page. At most one artifact per role and fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactRole {
    /// Just captured, not yet compared.
    Current,
    /// Reference the next capture is compared against.
    Baseline,
    /// Rendering of the detected difference.
    Diff,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 3] = [Self::Current, Self::Baseline, Self::Diff];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Baseline => "baseline",
            Self::Diff => "diff",
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pipeline stage a scan failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureStage {
    Capture,
    Compare,
    Notify,
    Storage,
}

/// Per-cycle failure. Contained to one page's scan; never fatal to the process.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScanFailure {
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("compare failed: {0}")]
    Compare(String),
    #[error("notification failed: {0}")]
    Notify(String),
    #[error("storage failed: {0}")]
    Storage(String),
}

impl ScanFailure {
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Capture(_) => FailureStage::Capture,
            Self::Compare(_) => FailureStage::Compare,
            Self::Notify(_) => FailureStage::Notify,
            Self::Storage(_) => FailureStage::Storage,
        }
    }

    pub(crate) fn capture(err: anyhow::Error) -> Self {
        Self::Capture(format!("{err:#}"))
    }

    pub(crate) fn compare(err: anyhow::Error) -> Self {
        Self::Compare(format!("{err:#}"))
    }

    pub(crate) fn notify(err: anyhow::Error) -> Self {
        Self::Notify(format!("{err:#}"))
    }

    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

/// Result of one scan cycle for one page. Not persisted.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanOutcome {
    /// No baseline existed; the capture became the baseline.
    FirstScan,
    NoChange,
    ChangeBelowThreshold { change_fraction: f64 },
    ChangeAboveThreshold { change_fraction: f64 },
    Failed(ScanFailure),
}

impl ScanOutcome {
    pub fn failure_stage(&self) -> Option<FailureStage> {
        match self {
            Self::Failed(f) => Some(f.stage()),
            _ => None,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Self::ChangeAboveThreshold { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_fingerprint_is_derived_from_url() {
        let page = MonitoredPage::new("https://example.com/");
        assert_eq!(page.fingerprint, Fingerprint::of_url("https://example.com/"));
        assert_eq!(page.fingerprint.as_str().len(), 64);
    }

    #[test]
    fn geometry_pixel_count_does_not_overflow_u32() {
        let g = Geometry { width: 100_000, height: 100_000 };
        assert_eq!(g.pixel_count(), 10_000_000_000);
    }

    #[test]
    fn failure_maps_to_stage() {
        assert_eq!(ScanFailure::Capture("x".into()).stage(), FailureStage::Capture);
        assert_eq!(ScanFailure::Compare("x".into()).stage(), FailureStage::Compare);
        assert_eq!(ScanFailure::Notify("x".into()).stage(), FailureStage::Notify);
        assert_eq!(ScanFailure::Storage("x".into()).stage(), FailureStage::Storage);
        assert_eq!(
            ScanOutcome::Failed(ScanFailure::Storage("disk".into())).failure_stage(),
            Some(FailureStage::Storage)
        );
        assert_eq!(ScanOutcome::NoChange.failure_stage(), None);
    }
}
