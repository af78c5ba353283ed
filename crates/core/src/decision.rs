use crate::model::{Geometry, ScanOutcome};

/// Share of the configured capture area that differs.
///
/// Density rather than an absolute count, so pages captured at the same
/// geometry are comparable. Zero-pixel geometry yields 0.
pub fn change_fraction(differing_pixels: u64, geometry: Geometry) -> f64 {
    let total = geometry.pixel_count();
    if total == 0 {
        return 0.0;
    }
    differing_pixels as f64 / total as f64
}

/// Threshold rule. Exactly 0 is no change; equal to the threshold does not alert.
pub fn classify(change_fraction: f64, threshold: f64) -> ScanOutcome {
    if change_fraction <= 0.0 {
        ScanOutcome::NoChange
    } else if change_fraction <= threshold {
        ScanOutcome::ChangeBelowThreshold { change_fraction }
    } else {
        ScanOutcome::ChangeAboveThreshold { change_fraction }
    }
}
