//! Capability interfaces for the external collaborators.
//!
//! The scan engine only talks to the outside world through these, so tests can
//! substitute fakes for the rasterizer, the comparator and the mail transport.

use anyhow::Result;
use async_trait::async_trait;

use crate::model::Geometry;

/// Renders a URL to a PNG.
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self, url: &str, geometry: Geometry, scale: f64) -> Result<Vec<u8>>;
}

/// What a comparator reports for two images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Identical,
    Differ { differing_pixels: u64, diff_image: Vec<u8> },
}

/// Pixel comparison with a color fuzz tolerance (percent).
///
/// "Images differ" is a normal `Ok(Comparison::Differ { .. })`, never an error.
#[async_trait]
pub trait Comparator: Send + Sync {
    async fn compare(&self, baseline: &[u8], current: &[u8], fuzz_percent: u8) -> Result<Comparison>;
}

/// A single outbound message with one attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mail {
    pub subject: String,
    pub body: String,
    pub recipient: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<()>;
}
