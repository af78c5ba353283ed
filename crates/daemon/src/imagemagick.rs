use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use pagewatch_core::{Comparator, Comparison};

use crate::container::{combined_output, ContainerRuntime};

const MOUNT_TARGET: &str = "/images";
const BASELINE_FILE: &str = "baseline.png";
const CURRENT_FILE: &str = "current.png";
const DIFF_FILE: &str = "diff.png";

/// `compare` exits 0 for identical images and 1 when they differ.
const EXIT_SAME: i32 = 0;
const EXIT_DIFFERENT: i32 = 1;

/// Pixel comparison with ImageMagick's `compare -metric AE` in a container.
pub struct DockerComparator {
    runtime: ContainerRuntime,
    image: String,
}

impl DockerComparator {
    pub fn new(runtime: ContainerRuntime, image: impl Into<String>) -> Self {
        Self {
            runtime,
            image: image.into(),
        }
    }
}

pub fn compare_args(fuzz_percent: u8) -> Vec<String> {
    vec![
        "compare".to_string(),
        "-verbose".to_string(),
        "-metric".to_string(),
        "AE".to_string(),
        "-fuzz".to_string(),
        format!("{fuzz_percent}%"),
        BASELINE_FILE.to_string(),
        CURRENT_FILE.to_string(),
        DIFF_FILE.to_string(),
    ]
}

/// Absolute-error pixel count from the `all:` line of `compare -verbose`.
///
/// Newer ImageMagick releases print the count in float notation and may append
/// a normalized value in parentheses; only the first token is used.
pub fn parse_absolute_error(output: &str) -> Option<u64> {
    output
        .lines()
        .filter_map(|l| l.trim_start().strip_prefix("all:"))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter_map(|token| {
            token
                .parse::<u64>()
                .ok()
                .or_else(|| token.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64))
        })
        .last()
}

#[async_trait]
impl Comparator for DockerComparator {
    async fn compare(&self, baseline: &[u8], current: &[u8], fuzz_percent: u8) -> Result<Comparison> {
        let scratch = self.runtime.scratch_dir("compare-")?;
        for (name, bytes) in [(BASELINE_FILE, baseline), (CURRENT_FILE, current)] {
            let path = scratch.path().join(name);
            tokio::fs::write(&path, bytes)
                .await
                .with_context(|| format!("write {}", path.display()))?;
        }

        let out = self
            .runtime
            .run(scratch.path(), MOUNT_TARGET, &self.image, &compare_args(fuzz_percent))
            .await?;
        let text = combined_output(&out);

        match out.status.code() {
            Some(EXIT_SAME) => Ok(Comparison::Identical),
            Some(EXIT_DIFFERENT) => {
                let differing_pixels = parse_absolute_error(&text)
                    .ok_or_else(|| anyhow!("no absolute error metric in compare output: {}", text.trim()))?;
                let path = scratch.path().join(DIFF_FILE);
                let diff_image = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("read diff image {}", path.display()))?;
                Ok(Comparison::Differ {
                    differing_pixels,
                    diff_image,
                })
            }
            _ => bail!("compare exited with {}: {}", out.status, text.trim()),
        }
    }
}
