use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use pagewatch_core::{Capturer, Geometry};

use crate::container::{combined_output, ContainerRuntime};

const OUTPUT_FILE: &str = "current.png";
const MOUNT_TARGET: &str = "/raster-output";

/// Screenshots via a headless rasterizer container.
pub struct DockerRasterizer {
    runtime: ContainerRuntime,
    image: String,
}

impl DockerRasterizer {
    pub fn new(runtime: ContainerRuntime, image: impl Into<String>) -> Self {
        Self {
            runtime,
            image: image.into(),
        }
    }
}

pub fn rasterize_args(url: &str, geometry: Geometry, scale: f64) -> Vec<String> {
    vec![
        url.to_string(),
        OUTPUT_FILE.to_string(),
        format!("{}px*{}px", geometry.width, geometry.height),
        format!("{scale:.6}"),
    ]
}

#[async_trait]
impl Capturer for DockerRasterizer {
    async fn capture(&self, url: &str, geometry: Geometry, scale: f64) -> Result<Vec<u8>> {
        let scratch = self.runtime.scratch_dir("capture-")?;
        let args = rasterize_args(url, geometry, scale);
        let out = self.runtime.run(scratch.path(), MOUNT_TARGET, &self.image, &args).await?;
        if !out.status.success() {
            bail!("rasterizer exited with {}: {}", out.status, combined_output(&out).trim());
        }
        let path = scratch.path().join(OUTPUT_FILE);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("read screenshot {}", path.display()))
    }
}
