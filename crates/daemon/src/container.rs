use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// How to reach the container runtime and where per-call scratch dirs live.
///
/// The scratch root is bind-mounted into the containers, so it must be an
/// absolute path that the container runtime can see.
#[derive(Clone, Debug)]
pub struct ContainerRuntime {
    pub docker: String,
    pub scratch_root: PathBuf,
}

impl ContainerRuntime {
    pub fn new(docker: impl Into<String>, scratch_root: PathBuf) -> Self {
        Self {
            docker: docker.into(),
            scratch_root,
        }
    }

    /// Fresh directory for one invocation; removed when dropped.
    pub fn scratch_dir(&self, prefix: &str) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&self.scratch_root)
            .with_context(|| format!("create scratch dir under {}", self.scratch_root.display()))
    }

    /// `docker run --rm -v <host>:<target> <image> <args...>`, output captured.
    pub async fn run(&self, host_dir: &Path, target: &str, image: &str, args: &[String]) -> Result<Output> {
        let argv = run_argv(host_dir, target, image, args);
        tokio::process::Command::new(&self.docker)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("run {} {}", self.docker, argv.join(" ")))
    }
}

pub fn run_argv(host_dir: &Path, target: &str, image: &str, args: &[String]) -> Vec<String> {
    let mut argv = vec![
        "run".to_string(),
        "--rm".to_string(),
        "-v".to_string(),
        format!("{}:{}", host_dir.display(), target),
        image.to_string(),
    ];
    argv.extend(args.iter().cloned());
    argv
}

/// stdout followed by stderr, lossy.
pub fn combined_output(out: &Output) -> String {
    let mut s = String::from_utf8_lossy(&out.stdout).into_owned();
    s.push_str(&String::from_utf8_lossy(&out.stderr));
    s
}
