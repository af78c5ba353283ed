#![forbid(unsafe_code)]

//! Visual change detection for a set of web pages: artifact storage, the
//! per-page scan cycle and its threshold decision, and alert formatting.

pub mod collab;
pub mod config;
pub mod decision;
pub mod engine;
pub mod hashing;
pub mod memory;
pub mod model;
pub mod notify;
pub mod store;

pub use collab::{Capturer, Comparator, Comparison, Mail, Mailer};
pub use config::{ConfigError, ScanConfig, SmtpSettings};
pub use engine::Scanner;
pub use memory::InMemoryArtifactStore;
pub use model::*;
pub use notify::Notifier;
pub use store::{ArtifactStore, FsArtifactStore};
