//! Scheduler timing with paused tokio time and fake collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use pagewatch_core::{
    ArtifactRole, Capturer, Comparator, Comparison, Geometry, InMemoryArtifactStore, Mail, Mailer, MonitoredPage,
    Notifier, ScanConfig, Scanner, SmtpSettings,
};
use pagewatch_daemon::spawn_scheduler;

/// Records every call; URLs containing "hang" never return.
#[derive(Default)]
struct RecordingCapturer {
    calls: Mutex<Vec<String>>,
}

impl RecordingCapturer {
    fn count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Capturer for RecordingCapturer {
    async fn capture(&self, url: &str, _geometry: Geometry, _scale: f64) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        if url.contains("hang") {
            return std::future::pending().await;
        }
        Ok(b"same".to_vec())
    }
}

struct SameComparator;

#[async_trait]
impl Comparator for SameComparator {
    async fn compare(&self, _baseline: &[u8], _current: &[u8], _fuzz_percent: u8) -> Result<Comparison> {
        Ok(Comparison::Identical)
    }
}

struct NoMail;

#[async_trait]
impl Mailer for NoMail {
    async fn send(&self, _mail: &Mail) -> Result<()> {
        panic!("no change should be alerted");
    }
}

const FAST: &str = "https://fast.example";
const HUNG: &str = "https://hang.example";

fn scanner(urls: &[&str], store: Arc<InMemoryArtifactStore>, capturer: Arc<RecordingCapturer>) -> Arc<Scanner> {
    let config = ScanConfig {
        pages: urls.iter().map(|u| MonitoredPage::new(*u)).collect(),
        interval: Duration::from_secs(3600),
        threshold: 0.05,
        geometry: Geometry { width: 800, height: 600 },
        scale: 1.0,
        fuzz_percent: 0,
        smtp: SmtpSettings {
            user: "u".into(),
            password: "p".into(),
            host: "smtp.example.com".into(),
            port: 465,
            from: "watch@example.com".into(),
            to: "ops@example.com".into(),
        },
    };
    Arc::new(Scanner::new(
        Arc::new(config),
        store,
        capturer,
        Arc::new(SameComparator),
        Notifier::new(Arc::new(NoMail)),
    ))
}

#[tokio::test(start_paused = true)]
async fn scans_immediately_then_once_per_interval() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let capturer = Arc::new(RecordingCapturer::default());
    let handle = spawn_scheduler(scanner(&[FAST], store.clone(), capturer.clone()), Duration::from_secs(10));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(capturer.count(FAST), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(capturer.count(FAST), 2);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(capturer.count(FAST), 4);

    let fp = MonitoredPage::new(FAST).fingerprint;
    assert_eq!(store.roles(&fp), vec![ArtifactRole::Baseline]);
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn hung_page_does_not_hold_back_other_pages_or_ticks() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let capturer = Arc::new(RecordingCapturer::default());
    let handle = spawn_scheduler(
        scanner(&[HUNG, FAST], store.clone(), capturer.clone()),
        Duration::from_secs(10),
    );

    tokio::time::sleep(Duration::from_secs(25)).await;

    // Ticks at 0s, 10s and 20s each start a fresh scan of both pages, even
    // though every scan of the hung page is still outstanding.
    assert_eq!(capturer.count(FAST), 3);
    assert_eq!(capturer.count(HUNG), 3);

    let hung = MonitoredPage::new(HUNG).fingerprint;
    assert!(store.roles(&hung).is_empty());
    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn tick_period_comes_from_the_caller() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let capturer = Arc::new(RecordingCapturer::default());
    let handle = spawn_scheduler(scanner(&[FAST], store, capturer.clone()), Duration::from_secs(3));

    tokio::time::sleep(Duration::from_millis(9_500)).await;
    // 0s, 3s, 6s, 9s; the configured hour never comes into play.
    assert_eq!(capturer.count(FAST), 4);
    handle.abort();
}
