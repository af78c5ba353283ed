use std::sync::Arc;

use anyhow::Result;

use crate::collab::{Mail, Mailer};
use crate::config::ScanConfig;
use crate::model::MonitoredPage;

/// Formats change alerts and hands them to the mail transport.
///
/// Delivery is attempted once; there is no queue and nothing is re-sent.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn notify(
        &self,
        page: &MonitoredPage,
        change_fraction: f64,
        diff_image: Vec<u8>,
        config: &ScanConfig,
    ) -> Result<()> {
        let mail = compose(page, change_fraction, diff_image, config);
        self.mailer.send(&mail).await
    }
}

pub fn compose(page: &MonitoredPage, change_fraction: f64, diff_image: Vec<u8>, config: &ScanConfig) -> Mail {
    Mail {
        subject: format!("Change detected: {}", page.url),
        body: format!(
            "Change on page {} detected ({:.4}% of pixels differ, threshold {:.4}%).\n\n",
            page.url,
            change_fraction * 100.0,
            config.threshold * 100.0
        ),
        recipient: config.smtp.to.clone(),
        attachment_name: format!("{}_diff.png", page.fingerprint),
        attachment: diff_image,
    }
}
