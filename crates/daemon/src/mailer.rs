use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use pagewatch_core::{Mail, Mailer, SmtpSettings};

/// Authenticated SMTP submission over implicit TLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let from: Mailbox = settings
            .from
            .parse()
            .with_context(|| format!("invalid sender address {:?}", settings.from))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .with_context(|| format!("configure smtp relay {}", settings.host))?
            .port(settings.port)
            .credentials(Credentials::new(settings.user.clone(), settings.password.clone()))
            .build();
        Ok(Self { transport, from })
    }
}

pub fn build_message(from: Mailbox, mail: &Mail) -> Result<Message> {
    let to: Mailbox = mail
        .recipient
        .parse()
        .with_context(|| format!("invalid recipient address {:?}", mail.recipient))?;
    let png = ContentType::parse("image/png").map_err(|_| anyhow!("invalid attachment content type"))?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.clone())
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(mail.body.clone()))
                .singlepart(Attachment::new(mail.attachment_name.clone()).body(mail.attachment.clone(), png)),
        )
        .context("build notification message")
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &Mail) -> Result<()> {
        let message = build_message(self.from.clone(), mail)?;
        self.transport.send(message).await.context("smtp submission")?;
        Ok(())
    }
}
