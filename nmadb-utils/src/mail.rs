//! Sending the same mail to many recipients
//!
//! One message is built per recipient. Messages are handed to the backend in
//! batches, opening one connection per batch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Recipients sent through one connection unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 7;

/// Attachments a single mail may carry
pub const MAX_ATTACHMENTS: usize = 3;

/// Mail settings from the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// Sender address, also the login for the backend
    pub username: String,
    /// Messages sent through one connection
    pub batch_size: usize,
    pub use_tls: bool,
    /// Directory the outbox backend writes batches to
    pub outbox: Option<PathBuf>,
}

impl Default for MailSettings {
    fn default() -> Self {
        MailSettings {
            username: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            use_tls: true,
            outbox: None,
        }
    }
}

/// File attached to every message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Shown file name; defaults to "attachment N"
    pub label: Option<String>,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(label: Option<String>, data: Vec<u8>) -> Self {
        Attachment { label, data }
    }

    /// Read an attachment from disk
    pub fn from_file(path: &Path, label: Option<String>) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
        Ok(Attachment { label, data })
    }
}

/// A composed message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from_email: String,
    pub to: Vec<String>,
    /// (file name, content)
    pub attachments: Vec<(String, Vec<u8>)>,
}

/// Errors composing or sending mass mail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    TooManyAttachments { count: usize },
    InvalidBatchSize,
    MissingSender,
}

impl std::fmt::Display for MailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailError::TooManyAttachments { count } => write!(
                f,
                "{} attachments given, at most {} are supported",
                count, MAX_ATTACHMENTS
            ),
            MailError::InvalidBatchSize => write!(f, "mail batch size must be at least 1"),
            MailError::MissingSender => write!(f, "mail username (sender) is not configured"),
        }
    }
}

impl std::error::Error for MailError {}

/// An open connection able to deliver messages
pub trait MailConnection {
    /// Deliver messages, returning how many were sent
    fn send_messages(&mut self, messages: &[EmailMessage]) -> Result<usize>;
}

/// Opens connections to a mail transport
pub trait MailBackend {
    type Connection: MailConnection;

    fn open(&self, settings: &MailSettings) -> Result<Self::Connection>;
}

/// Build one message per recipient
pub fn compose_messages(
    recipients: &[String],
    subject: &str,
    body: &str,
    attachments: &[Attachment],
    from_email: &str,
) -> Result<Vec<EmailMessage>, MailError> {
    if attachments.len() > MAX_ATTACHMENTS {
        return Err(MailError::TooManyAttachments {
            count: attachments.len(),
        });
    }

    let files: Vec<(String, Vec<u8>)> = attachments
        .iter()
        .enumerate()
        .map(|(idx, a)| {
            let label = a
                .label
                .clone()
                .unwrap_or_else(|| format!("attachment {}", idx + 1));
            (label, a.data.clone())
        })
        .collect();

    Ok(recipients
        .iter()
        .map(|to| EmailMessage {
            subject: subject.to_string(),
            body: body.to_string(),
            from_email: from_email.to_string(),
            to: vec![to.clone()],
            attachments: files.clone(),
        })
        .collect())
}

/// Send `subject`/`body` to every recipient, batch by batch
///
/// Returns the number of messages the backend accepted.
pub fn send_mass_mail<B: MailBackend>(
    backend: &B,
    settings: &MailSettings,
    recipients: &[String],
    subject: &str,
    body: &str,
    attachments: &[Attachment],
) -> Result<usize> {
    if settings.batch_size == 0 {
        return Err(MailError::InvalidBatchSize.into());
    }
    if settings.username.trim().is_empty() {
        return Err(MailError::MissingSender.into());
    }

    let messages = compose_messages(recipients, subject, body, attachments, &settings.username)?;

    let total = messages.len();
    let mut sent = 0;
    for (idx, batch) in messages.chunks(settings.batch_size).enumerate() {
        let delivered = backend
            .open(settings)
            .with_context(|| format!("Failed to open mail connection for batch {}", idx + 1))
            .and_then(|mut connection| {
                connection
                    .send_messages(batch)
                    .with_context(|| format!("Failed to send mail batch {}", idx + 1))
            })
            .with_context(|| {
                format!(
                    "{} of {} messages were sent before the failure; resending repeats them",
                    sent, total
                )
            })?;
        sent += delivered;
        log::info!("Mail batch {}: {} messages", idx + 1, batch.len());
    }

    Ok(sent)
}

/// Backend that writes every batch as a JSON file into a directory
#[derive(Debug, Clone)]
pub struct OutboxBackend {
    dir: PathBuf,
}

impl OutboxBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        OutboxBackend { dir: dir.into() }
    }
}

/// Connection of [`OutboxBackend`]
#[derive(Debug)]
pub struct OutboxConnection {
    dir: PathBuf,
    use_tls: bool,
}

impl MailBackend for OutboxBackend {
    type Connection = OutboxConnection;

    fn open(&self, settings: &MailSettings) -> Result<OutboxConnection> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create outbox: {}", self.dir.display()))?;
        Ok(OutboxConnection {
            dir: self.dir.clone(),
            use_tls: settings.use_tls,
        })
    }
}

#[derive(Serialize)]
struct OutboxBatch<'a> {
    written_at: String,
    use_tls: bool,
    messages: &'a [EmailMessage],
}

impl MailConnection for OutboxConnection {
    fn send_messages(&mut self, messages: &[EmailMessage]) -> Result<usize> {
        let batch = OutboxBatch {
            written_at: chrono::Utc::now().to_rfc3339(),
            use_tls: self.use_tls,
            messages,
        };
        let path = self.dir.join(format!("batch-{}.json", uuid::Uuid::new_v4()));
        let json = serde_json::to_string_pretty(&batch).context("Failed to serialize mail batch")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write mail batch: {}", path.display()))?;
        log::debug!("Mail batch written to {}", path.display());
        Ok(messages.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the size of every batch it receives
    #[derive(Default)]
    struct RecordingBackend {
        batches: RefCell<Vec<usize>>,
        /// Batch number (from 1) whose delivery fails
        fail_batch: Option<usize>,
    }

    struct RecordingConnection<'a> {
        batches: &'a RefCell<Vec<usize>>,
        fail_batch: Option<usize>,
    }

    impl MailConnection for RecordingConnection<'_> {
        fn send_messages(&mut self, messages: &[EmailMessage]) -> Result<usize> {
            let number = self.batches.borrow().len() + 1;
            if self.fail_batch == Some(number) {
                anyhow::bail!("connection reset");
            }
            self.batches.borrow_mut().push(messages.len());
            Ok(messages.len())
        }
    }

    impl<'a> MailBackend for &'a RecordingBackend {
        type Connection = RecordingConnection<'a>;

        fn open(&self, _settings: &MailSettings) -> Result<RecordingConnection<'a>> {
            let backend: &'a RecordingBackend = *self;
            Ok(RecordingConnection {
                batches: &backend.batches,
                fail_batch: backend.fail_batch,
            })
        }
    }

    fn settings(batch_size: usize) -> MailSettings {
        MailSettings {
            username: "olimpiados@example.com".into(),
            batch_size,
            ..MailSettings::default()
        }
    }

    fn recipients(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("pupil{}@example.com", i)).collect()
    }

    #[test]
    fn test_batches_of_default_size() {
        let backend = RecordingBackend::default();
        let sent = send_mass_mail(
            &&backend,
            &settings(DEFAULT_BATCH_SIZE),
            &recipients(15),
            "Kvietimas",
            "Sveiki",
            &[],
        )
        .unwrap();
        assert_eq!(sent, 15);
        assert_eq!(*backend.batches.borrow(), vec![7, 7, 1]);
    }

    #[test]
    fn test_configured_batch_size() {
        let backend = RecordingBackend::default();
        send_mass_mail(&&backend, &settings(2), &recipients(5), "S", "B", &[]).unwrap();
        assert_eq!(*backend.batches.borrow(), vec![2, 2, 1]);
    }

    #[test]
    fn test_failed_batch_reports_messages_already_sent() {
        let backend = RecordingBackend {
            fail_batch: Some(2),
            ..RecordingBackend::default()
        };
        let err = send_mass_mail(&&backend, &settings(7), &recipients(15), "S", "B", &[])
            .unwrap_err();

        assert_eq!(*backend.batches.borrow(), vec![7]);
        let message = format!("{:#}", err);
        assert!(message.contains("7 of 15 messages were sent"));
        assert!(message.contains("Failed to send mail batch 2"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let backend = RecordingBackend::default();
        let err = send_mass_mail(&&backend, &settings(0), &recipients(1), "S", "B", &[]).unwrap_err();
        assert_eq!(err.downcast_ref::<MailError>(), Some(&MailError::InvalidBatchSize));
        assert!(backend.batches.borrow().is_empty());
    }

    #[test]
    fn test_compose_default_attachment_labels() {
        let attachments = vec![
            Attachment::new(None, b"one".to_vec()),
            Attachment::new(Some("rules.pdf".into()), b"two".to_vec()),
        ];
        let messages = compose_messages(&recipients(2), "S", "B", &attachments, "me@example.com").unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].to, vec!["pupil1@example.com".to_string()]);
        assert_eq!(messages[0].from_email, "me@example.com");
        let labels: Vec<_> = messages[0].attachments.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["attachment 1", "rules.pdf"]);
    }

    #[test]
    fn test_too_many_attachments() {
        let attachments = vec![Attachment::new(None, Vec::new()); 4];
        let result = compose_messages(&recipients(1), "S", "B", &attachments, "me@example.com");
        assert_eq!(result, Err(MailError::TooManyAttachments { count: 4 }));
    }

    #[test]
    fn test_outbox_writes_one_file_per_batch() {
        let dir = tempfile::tempdir().unwrap();
        let backend = OutboxBackend::new(dir.path().join("outbox"));
        let sent = send_mass_mail(&backend, &settings(3), &recipients(4), "S", "B", &[]).unwrap();
        assert_eq!(sent, 4);

        let files = std::fs::read_dir(dir.path().join("outbox")).unwrap().count();
        assert_eq!(files, 2);
    }
}
