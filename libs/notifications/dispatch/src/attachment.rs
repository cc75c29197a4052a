//! File attachments, read lazily at send time.

use crate::error::{NotificationError, NotificationResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::{Path, PathBuf};

/// A file to attach: where to read it and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub filename: String,
}

impl Attachment {
    pub fn new(path: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filename: filename.into(),
        }
    }

    /// Read the file contents.
    pub async fn load(&self) -> NotificationResult<LoadedAttachment> {
        let content =
            tokio::fs::read(&self.path)
                .await
                .map_err(|source| NotificationError::AttachmentRead {
                    path: self.path.clone(),
                    source,
                })?;

        Ok(LoadedAttachment {
            filename: self.filename.clone(),
            content,
        })
    }
}

/// Attachment bytes held only for the duration of one send.
#[derive(Debug, Clone)]
pub struct LoadedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

impl LoadedAttachment {
    pub fn mime_type(&self) -> &'static str {
        mime_type_for(&self.filename)
    }

    pub fn base64(&self) -> String {
        BASE64.encode(&self.content)
    }
}

/// Read every attachment in order, failing on the first unreadable file.
pub async fn load_all(attachments: &[Attachment]) -> NotificationResult<Vec<LoadedAttachment>> {
    let mut loaded = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        loaded.push(attachment.load().await?);
    }
    Ok(loaded)
}

/// MIME type derived from a filename extension.
pub fn mime_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
