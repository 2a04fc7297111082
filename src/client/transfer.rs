//! One-shot multipart transfer with observable progress.
//!
//! A transfer is a spawned task that yields zero or more
//! [`TransferEvent::Progress`] events with non-decreasing fractions in
//! `[0, 1]`, followed by exactly one [`TransferEvent::Completed`].

use crate::models::UploadableFile;
use anyhow::Context;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{AsHeaderName, HeaderMap};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Multipart field the server reads the document from
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct TransferResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransferResponse {
    /// Header value as text, tolerating non-ASCII bytes.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }
}

#[derive(Error, Debug, Clone)]
pub enum TransferError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug)]
pub enum TransferEvent {
    Progress(f64),
    Completed(Result<TransferResponse, TransferError>),
}

/// Forwards progress to the transfer's event channel, clamping to `[0, 1]`
/// and dropping anything that would move backwards.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<TransferEvent>,
    last: f64,
}

impl ProgressReporter {
    fn new(tx: mpsc::UnboundedSender<TransferEvent>) -> Self {
        Self { tx, last: 0.0 }
    }

    pub fn report(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction < self.last {
            return;
        }
        self.last = fraction;
        // A closed receiver means nobody is watching any more
        let _ = self.tx.send(TransferEvent::Progress(fraction));
    }

    /// Reports `sent / total`; silent when the total is unknown.
    pub fn report_bytes(&mut self, sent: u64, total: u64) {
        if total > 0 {
            self.report(sent as f64 / total as f64);
        }
    }
}

/// Trait for the client side of the upload exchange
#[async_trait::async_trait]
pub trait UploadTransport: Send + Sync {
    /// Send the document and wait for the complete response
    async fn send(
        &self,
        file: &UploadableFile,
        progress: ProgressReporter,
    ) -> Result<TransferResponse, TransferError>;
}

/// Spawns the transfer and returns its event stream.
pub fn start_transfer(
    transport: Arc<dyn UploadTransport>,
    file: UploadableFile,
) -> mpsc::UnboundedReceiver<TransferEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = ProgressReporter::new(tx.clone());

    tokio::spawn(async move {
        let result = transport.send(&file, reporter).await;
        if let Err(e) = &result {
            tracing::warn!("Transfer of {} failed: {}", file.name, e);
        }
        let _ = tx.send(TransferEvent::Completed(result));
    });

    rx
}

/// `reqwest` transport posting `multipart/form-data` to the upload endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    chunk_size: usize,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, chunk_size: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn split_chunks(content: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    (0..content.len())
        .step_by(chunk_size)
        .map(|start| content.slice(start..(start + chunk_size).min(content.len())))
        .collect()
}

#[async_trait::async_trait]
impl UploadTransport for HttpTransport {
    async fn send(
        &self,
        file: &UploadableFile,
        mut progress: ProgressReporter,
    ) -> Result<TransferResponse, TransferError> {
        let total = file.content.len() as u64;
        let mut sent = 0u64;

        // Progress ticks as the body stream is polled by the connection
        let stream = futures::stream::iter(split_chunks(&file.content, self.chunk_size)).map(
            move |chunk| {
                sent += chunk.len() as u64;
                progress.report_bytes(sent, total);
                Ok::<Bytes, std::io::Error>(chunk)
            },
        );

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(file.name.clone())
            .mime_str(file.mime_type.as_str())
            .map_err(|e| TransferError::InvalidRequest(e.to_string()))?;
        // Browsers send the filename verbatim rather than percent-encoded
        let form = Form::new().percent_encode_noop().part(FILE_FIELD, part);

        tracing::debug!("Posting {} ({} bytes) to {}", file.name, total, self.url);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        Ok(TransferResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_chunks() {
        let content = Bytes::from_static(b"abcdefghij");
        let chunks = split_chunks(&content, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(&chunks[2][..], b"ij");
        assert!(split_chunks(&Bytes::new(), 4).is_empty());
    }

    #[test]
    fn test_reporter_is_monotonic_and_clamped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut reporter = ProgressReporter::new(tx);

        reporter.report(0.2);
        reporter.report(0.1);
        reporter.report(f64::NAN);
        reporter.report(1.5);
        reporter.report_bytes(5, 0);

        let mut seen = Vec::new();
        while let Ok(TransferEvent::Progress(p)) = rx.try_recv() {
            seen.push(p);
        }
        assert_eq!(seen, vec![0.2, 1.0]);
    }
}
