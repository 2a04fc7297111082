use crate::models::{FormattedDocument, UploadedDocument};
use crate::utils::validation::formatted_filename;
use anyhow::Result;
use std::time::Duration;

/// Trait for document formatting implementations
///
/// This is where ABNT layout rules would be applied. Implementations receive
/// the document fully in memory and must not persist it.
#[async_trait::async_trait]
pub trait DocumentFormatter: Send + Sync {
    /// Produce the formatted attachment for an uploaded document
    async fn format(&self, document: UploadedDocument) -> Result<FormattedDocument>;

    /// Short name used in logs and the health endpoint
    fn name(&self) -> &'static str;
}

/// Formatter that renames the document and echoes its bytes unchanged
/// after a fixed delay.
pub struct PassthroughFormatter {
    delay: Duration,
}

impl PassthroughFormatter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl DocumentFormatter for PassthroughFormatter {
    async fn format(&self, document: UploadedDocument) -> Result<FormattedDocument> {
        let filename = formatted_filename(&document.original_name);

        if !self.delay.is_zero() {
            tracing::debug!(
                "Simulating {:?} of processing for {}",
                self.delay,
                document.original_name
            );
            tokio::time::sleep(self.delay).await;
        }

        Ok(FormattedDocument {
            filename,
            mime_type: document.mime_type,
            content: document.content,
        })
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Formatter that always fails (for testing)
#[cfg(test)]
pub struct FailingFormatter;

#[cfg(test)]
#[async_trait::async_trait]
impl DocumentFormatter for FailingFormatter {
    async fn format(&self, _document: UploadedDocument) -> Result<FormattedDocument> {
        Err(anyhow::anyhow!("formatter crashed"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Factory function to create the formatter named in config
pub fn create_formatter(formatter_type: &str, delay: Duration) -> Box<dyn DocumentFormatter> {
    match formatter_type.to_lowercase().as_str() {
        "passthrough" | "mock" | "echo" => Box::new(PassthroughFormatter::new(delay)),
        _ => {
            tracing::warn!(
                "Unknown formatter type '{}', using PassthroughFormatter",
                formatter_type
            );
            Box::new(PassthroughFormatter::new(delay))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMime;
    use bytes::Bytes;

    fn document(name: &str) -> UploadedDocument {
        UploadedDocument {
            original_name: name.to_string(),
            mime_type: DocumentMime::Pdf,
            content: Bytes::from_static(b"%PDF-1.7 body"),
        }
    }

    #[tokio::test]
    async fn test_passthrough_renames_and_echoes() {
        let formatter = PassthroughFormatter::new(Duration::ZERO);
        let result = formatter.format(document("thesis.pdf")).await.unwrap();
        assert_eq!(result.filename, "thesis-abnt.pdf");
        assert_eq!(result.mime_type, DocumentMime::Pdf);
        assert_eq!(&result.content[..], b"%PDF-1.7 body");
    }

    #[tokio::test(start_paused = true)]
    async fn test_passthrough_waits_for_delay() {
        let formatter = PassthroughFormatter::new(Duration::from_millis(2000));
        let started = tokio::time::Instant::now();
        formatter.format(document("a.pdf")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_failing_formatter() {
        assert!(FailingFormatter.format(document("a.pdf")).await.is_err());
    }

    #[test]
    fn test_create_formatter() {
        assert_eq!(create_formatter("passthrough", Duration::ZERO).name(), "passthrough");
        assert_eq!(create_formatter("unknown", Duration::ZERO).name(), "passthrough");
    }
}
