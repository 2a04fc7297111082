//! Client-side upload session: file selection, transfer progress and the
//! downloadable result.
//!
//! One session drives at most one upload at a time. [`UploadSession::submit`]
//! holds the session mutably for the whole exchange, so nothing else can
//! select or reset while a request is in flight.

use super::download::{DownloadSink, ResultHandle};
use super::notification::{Notification, NotificationKind, Toasts};
use super::transfer::{TransferError, TransferEvent, TransferResponse, UploadTransport, start_transfer};
use crate::config::ClientConfig;
use crate::models::{FileCandidate, UploadableFile};
use crate::utils::disposition;
use crate::utils::validation::{validate_file_size, validate_mime_type};
use reqwest::header::CONTENT_DISPOSITION;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Share of the bar driven by real transfer progress
const TRANSFER_SHARE: f64 = 0.6;

/// Up to this percentage the label reads "sending"
const SENDING_THRESHOLD: u8 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Unsupported file type '{0}'")]
    InvalidFileType(String),

    #[error("File of {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status {status}")]
    Server { status: u16 },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("An upload is already in progress")]
    Busy,
}

impl UploadError {
    /// Text shown in the error toast.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::InvalidFileType(_) => "Please select a PDF or DOCX file".to_string(),
            UploadError::FileTooLarge { max, .. } => {
                format!("The file must be at most {}MB", max / 1024 / 1024)
            }
            UploadError::Network(_) => "Could not connect to the server".to_string(),
            UploadError::Server { .. } => "Error processing the file".to_string(),
            UploadError::Download(_) => "Could not save the document".to_string(),
            UploadError::Busy => "Please wait for the current upload to finish".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLabel {
    Sending,
    ProcessingOnServer,
    Done,
}

impl ProgressLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressLabel::Sending => "Sending file...",
            ProgressLabel::ProcessingOnServer => "Processing on server...",
            ProgressLabel::Done => "Done!",
        }
    }
}

impl fmt::Display for ProgressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Ready { file: UploadableFile },
    Transmitting { file: UploadableFile },
    ServerProcessing { file: UploadableFile },
    Succeeded { file: UploadableFile, result: ResultHandle },
}

impl UploadState {
    pub fn file(&self) -> Option<&UploadableFile> {
        match self {
            UploadState::Idle => None,
            UploadState::Ready { file }
            | UploadState::Transmitting { file }
            | UploadState::ServerProcessing { file }
            | UploadState::Succeeded { file, .. } => Some(file),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Ready { .. } => "ready",
            UploadState::Transmitting { .. } => "transmitting",
            UploadState::ServerProcessing { .. } => "server-processing",
            UploadState::Succeeded { .. } => "succeeded",
        }
    }

    fn is_in_flight(&self) -> bool {
        matches!(
            self,
            UploadState::Transmitting { .. } | UploadState::ServerProcessing { .. }
        )
    }
}

/// Which part of the page is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    DropZone,
    Preview,
    Success,
}

impl From<&UploadState> for Panel {
    fn from(state: &UploadState) -> Self {
        match state {
            UploadState::Idle => Panel::DropZone,
            UploadState::Ready { .. }
            | UploadState::Transmitting { .. }
            | UploadState::ServerProcessing { .. } => Panel::Preview,
            UploadState::Succeeded { .. } => Panel::Success,
        }
    }
}

/// What a renderer needs to redraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PanelChanged(Panel),
    Progress { percent: u8, label: ProgressLabel },
    Notified(Notification),
}

/// The native file input. Choosing the value it already holds fires no
/// change, so it must be cleared for the same file to be picked again.
#[derive(Debug, Default)]
struct FilePicker {
    value: Option<String>,
}

pub struct UploadSession {
    config: ClientConfig,
    state: UploadState,
    progress_percent: u8,
    progress_label: Option<ProgressLabel>,
    picker: FilePicker,
    toasts: Toasts,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl UploadSession {
    pub fn new(config: ClientConfig) -> Self {
        let toasts = Toasts::new(config.toast_duration);
        Self {
            config,
            state: UploadState::Idle,
            progress_percent: 0,
            progress_label: None,
            picker: FilePicker::default(),
            toasts,
            events: None,
        }
    }

    /// Receives every panel change, progress update and toast from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&UploadableFile> {
        self.state.file()
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn progress_label(&self) -> &'static str {
        self.progress_label.map(|l| l.as_str()).unwrap_or("")
    }

    pub fn result(&self) -> Option<&ResultHandle> {
        match &self.state {
            UploadState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn result_available(&self) -> bool {
        self.result().is_some()
    }

    pub fn panel(&self) -> Panel {
        Panel::from(&self.state)
    }

    /// Submit and cancel are disabled while the bar is partly filled.
    pub fn actions_enabled(&self) -> bool {
        !(self.progress_percent > 0 && self.progress_percent < 100)
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    /// Validates a candidate and makes it the selected file.
    ///
    /// On rejection an error toast is shown and the session is left as it was.
    pub fn select_file(&mut self, candidate: FileCandidate) -> Result<(), UploadError> {
        if self.state.is_in_flight() {
            return Err(UploadError::Busy);
        }

        let file = match self.validate(candidate) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("Rejected selection: {}", e);
                self.notify(e.user_message(), NotificationKind::Error);
                return Err(e);
            }
        };

        tracing::info!("📎 Selected {} ({} bytes)", file.name, file.size_bytes);
        // The drop zone and its input are replaced by the preview
        self.picker.value = None;
        self.set_progress(0, None);
        self.set_state(UploadState::Ready { file });
        self.notify("File loaded successfully!", NotificationKind::Success);
        Ok(())
    }

    /// A file chosen through the picker control. Returns `None` when the
    /// picker already held that file and therefore fired no change.
    pub fn pick_file(&mut self, candidate: FileCandidate) -> Option<Result<(), UploadError>> {
        if self.picker.value.as_deref() == Some(candidate.name.as_str()) {
            return None;
        }
        self.picker.value = Some(candidate.name.clone());
        Some(self.select_file(candidate))
    }

    /// Files dropped on the drop zone; only the first one is considered.
    pub fn drop_files<I>(&mut self, files: I) -> Option<Result<(), UploadError>>
    where
        I: IntoIterator<Item = FileCandidate>,
    {
        let first = files.into_iter().next()?;
        Some(self.select_file(first))
    }

    pub fn remove_file(&mut self) {
        self.reset();
    }

    /// Back to an empty drop zone. Calling it again changes nothing.
    pub fn reset(&mut self) {
        self.picker.value = None;
        self.set_progress(0, None);
        self.set_state(UploadState::Idle);
    }

    /// "Format another file" from the success panel.
    pub fn start_over(&mut self) {
        if !matches!(self.state, UploadState::Succeeded { .. }) {
            tracing::debug!("start_over ignored in state {}", self.state.name());
            return;
        }
        self.reset();
    }

    /// Uploads the selected file and waits for the formatted result.
    ///
    /// Does nothing unless a file is selected and idle. On failure the file
    /// stays selected so the user can retry.
    pub async fn submit(&mut self, transport: Arc<dyn UploadTransport>) -> Result<(), UploadError> {
        let file = match &self.state {
            UploadState::Ready { file } => file.clone(),
            other => {
                tracing::debug!("submit ignored in state {}", other.name());
                return Ok(());
            }
        };

        self.set_progress(0, Some(ProgressLabel::Sending));
        self.set_state(UploadState::Transmitting { file: file.clone() });

        let mut events = start_transfer(transport, file.clone());
        let mut outcome = None;
        while let Some(event) = events.recv().await {
            match event {
                TransferEvent::Progress(fraction) => self.on_transfer_progress(fraction),
                TransferEvent::Completed(result) => {
                    outcome = Some(result);
                    break;
                }
            }
        }

        // The bar reads 100% before the status is looked at
        self.set_progress(100, Some(ProgressLabel::Done));

        let outcome = outcome.unwrap_or_else(|| {
            Err(TransferError::Network(
                "transfer ended without a response".to_string(),
            ))
        });

        match outcome {
            Ok(response) if response.status == 200 => {
                self.complete(file, response).await;
                Ok(())
            }
            Ok(response) => self.fail(
                file,
                UploadError::Server {
                    status: response.status,
                },
            ),
            Err(e) => self.fail(file, UploadError::Network(e.to_string())),
        }
    }

    /// Saves the result through `sink`. Returns `None` when there is no
    /// result to save.
    pub async fn download(
        &mut self,
        sink: &dyn DownloadSink,
    ) -> Result<Option<PathBuf>, UploadError> {
        let UploadState::Succeeded { result, .. } = &self.state else {
            tracing::debug!("download ignored in state {}", self.state.name());
            return Ok(None);
        };

        let path = match sink.save(result).await {
            Ok(path) => path,
            Err(e) => {
                let err = UploadError::Download(format!("{:#}", e));
                self.notify(err.user_message(), NotificationKind::Error);
                return Err(err);
            }
        };

        self.notify("Download started...", NotificationKind::Success);
        if !self.config.download_notice_delay.is_zero() {
            tokio::time::sleep(self.config.download_notice_delay).await;
        }
        self.notify("Download complete!", NotificationKind::Success);

        Ok(Some(path))
    }

    fn validate(&self, candidate: FileCandidate) -> Result<UploadableFile, UploadError> {
        let mime_type = validate_mime_type(&candidate.mime_type)
            .map_err(|_| UploadError::InvalidFileType(candidate.mime_type.clone()))?;

        validate_file_size(candidate.size_bytes, self.config.max_file_size).map_err(|_| {
            UploadError::FileTooLarge {
                size: candidate.size_bytes,
                max: self.config.max_file_size,
            }
        })?;

        Ok(UploadableFile {
            name: candidate.name,
            size_bytes: candidate.size_bytes,
            mime_type,
            content: candidate.content,
        })
    }

    fn on_transfer_progress(&mut self, fraction: f64) {
        let percent = (fraction * 100.0 * TRANSFER_SHARE).round() as u8;
        let percent = percent.max(self.progress_percent);
        let label = if percent <= SENDING_THRESHOLD {
            ProgressLabel::Sending
        } else {
            ProgressLabel::ProcessingOnServer
        };
        self.set_progress(percent, Some(label));

        if fraction >= 1.0 {
            if let UploadState::Transmitting { file } = &self.state {
                let file = file.clone();
                self.set_state(UploadState::ServerProcessing { file });
            }
        }
    }

    async fn complete(&mut self, file: UploadableFile, response: TransferResponse) {
        let header = response.header(CONTENT_DISPOSITION);
        let filename = disposition::filename_or_default(header.as_deref());
        let result = ResultHandle {
            filename,
            content: response.body,
        };

        if !self.config.success_delay.is_zero() {
            tokio::time::sleep(self.config.success_delay).await;
        }

        tracing::info!(
            "✅ Received {} ({} bytes)",
            result.filename,
            result.content.len()
        );
        self.set_state(UploadState::Succeeded { file, result });
        self.notify("Document formatted successfully!", NotificationKind::Success);
    }

    fn fail(&mut self, file: UploadableFile, err: UploadError) -> Result<(), UploadError> {
        tracing::warn!("Upload of {} failed: {}", file.name, err);
        self.set_state(UploadState::Ready { file });
        self.notify(err.user_message(), NotificationKind::Error);
        Err(err)
    }

    fn set_state(&mut self, state: UploadState) {
        let before = self.panel();
        self.state = state;
        let after = self.panel();
        if before != after {
            self.emit(SessionEvent::PanelChanged(after));
        }
    }

    fn set_progress(&mut self, percent: u8, label: Option<ProgressLabel>) {
        let changed = self.progress_percent != percent || self.progress_label != label;
        self.progress_percent = percent;
        self.progress_label = label;
        if let (true, Some(label)) = (changed, label) {
            self.emit(SessionEvent::Progress { percent, label });
        }
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        let notification = self.toasts.show(message, kind);
        self.emit(SessionEvent::Notified(notification));
    }

    fn emit(&mut self, event: SessionEvent) {
        let closed = match &self.events {
            Some(tx) => tx.send(event).is_err(),
            None => false,
        };
        if closed {
            self.events = None;
        }
    }
}
