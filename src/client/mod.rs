//! Headless upload client: the session state machine and its transport.

pub mod download;
pub mod notification;
pub mod session;
pub mod transfer;

pub use download::{DirectorySink, DownloadSink, ResultHandle};
pub use notification::{Notification, NotificationKind};
pub use session::{Panel, ProgressLabel, SessionEvent, UploadError, UploadSession, UploadState};
pub use transfer::{
    HttpTransport, ProgressReporter, TransferError, TransferResponse, UploadTransport,
};
