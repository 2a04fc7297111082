use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => f.write_str("success"),
            NotificationKind::Error => f.write_str("error"),
        }
    }
}

/// A toast: shown once, gone after its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub visible_until: Instant,
}

impl Notification {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now < self.visible_until
    }
}

/// Toasts kept for [`Toasts::history`]; older ones are dropped.
pub const HISTORY_LIMIT: usize = 16;

/// Single-slot toast area. A new toast replaces the one on screen; every
/// toast expires on its own deadline.
#[derive(Debug)]
pub struct Toasts {
    duration: Duration,
    current: Option<Notification>,
    history: Vec<Notification>,
}

impl Toasts {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
            history: Vec::new(),
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) -> Notification {
        let notification = Notification {
            message: message.into(),
            kind,
            visible_until: Instant::now() + self.duration,
        };

        match kind {
            NotificationKind::Success => tracing::info!("🔔 {}", notification.message),
            NotificationKind::Error => tracing::warn!("🔔 {}", notification.message),
        }

        self.current = Some(notification.clone());
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(notification.clone());
        notification
    }

    /// The toast on screen right now, if it has not expired.
    pub fn visible(&self) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|n| n.is_visible_at(Instant::now()))
    }

    /// The most recent toasts, oldest first.
    pub fn history(&self) -> &[Notification] {
        &self.history
    }

    pub fn last(&self) -> Option<&Notification> {
        self.history.last()
    }
}
