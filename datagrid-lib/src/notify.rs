//! User-facing notifications
//!
//! The grid reports outcomes (row updated, fetch failed, ...) as [`Toast`]s
//! through a [`Notifier`]. Hosts decide how to show them.

use std::sync::Mutex;
use std::time::Duration;

/// Default duration for toast notifications.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(4);

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    /// Neutral information.
    Info,
    /// An operation succeeded.
    Success,
    /// Something needs attention.
    Warning,
    /// An operation failed.
    Error,
}

/// A transient notification.
///
/// # Example
///
/// ```
/// use datagrid_lib::notify::Toast;
///
/// let toast = Toast::error("Failed to load rows").with_description("connection refused");
/// assert!(toast.is_error());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Severity.
    pub level: ToastLevel,
    /// Headline.
    pub title: String,
    /// Optional detail line.
    pub description: Option<String>,
    /// How long to show the toast.
    pub duration: Duration,
}

impl Toast {
    fn with_level(level: ToastLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    /// Create an info toast.
    pub fn info(title: impl Into<String>) -> Self {
        Self::with_level(ToastLevel::Info, title)
    }

    /// Create a success toast.
    pub fn success(title: impl Into<String>) -> Self {
        Self::with_level(ToastLevel::Success, title)
    }

    /// Create a warning toast.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::with_level(ToastLevel::Warning, title)
    }

    /// Create an error toast.
    pub fn error(title: impl Into<String>) -> Self {
        Self::with_level(ToastLevel::Error, title)
    }

    /// Add a detail line.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a custom duration for this toast.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns `true` for error toasts.
    pub fn is_error(&self) -> bool {
        self.level == ToastLevel::Error
    }
}

impl From<String> for Toast {
    fn from(message: String) -> Self {
        Toast::info(message)
    }
}

impl From<&str> for Toast {
    fn from(message: &str) -> Self {
        Toast::info(message)
    }
}

/// Receives toasts raised by the grid.
pub trait Notifier: Send + Sync {
    /// Shows (or queues) a toast.
    fn notify(&self, toast: Toast);
}

/// A notifier that queues toasts until the host drains them.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<Vec<Toast>>,
}

impl ToastQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every queued toast.
    pub fn drain(&self) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *toasts)
    }

    /// Number of queued toasts.
    pub fn len(&self) -> usize {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if no toast is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner()).push(toast);
    }
}

/// A notifier that writes toasts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        let detail = toast.description.as_deref().unwrap_or("");
        match toast.level {
            ToastLevel::Error => log::error!("{} {}", toast.title, detail),
            ToastLevel::Warning => log::warn!("{} {}", toast.title, detail),
            ToastLevel::Info | ToastLevel::Success => log::info!("{} {}", toast.title, detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drains_in_order() {
        let queue = ToastQueue::new();
        queue.notify(Toast::success("Row updated"));
        queue.notify("Plain".into());

        let toasts = queue.drain();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].level, ToastLevel::Success);
        assert_eq!(toasts[1].level, ToastLevel::Info);
        assert!(queue.is_empty());
    }
}
