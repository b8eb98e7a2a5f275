//! User-facing notifications (the toast/snackbar surface).

use std::fmt;
use std::time::Duration;

use tracing::{error, info};

/// How long a notification stays visible unless the caller says otherwise
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Error,
    Success,
    Info,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Error => "error",
            Category::Success => "success",
            Category::Info => "info",
        };
        f.write_str(label)
    }
}

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, category: Category, duration: Duration);

    fn default_duration(&self) -> Duration {
        DEFAULT_NOTIFICATION_DURATION
    }

    fn show_error(&self, message: &str) {
        self.notify(message, Category::Error, self.default_duration());
    }

    fn show_success(&self, message: &str) {
        self.notify(message, Category::Success, self.default_duration());
    }

    fn show_info(&self, message: &str) {
        self.notify(message, Category::Info, self.default_duration());
    }
}

/// Notifier that writes to the tracing log.
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    duration: Duration,
}

impl LogNotifier {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION)
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, category: Category, duration: Duration) {
        let duration_ms = duration.as_millis() as u64;
        match category {
            Category::Error => error!(duration_ms, "{}", message),
            Category::Success | Category::Info => {
                info!(category = %category, duration_ms, "{}", message)
            }
        }
    }

    fn default_duration(&self) -> Duration {
        self.duration
    }
}
