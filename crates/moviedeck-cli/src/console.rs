//! Terminal implementations of the core's front-end collaborators.

use std::io::{self, Write};
use std::time::Duration;

use moviedeck_core::navigation::{Navigator, Route};
use moviedeck_core::notify::{Category, Notifier};
use moviedeck_core::tracker::WorkTracker;
use tokio::task::JoinHandle;

/// Width of the busy line, cleared when work finishes
const BUSY_LINE_WIDTH: usize = 12;

pub struct ConsoleNotifier {
    duration: Duration,
}

impl ConsoleNotifier {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Notifier for ConsoleNotifier {
    // A terminal line stays put, so the display duration has nothing to drive
    fn notify(&self, message: &str, category: Category, _duration: Duration) {
        let marker = match category {
            Category::Error => "✗",
            Category::Success => "✓",
            Category::Info => "•",
        };
        eprintln!("{} {}", marker, message);
    }

    fn default_duration(&self) -> Duration {
        self.duration
    }
}

/// Prints where the app would send the user next.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        match route {
            Route::Login => eprintln!("Please log in: moviedeck login"),
            Route::NotFound => eprintln!("Not found."),
            Route::Movies | Route::MovieDetail(_) => tracing::debug!(route = %route, "Navigate"),
        }
    }
}

/// Show a "Loading..." line on stderr while any tracked call is in flight.
pub fn spawn_busy_indicator(tracker: &WorkTracker) -> JoinHandle<()> {
    let mut busy = tracker.subscribe();
    tokio::spawn(async move {
        while busy.changed().await.is_ok() {
            let is_busy = *busy.borrow_and_update();
            let mut stderr = io::stderr();
            if is_busy {
                let _ = write!(stderr, "{:<width$}\r", "Loading...", width = BUSY_LINE_WIDTH);
            } else {
                let _ = write!(stderr, "{:width$}\r", "", width = BUSY_LINE_WIDTH);
            }
            let _ = stderr.flush();
        }
    })
}
