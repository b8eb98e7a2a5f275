//! Navigation requests sent to whatever front end hosts the views.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Movies,
    MovieDetail(u64),
    NotFound,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "/login"),
            Route::Movies => write!(f, "/movies"),
            Route::MovieDetail(id) => write!(f, "/movies/{}", id),
            Route::NotFound => write!(f, "/404"),
        }
    }
}

/// Fire-and-forget navigation target.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only records the request in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(route = %route, "Navigation requested");
    }
}
