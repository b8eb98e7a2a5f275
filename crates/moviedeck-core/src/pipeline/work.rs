use std::sync::Arc;

use async_trait::async_trait;

use super::{is_asset_request, Middleware, Next};
use crate::api::{ApiError, ApiRequest, ApiResponse};
use crate::tracker::WorkTracker;

/// Counts each call as in flight from entry until it settles or is dropped.
///
/// A retry issued further down the chain belongs to the same tracked call.
pub struct WorkTrackingStage {
    tracker: Arc<WorkTracker>,
}

impl WorkTrackingStage {
    pub fn new(tracker: Arc<WorkTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Middleware for WorkTrackingStage {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse, ApiError> {
        if is_asset_request(&request) {
            return next.run(request).await;
        }

        let _guard = self.tracker.begin();
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::testing::{unauthorized, ScriptedTransport};
    use reqwest::Url;

    fn get(url: &str) -> ApiRequest {
        ApiRequest::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_tracks_success_and_failure() {
        let tracker = Arc::new(WorkTracker::new());
        let pipeline = Pipeline::builder(Arc::new(ScriptedTransport::new(vec![
            Ok(crate::testing::ok_json("{}")),
            Err(unauthorized()),
        ])))
        .with(WorkTrackingStage::new(tracker.clone()))
        .build();

        pipeline.execute(get("https://api.example.com/movie/1")).await.unwrap();
        assert_eq!(tracker.in_flight(), 0);
        pipeline.execute(get("https://api.example.com/movie/2")).await.unwrap_err();
        assert_eq!(tracker.in_flight(), 0);
        assert!(!tracker.is_busy());
    }

    #[tokio::test]
    async fn test_counts_while_in_flight() {
        let tracker = Arc::new(WorkTracker::new());
        let pipeline = Arc::new(
            Pipeline::builder(Arc::new(
                ScriptedTransport::new(vec![])
                    .delayed(std::time::Duration::from_millis(20)),
            ))
            .with(WorkTrackingStage::new(tracker.clone()))
            .build(),
        );

        let p = pipeline.clone();
        let call = tokio::spawn(async move {
            p.execute(get("https://api.example.com/movie/1")).await
        });
        while tracker.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(tracker.is_busy());

        call.await.unwrap().unwrap();
        assert_eq!(tracker.in_flight(), 0);
    }
}
