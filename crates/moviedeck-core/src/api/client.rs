//! Movie catalog client.
//!
//! Every call goes through the shared `Pipeline`, so it is tracked by the
//! work-tracker and carries the session's credentials.

use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ApiError, ApiRequest};
use crate::models::{MovieDetail, MovieListResponse};
use crate::navigation::{Navigator, Route};
use crate::pipeline::Pipeline;

/// Base URL for the catalog API
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Clone)]
pub struct MovieClient {
    pipeline: Arc<Pipeline>,
    base_url: String,
    api_key: Option<String>,
}

impl MovieClient {
    pub fn new(pipeline: Arc<Pipeline>, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            pipeline,
            base_url,
            api_key,
        }
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL {}: {}", raw, e)))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(ref key) = self.api_key {
                query.append_pair("api_key", key);
            }
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        // An empty query_pairs_mut still leaves a trailing '?'
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, ApiError> {
        let url = self.url(path, params)?;
        debug!(path = path, "Catalog request");
        let response = self.pipeline.execute(ApiRequest::get(url)).await?;
        response.json()
    }

    // ===== Catalog Queries =====

    pub async fn popular(&self, page: u32) -> Result<MovieListResponse, ApiError> {
        self.get("/movie/popular", &[("page", page.to_string())]).await
    }

    pub async fn top_rated(&self, page: u32) -> Result<MovieListResponse, ApiError> {
        self.get("/movie/top_rated", &[("page", page.to_string())]).await
    }

    pub async fn movie(&self, id: u64) -> Result<MovieDetail, ApiError> {
        self.get(&format!("/movie/{}", id), &[]).await
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<MovieListResponse, ApiError> {
        self.get(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Load a movie for its detail view from a raw route parameter.
    ///
    /// An unparseable or zero id, or a 404 from the catalog, sends the user
    /// to the not-found view before the error is returned.
    pub async fn resolve_movie(
        &self,
        raw_id: &str,
        navigator: &dyn Navigator,
    ) -> Result<MovieDetail, ApiError> {
        let id = match raw_id.trim().parse::<u64>() {
            Ok(id) if id > 0 => id,
            _ => {
                warn!(raw_id = raw_id, "Invalid movie id");
                navigator.navigate(Route::NotFound);
                return Err(ApiError::InvalidRequest(format!("Invalid movie id: {}", raw_id)));
            }
        };

        match self.movie(id).await {
            Ok(detail) => Ok(detail),
            Err(e) if e.is_not_found() => {
                navigator.navigate(Route::NotFound);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
