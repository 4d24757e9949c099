//! Upstream movie-management service (Radarr API v3).
//!
//! `UpstreamSession` owns the connection pool, authentication and retry
//! policy. `RadarrClient` maps typed operations onto it and implements
//! `MovieLibrary`, the seam the tool router depends on.

mod client;
mod error;
mod session;
mod types;

pub use client::RadarrClient;
pub use error::UpstreamError;
pub use session::{RetryPolicy, UpstreamRequest, UpstreamSession};
pub use types::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

/// Operations the gateway performs against the movie library.
#[async_trait]
pub trait MovieLibrary: Send + Sync {
    // Lookup (not yet in the library)

    /// Free-text lookup against the upstream metadata source.
    async fn lookup_movies(&self, term: &str) -> Result<Vec<Movie>, UpstreamError>;

    /// Lookup a single movie by TMDB id.
    async fn lookup_movie_by_tmdb(&self, tmdb_id: u32) -> Result<Movie, UpstreamError>;

    /// Lookup a single movie by IMDB id (`tt...`).
    async fn lookup_movie_by_imdb(&self, imdb_id: &str) -> Result<Movie, UpstreamError>;

    // Library

    async fn list_movies(&self) -> Result<Vec<Movie>, UpstreamError>;

    async fn get_movie(&self, id: u32) -> Result<Movie, UpstreamError>;

    async fn add_movie(&self, request: &AddMovieRequest) -> Result<Movie, UpstreamError>;

    /// Replace a library movie with the given record.
    async fn update_movie(&self, movie: &Movie) -> Result<Movie, UpstreamError>;

    async fn movie_history(&self, movie_id: u32) -> Result<Vec<HistoryRecord>, UpstreamError>;

    // Releases

    async fn search_releases(&self, movie_id: u32) -> Result<Vec<Release>, UpstreamError>;

    async fn grab_release(&self, request: &GrabRequest) -> Result<Value, UpstreamError>;

    // Queue

    async fn queue(&self, query: &QueueQuery) -> Result<Page<QueueItem>, UpstreamError>;

    async fn remove_queue_item(
        &self,
        id: u32,
        remove_from_client: bool,
        blocklist: bool,
    ) -> Result<(), UpstreamError>;

    /// Re-grab the release behind a failed queue item.
    async fn retry_queue_item(&self, id: u32) -> Result<(), UpstreamError>;

    // Defaults

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, UpstreamError>;

    async fn root_folders(&self) -> Result<Vec<RootFolder>, UpstreamError>;

    // Wanted / calendar

    async fn wanted_missing(&self, page: u32, page_size: u32)
        -> Result<Page<Movie>, UpstreamError>;

    /// Movies with a release date inside `start..=end`.
    async fn calendar(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<Movie>, UpstreamError>;

    // System

    async fn system_status(&self) -> Result<SystemStatus, UpstreamError>;

    async fn health(&self) -> Result<Vec<HealthCheck>, UpstreamError>;

    async fn disk_space(&self) -> Result<Vec<DiskSpace>, UpstreamError>;

    // Indexers

    async fn indexers(&self) -> Result<Vec<Indexer>, UpstreamError>;

    /// Run the upstream connectivity test for one indexer.
    async fn test_indexer(&self, id: u32) -> Result<Value, UpstreamError>;
}
