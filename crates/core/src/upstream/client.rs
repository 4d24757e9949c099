//! HTTP implementation of `MovieLibrary`.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::UpstreamConfig;

use super::session::{UpstreamRequest, UpstreamSession};
use super::types::*;
use super::{MovieLibrary, UpstreamError};

/// Radarr v3 API client.
#[derive(Debug)]
pub struct RadarrClient {
    session: UpstreamSession,
}

impl RadarrClient {
    /// Create a new client with its own session.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            session: UpstreamSession::new(config)?,
        })
    }

    /// Wrap an existing session.
    pub fn with_session(session: UpstreamSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &UpstreamSession {
        &self.session
    }
}

/// `history/movie` has returned both a bare list and a paged envelope
/// across upstream versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryResponse {
    List(Vec<HistoryRecord>),
    Paged(Page<HistoryRecord>),
}

impl HistoryResponse {
    fn into_records(self) -> Vec<HistoryRecord> {
        match self {
            HistoryResponse::List(records) => records,
            HistoryResponse::Paged(page) => page.records,
        }
    }
}

#[async_trait]
impl MovieLibrary for RadarrClient {
    async fn lookup_movies(&self, term: &str) -> Result<Vec<Movie>, UpstreamError> {
        debug!(term = term, "Movie lookup");
        let movies: Option<Vec<Movie>> = self
            .session
            .execute(UpstreamRequest::get("movie/lookup").query("term", term))
            .await?;
        Ok(movies.unwrap_or_default())
    }

    async fn lookup_movie_by_tmdb(&self, tmdb_id: u32) -> Result<Movie, UpstreamError> {
        let movie: Option<Movie> = self
            .session
            .execute(UpstreamRequest::get("movie/lookup/tmdb").query("tmdbId", tmdb_id))
            .await?;
        movie.ok_or_else(|| UpstreamError::NotFound(format!("movie with TMDB id {}", tmdb_id)))
    }

    async fn lookup_movie_by_imdb(&self, imdb_id: &str) -> Result<Movie, UpstreamError> {
        let movie: Option<Movie> = self
            .session
            .execute(UpstreamRequest::get("movie/lookup/imdb").query("imdbId", imdb_id))
            .await?;
        movie.ok_or_else(|| UpstreamError::NotFound(format!("movie with IMDB id {}", imdb_id)))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, UpstreamError> {
        self.session.execute(UpstreamRequest::get("movie")).await
    }

    async fn get_movie(&self, id: u32) -> Result<Movie, UpstreamError> {
        self.session
            .execute(UpstreamRequest::get(format!("movie/{}", id)))
            .await
    }

    async fn add_movie(&self, request: &AddMovieRequest) -> Result<Movie, UpstreamError> {
        self.session
            .execute(UpstreamRequest::post("movie").json(request)?)
            .await
    }

    async fn update_movie(&self, movie: &Movie) -> Result<Movie, UpstreamError> {
        let id = movie
            .id
            .ok_or_else(|| UpstreamError::Client("Cannot update a movie without an id".into()))?;
        self.session
            .execute(UpstreamRequest::put(format!("movie/{}", id)).json(movie)?)
            .await
    }

    async fn movie_history(&self, movie_id: u32) -> Result<Vec<HistoryRecord>, UpstreamError> {
        let history: Option<HistoryResponse> = self
            .session
            .execute(UpstreamRequest::get("history/movie").query("movieId", movie_id))
            .await?;
        Ok(history.map(HistoryResponse::into_records).unwrap_or_default())
    }

    async fn search_releases(&self, movie_id: u32) -> Result<Vec<Release>, UpstreamError> {
        self.session
            .execute(UpstreamRequest::get("release").query("movieId", movie_id))
            .await
    }

    async fn grab_release(&self, request: &GrabRequest) -> Result<Value, UpstreamError> {
        self.session
            .execute(UpstreamRequest::post("release").json(request)?)
            .await
    }

    async fn queue(&self, query: &QueueQuery) -> Result<Page<QueueItem>, UpstreamError> {
        let page: Option<Page<QueueItem>> = self
            .session
            .execute(
                UpstreamRequest::get("queue")
                    .query("page", query.page)
                    .query("pageSize", query.page_size)
                    .query("sortKey", &query.sort_key)
                    .query("includeMovie", true),
            )
            .await?;
        Ok(page.unwrap_or_else(|| Page::empty(query.page, query.page_size)))
    }

    async fn remove_queue_item(
        &self,
        id: u32,
        remove_from_client: bool,
        blocklist: bool,
    ) -> Result<(), UpstreamError> {
        let _: Value = self
            .session
            .execute(
                UpstreamRequest::delete(format!("queue/{}", id))
                    .query("removeFromClient", remove_from_client)
                    .query("blocklist", blocklist),
            )
            .await?;
        Ok(())
    }

    async fn retry_queue_item(&self, id: u32) -> Result<(), UpstreamError> {
        let _: Value = self
            .session
            .execute(UpstreamRequest::post(format!("queue/grab/{}", id)))
            .await?;
        Ok(())
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, UpstreamError> {
        self.session.execute(UpstreamRequest::get("qualityprofile")).await
    }

    async fn root_folders(&self) -> Result<Vec<RootFolder>, UpstreamError> {
        self.session.execute(UpstreamRequest::get("rootfolder")).await
    }

    async fn wanted_missing(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Movie>, UpstreamError> {
        let wanted: Option<Page<Movie>> = self
            .session
            .execute(
                UpstreamRequest::get("wanted/missing")
                    .query("page", page)
                    .query("pageSize", page_size)
                    .query("sortKey", "title"),
            )
            .await?;
        Ok(wanted.unwrap_or_else(|| Page::empty(page, page_size)))
    }

    async fn calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movie>, UpstreamError> {
        let movies: Option<Vec<Movie>> = self
            .session
            .execute(
                UpstreamRequest::get("calendar")
                    .query("start", start.format("%Y-%m-%d"))
                    .query("end", end.format("%Y-%m-%d")),
            )
            .await?;
        Ok(movies.unwrap_or_default())
    }

    async fn system_status(&self) -> Result<SystemStatus, UpstreamError> {
        self.session.execute(UpstreamRequest::get("system/status")).await
    }

    async fn health(&self) -> Result<Vec<HealthCheck>, UpstreamError> {
        self.session.execute(UpstreamRequest::get("health")).await
    }

    async fn disk_space(&self) -> Result<Vec<DiskSpace>, UpstreamError> {
        self.session.execute(UpstreamRequest::get("diskspace")).await
    }

    async fn indexers(&self) -> Result<Vec<Indexer>, UpstreamError> {
        self.session.execute(UpstreamRequest::get("indexer")).await
    }

    async fn test_indexer(&self, id: u32) -> Result<Value, UpstreamError> {
        // The test endpoint takes the full indexer record, not an id.
        let indexer: Indexer = self
            .session
            .execute(UpstreamRequest::get(format!("indexer/{}", id)))
            .await?;
        debug!(indexer_id = id, name = %indexer.name, "Testing indexer");
        self.session
            .execute(UpstreamRequest::post("indexer/test").json(&indexer)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_accepts_list_and_page() {
        let list: HistoryResponse =
            serde_json::from_value(json!([{ "id": 1, "eventType": "grabbed" }])).unwrap();
        assert_eq!(list.into_records().len(), 1);

        let paged: HistoryResponse = serde_json::from_value(json!({
            "page": 1,
            "pageSize": 10,
            "totalRecords": 2,
            "records": [
                { "id": 1, "eventType": "grabbed" },
                { "id": 2, "eventType": "downloadFolderImported" }
            ]
        }))
        .unwrap();
        let records = paged.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event_type, "downloadFolderImported");
    }

    #[tokio::test]
    async fn test_update_without_id_fails_locally() {
        let client =
            RadarrClient::new(&UpstreamConfig::new("http://127.0.0.1:9", "key")).unwrap();
        let result = client.update_movie(&Movie::default()).await;
        assert!(matches!(result, Err(UpstreamError::Client(_))));
    }
}
