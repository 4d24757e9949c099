//! Mock movie library for testing.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::upstream::{
    AddMovieRequest, DiskSpace, GrabRequest, HealthCheck, HistoryRecord, Indexer, Movie,
    MovieLibrary, Page, QualityProfile, QueueItem, QueueQuery, Release, RootFolder, SystemStatus,
    UpstreamError,
};

/// A recorded library call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryCall {
    LookupMovies { term: String },
    LookupByTmdb { tmdb_id: u32 },
    LookupByImdb { imdb_id: String },
    ListMovies,
    GetMovie { id: u32 },
    AddMovie { request: AddMovieRequest },
    UpdateMovie { movie: Movie },
    MovieHistory { movie_id: u32 },
    SearchReleases { movie_id: u32 },
    GrabRelease { request: GrabRequest },
    Queue { query: QueueQuery },
    RemoveQueueItem { id: u32, remove_from_client: bool, blocklist: bool },
    RetryQueueItem { id: u32 },
    QualityProfiles,
    RootFolders,
    WantedMissing { page: u32, page_size: u32 },
    Calendar { start: NaiveDate, end: NaiveDate },
    SystemStatus,
    Health,
    DiskSpace,
    Indexers,
    TestIndexer { id: u32 },
}

#[derive(Debug, Default)]
struct LibraryState {
    /// Movies returned by lookups (not yet added).
    catalog: Vec<Movie>,
    /// Library movies by id.
    movies: HashMap<u32, Movie>,
    history: HashMap<u32, Vec<HistoryRecord>>,
    releases: HashMap<u32, Vec<Release>>,
    queue: Vec<QueueItem>,
    profiles: Vec<QualityProfile>,
    folders: Vec<RootFolder>,
    indexers: Vec<Indexer>,
    status: SystemStatus,
    health: Vec<HealthCheck>,
    disks: Vec<DiskSpace>,
    next_id: u32,
}

/// Mock implementation of the MovieLibrary trait.
///
/// Provides controllable behavior for testing:
/// - In-memory catalog, library, queue and defaults
/// - Records every call for assertions
/// - Injects a one-shot error
///
/// # Example
///
/// ```rust,ignore
/// use reelgate_core::testing::{fixtures, MockMovieLibrary};
///
/// let library = MockMovieLibrary::new();
/// library.add_to_catalog(fixtures::lookup_movie("Alien", 1979, 348)).await;
///
/// let found = library.lookup_movie_by_tmdb(348).await?;
/// assert_eq!(found.title, "Alien");
/// ```
#[derive(Debug, Clone)]
pub struct MockMovieLibrary {
    state: Arc<RwLock<LibraryState>>,
    calls: Arc<RwLock<Vec<LibraryCall>>>,
    next_error: Arc<RwLock<Option<UpstreamError>>>,
}

impl Default for MockMovieLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMovieLibrary {
    /// Create a new empty mock library.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LibraryState {
                next_id: 1,
                ..Default::default()
            })),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Add a movie that lookups can find.
    pub async fn add_to_catalog(&self, movie: Movie) {
        self.state.write().await.catalog.push(movie);
    }

    /// Put a movie straight into the library. Assigns an id if missing.
    pub async fn add_to_library(&self, mut movie: Movie) -> u32 {
        let mut state = self.state.write().await;
        let id = match movie.id {
            Some(id) if id > 0 => id,
            _ => state.next_id,
        };
        state.next_id = state.next_id.max(id + 1);
        movie.id = Some(id);
        state.movies.insert(id, movie);
        id
    }

    pub async fn set_history(&self, movie_id: u32, records: Vec<HistoryRecord>) {
        self.state.write().await.history.insert(movie_id, records);
    }

    pub async fn set_releases(&self, movie_id: u32, releases: Vec<Release>) {
        self.state.write().await.releases.insert(movie_id, releases);
    }

    pub async fn set_queue(&self, items: Vec<QueueItem>) {
        self.state.write().await.queue = items;
    }

    pub async fn set_quality_profiles(&self, profiles: Vec<QualityProfile>) {
        self.state.write().await.profiles = profiles;
    }

    pub async fn set_root_folders(&self, folders: Vec<RootFolder>) {
        self.state.write().await.folders = folders;
    }

    pub async fn set_indexers(&self, indexers: Vec<Indexer>) {
        self.state.write().await.indexers = indexers;
    }

    pub async fn set_system(
        &self,
        status: SystemStatus,
        health: Vec<HealthCheck>,
        disks: Vec<DiskSpace>,
    ) {
        let mut state = self.state.write().await;
        state.status = status;
        state.health = health;
        state.disks = disks;
    }

    /// Current library contents, sorted by id.
    pub async fn library(&self) -> Vec<Movie> {
        let state = self.state.read().await;
        let mut movies: Vec<Movie> = state.movies.values().cloned().collect();
        movies.sort_by_key(|movie| movie.id);
        movies
    }

    pub async fn queue_items(&self) -> Vec<QueueItem> {
        self.state.read().await.queue.clone()
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    pub async fn recorded_calls(&self) -> Vec<LibraryCall> {
        self.calls.read().await.clone()
    }

    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of recorded calls matching `predicate`.
    pub async fn count_calls(&self, predicate: impl Fn(&LibraryCall) -> bool) -> usize {
        self.calls.read().await.iter().filter(|call| predicate(call)).count()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: UpstreamError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Record the call, then fail if an error is pending.
    async fn enter(&self, call: LibraryCall) -> Result<(), UpstreamError> {
        self.calls.write().await.push(call);
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Library copy of a catalog movie, if it has been added.
    fn in_library(state: &LibraryState, tmdb_id: Option<u32>) -> Option<Movie> {
        tmdb_id.and_then(|tmdb_id| {
            state
                .movies
                .values()
                .find(|movie| movie.tmdb_id == Some(tmdb_id))
                .cloned()
        })
    }
}

fn page_of<T: Clone>(items: &[T], page: u32, page_size: u32) -> Page<T> {
    let start = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
    Page {
        page,
        page_size,
        total_records: items.len() as u32,
        records: items
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect(),
    }
}

#[async_trait]
impl MovieLibrary for MockMovieLibrary {
    async fn lookup_movies(&self, term: &str) -> Result<Vec<Movie>, UpstreamError> {
        self.enter(LibraryCall::LookupMovies {
            term: term.to_string(),
        })
        .await?;

        let state = self.state.read().await;
        let term_lower = term.to_lowercase();
        Ok(state
            .catalog
            .iter()
            .filter(|movie| {
                let title = movie.title.to_lowercase();
                title.contains(&term_lower) || term_lower.contains(&title)
            })
            .map(|movie| Self::in_library(&state, movie.tmdb_id).unwrap_or_else(|| movie.clone()))
            .collect())
    }

    async fn lookup_movie_by_tmdb(&self, tmdb_id: u32) -> Result<Movie, UpstreamError> {
        self.enter(LibraryCall::LookupByTmdb { tmdb_id }).await?;

        let state = self.state.read().await;
        if let Some(movie) = Self::in_library(&state, Some(tmdb_id)) {
            return Ok(movie);
        }
        state
            .catalog
            .iter()
            .find(|movie| movie.tmdb_id == Some(tmdb_id))
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(format!("movie/lookup/tmdb {}", tmdb_id)))
    }

    async fn lookup_movie_by_imdb(&self, imdb_id: &str) -> Result<Movie, UpstreamError> {
        self.enter(LibraryCall::LookupByImdb {
            imdb_id: imdb_id.to_string(),
        })
        .await?;

        let state = self.state.read().await;
        state
            .movies
            .values()
            .chain(state.catalog.iter())
            .find(|movie| movie.imdb_id.as_deref() == Some(imdb_id))
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(format!("movie/lookup/imdb {}", imdb_id)))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, UpstreamError> {
        self.enter(LibraryCall::ListMovies).await?;
        Ok(self.library().await)
    }

    async fn get_movie(&self, id: u32) -> Result<Movie, UpstreamError> {
        self.enter(LibraryCall::GetMovie { id }).await?;
        self.state
            .read()
            .await
            .movies
            .get(&id)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(format!("movie/{}", id)))
    }

    async fn add_movie(&self, request: &AddMovieRequest) -> Result<Movie, UpstreamError> {
        self.enter(LibraryCall::AddMovie {
            request: request.clone(),
        })
        .await?;

        let mut state = self.state.write().await;
        if Self::in_library(&state, request.movie.tmdb_id).is_some() {
            return Err(UpstreamError::Conflict(
                "This movie has already been added".to_string(),
            ));
        }

        let id = state.next_id;
        state.next_id += 1;

        let mut movie = request.movie.clone();
        movie.id = Some(id);
        movie.path = movie
            .root_folder_path
            .as_ref()
            .map(|root| format!("{}/{}", root.trim_end_matches('/'), movie.title));
        state.movies.insert(id, movie.clone());
        Ok(movie)
    }

    async fn update_movie(&self, movie: &Movie) -> Result<Movie, UpstreamError> {
        self.enter(LibraryCall::UpdateMovie {
            movie: movie.clone(),
        })
        .await?;

        let id = movie
            .id
            .ok_or_else(|| UpstreamError::Client("Cannot update a movie without an id".into()))?;
        let mut state = self.state.write().await;
        match state.movies.get_mut(&id) {
            Some(existing) => {
                *existing = movie.clone();
                Ok(movie.clone())
            }
            None => Err(UpstreamError::NotFound(format!("movie/{}", id))),
        }
    }

    async fn movie_history(&self, movie_id: u32) -> Result<Vec<HistoryRecord>, UpstreamError> {
        self.enter(LibraryCall::MovieHistory { movie_id }).await?;
        Ok(self
            .state
            .read()
            .await
            .history
            .get(&movie_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_releases(&self, movie_id: u32) -> Result<Vec<Release>, UpstreamError> {
        self.enter(LibraryCall::SearchReleases { movie_id }).await?;
        let state = self.state.read().await;
        if !state.movies.contains_key(&movie_id) {
            return Err(UpstreamError::NotFound(format!("movie/{}", movie_id)));
        }
        Ok(state.releases.get(&movie_id).cloned().unwrap_or_default())
    }

    async fn grab_release(&self, request: &GrabRequest) -> Result<Value, UpstreamError> {
        self.enter(LibraryCall::GrabRelease {
            request: request.clone(),
        })
        .await?;

        let state = self.state.read().await;
        let release = state
            .releases
            .get(&request.movie_id)
            .and_then(|releases| releases.iter().find(|r| r.guid == request.guid))
            .ok_or_else(|| {
                UpstreamError::NotFound(format!("release {} for movie {}", request.guid, request.movie_id))
            })?;
        Ok(json!({ "guid": release.guid, "title": release.title, "approved": release.approved }))
    }

    async fn queue(&self, query: &QueueQuery) -> Result<Page<QueueItem>, UpstreamError> {
        self.enter(LibraryCall::Queue {
            query: query.clone(),
        })
        .await?;
        let state = self.state.read().await;
        Ok(page_of(&state.queue, query.page, query.page_size))
    }

    async fn remove_queue_item(
        &self,
        id: u32,
        remove_from_client: bool,
        blocklist: bool,
    ) -> Result<(), UpstreamError> {
        self.enter(LibraryCall::RemoveQueueItem {
            id,
            remove_from_client,
            blocklist,
        })
        .await?;

        let mut state = self.state.write().await;
        let before = state.queue.len();
        state.queue.retain(|item| item.id != id);
        if state.queue.len() == before {
            return Err(UpstreamError::NotFound(format!("queue/{}", id)));
        }
        Ok(())
    }

    async fn retry_queue_item(&self, id: u32) -> Result<(), UpstreamError> {
        self.enter(LibraryCall::RetryQueueItem { id }).await?;
        let state = self.state.read().await;
        if state.queue.iter().any(|item| item.id == id) {
            Ok(())
        } else {
            Err(UpstreamError::NotFound(format!("queue/grab/{}", id)))
        }
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, UpstreamError> {
        self.enter(LibraryCall::QualityProfiles).await?;
        Ok(self.state.read().await.profiles.clone())
    }

    async fn root_folders(&self) -> Result<Vec<RootFolder>, UpstreamError> {
        self.enter(LibraryCall::RootFolders).await?;
        Ok(self.state.read().await.folders.clone())
    }

    async fn wanted_missing(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Movie>, UpstreamError> {
        self.enter(LibraryCall::WantedMissing { page, page_size })
            .await?;
        let wanted: Vec<Movie> = self
            .library()
            .await
            .into_iter()
            .filter(|movie| movie.monitored && !movie.has_file)
            .collect();
        Ok(page_of(&wanted, page, page_size))
    }

    async fn calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movie>, UpstreamError> {
        self.enter(LibraryCall::Calendar { start, end }).await?;
        Ok(self
            .library()
            .await
            .into_iter()
            .filter(|movie| movie.release_dates().any(|date| date >= start && date <= end))
            .collect())
    }

    async fn system_status(&self) -> Result<SystemStatus, UpstreamError> {
        self.enter(LibraryCall::SystemStatus).await?;
        Ok(self.state.read().await.status.clone())
    }

    async fn health(&self) -> Result<Vec<HealthCheck>, UpstreamError> {
        self.enter(LibraryCall::Health).await?;
        Ok(self.state.read().await.health.clone())
    }

    async fn disk_space(&self) -> Result<Vec<DiskSpace>, UpstreamError> {
        self.enter(LibraryCall::DiskSpace).await?;
        Ok(self.state.read().await.disks.clone())
    }

    async fn indexers(&self) -> Result<Vec<Indexer>, UpstreamError> {
        self.enter(LibraryCall::Indexers).await?;
        Ok(self.state.read().await.indexers.clone())
    }

    async fn test_indexer(&self, id: u32) -> Result<Value, UpstreamError> {
        self.enter(LibraryCall::TestIndexer { id }).await?;
        let state = self.state.read().await;
        if state.indexers.iter().any(|indexer| indexer.id == id) {
            Ok(Value::Null)
        } else {
            Err(UpstreamError::NotFound(format!("indexer/{}", id)))
        }
    }
}
