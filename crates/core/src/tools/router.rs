//! Tool dispatch: validate arguments, consult the cache, delegate to the
//! movie library, reshape the result.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::metrics::TOOL_CALLS;
use crate::upstream::{
    AddMovieRequest, AddOptions, GrabRequest, MovieLibrary, Movie, QualityProfile, QueueQuery,
    Release, RootFolder,
};

use super::params::*;
use super::responses::*;
use super::schema::{
    self, ResourceDefinition, ResourceTemplate, ToolDefinition, JSON_MIME, MOVIES_URI_PREFIX,
    MOVIE_URI_PREFIX,
};
use super::ToolError;

/// Body of a resource read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: &'static str,
    pub text: String,
}

/// Routes named tool calls to the movie library.
///
/// Owns the response cache for its whole lifetime; the cache is never
/// persisted and only forgets entries through TTL expiry.
pub struct ToolRouter {
    library: Arc<dyn MovieLibrary>,
    cache: Arc<ResponseCache>,
}

impl ToolRouter {
    pub fn new(library: Arc<dyn MovieLibrary>, cache: Arc<ResponseCache>) -> Self {
        Self { library, cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        schema::tool_definitions()
    }

    pub fn resources(&self) -> Vec<ResourceDefinition> {
        schema::resource_definitions()
    }

    pub fn resource_templates(&self) -> Vec<ResourceTemplate> {
        schema::resource_templates()
    }

    /// Invoke a tool by name with raw JSON arguments.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let started = Instant::now();
        let result = self.dispatch(name, arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        // Unknown names would otherwise create unbounded label values.
        let tool_label = if schema::tool_definitions().iter().any(|tool| tool.name == name) {
            name
        } else {
            "unknown"
        };

        match &result {
            Ok(_) => {
                TOOL_CALLS.with_label_values(&[tool_label, "success"]).inc();
                info!(tool = name, elapsed_ms, "Tool call succeeded");
            }
            Err(err) => {
                let kind = err.kind();
                TOOL_CALLS.with_label_values(&[tool_label, kind.as_str()]).inc();
                warn!(tool = name, kind = %kind, elapsed_ms, error = %err, "Tool call failed");
            }
        }

        result
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        match name {
            "search_movies" => to_json(self.search_movies(parse(arguments)?).await?),
            "add_movie" => to_json(self.add_movie(parse(arguments)?).await?),
            "get_movies" => to_json(self.get_movies(parse(arguments)?).await?),
            "get_movie_details" => to_json(self.get_movie_details(parse(arguments)?).await?),
            "update_movie" => to_json(self.update_movie(parse(arguments)?).await?),
            "search_movie_releases" => {
                to_json(self.search_movie_releases(parse(arguments)?).await?)
            }
            "download_release" => to_json(self.download_release(parse(arguments)?).await?),
            "get_download_queue" => to_json(self.get_download_queue(parse(arguments)?).await?),
            "manage_download_queue" => {
                to_json(self.manage_download_queue(parse(arguments)?).await?)
            }
            "get_system_defaults" => {
                parse::<NoParams>(arguments)?;
                to_json(self.get_system_defaults().await?)
            }
            "get_wanted_movies" => to_json(self.get_wanted_movies(parse(arguments)?).await?),
            "get_calendar" => to_json(self.get_calendar(parse(arguments)?).await?),
            "get_system_status" => {
                parse::<NoParams>(arguments)?;
                to_json(self.get_system_status().await?)
            }
            "manage_indexers" => to_json(self.manage_indexers(parse(arguments)?).await?),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    // =========================================================================
    // Search / add / update
    // =========================================================================

    pub async fn search_movies(
        &self,
        params: SearchMoviesParams,
    ) -> Result<SearchMoviesResult, ToolError> {
        let movies = match params.lookup()? {
            MovieLookup::Term(term) => self.lookup_term(&term).await?,
            MovieLookup::Tmdb(tmdb_id) => vec![self.lookup_tmdb(tmdb_id).await?],
            MovieLookup::Imdb(imdb_id) => vec![self.lookup_imdb(&imdb_id).await?],
        };

        let movies: Vec<SearchResult> = movies
            .iter()
            .take(MAX_SEARCH_RESULTS)
            .map(SearchResult::from)
            .collect();
        debug!(results = movies.len(), "Movie search finished");

        Ok(SearchMoviesResult {
            results_count: movies.len(),
            movies,
        })
    }

    pub async fn add_movie(&self, params: AddMovieParams) -> Result<AddMovieResult, ToolError> {
        params.validate()?;

        let found = self.lookup_tmdb(params.tmdb_id).await?;
        if found.is_in_library() {
            return Err(ToolError::Conflict(format!(
                "'{}' is already in the library (id {})",
                found.title,
                found.id.unwrap_or_default()
            )));
        }

        let mut defaults_applied = Vec::new();
        let (quality_profile_id, root_folder_path) =
            match (params.quality_profile_id, params.root_folder_path.clone()) {
                (Some(profile), Some(folder)) => (profile, folder),
                (profile, folder) => {
                    let (profiles, folders) = self.defaults().await?;
                    let profile = match profile {
                        Some(profile) => profile,
                        None => {
                            defaults_applied.push("quality_profile_id".to_string());
                            profiles.first().map(|p| p.id).ok_or_else(|| {
                                ToolError::Validation(
                                    "No quality profile configured upstream".to_string(),
                                )
                            })?
                        }
                    };
                    let folder = match folder {
                        Some(folder) => folder,
                        None => {
                            defaults_applied.push("root_folder_path".to_string());
                            folders.first().map(|f| f.path.clone()).ok_or_else(|| {
                                ToolError::Validation(
                                    "No root folder configured upstream".to_string(),
                                )
                            })?
                        }
                    };
                    (profile, folder)
                }
            };

        let request = AddMovieRequest {
            movie: Movie {
                id: None,
                quality_profile_id: Some(quality_profile_id),
                root_folder_path: Some(root_folder_path),
                monitored: params.monitored,
                minimum_availability: params
                    .minimum_availability
                    .map(|availability| availability.as_str().to_string())
                    .or(found.minimum_availability.clone()),
                ..found
            },
            add_options: AddOptions {
                search_for_movie: params.search_on_add,
            },
        };

        let added = self.library.add_movie(&request).await?;
        info!(
            tmdb_id = params.tmdb_id,
            movie_id = added.id,
            title = %added.title,
            defaults = ?defaults_applied,
            "Movie added"
        );

        Ok(AddMovieResult {
            movie: MovieSummary::from(&added),
            defaults_applied,
            search_started: params.search_on_add,
        })
    }

    pub async fn update_movie(
        &self,
        params: UpdateMovieParams,
    ) -> Result<UpdateMovieResult, ToolError> {
        params.validate()?;

        // Read-modify-write on a fresh copy so unrelated fields survive.
        let mut movie = self.library.get_movie(params.movie_id).await?;
        let mut changed = Vec::new();
        if let Some(monitored) = params.monitored {
            movie.monitored = monitored;
            changed.push("monitored".to_string());
        }
        if let Some(profile) = params.quality_profile_id {
            movie.quality_profile_id = Some(profile);
            changed.push("quality_profile_id".to_string());
        }

        let updated = self.library.update_movie(&movie).await?;
        Ok(UpdateMovieResult {
            movie: MovieSummary::from(&updated),
            changed,
        })
    }

    // =========================================================================
    // Library
    // =========================================================================

    pub async fn get_movies(&self, params: GetMoviesParams) -> Result<MovieListResult, ToolError> {
        let movies = self.library.list_movies().await?;
        let movies: Vec<LibraryMovie> = movies
            .iter()
            .filter(|m| params.monitored.is_none_or(|wanted| m.monitored == wanted))
            .filter(|m| params.has_file.is_none_or(|wanted| m.has_file == wanted))
            .filter(|m| {
                params
                    .status
                    .as_deref()
                    .is_none_or(|wanted| m.status.as_deref() == Some(wanted))
            })
            .filter(|m| {
                params
                    .quality_profile_id
                    .is_none_or(|wanted| m.quality_profile_id == Some(wanted))
            })
            .map(LibraryMovie::from)
            .collect();

        Ok(MovieListResult {
            total_count: movies.len(),
            movies,
        })
    }

    pub async fn get_movie_details(
        &self,
        params: MovieDetailsParams,
    ) -> Result<MovieDetailsResult, ToolError> {
        let key = CacheKey::new("movie_details")
            .param("movie_id", params.movie_id)
            .param("include_files", params.include_files)
            .param("include_history", params.include_history);

        self.cache
            .get_or_fetch(key, || async {
                let movie = self.library.get_movie(params.movie_id).await?;
                let mut details = MovieDetails::from(&movie);

                if params.include_files {
                    details.file_details = movie.movie_file.as_ref().map(FileDetails::from);
                }
                if params.include_history {
                    let history = self.library.movie_history(params.movie_id).await?;
                    details.history = Some(
                        history
                            .iter()
                            .take(MAX_HISTORY_EVENTS)
                            .map(HistoryEvent::from)
                            .collect(),
                    );
                }

                Ok::<_, ToolError>(MovieDetailsResult { movie: details })
            })
            .await
    }

    // =========================================================================
    // Releases
    // =========================================================================

    pub async fn search_movie_releases(
        &self,
        params: SearchReleasesParams,
    ) -> Result<ReleasesResult, ToolError> {
        let mut releases = self.library.search_releases(params.movie_id).await?;
        sort_releases(&mut releases, params.sort_by);

        let total_found = releases.len();
        let releases: Vec<ReleaseSummary> = releases
            .iter()
            .take(MAX_RELEASES)
            .map(ReleaseSummary::from)
            .collect();

        Ok(ReleasesResult {
            movie_id: params.movie_id,
            total_found,
            releases_count: releases.len(),
            releases,
        })
    }

    pub async fn download_release(
        &self,
        params: DownloadReleaseParams,
    ) -> Result<DownloadResult, ToolError> {
        params.validate()?;

        let request = GrabRequest {
            guid: params.release_guid.clone(),
            movie_id: params.movie_id,
        };
        let release = self.library.grab_release(&request).await?;
        info!(movie_id = params.movie_id, guid = %params.release_guid, "Release grabbed");

        Ok(DownloadResult {
            release_guid: params.release_guid,
            movie_id: params.movie_id,
            message: "Release sent to the download client".to_string(),
            release,
        })
    }

    // =========================================================================
    // Queue
    // =========================================================================

    pub async fn get_download_queue(&self, params: QueueParams) -> Result<QueueResult, ToolError> {
        params.validate()?;

        let page = self
            .library
            .queue(&QueueQuery {
                page: params.page,
                page_size: params.page_size,
                sort_key: params.sort.sort_key().to_string(),
            })
            .await?;

        Ok(QueueResult {
            page: page.page,
            page_size: if page.page_size == 0 {
                params.page_size
            } else {
                page.page_size
            },
            total_records: page.total_records,
            queue: page.records.iter().map(QueueEntry::from).collect(),
        })
    }

    pub async fn manage_download_queue(
        &self,
        params: ManageQueueParams,
    ) -> Result<QueueActionResult, ToolError> {
        let (removed_from_client, blocklisted) = match params.action {
            QueueAction::Remove => {
                self.library
                    .remove_queue_item(params.queue_id, params.remove_from_client, params.blocklist)
                    .await?;
                (params.remove_from_client, params.blocklist)
            }
            QueueAction::Ignore => {
                self.library
                    .remove_queue_item(params.queue_id, false, params.blocklist)
                    .await?;
                (false, params.blocklist)
            }
            QueueAction::Retry => {
                self.library.retry_queue_item(params.queue_id).await?;
                (false, false)
            }
        };

        let action = match params.action {
            QueueAction::Remove => "remove",
            QueueAction::Retry => "retry",
            QueueAction::Ignore => "ignore",
        };
        info!(queue_id = params.queue_id, action, "Queue item updated");

        Ok(QueueActionResult {
            queue_id: params.queue_id,
            action: action.to_string(),
            removed_from_client,
            blocklisted,
        })
    }

    // =========================================================================
    // Defaults / wanted / calendar / system
    // =========================================================================

    pub async fn get_system_defaults(&self) -> Result<SystemDefaults, ToolError> {
        let (profiles, folders) = self.defaults().await?;
        Ok(SystemDefaults {
            quality_profiles: profiles.iter().map(ProfileSummary::from).collect(),
            root_folders: folders.iter().map(FolderSummary::from).collect(),
        })
    }

    pub async fn get_wanted_movies(&self, params: WantedParams) -> Result<WantedResult, ToolError> {
        params.validate()?;

        let page = self
            .library
            .wanted_missing(params.page, params.page_size)
            .await?;

        Ok(WantedResult {
            page: page.page,
            page_size: params.page_size,
            total_records: page.total_records,
            wanted_movies: page.records.iter().map(LibraryMovie::from).collect(),
        })
    }

    pub async fn get_calendar(&self, params: CalendarParams) -> Result<CalendarResult, ToolError> {
        self.calendar_between(params, Utc::now().date_naive()).await
    }

    /// Calendar with an explicit notion of "today" for the default range.
    pub async fn calendar_between(
        &self,
        params: CalendarParams,
        today: NaiveDate,
    ) -> Result<CalendarResult, ToolError> {
        let (start, end) = params.range(today)?;
        let movies = self.library.calendar(start, end).await?;
        let movies: Vec<CalendarEntry> = movies.iter().map(CalendarEntry::from).collect();

        Ok(CalendarResult {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            movies_count: movies.len(),
            movies,
        })
    }

    pub async fn get_system_status(&self) -> Result<SystemStatusResult, ToolError> {
        let (system, health_checks, disk_space) = tokio::try_join!(
            self.library.system_status(),
            self.library.health(),
            self.library.disk_space(),
        )?;

        Ok(SystemStatusResult {
            system,
            health_checks,
            disk_space,
        })
    }

    pub async fn manage_indexers(&self, params: IndexerParams) -> Result<IndexerResult, ToolError> {
        match params.action {
            IndexerAction::List => {
                let indexers = self.library.indexers().await?;
                Ok(IndexerResult::List {
                    indexers: indexers.iter().map(IndexerSummary::from).collect(),
                })
            }
            IndexerAction::Test => {
                let indexer_id = params.test_target()?;
                let result = self.library.test_indexer(indexer_id).await?;
                info!(indexer_id, "Indexer test passed");
                Ok(IndexerResult::Test {
                    indexer_id,
                    passed: true,
                    result,
                })
            }
        }
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Read `radarr://movies/{filter}` or `radarr://movie/{id}`.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContents, ToolError> {
        let value = if let Some(filter) = uri.strip_prefix(MOVIES_URI_PREFIX) {
            self.movie_collection(filter).await?
        } else if let Some(id) = uri.strip_prefix(MOVIE_URI_PREFIX) {
            let movie_id = id.parse::<u32>().map_err(|_| {
                ToolError::Validation(format!("Invalid movie id '{}' in {}", id, uri))
            })?;
            to_json(
                self.get_movie_details(MovieDetailsParams {
                    movie_id,
                    include_files: true,
                    include_history: true,
                })
                .await?,
            )?
        } else {
            return Err(ToolError::UnknownResource(uri.to_string()));
        };

        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| ToolError::Internal(e.to_string()))?;
        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: JSON_MIME,
            text,
        })
    }

    async fn movie_collection(&self, filter: &str) -> Result<Value, ToolError> {
        let library = |monitored: Option<bool>, has_file: Option<bool>| GetMoviesParams {
            monitored,
            has_file,
            ..Default::default()
        };

        match filter {
            "all" | "" => to_json(self.get_movies(library(None, None)).await?),
            "monitored" => to_json(self.get_movies(library(Some(true), None)).await?),
            "unmonitored" => to_json(self.get_movies(library(Some(false), None)).await?),
            "missing" => to_json(self.get_movies(library(None, Some(false))).await?),
            "downloaded" => to_json(self.get_movies(library(None, Some(true))).await?),
            "wanted" => to_json(self.get_wanted_movies(WantedParams::default()).await?),
            other => Err(ToolError::Validation(format!(
                "Unknown movie filter '{}', expected one of: {}",
                other,
                schema::MOVIE_FILTERS.join(", ")
            ))),
        }
    }

    // =========================================================================
    // Cached upstream reads
    // =========================================================================

    async fn lookup_term(&self, term: &str) -> Result<Vec<Movie>, ToolError> {
        let key = CacheKey::new("movie_lookup").param("term", term.to_lowercase());
        self.cache
            .get_or_fetch(key, || async {
                Ok::<_, ToolError>(self.library.lookup_movies(term).await?)
            })
            .await
    }

    async fn lookup_tmdb(&self, tmdb_id: u32) -> Result<Movie, ToolError> {
        let key = CacheKey::new("movie_lookup").param("tmdb_id", tmdb_id);
        self.cache
            .get_or_fetch(key, || async {
                Ok::<_, ToolError>(self.library.lookup_movie_by_tmdb(tmdb_id).await?)
            })
            .await
    }

    async fn lookup_imdb(&self, imdb_id: &str) -> Result<Movie, ToolError> {
        let key = CacheKey::new("movie_lookup").param("imdb_id", imdb_id);
        self.cache
            .get_or_fetch(key, || async {
                Ok::<_, ToolError>(self.library.lookup_movie_by_imdb(imdb_id).await?)
            })
            .await
    }

    /// Quality profiles and root folders, shared by `get_system_defaults`
    /// and the add-movie fallback.
    async fn defaults(&self) -> Result<(Vec<QualityProfile>, Vec<RootFolder>), ToolError> {
        let profiles = self
            .cache
            .get_or_fetch(CacheKey::new("quality_profiles"), || async {
                Ok::<_, ToolError>(self.library.quality_profiles().await?)
            })
            .await?;
        let folders = self
            .cache
            .get_or_fetch(CacheKey::new("root_folders"), || async {
                Ok::<_, ToolError>(self.library.root_folders().await?)
            })
            .await?;
        Ok((profiles, folders))
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Internal(e.to_string()))
}

fn sort_releases(releases: &mut [Release], sort_by: ReleaseSort) {
    match sort_by {
        ReleaseSort::Seeders => {
            releases.sort_by(|a, b| b.seeders.unwrap_or(0).cmp(&a.seeders.unwrap_or(0)))
        }
        ReleaseSort::Size => releases.sort_by(|a, b| b.size.cmp(&a.size)),
        ReleaseSort::Quality => {
            releases.sort_by(|a, b| b.quality.quality.id.cmp(&a.quality.quality.id))
        }
        ReleaseSort::Age => releases.sort_by(|a, b| a.age.cmp(&b.age)),
    }
}
