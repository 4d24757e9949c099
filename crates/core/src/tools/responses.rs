//! Result shapes returned by tools.
//!
//! Upstream records are reduced to the fields a caller acts on and
//! serialized in snake_case.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::upstream::{
    DiskSpace, HealthCheck, HistoryRecord, Indexer, Movie, MovieFile, QualityProfile, QueueItem,
    Release, RootFolder, SystemStatus,
};

/// Overview length in search results.
pub const SEARCH_OVERVIEW_CHARS: usize = 200;
/// Overview length in library listings.
pub const LIST_OVERVIEW_CHARS: usize = 100;
/// Overview length in calendar entries.
pub const CALENDAR_OVERVIEW_CHARS: usize = 150;

pub const MAX_SEARCH_RESULTS: usize = 10;
pub const MAX_RELEASES: usize = 20;
pub const MAX_HISTORY_EVENTS: usize = 10;

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

fn overview(movie: &Movie, max: usize) -> String {
    truncate(movie.overview.as_deref().unwrap_or_default(), max)
}

// =============================================================================
// search_movies
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub year: Option<u32>,
    pub overview: String,
    pub tmdb_id: Option<u32>,
    pub imdb_id: Option<String>,
    pub runtime: Option<u32>,
    pub status: Option<String>,
    pub poster: Option<String>,
    pub genres: Vec<String>,
    pub ratings: Value,
    /// Library id when the movie has already been added.
    pub library_id: Option<u32>,
}

impl From<&Movie> for SearchResult {
    fn from(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            year: movie.year,
            overview: overview(movie, SEARCH_OVERVIEW_CHARS),
            tmdb_id: movie.tmdb_id,
            imdb_id: movie.imdb_id.clone(),
            runtime: movie.runtime,
            status: movie.status.clone(),
            poster: movie.poster_url().map(str::to_string),
            genres: movie.genres.clone(),
            ratings: movie.ratings.clone(),
            library_id: movie.id.filter(|_| movie.is_in_library()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMoviesResult {
    pub results_count: usize,
    pub movies: Vec<SearchResult>,
}

// =============================================================================
// add_movie / update_movie
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: Option<u32>,
    pub title: String,
    pub year: Option<u32>,
    pub status: Option<String>,
    pub monitored: bool,
    pub quality_profile_id: Option<u32>,
    pub root_folder_path: Option<String>,
    pub path: Option<String>,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            status: movie.status.clone(),
            monitored: movie.monitored,
            quality_profile_id: movie.quality_profile_id,
            root_folder_path: movie.root_folder_path.clone(),
            path: movie.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMovieResult {
    pub movie: MovieSummary,
    /// Fields filled from the system defaults, e.g. `["quality_profile_id"]`.
    pub defaults_applied: Vec<String>,
    pub search_started: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMovieResult {
    pub movie: MovieSummary,
    pub changed: Vec<String>,
}

// =============================================================================
// get_movies / get_wanted_movies
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub relative_path: Option<String>,
    pub size: u64,
    pub quality: Option<String>,
}

impl From<&MovieFile> for FileInfo {
    fn from(file: &MovieFile) -> Self {
        Self {
            relative_path: file.relative_path.clone(),
            size: file.size,
            quality: file.quality.name().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryMovie {
    pub id: Option<u32>,
    pub title: String,
    pub year: Option<u32>,
    pub status: Option<String>,
    pub monitored: bool,
    pub has_file: bool,
    pub quality_profile_id: Option<u32>,
    pub size_on_disk: u64,
    pub tmdb_id: Option<u32>,
    pub imdb_id: Option<String>,
    pub overview: String,
    pub file_info: Option<FileInfo>,
}

impl From<&Movie> for LibraryMovie {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            status: movie.status.clone(),
            monitored: movie.monitored,
            has_file: movie.has_file,
            quality_profile_id: movie.quality_profile_id,
            size_on_disk: movie.size_on_disk.unwrap_or(0),
            tmdb_id: movie.tmdb_id,
            imdb_id: movie.imdb_id.clone(),
            overview: overview(movie, LIST_OVERVIEW_CHARS),
            file_info: movie.movie_file.as_ref().map(FileInfo::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieListResult {
    pub total_count: usize,
    pub movies: Vec<LibraryMovie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WantedResult {
    pub page: u32,
    pub page_size: u32,
    pub total_records: u32,
    pub wanted_movies: Vec<LibraryMovie>,
}

// =============================================================================
// get_movie_details
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDetails {
    pub id: u32,
    pub relative_path: Option<String>,
    pub size: u64,
    pub date_added: Option<String>,
    pub quality: Option<String>,
    pub media_info: Value,
}

impl From<&MovieFile> for FileDetails {
    fn from(file: &MovieFile) -> Self {
        Self {
            id: file.id,
            relative_path: file.relative_path.clone(),
            size: file.size,
            date_added: file.date_added.clone(),
            quality: file.quality.name().map(str::to_string),
            media_info: file.media_info.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub event_type: String,
    pub date: Option<String>,
    pub quality: Option<String>,
    pub source_title: Option<String>,
    pub data: Value,
}

impl From<&HistoryRecord> for HistoryEvent {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            event_type: record.event_type.clone(),
            date: record.date.clone(),
            quality: record.quality.name().map(str::to_string),
            source_title: record.source_title.clone(),
            data: record.data.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: Option<u32>,
    pub title: String,
    pub year: Option<u32>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub monitored: bool,
    pub has_file: bool,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub ratings: Value,
    pub quality_profile_id: Option<u32>,
    pub minimum_availability: Option<String>,
    pub root_folder_path: Option<String>,
    pub path: Option<String>,
    pub size_on_disk: u64,
    pub tmdb_id: Option<u32>,
    pub imdb_id: Option<String>,
    pub in_cinemas: Option<String>,
    pub digital_release: Option<String>,
    pub physical_release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_details: Option<FileDetails>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub history: Option<Vec<HistoryEvent>>,
}

impl From<&Movie> for MovieDetails {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            overview: movie.overview.clone(),
            status: movie.status.clone(),
            monitored: movie.monitored,
            has_file: movie.has_file,
            runtime: movie.runtime,
            genres: movie.genres.clone(),
            ratings: movie.ratings.clone(),
            quality_profile_id: movie.quality_profile_id,
            minimum_availability: movie.minimum_availability.clone(),
            root_folder_path: movie.root_folder_path.clone(),
            path: movie.path.clone(),
            size_on_disk: movie.size_on_disk.unwrap_or(0),
            tmdb_id: movie.tmdb_id,
            imdb_id: movie.imdb_id.clone(),
            in_cinemas: movie.in_cinemas.clone(),
            digital_release: movie.digital_release.clone(),
            physical_release: movie.physical_release.clone(),
            file_details: None,
            history: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetailsResult {
    pub movie: MovieDetails,
}

// =============================================================================
// Releases
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSummary {
    pub guid: String,
    pub title: String,
    pub size: u64,
    pub age: u32,
    pub seeders: Option<u32>,
    pub leechers: Option<u32>,
    pub quality: Option<String>,
    pub indexer: Option<String>,
    pub protocol: Option<String>,
    pub approved: bool,
    pub rejections: Vec<String>,
}

impl From<&Release> for ReleaseSummary {
    fn from(release: &Release) -> Self {
        Self {
            guid: release.guid.clone(),
            title: release.title.clone(),
            size: release.size,
            age: release.age,
            seeders: release.seeders,
            leechers: release.leechers,
            quality: release.quality.name().map(str::to_string),
            indexer: release.indexer.clone(),
            protocol: release.protocol.clone(),
            approved: release.approved,
            rejections: release.rejections.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasesResult {
    pub movie_id: u32,
    pub total_found: usize,
    pub releases_count: usize,
    pub releases: Vec<ReleaseSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    pub release_guid: String,
    pub movie_id: u32,
    pub message: String,
    pub release: Value,
}

// =============================================================================
// Queue
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: u32,
    pub movie_id: Option<u32>,
    pub movie_title: Option<String>,
    pub title: Option<String>,
    pub size: f64,
    pub sizeleft: f64,
    /// Completed fraction in `0.0..=1.0`.
    pub progress: f64,
    pub status: Option<String>,
    pub tracked_download_status: Option<String>,
    pub eta: Option<String>,
    pub timeleft: Option<String>,
    pub quality: Option<String>,
    pub protocol: Option<String>,
    pub download_client: Option<String>,
    pub output_path: Option<String>,
    pub status_messages: Vec<String>,
    pub error_message: Option<String>,
}

impl From<&QueueItem> for QueueEntry {
    fn from(item: &QueueItem) -> Self {
        let status_messages = item
            .status_messages
            .iter()
            .flat_map(|message| {
                std::iter::once(message.title.clone())
                    .filter(|title| !title.is_empty())
                    .chain(message.messages.iter().cloned())
            })
            .collect();

        Self {
            id: item.id,
            movie_id: item.movie_id,
            movie_title: item.movie.as_ref().map(|movie| movie.title.clone()),
            title: item.title.clone(),
            size: item.size,
            sizeleft: item.sizeleft,
            progress: item.progress(),
            status: item.status.clone(),
            tracked_download_status: item.tracked_download_status.clone(),
            eta: item.estimated_completion_time.clone(),
            timeleft: item.timeleft.clone(),
            quality: item.quality.name().map(str::to_string),
            protocol: item.protocol.clone(),
            download_client: item.download_client.clone(),
            output_path: item.output_path.clone(),
            status_messages,
            error_message: item.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResult {
    pub page: u32,
    pub page_size: u32,
    pub total_records: u32,
    pub queue: Vec<QueueEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueActionResult {
    pub queue_id: u32,
    pub action: String,
    pub removed_from_client: bool,
    pub blocklisted: bool,
}

// =============================================================================
// Defaults
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: u32,
    pub name: String,
    pub cutoff: Option<String>,
    pub upgrade_allowed: bool,
    pub allowed_qualities: Vec<String>,
}

impl From<&QualityProfile> for ProfileSummary {
    fn from(profile: &QualityProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            cutoff: profile.cutoff_name(),
            upgrade_allowed: profile.upgrade_allowed,
            allowed_qualities: profile.allowed_qualities(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSummary {
    pub id: u32,
    pub path: String,
    pub accessible: bool,
    pub free_space: Option<u64>,
    pub unmapped_folders: usize,
}

impl From<&RootFolder> for FolderSummary {
    fn from(folder: &RootFolder) -> Self {
        Self {
            id: folder.id,
            path: folder.path.clone(),
            accessible: folder.accessible,
            free_space: folder.free_space,
            unmapped_folders: folder.unmapped_folders.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDefaults {
    pub quality_profiles: Vec<ProfileSummary>,
    pub root_folders: Vec<FolderSummary>,
}

// =============================================================================
// Calendar / system / indexers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: Option<u32>,
    pub title: String,
    pub year: Option<u32>,
    pub status: Option<String>,
    pub monitored: bool,
    pub has_file: bool,
    pub in_cinemas: Option<String>,
    pub digital_release: Option<String>,
    pub physical_release: Option<String>,
    pub overview: String,
}

impl From<&Movie> for CalendarEntry {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            status: movie.status.clone(),
            monitored: movie.monitored,
            has_file: movie.has_file,
            in_cinemas: movie.in_cinemas.clone(),
            digital_release: movie.digital_release.clone(),
            physical_release: movie.physical_release.clone(),
            overview: overview(movie, CALENDAR_OVERVIEW_CHARS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarResult {
    pub start_date: String,
    pub end_date: String,
    pub movies_count: usize,
    pub movies: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatusResult {
    pub system: SystemStatus,
    pub health_checks: Vec<HealthCheck>,
    pub disk_space: Vec<DiskSpace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerSummary {
    pub id: u32,
    pub name: String,
    pub implementation: Option<String>,
    pub protocol: Option<String>,
    pub enable_rss: bool,
    pub enable_automatic_search: bool,
    pub enable_interactive_search: bool,
    pub priority: i32,
    pub tags: Vec<u32>,
}

impl From<&Indexer> for IndexerSummary {
    fn from(indexer: &Indexer) -> Self {
        Self {
            id: indexer.id,
            name: indexer.name.clone(),
            implementation: indexer.implementation.clone(),
            protocol: indexer.protocol.clone(),
            enable_rss: indexer.enable_rss,
            enable_automatic_search: indexer.enable_automatic_search,
            enable_interactive_search: indexer.enable_interactive_search,
            priority: indexer.priority,
            tags: indexer.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum IndexerResult {
    List { indexers: Vec<IndexerSummary> },
    Test { indexer_id: u32, passed: bool, result: Value },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{QualityModel, Quality, StatusMessage};

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn test_search_result_trims_overview() {
        let movie = Movie {
            title: "Alien".into(),
            overview: Some("x".repeat(300)),
            ..Default::default()
        };
        let result = SearchResult::from(&movie);
        assert_eq!(result.overview.chars().count(), SEARCH_OVERVIEW_CHARS + 3);
        assert!(result.library_id.is_none());
    }

    #[test]
    fn test_queue_entry_flattens_messages() {
        let item = QueueItem {
            id: 3,
            size: 100.0,
            sizeleft: 40.0,
            quality: QualityModel {
                quality: Quality { id: 7, name: "Bluray-1080p".into() },
            },
            status_messages: vec![StatusMessage {
                title: "Alien.1979.mkv".into(),
                messages: vec!["No files found are eligible for import".into()],
            }],
            ..Default::default()
        };

        let entry = QueueEntry::from(&item);
        assert!((entry.progress - 0.6).abs() < 1e-9);
        assert_eq!(entry.quality.as_deref(), Some("Bluray-1080p"));
        assert_eq!(
            entry.status_messages,
            vec!["Alien.1979.mkv", "No files found are eligible for import"]
        );
    }

    #[test]
    fn test_details_omit_unrequested_sections() {
        let details = MovieDetails::from(&Movie {
            id: Some(1),
            title: "Alien".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&details).unwrap();
        assert!(json.get("file_details").is_none());
        assert!(json.get("history").is_none());
    }

    #[test]
    fn test_indexer_result_tagged_by_action() {
        let json = serde_json::to_value(IndexerResult::List { indexers: vec![] }).unwrap();
        assert_eq!(json["action"], "list");
        assert!(json["indexers"].as_array().unwrap().is_empty());
    }
}
