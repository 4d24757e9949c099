//! Records exchanged with the Radarr v3 API.
//!
//! Fields the gateway never inspects are kept in `extra` on the records that
//! are sent back upstream (movies, indexers), so a read-modify-write cycle
//! does not drop data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A movie, either in the library (`id` set) or from a lookup (`id` absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Movie {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub title: String,
    pub year: Option<u32>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub tmdb_id: Option<u32>,
    pub imdb_id: Option<String>,
    pub title_slug: Option<String>,
    pub monitored: bool,
    pub has_file: bool,
    pub quality_profile_id: Option<u32>,
    pub root_folder_path: Option<String>,
    pub path: Option<String>,
    pub size_on_disk: Option<u64>,
    pub runtime: Option<u32>,
    pub minimum_availability: Option<String>,
    pub in_cinemas: Option<String>,
    pub physical_release: Option<String>,
    pub digital_release: Option<String>,
    pub genres: Vec<String>,
    pub images: Vec<MediaCover>,
    pub ratings: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_file: Option<MovieFile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Movie {
    /// True when the movie already exists in the library.
    pub fn is_in_library(&self) -> bool {
        self.id.is_some_and(|id| id > 0)
    }

    /// Release dates the calendar is keyed on, in upstream order.
    pub fn release_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        [&self.in_cinemas, &self.digital_release, &self.physical_release]
            .into_iter()
            .flatten()
            .filter_map(|date| parse_upstream_date(date))
    }

    /// URL of the poster image, if any.
    pub fn poster_url(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|image| image.cover_type == "poster")
            .or_else(|| self.images.first())
            .and_then(|image| image.remote_url.as_deref().or(image.url.as_deref()))
    }
}

/// Upstream timestamps are RFC 3339; only the date part matters here.
fn parse_upstream_date(value: &str) -> Option<NaiveDate> {
    value
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaCover {
    pub cover_type: String,
    pub url: Option<String>,
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieFile {
    pub id: u32,
    pub relative_path: Option<String>,
    pub size: u64,
    pub date_added: Option<String>,
    pub quality: QualityModel,
    pub media_info: Value,
}

/// Quality wrapper as Radarr nests it: `{ "quality": { "id", "name" }, "revision": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityModel {
    pub quality: Quality,
}

impl QualityModel {
    pub fn name(&self) -> Option<&str> {
        if self.quality.name.is_empty() {
            None
        } else {
            Some(&self.quality.name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quality {
    pub id: u32,
    pub name: String,
}

/// Options sent along with a new movie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOptions {
    pub search_for_movie: bool,
}

/// Body of `POST /movie`: the lookup record plus placement choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMovieRequest {
    #[serde(flatten)]
    pub movie: Movie,
    pub add_options: AddOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryRecord {
    pub id: u32,
    pub movie_id: Option<u32>,
    pub event_type: String,
    pub date: Option<String>,
    pub source_title: Option<String>,
    pub quality: QualityModel,
    pub data: Value,
}

/// A candidate download for one movie. Only valid for the movie it was searched for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Release {
    pub guid: String,
    pub title: String,
    pub size: u64,
    pub age: u32,
    pub seeders: Option<u32>,
    pub leechers: Option<u32>,
    pub quality: QualityModel,
    pub indexer: Option<String>,
    pub indexer_id: Option<u32>,
    pub download_url: Option<String>,
    pub protocol: Option<String>,
    pub approved: bool,
    pub rejections: Vec<String>,
}

/// Body of `POST /release`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrabRequest {
    pub guid: String,
    pub movie_id: u32,
}

/// Paged envelope used by queue, wanted and history endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_records: u32,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            total_records: 0,
            records: Vec::new(),
        }
    }
}

/// Query for `GET /queue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueItem {
    pub id: u32,
    pub movie_id: Option<u32>,
    pub movie: Option<Movie>,
    pub title: Option<String>,
    pub size: f64,
    pub sizeleft: f64,
    pub status: Option<String>,
    pub tracked_download_status: Option<String>,
    pub tracked_download_state: Option<String>,
    pub estimated_completion_time: Option<String>,
    pub timeleft: Option<String>,
    pub quality: QualityModel,
    pub protocol: Option<String>,
    pub download_client: Option<String>,
    pub output_path: Option<String>,
    pub status_messages: Vec<StatusMessage>,
    pub error_message: Option<String>,
}

impl QueueItem {
    /// Completed fraction in `0.0..=1.0`, derived from size and bytes left.
    pub fn progress(&self) -> f64 {
        if self.size <= 0.0 {
            return 0.0;
        }
        ((self.size - self.sizeleft) / self.size).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusMessage {
    pub title: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityProfile {
    pub id: u32,
    pub name: String,
    pub cutoff: Option<u32>,
    pub upgrade_allowed: bool,
    pub items: Vec<QualityProfileItem>,
}

impl QualityProfile {
    /// Names of the allowed qualities, flattening quality groups.
    pub fn allowed_qualities(&self) -> Vec<String> {
        fn collect(items: &[QualityProfileItem], out: &mut Vec<String>) {
            for item in items.iter().filter(|item| item.allowed) {
                match &item.quality {
                    Some(quality) => out.push(quality.name.clone()),
                    None => collect(&item.items, out),
                }
            }
        }

        let mut names = Vec::new();
        collect(&self.items, &mut names);
        names
    }

    /// Name of the cutoff quality, when it can be resolved from the items.
    pub fn cutoff_name(&self) -> Option<String> {
        fn find(items: &[QualityProfileItem], id: u32) -> Option<String> {
            items.iter().find_map(|item| match &item.quality {
                Some(quality) if quality.id == id => Some(quality.name.clone()),
                Some(_) => None,
                None if item.id == Some(id) => item.name.clone(),
                None => find(&item.items, id),
            })
        }

        self.cutoff.and_then(|id| find(&self.items, id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityProfileItem {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub quality: Option<Quality>,
    pub items: Vec<QualityProfileItem>,
    pub allowed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RootFolder {
    pub id: u32,
    pub path: String,
    pub accessible: bool,
    pub free_space: Option<u64>,
    pub unmapped_folders: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Indexer {
    pub id: u32,
    pub name: String,
    pub implementation: Option<String>,
    pub protocol: Option<String>,
    pub enable_rss: bool,
    pub enable_automatic_search: bool,
    pub enable_interactive_search: bool,
    pub priority: i32,
    pub tags: Vec<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /system/status`. Serialized back out in snake_case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "camelCase"), default)]
pub struct SystemStatus {
    pub app_name: Option<String>,
    pub version: Option<String>,
    pub build_time: Option<String>,
    pub is_debug: Option<bool>,
    pub is_production: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_user_interactive: Option<bool>,
    pub startup_path: Option<String>,
    pub app_data: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub is_linux: Option<bool>,
    pub is_osx: Option<bool>,
    pub is_windows: Option<bool>,
    pub is_docker: Option<bool>,
    pub mode: Option<String>,
    pub branch: Option<String>,
    pub authentication: Option<String>,
    pub database_type: Option<String>,
    pub database_version: Option<String>,
    pub migration_version: Option<u32>,
    pub url_base: Option<String>,
    pub runtime_version: Option<String>,
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "camelCase"), default)]
pub struct HealthCheck {
    pub source: Option<String>,
    #[serde(rename(deserialize = "type"))]
    pub check_type: Option<String>,
    pub message: Option<String>,
    pub wiki_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "camelCase"), default)]
pub struct DiskSpace {
    pub path: Option<String>,
    pub label: Option<String>,
    pub free_space: Option<u64>,
    pub total_space: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_preserves_unknown_fields() {
        let raw = json!({
            "id": 7,
            "title": "Alien",
            "year": 1979,
            "tmdbId": 348,
            "monitored": true,
            "qualityProfileId": 4,
            "tags": [1, 2],
            "collection": { "name": "Alien Collection" }
        });

        let movie: Movie = serde_json::from_value(raw).unwrap();
        assert_eq!(movie.id, Some(7));
        assert_eq!(movie.tmdb_id, Some(348));
        assert!(movie.is_in_library());
        assert_eq!(movie.extra["tags"], json!([1, 2]));

        let back = serde_json::to_value(&movie).unwrap();
        assert_eq!(back["collection"]["name"], "Alien Collection");
        assert_eq!(back["qualityProfileId"], 4);
    }

    #[test]
    fn test_lookup_movie_is_not_in_library() {
        let movie: Movie = serde_json::from_value(json!({ "title": "Alien", "id": 0 })).unwrap();
        assert!(!movie.is_in_library());

        let movie: Movie = serde_json::from_value(json!({ "title": "Alien" })).unwrap();
        assert!(!movie.is_in_library());
    }

    #[test]
    fn test_add_movie_request_flattens_movie() {
        let request = AddMovieRequest {
            movie: Movie {
                title: "Alien".to_string(),
                tmdb_id: Some(348),
                quality_profile_id: Some(1),
                root_folder_path: Some("/movies".to_string()),
                monitored: true,
                ..Default::default()
            },
            add_options: AddOptions {
                search_for_movie: true,
            },
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["title"], "Alien");
        assert_eq!(body["qualityProfileId"], 1);
        assert_eq!(body["rootFolderPath"], "/movies");
        assert_eq!(body["addOptions"]["searchForMovie"], true);
        assert!(body.get("id").is_none());
    }

    #[test]
    fn test_release_dates_parse_timestamps() {
        let movie = Movie {
            in_cinemas: Some("2024-03-01T00:00:00Z".to_string()),
            digital_release: Some("garbage".to_string()),
            physical_release: Some("2024-06-15T00:00:00Z".to_string()),
            ..Default::default()
        };

        let dates: Vec<_> = movie.release_dates().collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            ]
        );
    }

    #[test]
    fn test_queue_progress() {
        let item = QueueItem {
            size: 1000.0,
            sizeleft: 250.0,
            ..Default::default()
        };
        assert!((item.progress() - 0.75).abs() < f64::EPSILON);

        let empty = QueueItem::default();
        assert_eq!(empty.progress(), 0.0);
    }

    #[test]
    fn test_quality_profile_flattens_groups() {
        let profile: QualityProfile = serde_json::from_value(json!({
            "id": 1,
            "name": "HD",
            "cutoff": 1001,
            "items": [
                { "quality": { "id": 1, "name": "SDTV" }, "allowed": false, "items": [] },
                {
                    "id": 1001,
                    "name": "WEB 1080p",
                    "allowed": true,
                    "items": [
                        { "quality": { "id": 3, "name": "WEBDL-1080p" }, "allowed": true, "items": [] },
                        { "quality": { "id": 15, "name": "WEBRip-1080p" }, "allowed": true, "items": [] }
                    ]
                },
                { "quality": { "id": 7, "name": "Bluray-1080p" }, "allowed": true, "items": [] }
            ]
        }))
        .unwrap();

        assert_eq!(
            profile.allowed_qualities(),
            vec!["WEBDL-1080p", "WEBRip-1080p", "Bluray-1080p"]
        );
        assert_eq!(profile.cutoff_name().as_deref(), Some("WEB 1080p"));
    }

    #[test]
    fn test_system_status_serializes_snake_case() {
        let status: SystemStatus = serde_json::from_value(json!({
            "version": "5.2.6.8376",
            "isDocker": true,
            "urlBase": ""
        }))
        .unwrap();

        let out = serde_json::to_value(&status).unwrap();
        assert_eq!(out["version"], "5.2.6.8376");
        assert_eq!(out["is_docker"], true);
        assert_eq!(out["url_base"], "");
    }

    #[test]
    fn test_health_check_type_field() {
        let check: HealthCheck = serde_json::from_value(json!({
            "source": "IndexerStatusCheck",
            "type": "warning",
            "message": "Indexers unavailable",
            "wikiUrl": "https://wiki.servarr.com/radarr/system"
        }))
        .unwrap();

        assert_eq!(check.check_type.as_deref(), Some("warning"));
        let out = serde_json::to_value(&check).unwrap();
        assert_eq!(out["check_type"], "warning");
        assert_eq!(out["wiki_url"], "https://wiki.servarr.com/radarr/system");
    }
}
