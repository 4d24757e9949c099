//! Testing utilities and a mock movie library.
//!
//! Lets the tool router and the server be exercised without a running
//! upstream instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelgate_core::testing::{fixtures, MockMovieLibrary};
//!
//! let library = MockMovieLibrary::new();
//! library.set_quality_profiles(vec![fixtures::quality_profile(1, "HD-1080p")]).await;
//! library.set_root_folders(vec![fixtures::root_folder(1, "/movies")]).await;
//!
//! // Hand it to a ToolRouter...
//! ```

mod mock_library;

pub use mock_library::{LibraryCall, MockMovieLibrary};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;

    use crate::upstream::{
        HistoryRecord, Indexer, Movie, MovieFile, Quality, QualityModel, QualityProfile,
        QualityProfileItem, QueueItem, Release, RootFolder,
    };

    fn quality(id: u32, name: &str) -> QualityModel {
        QualityModel {
            quality: Quality {
                id,
                name: name.to_string(),
            },
        }
    }

    /// A lookup result that is not in the library yet.
    pub fn lookup_movie(title: &str, year: u32, tmdb_id: u32) -> Movie {
        Movie {
            id: None,
            title: title.to_string(),
            year: Some(year),
            overview: Some(format!("{} is a movie released in {}.", title, year)),
            status: Some("released".to_string()),
            tmdb_id: Some(tmdb_id),
            imdb_id: Some(format!("tt{:07}", tmdb_id)),
            title_slug: Some(format!("{}-{}", title.to_lowercase().replace(' ', "-"), tmdb_id)),
            runtime: Some(117),
            genres: vec!["Science Fiction".to_string()],
            ratings: json!({ "imdb": { "votes": 1000, "value": 8.5 } }),
            in_cinemas: Some(format!("{}-05-25T00:00:00Z", year)),
            ..Default::default()
        }
    }

    /// A library movie with the given id, profile and file presence.
    pub fn library_movie(id: u32, title: &str, monitored: bool, has_file: bool) -> Movie {
        let mut movie = lookup_movie(title, 2000 + id % 25, 1000 + id);
        movie.id = Some(id);
        movie.monitored = monitored;
        movie.has_file = has_file;
        movie.quality_profile_id = Some(1);
        movie.root_folder_path = Some("/movies".to_string());
        movie.path = Some(format!("/movies/{}", title));
        if has_file {
            movie.size_on_disk = Some(4 * 1024 * 1024 * 1024);
            movie.movie_file = Some(MovieFile {
                id: id * 10,
                relative_path: Some(format!("{}.mkv", title)),
                size: 4 * 1024 * 1024 * 1024,
                date_added: Some("2024-01-01T00:00:00Z".to_string()),
                quality: quality(7, "Bluray-1080p"),
                media_info: json!({ "videoCodec": "x264" }),
            });
        }
        movie
    }

    pub fn quality_profile(id: u32, name: &str) -> QualityProfile {
        QualityProfile {
            id,
            name: name.to_string(),
            cutoff: Some(7),
            upgrade_allowed: true,
            items: vec![
                QualityProfileItem {
                    quality: Some(Quality {
                        id: 3,
                        name: "WEBDL-1080p".to_string(),
                    }),
                    allowed: true,
                    ..Default::default()
                },
                QualityProfileItem {
                    quality: Some(Quality {
                        id: 7,
                        name: "Bluray-1080p".to_string(),
                    }),
                    allowed: true,
                    ..Default::default()
                },
            ],
        }
    }

    pub fn root_folder(id: u32, path: &str) -> RootFolder {
        RootFolder {
            id,
            path: path.to_string(),
            accessible: true,
            free_space: Some(500 * 1024 * 1024 * 1024),
            unmapped_folders: Vec::new(),
        }
    }

    pub fn release(guid: &str, seeders: u32, size: u64) -> Release {
        Release {
            guid: guid.to_string(),
            title: format!("Movie.2024.1080p.{}", guid),
            size,
            age: 3,
            seeders: Some(seeders),
            leechers: Some(seeders / 2),
            quality: quality(7, "Bluray-1080p"),
            indexer: Some("mock-indexer".to_string()),
            indexer_id: Some(1),
            protocol: Some("torrent".to_string()),
            approved: true,
            ..Default::default()
        }
    }

    /// Queue item whose completed fraction is `progress`.
    pub fn queue_item(id: u32, movie_id: u32, progress: f64) -> QueueItem {
        let size = 1_000_000_000.0;
        QueueItem {
            id,
            movie_id: Some(movie_id),
            title: Some(format!("Queued.Release.{}", id)),
            size,
            sizeleft: size * (1.0 - progress),
            status: Some("downloading".to_string()),
            tracked_download_status: Some("ok".to_string()),
            quality: quality(7, "Bluray-1080p"),
            protocol: Some("torrent".to_string()),
            download_client: Some("qBittorrent".to_string()),
            ..Default::default()
        }
    }

    pub fn history_record(id: u32, movie_id: u32, event_type: &str) -> HistoryRecord {
        HistoryRecord {
            id,
            movie_id: Some(movie_id),
            event_type: event_type.to_string(),
            date: Some(format!("2024-01-{:02}T12:00:00Z", (id % 28) + 1)),
            source_title: Some(format!("Release.{}", id)),
            quality: quality(7, "Bluray-1080p"),
            data: json!({}),
        }
    }

    pub fn indexer(id: u32, name: &str) -> Indexer {
        Indexer {
            id,
            name: name.to_string(),
            implementation: Some("Torznab".to_string()),
            protocol: Some("torrent".to_string()),
            enable_rss: true,
            enable_automatic_search: true,
            enable_interactive_search: true,
            priority: 25,
            ..Default::default()
        }
    }
}
