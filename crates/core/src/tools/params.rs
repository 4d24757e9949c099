//! Typed parameter records for every tool.
//!
//! Arguments arrive as a JSON object and are decoded with serde before any
//! upstream call is made. Unknown fields and out-of-range enum values are
//! rejected as validation errors.

use chrono::{Days, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ToolError;

/// Maximum page size accepted by paged tools.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Days covered by the calendar when no end date is given.
pub const CALENDAR_WINDOW_DAYS: u64 = 30;

/// Decode tool arguments. `null` is treated as an empty object.
pub fn parse<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::Validation(format!("Invalid arguments: {}", e)))
}

fn yes() -> bool {
    true
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

fn check_paging(page: u32, page_size: u32) -> Result<(), ToolError> {
    if page == 0 {
        return Err(ToolError::Validation("page must be at least 1".to_string()));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ToolError::Validation(format!(
            "page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// Tools without parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

// =============================================================================
// Search / add
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchMoviesParams {
    pub query: Option<String>,
    pub tmdb_id: Option<u32>,
    pub imdb_id: Option<String>,
    pub year: Option<u32>,
}

/// What a movie search resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieLookup {
    Term(String),
    Tmdb(u32),
    Imdb(String),
}

impl SearchMoviesParams {
    /// Exactly one of a free-text query or an external id must be given.
    /// `year` only narrows a query.
    pub fn lookup(&self) -> Result<MovieLookup, ToolError> {
        let query = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let imdb = self
            .imdb_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        if self.year.is_some() && query.is_none() && (self.tmdb_id.is_some() || imdb.is_some()) {
            return Err(ToolError::Validation(
                "year can only be combined with query".to_string(),
            ));
        }

        match (query, self.tmdb_id, imdb) {
            (Some(query), None, None) => Ok(MovieLookup::Term(match self.year {
                Some(year) => format!("{} {}", query, year),
                None => query.to_string(),
            })),
            (None, Some(tmdb_id), None) => Ok(MovieLookup::Tmdb(tmdb_id)),
            (None, None, Some(imdb_id)) => {
                if !imdb_id.starts_with("tt") {
                    return Err(ToolError::Validation(format!(
                        "imdb_id must look like 'tt0078748', got '{}'",
                        imdb_id
                    )));
                }
                Ok(MovieLookup::Imdb(imdb_id.to_string()))
            }
            (None, None, None) => Err(ToolError::Validation(
                "Provide either query or one of tmdb_id / imdb_id".to_string(),
            )),
            _ => Err(ToolError::Validation(
                "query, tmdb_id and imdb_id are mutually exclusive".to_string(),
            )),
        }
    }
}

/// Earliest stage at which a movie counts as available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MinimumAvailability {
    Announced,
    InCinemas,
    Released,
}

impl MinimumAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinimumAvailability::Announced => "announced",
            MinimumAvailability::InCinemas => "inCinemas",
            MinimumAvailability::Released => "released",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMovieParams {
    pub tmdb_id: u32,
    pub quality_profile_id: Option<u32>,
    pub root_folder_path: Option<String>,
    #[serde(default = "yes")]
    pub monitored: bool,
    #[serde(default = "yes")]
    pub search_on_add: bool,
    pub minimum_availability: Option<MinimumAvailability>,
}

impl AddMovieParams {
    pub fn new(tmdb_id: u32) -> Self {
        Self {
            tmdb_id,
            quality_profile_id: None,
            root_folder_path: None,
            monitored: true,
            search_on_add: true,
            minimum_availability: None,
        }
    }

    pub fn validate(&self) -> Result<(), ToolError> {
        if self
            .root_folder_path
            .as_deref()
            .is_some_and(|path| path.trim().is_empty())
        {
            return Err(ToolError::Validation(
                "root_folder_path must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Library
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetMoviesParams {
    pub monitored: Option<bool>,
    pub status: Option<String>,
    pub quality_profile_id: Option<u32>,
    pub has_file: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovieDetailsParams {
    pub movie_id: u32,
    #[serde(default = "yes")]
    pub include_files: bool,
    #[serde(default)]
    pub include_history: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovieParams {
    pub movie_id: u32,
    pub monitored: Option<bool>,
    pub quality_profile_id: Option<u32>,
}

impl UpdateMovieParams {
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.monitored.is_none() && self.quality_profile_id.is_none() {
            return Err(ToolError::Validation(
                "Provide at least one of monitored / quality_profile_id".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Releases
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseSort {
    #[default]
    Seeders,
    Size,
    Quality,
    Age,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchReleasesParams {
    pub movie_id: u32,
    #[serde(default)]
    pub sort_by: ReleaseSort,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadReleaseParams {
    pub release_guid: String,
    pub movie_id: u32,
}

impl DownloadReleaseParams {
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.release_guid.trim().is_empty() {
            return Err(ToolError::Validation(
                "release_guid must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Queue
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueSort {
    #[default]
    Progress,
    Eta,
    Quality,
    Title,
    Timeleft,
}

impl QueueSort {
    /// Sort key understood by the upstream queue endpoint.
    pub fn sort_key(&self) -> &'static str {
        match self {
            QueueSort::Progress => "progress",
            QueueSort::Eta => "estimatedCompletionTime",
            QueueSort::Quality => "quality",
            QueueSort::Title => "title",
            QueueSort::Timeleft => "timeleft",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueParams {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub sort: QueueSort,
}

impl Default for QueueParams {
    fn default() -> Self {
        Self {
            page: first_page(),
            page_size: default_page_size(),
            sort: QueueSort::default(),
        }
    }
}

impl QueueParams {
    pub fn validate(&self) -> Result<(), ToolError> {
        check_paging(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueAction {
    Remove,
    Retry,
    /// Drop the item from the queue but leave it in the download client.
    Ignore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManageQueueParams {
    pub queue_id: u32,
    pub action: QueueAction,
    #[serde(default)]
    pub remove_from_client: bool,
    #[serde(default)]
    pub blocklist: bool,
}

// =============================================================================
// Wanted / calendar
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WantedParams {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for WantedParams {
    fn default() -> Self {
        Self {
            page: first_page(),
            page_size: default_page_size(),
        }
    }
}

impl WantedParams {
    pub fn validate(&self) -> Result<(), ToolError> {
        check_paging(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl CalendarParams {
    /// Resolve the inclusive date range. A missing start is `today`; a
    /// missing end is 30 days after the start.
    pub fn range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ToolError> {
        let window = Days::new(CALENDAR_WINDOW_DAYS);
        let start = self.start_date.as_deref().map(parse_date).transpose()?;
        let end = self.end_date.as_deref().map(parse_date).transpose()?;

        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, add_days(start, window)?),
            (None, Some(end)) => (today, end),
            (None, None) => (today, add_days(today, window)?),
        };

        if start > end {
            return Err(ToolError::Validation(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
        Ok((start, end))
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ToolError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

fn add_days(date: NaiveDate, days: Days) -> Result<NaiveDate, ToolError> {
    date.checked_add_days(days)
        .ok_or_else(|| ToolError::Validation(format!("Date {} is out of range", date)))
}

// =============================================================================
// Indexers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexerAction {
    List,
    Test,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerParams {
    pub action: IndexerAction,
    pub indexer_id: Option<u32>,
}

impl IndexerParams {
    /// Id of the indexer to test. Required for `test`.
    pub fn test_target(&self) -> Result<u32, ToolError> {
        self.indexer_id
            .ok_or_else(|| ToolError::Validation("indexer_id is required for action 'test'".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_search_requires_exactly_one_selector() {
        let both: SearchMoviesParams =
            parse(json!({ "query": "Alien", "tmdb_id": 348 })).unwrap();
        assert!(matches!(both.lookup(), Err(ToolError::Validation(_))));

        let ids: SearchMoviesParams =
            parse(json!({ "tmdb_id": 348, "imdb_id": "tt0078748" })).unwrap();
        assert!(matches!(ids.lookup(), Err(ToolError::Validation(_))));

        let neither: SearchMoviesParams = parse(json!({ "year": 1979 })).unwrap();
        assert!(matches!(neither.lookup(), Err(ToolError::Validation(_))));

        let blank: SearchMoviesParams = parse(json!({ "query": "   " })).unwrap();
        assert!(matches!(blank.lookup(), Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_search_lookup_variants() {
        let term: SearchMoviesParams = parse(json!({ "query": "Alien", "year": 1979 })).unwrap();
        assert_eq!(term.lookup().unwrap(), MovieLookup::Term("Alien 1979".into()));

        let tmdb: SearchMoviesParams = parse(json!({ "tmdb_id": 348 })).unwrap();
        assert_eq!(tmdb.lookup().unwrap(), MovieLookup::Tmdb(348));

        let imdb: SearchMoviesParams = parse(json!({ "imdb_id": "tt0078748" })).unwrap();
        assert_eq!(imdb.lookup().unwrap(), MovieLookup::Imdb("tt0078748".into()));

        let bad_imdb: SearchMoviesParams = parse(json!({ "imdb_id": "0078748" })).unwrap();
        assert!(bad_imdb.lookup().is_err());
    }

    #[test]
    fn test_search_year_requires_query() {
        let tmdb: SearchMoviesParams = parse(json!({ "tmdb_id": 348, "year": 1979 })).unwrap();
        assert!(matches!(tmdb.lookup(), Err(ToolError::Validation(_))));

        let imdb: SearchMoviesParams =
            parse(json!({ "imdb_id": "tt0078748", "year": 1979 })).unwrap();
        assert!(matches!(imdb.lookup(), Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_add_movie_defaults() {
        let params: AddMovieParams = parse(json!({ "tmdb_id": 348 })).unwrap();
        assert!(params.monitored);
        assert!(params.search_on_add);
        assert!(params.quality_profile_id.is_none());

        let params: AddMovieParams =
            parse(json!({ "tmdb_id": 348, "minimum_availability": "inCinemas" })).unwrap();
        assert_eq!(params.minimum_availability, Some(MinimumAvailability::InCinemas));

        let missing: Result<AddMovieParams, _> = parse(json!({}));
        assert!(matches!(missing, Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<GetMoviesParams, _> = parse(json!({ "monitored": true, "foo": 1 }));
        assert!(matches!(result, Err(ToolError::Validation(_))));

        let result: Result<NoParams, _> = parse(json!({ "x": 1 }));
        assert!(result.is_err());
        assert!(parse::<NoParams>(Value::Null).is_ok());
    }

    #[test]
    fn test_queue_action_outside_enum_rejected() {
        let result: Result<ManageQueueParams, _> =
            parse(json!({ "queue_id": 1, "action": "pause" }));
        let err = result.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        assert!(err.to_string().contains("pause"));

        let ok: ManageQueueParams = parse(json!({ "queue_id": 1, "action": "ignore" })).unwrap();
        assert_eq!(ok.action, QueueAction::Ignore);
        assert!(!ok.remove_from_client);
        assert!(!ok.blocklist);
    }

    #[test]
    fn test_queue_paging_bounds() {
        let params: QueueParams = parse(json!({})).unwrap();
        assert_eq!((params.page, params.page_size), (1, 20));
        assert_eq!(params.sort, QueueSort::Progress);
        assert!(params.validate().is_ok());

        let zero_page: QueueParams = parse(json!({ "page": 0 })).unwrap();
        assert!(zero_page.validate().is_err());

        let too_big: QueueParams = parse(json!({ "page_size": 501 })).unwrap();
        assert!(too_big.validate().is_err());

        let eta: QueueParams = parse(json!({ "sort": "eta" })).unwrap();
        assert_eq!(eta.sort.sort_key(), "estimatedCompletionTime");
    }

    #[test]
    fn test_update_requires_a_change() {
        let params: UpdateMovieParams = parse(json!({ "movie_id": 1 })).unwrap();
        assert!(params.validate().is_err());

        let params: UpdateMovieParams = parse(json!({ "movie_id": 1, "monitored": false })).unwrap();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_calendar_range_defaults() {
        let today = date(2024, 5, 1);

        let none = CalendarParams::default();
        assert_eq!(none.range(today).unwrap(), (today, date(2024, 5, 31)));

        let start_only = CalendarParams {
            start_date: Some("2024-06-01".into()),
            end_date: None,
        };
        assert_eq!(
            start_only.range(today).unwrap(),
            (date(2024, 6, 1), date(2024, 7, 1))
        );

        let end_only = CalendarParams {
            start_date: None,
            end_date: Some("2024-06-30".into()),
        };
        assert_eq!(end_only.range(today).unwrap(), (today, date(2024, 6, 30)));
    }

    #[test]
    fn test_calendar_end_only_starts_today() {
        let today = date(2024, 2, 20);

        let later = CalendarParams {
            start_date: None,
            end_date: Some("2024-03-01".into()),
        };
        assert_eq!(later.range(today).unwrap(), (today, date(2024, 3, 1)));

        let earlier = CalendarParams {
            start_date: None,
            end_date: Some("2024-02-01".into()),
        };
        assert!(matches!(
            earlier.range(today),
            Err(ToolError::Validation(_))
        ));
    }

    #[test]
    fn test_calendar_range_rejects_inverted_and_malformed() {
        let inverted = CalendarParams {
            start_date: Some("2024-06-02".into()),
            end_date: Some("2024-06-01".into()),
        };
        assert!(matches!(
            inverted.range(date(2024, 1, 1)),
            Err(ToolError::Validation(_))
        ));

        let malformed = CalendarParams {
            start_date: Some("06/01/2024".into()),
            end_date: None,
        };
        assert!(malformed.range(date(2024, 1, 1)).is_err());

        let same_day = CalendarParams {
            start_date: Some("2024-06-01".into()),
            end_date: Some("2024-06-01".into()),
        };
        assert!(same_day.range(date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_indexer_test_requires_id() {
        let params: IndexerParams = parse(json!({ "action": "test" })).unwrap();
        assert!(params.test_target().is_err());

        let params: IndexerParams = parse(json!({ "action": "test", "indexer_id": 4 })).unwrap();
        assert_eq!(params.test_target().unwrap(), 4);

        let bad: Result<IndexerParams, _> = parse(json!({ "action": "delete" }));
        assert!(bad.is_err());
    }
}
