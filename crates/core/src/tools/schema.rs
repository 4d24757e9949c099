//! Tool and resource descriptors advertised to callers.

use serde::Serialize;
use serde_json::{json, Value};

/// A named tool with its JSON input schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// A concrete, listable resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: &'static str,
}

/// A parameterized resource address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub uri_template: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

pub const JSON_MIME: &str = "application/json";

pub const MOVIES_URI_PREFIX: &str = "radarr://movies/";
pub const MOVIE_URI_PREFIX: &str = "radarr://movie/";

/// Filter tokens accepted by the movie-collection resource.
pub const MOVIE_FILTERS: [&str; 6] = [
    "all",
    "monitored",
    "unmonitored",
    "wanted",
    "missing",
    "downloaded",
];

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn paging_properties() -> Value {
    json!({
        "page": { "type": "integer", "minimum": 1, "default": 1, "description": "Page number" },
        "page_size": {
            "type": "integer",
            "minimum": 1,
            "maximum": super::params::MAX_PAGE_SIZE,
            "default": 20,
            "description": "Items per page"
        }
    })
}

/// Every tool the router serves, in a stable order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let mut queue_properties = paging_properties();
    queue_properties["sort"] = json!({
        "type": "string",
        "enum": ["progress", "eta", "quality", "title", "timeleft"],
        "default": "progress",
        "description": "Sort order for queue items"
    });

    vec![
        ToolDefinition {
            name: "search_movies",
            description: "Search for movies by title, or look one up by TMDB or IMDB id. \
                          Provide either query or exactly one external id.",
            input_schema: object(
                json!({
                    "query": { "type": "string", "description": "Movie title to search for" },
                    "tmdb_id": { "type": "integer", "minimum": 1, "description": "TMDB id" },
                    "imdb_id": { "type": "string", "pattern": "^tt\\d+$", "description": "IMDB id, e.g. tt0078748" },
                    "year": { "type": "integer", "description": "Release year to narrow a query search; not allowed with tmdb_id or imdb_id" }
                }),
                &[],
            ),
        },
        ToolDefinition {
            name: "add_movie",
            description: "Add a movie to the library by TMDB id. Missing quality profile or \
                          root folder fall back to the first configured one.",
            input_schema: object(
                json!({
                    "tmdb_id": { "type": "integer", "minimum": 1, "description": "TMDB id of the movie" },
                    "quality_profile_id": { "type": "integer", "description": "Quality profile to use" },
                    "root_folder_path": { "type": "string", "description": "Root folder for storage" },
                    "monitored": { "type": "boolean", "default": true },
                    "search_on_add": { "type": "boolean", "default": true, "description": "Search for releases right after adding" },
                    "minimum_availability": { "type": "string", "enum": ["announced", "inCinemas", "released"] }
                }),
                &["tmdb_id"],
            ),
        },
        ToolDefinition {
            name: "get_movies",
            description: "List movies in the library with optional filters.",
            input_schema: object(
                json!({
                    "monitored": { "type": "boolean" },
                    "status": { "type": "string", "description": "announced, inCinemas, released, ..." },
                    "quality_profile_id": { "type": "integer" },
                    "has_file": { "type": "boolean" }
                }),
                &[],
            ),
        },
        ToolDefinition {
            name: "get_movie_details",
            description: "Get one library movie with file details and optionally its last 10 history events.",
            input_schema: object(
                json!({
                    "movie_id": { "type": "integer", "description": "Library movie id" },
                    "include_files": { "type": "boolean", "default": true },
                    "include_history": { "type": "boolean", "default": false }
                }),
                &["movie_id"],
            ),
        },
        ToolDefinition {
            name: "update_movie",
            description: "Change monitoring or quality profile of a library movie.",
            input_schema: object(
                json!({
                    "movie_id": { "type": "integer" },
                    "monitored": { "type": "boolean" },
                    "quality_profile_id": { "type": "integer" }
                }),
                &["movie_id"],
            ),
        },
        ToolDefinition {
            name: "search_movie_releases",
            description: "Search indexers for releases of a library movie (top 20).",
            input_schema: object(
                json!({
                    "movie_id": { "type": "integer" },
                    "sort_by": {
                        "type": "string",
                        "enum": ["seeders", "size", "quality", "age"],
                        "default": "seeders"
                    }
                }),
                &["movie_id"],
            ),
        },
        ToolDefinition {
            name: "download_release",
            description: "Send a release found by search_movie_releases to the download client.",
            input_schema: object(
                json!({
                    "release_guid": { "type": "string" },
                    "movie_id": { "type": "integer", "description": "Movie the release was searched for" }
                }),
                &["release_guid", "movie_id"],
            ),
        },
        ToolDefinition {
            name: "get_download_queue",
            description: "Show the download queue with progress and status messages.",
            input_schema: object(queue_properties, &[]),
        },
        ToolDefinition {
            name: "manage_download_queue",
            description: "Remove, retry or ignore a queue item.",
            input_schema: object(
                json!({
                    "queue_id": { "type": "integer" },
                    "action": { "type": "string", "enum": ["remove", "retry", "ignore"] },
                    "remove_from_client": { "type": "boolean", "default": false },
                    "blocklist": { "type": "boolean", "default": false }
                }),
                &["queue_id", "action"],
            ),
        },
        ToolDefinition {
            name: "get_system_defaults",
            description: "List quality profiles and root folders available for new movies.",
            input_schema: object(json!({}), &[]),
        },
        ToolDefinition {
            name: "get_wanted_movies",
            description: "List monitored movies that have not been downloaded yet.",
            input_schema: object(paging_properties(), &[]),
        },
        ToolDefinition {
            name: "get_calendar",
            description: "Movies releasing within a date range (defaults to the next 30 days).",
            input_schema: object(
                json!({
                    "start_date": { "type": "string", "format": "date", "description": "YYYY-MM-DD, defaults to today" },
                    "end_date": { "type": "string", "format": "date", "description": "YYYY-MM-DD, defaults to start + 30 days" }
                }),
                &[],
            ),
        },
        ToolDefinition {
            name: "get_system_status",
            description: "Upstream version, health checks and disk space.",
            input_schema: object(json!({}), &[]),
        },
        ToolDefinition {
            name: "manage_indexers",
            description: "List indexers or test one indexer's connection.",
            input_schema: object(
                json!({
                    "action": { "type": "string", "enum": ["list", "test"] },
                    "indexer_id": { "type": "integer", "description": "Required for test" }
                }),
                &["action"],
            ),
        },
    ]
}

/// Concrete resources, one per movie-collection filter.
pub fn resource_definitions() -> Vec<ResourceDefinition> {
    MOVIE_FILTERS
        .iter()
        .map(|filter| ResourceDefinition {
            uri: format!("{}{}", MOVIES_URI_PREFIX, filter),
            name: format!("movies-{}", filter),
            description: format!("Movie collection ({})", filter),
            mime_type: JSON_MIME,
        })
        .collect()
}

pub fn resource_templates() -> Vec<ResourceTemplate> {
    vec![
        ResourceTemplate {
            uri_template: "radarr://movies/{filter}",
            name: "movie-collection",
            description: "Movie collection filtered by all, monitored, unmonitored, wanted, missing or downloaded",
            mime_type: JSON_MIME,
        },
        ResourceTemplate {
            uri_template: "radarr://movie/{movie_id}",
            name: "movie-details",
            description: "One movie with files and recent history",
            mime_type: JSON_MIME,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_unique() {
        let tools = tool_definitions();
        let names: HashSet<_> = tools.iter().map(|tool| tool.name).collect();
        assert_eq!(names.len(), tools.len());
        assert_eq!(tools.len(), 14);
    }

    #[test]
    fn test_schemas_are_closed_objects() {
        for tool in tool_definitions() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert_eq!(tool.input_schema["additionalProperties"], false, "{}", tool.name);
        }
    }

    #[test]
    fn test_definition_serializes_input_schema_camel_case() {
        let tool = &tool_definitions()[0];
        let json = serde_json::to_value(tool).unwrap();
        assert!(json.get("inputSchema").is_some());
    }

    #[test]
    fn test_resource_list_covers_filters() {
        let uris: Vec<_> = resource_definitions().into_iter().map(|r| r.uri).collect();
        assert!(uris.contains(&"radarr://movies/wanted".to_string()));
        assert_eq!(uris.len(), MOVIE_FILTERS.len());
    }
}
