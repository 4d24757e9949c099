//! Named tools and read-only resources over the movie library.
//!
//! Every tool has a declared JSON input schema (`schema`), a typed parameter
//! record (`params`) and a reshaped result (`responses`). `ToolRouter` ties
//! them together and owns the response cache.

mod error;
pub mod params;
pub mod responses;
mod router;
pub mod schema;

pub use error::{ErrorKind, ErrorPayload, ToolError};
pub use router::{ResourceContents, ToolRouter};
pub use schema::{ResourceDefinition, ResourceTemplate, ToolDefinition};
