/// Catalog access: HTTP client, record normalization and playback.
///
/// This module talks to the Amazon Video web and ATV endpoints, turns the
/// loosely typed records they return into [`crate::model`] entities, and
/// resolves the manifests and Widevine license needed for playback.
mod catalog_types;
mod client;
mod listing;
mod normalize;
mod params;
mod playback;

pub use client::{CatalogClient, CatalogOperation, ContentTypeFilter, ListRequest, ResumeInfo};
pub use listing::StaticListing;
pub use normalize::{
    RecordError, normalize_record, normalize_records, parse_content_type, titles_to_episodes,
};
pub use params::Params;
pub use playback::{LicenseChallenge, ManifestInfo, PlaybackInfo};

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP client could not be set up
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The HTTP request could not be completed
    #[error("Request to {url} failed: {source}")]
    RequestFailed { url: String, source: reqwest::Error },

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body was not what we expected
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The API reported an error of its own
    #[error("Catalog API error: {0}")]
    ApiError(String),

    /// No player token was issued; the cookies are missing or expired
    #[error("Not authorized: no player token issued for the given cookies")]
    NotAuthorized,

    /// The detail page held no playable title
    #[error("Unable to determine the title to resume for {0}")]
    ResumeInfoNotFound(String),

    /// A request URL could not be built
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A source of raw catalog listings.
///
/// Implementors return the untouched title records for a listing request;
/// normalization and ranking happen on top of this.
pub trait CatalogSource {
    /// Fetches the raw title records matching `request`.
    ///
    /// # Errors
    ///
    /// Returns an error when the listing can't be retrieved at all. Single
    /// malformed records are not errors; they are skipped later on.
    fn list(&self, request: &ListRequest) -> Result<Vec<Value>, CatalogError>;
}

/// Describes an error object returned inside a catalog response.
///
/// Errors come either as bare strings or as objects with a `message` and
/// usually a `code` or `errorCode`.
pub(crate) fn describe_api_error(error: &Value) -> String {
    if let Some(text) = error.as_str() {
        return text.to_string();
    }

    let message = error.get("message").and_then(Value::as_str);
    let code = error
        .get("errorCode")
        .or_else(|| error.get("code"))
        .and_then(Value::as_str);

    match (code, message) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (None, Some(message)) => message.to_string(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_api_error() {
        assert_eq!(describe_api_error(&json!("boom")), "boom");
        assert_eq!(
            describe_api_error(&json!({ "errorCode": "PRS.NoRights", "message": "No rights" })),
            "PRS.NoRights: No rights"
        );
        assert_eq!(describe_api_error(&json!({ "message": "Oops" })), "Oops");
        assert_eq!(describe_api_error(&json!({ "other": 1 })), r#"{"other":1}"#);
    }
}
