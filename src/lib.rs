//! Chakram - a client for the Amazon Video catalog
//!
//! This library lists movies, seasons and episodes, resolves DASH manifests
//! and Widevine licenses for playback, and finds the title a user means
//! among the noisy, duplicated results the catalog returns.

pub mod catalog;
pub mod config;
pub mod device;
pub mod model;
pub mod resolve;

use catalog::{CatalogSource, ListRequest, normalize_records};
use resolve::TitleQuery;

// Re-export error types
pub use catalog::{CatalogError, RecordError};
pub use config::ConfigError;

// Re-export the entities
pub use model::{Episode, Movie, Season, Series, Title, TitleType, TitleView};

pub use catalog::CatalogClient;
pub use config::Config;

use std::io;
use thiserror::Error;

/// Progress event emitted while finding a title
///
/// These events allow library users to report what is going on during a
/// search, or to stay silent.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Requesting the candidate listing
    FetchingListing { query: String },

    /// Listing received
    ListingFetched { record_count: usize },

    /// Records converted into titles; malformed ones were skipped
    RecordsNormalized { title_count: usize, skipped: usize },

    /// Ranking complete
    Complete { match_count: usize },
}

/// How to gather and narrow down candidates for a search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// The listing to rank. Its search phrase defaults to the query.
    pub request: ListRequest,
    /// Only return titles of this kind
    pub type_filter: Option<TitleType>,
}

/// Top-level error type for Chakram operations
#[derive(Debug, Error)]
pub enum ChakramError {
    /// Error while talking to the catalog
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error while loading configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to render results as JSON
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// The interactive selection prompt failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Finds the titles matching a free-text query, best match first
///
/// This function fetches a listing from `source`, normalizes its records,
/// folds seasons into their series and 4K twins into one entry, and ranks
/// what remains against `query`.
///
/// Progress events are emitted through the provided callback.
///
/// # Arguments
///
/// * `source` - Where the candidate listing comes from
/// * `query` - What the user typed
/// * `options` - Listing parameters and an optional type filter
/// * `progress_callback` - Closure called with progress events
///
/// # Examples
///
/// ```
/// use chakram::catalog::StaticListing;
/// use chakram::{FindOptions, find_titles};
///
/// let listing = StaticListing::from_json_str(r#"[
///     {"titleId": "A", "title": "Planet Earth", "contentType": "MOVIE"},
///     {"titleId": "B", "title": "Planet Earth (4K UHD)", "contentType": "MOVIE"},
///     {"titleId": "C", "title": "Blue Planet", "contentType": "MOVIE"}
/// ]"#).unwrap();
///
/// let titles = find_titles(&listing, "planet earth", &FindOptions::default(), |_| {}).unwrap();
/// assert_eq!(titles[0].id(), "B");
/// ```
pub fn find_titles<S, F>(
    source: &S,
    query: &str,
    options: &FindOptions,
    mut progress_callback: F,
) -> Result<Vec<Title>, ChakramError>
where
    S: CatalogSource + ?Sized,
    F: FnMut(ProgressEvent),
{
    let mut request = options.request.clone();
    if request.search.is_none() {
        request.search = Some(query.to_string());
    }

    progress_callback(ProgressEvent::FetchingListing {
        query: query.to_string(),
    });
    let records = source.list(&request)?;
    progress_callback(ProgressEvent::ListingFetched {
        record_count: records.len(),
    });

    let titles = normalize_records(&records);
    progress_callback(ProgressEvent::RecordsNormalized {
        title_count: titles.len(),
        skipped: records.len() - titles.len(),
    });

    let matches = TitleQuery::new(query).filter(titles, options.type_filter);
    progress_callback(ProgressEvent::Complete {
        match_count: matches.len(),
    });

    Ok(matches)
}
