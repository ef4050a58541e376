//! Catalog listings loaded from disk
//!
//! A saved catalog response can be ranked offline the same way a live one
//! is. This is handy for debugging ranking on a listing that misbehaved.

use super::client::parse_list_response;
use super::{CatalogError, CatalogSource, ListRequest};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A fixed set of raw catalog records
///
/// Listing requests are answered with every record regardless of their
/// parameters; there is no server here to do the filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticListing {
    titles: Vec<Value>,
}

impl StaticListing {
    pub fn new(titles: Vec<Value>) -> Self {
        Self { titles }
    }

    /// Parses a saved listing
    ///
    /// Accepts a bare array of title records, an object with a `titles`
    /// array, or a complete catalog response.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let titles = match value {
            Value::Array(titles) => titles,
            Value::Object(mut object) if object.contains_key("titles") => {
                match object.remove("titles") {
                    Some(Value::Array(titles)) => titles,
                    _ => {
                        return Err(CatalogError::ParseError(
                            "`titles` is not a list".to_string(),
                        ));
                    }
                }
            }
            other => parse_list_response(other)?,
        };

        Ok(Self::new(titles))
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|e| {
            CatalogError::ParseError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl CatalogSource for StaticListing {
    fn list(&self, _request: &ListRequest) -> Result<Vec<Value>, CatalogError> {
        Ok(self.titles.clone())
    }
}
