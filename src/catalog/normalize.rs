//! Record normalizer
//!
//! Maps the catalog's loosely shaped title records onto the strict entities
//! in [`crate::model`]. Records that can't be mapped are rejected with a
//! [`RecordError`]; listing helpers skip them and keep going.

use super::catalog_types::{RawAncestor, RawFormat, RawTitle};
use crate::model::{Episode, Movie, Season, Series, Title, TitleType};
use crate::resolve::order_episodes;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Format type whose images are preferred for cover art
const PREFERRED_FORMAT: &str = "HD";

/// Image types usable as cover art
const COVER_IMAGE_TYPES: &[&str] = &["COVER_ART_TV", "COVER_ART_MOVIE"];

/// Errors that make a single catalog record unusable
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record does not have the expected shape
    #[error("Malformed catalog record: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A field required for this kind of record is absent
    #[error("Catalog record is missing required field `{0}`")]
    MissingField(&'static str),

    /// The record's content type is not one we know
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),
}

/// Maps a catalog content type onto a title type, ignoring case
///
/// Both the bare names (`EPISODE`) and the browse filter names
/// (`TVEpisode`) are accepted.
pub fn parse_content_type(content_type: &str) -> Option<TitleType> {
    match content_type.to_ascii_uppercase().as_str() {
        "MOVIE" => Some(TitleType::Movie),
        "EPISODE" | "TVEPISODE" => Some(TitleType::Episode),
        "SEASON" | "TVSEASON" => Some(TitleType::Season),
        "SERIES" | "TVSERIES" => Some(TitleType::Series),
        _ => None,
    }
}

/// Converts one raw catalog record into a [`Title`]
pub fn normalize_record(value: &Value) -> Result<Title, RecordError> {
    let raw = RawTitle::deserialize(value)?;

    let content_type = raw
        .content_type
        .as_deref()
        .ok_or(RecordError::MissingField("contentType"))?;
    let title_type = parse_content_type(content_type)
        .ok_or_else(|| RecordError::UnknownContentType(content_type.to_string()))?;

    let cover = raw.formats.as_deref().and_then(find_cover);
    let ancestors = raw.ancestor_titles.as_deref().unwrap_or_default();
    let id = raw.title_id.ok_or(RecordError::MissingField("titleId"))?;
    let title = raw.title.ok_or(RecordError::MissingField("title"))?;

    let record = match title_type {
        TitleType::Movie => Title::Movie(Movie { id, title, cover }),
        TitleType::Series => Title::Series(Series { id, title, cover }),
        TitleType::Season => Title::Season(Season {
            id,
            title,
            cover,
            number: raw.number.ok_or(RecordError::MissingField("number"))?,
            series: find_series(ancestors)?,
        }),
        TitleType::Episode => Title::Episode(Episode {
            id,
            title,
            cover,
            number: raw.number.ok_or(RecordError::MissingField("number"))?,
            season: find_season(ancestors)?,
            series: find_series(ancestors)?,
        }),
    };

    Ok(record)
}

/// Converts a listing, skipping records that can't be normalized
pub fn normalize_records(values: &[Value]) -> Vec<Title> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match normalize_record(value) {
            Ok(title) => Some(title),
            Err(e) => {
                warn!(index, error = %e, "skipping catalog record");
                None
            }
        })
        .collect()
}

/// Converts an episode listing into playback-ordered episodes
///
/// Records that aren't episodes are dropped, as are placeholder episodes
/// numbered zero.
pub fn titles_to_episodes(values: &[Value]) -> Vec<Episode> {
    let episodes = normalize_records(values)
        .into_iter()
        .filter_map(|title| match title {
            Title::Episode(episode) => Some(episode),
            other => {
                debug!(id = %other.id(), kind = %other.title_type(), "not an episode");
                None
            }
        });

    order_episodes(episodes)
}

/// Picks cover art, preferring the HD format's images
fn find_cover(formats: &[RawFormat]) -> Option<String> {
    let format = formats
        .iter()
        .find(|f| f.video_format_type.as_deref() == Some(PREFERRED_FORMAT))
        .or_else(|| formats.first())?;

    format
        .images
        .as_deref()?
        .iter()
        .find(|image| {
            image
                .image_type
                .as_deref()
                .is_some_and(|t| COVER_IMAGE_TYPES.contains(&t))
        })
        .and_then(|image| image.uri.clone())
}

fn find_ancestor<'a>(ancestors: &'a [RawAncestor], content_type: &str) -> Option<&'a RawAncestor> {
    ancestors
        .iter()
        .find(|a| a.content_type.as_deref() == Some(content_type))
}

fn find_season(ancestors: &[RawAncestor]) -> Result<Option<Season>, RecordError> {
    let Some(ancestor) = find_ancestor(ancestors, "SEASON") else {
        return Ok(None);
    };

    Ok(Some(Season {
        id: ancestor
            .title_id
            .clone()
            .ok_or(RecordError::MissingField("ancestorTitles.titleId"))?,
        title: ancestor
            .title
            .clone()
            .ok_or(RecordError::MissingField("ancestorTitles.title"))?,
        cover: None,
        number: ancestor
            .number
            .ok_or(RecordError::MissingField("ancestorTitles.number"))?,
        series: None,
    }))
}

fn find_series(ancestors: &[RawAncestor]) -> Result<Option<Series>, RecordError> {
    let Some(ancestor) = find_ancestor(ancestors, "SERIES") else {
        return Ok(None);
    };

    Ok(Some(Series {
        id: ancestor
            .title_id
            .clone()
            .ok_or(RecordError::MissingField("ancestorTitles.titleId"))?,
        title: ancestor
            .title
            .clone()
            .ok_or(RecordError::MissingField("ancestorTitles.title"))?,
        cover: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn episode_record(id: &str, season: u32, number: u32) -> Value {
        json!({
            "titleId": id,
            "title": format!("Episode {}", number),
            "contentType": "EPISODE",
            "number": number,
            "ancestorTitles": [
                { "titleId": format!("SEASON-{}", season), "title": format!("Season {}", season), "contentType": "SEASON", "number": season },
                { "titleId": "SERIES-1", "title": "The Show", "contentType": "SERIES" }
            ]
        })
    }

    #[test]
    fn test_parse_content_type() {
        assert_eq!(parse_content_type("MOVIE"), Some(TitleType::Movie));
        assert_eq!(parse_content_type("TVEpisode"), Some(TitleType::Episode));
        assert_eq!(parse_content_type("season"), Some(TitleType::Season));
        assert_eq!(parse_content_type("TVSeries"), Some(TitleType::Series));
        assert_eq!(parse_content_type("BONUS"), None);
    }

    #[test]
    fn test_normalize_movie_with_cover() {
        let value = json!({
            "titleId": "M1",
            "title": "Heat",
            "contentType": "MOVIE",
            "formats": [
                { "videoFormatType": "SD", "images": [{ "type": "COVER_ART_MOVIE", "uri": "sd.jpg" }] },
                { "videoFormatType": "HD", "images": [
                    { "type": "HERO", "uri": "hero.jpg" },
                    { "type": "COVER_ART_MOVIE", "uri": "hd.jpg" }
                ] }
            ]
        });

        let title = normalize_record(&value).unwrap();
        assert_eq!(
            title,
            Title::Movie(Movie {
                id: "M1".to_string(),
                title: "Heat".to_string(),
                cover: Some("hd.jpg".to_string()),
            })
        );
    }

    #[test]
    fn test_cover_falls_back_to_first_format() {
        let value = json!({
            "titleId": "M1",
            "title": "Heat",
            "contentType": "MOVIE",
            "formats": [
                { "videoFormatType": "SD", "images": [{ "type": "COVER_ART_TV", "uri": "sd.jpg" }] }
            ]
        });

        assert_eq!(normalize_record(&value).unwrap().cover(), Some("sd.jpg"));
    }

    #[test]
    fn test_normalize_season_with_series() {
        let value = json!({
            "titleId": "S1-2",
            "title": "The Show - Season 2",
            "contentType": "SEASON",
            "number": 2,
            "ancestorTitles": [
                { "titleId": "S1", "title": "The Show", "contentType": "SERIES" }
            ]
        });

        let Title::Season(season) = normalize_record(&value).unwrap() else {
            panic!("expected a season");
        };
        assert_eq!(season.number, 2);
        assert_eq!(season.series.unwrap().id, "S1");
    }

    #[test]
    fn test_normalize_episode_with_ancestors() {
        let Title::Episode(episode) = normalize_record(&episode_record("E1", 3, 4)).unwrap() else {
            panic!("expected an episode");
        };

        assert_eq!(episode.number, 4);
        assert_eq!(episode.season_number(), Some(3));
        assert!(episode.season.as_ref().unwrap().series.is_none());
        assert_eq!(episode.series.unwrap().title, "The Show");
    }

    #[test]
    fn test_rejects_malformed_records() {
        assert!(matches!(
            normalize_record(&json!({ "titleId": "X", "title": "X", "contentType": "TRAILER" })),
            Err(RecordError::UnknownContentType(_))
        ));
        assert!(matches!(
            normalize_record(&json!({ "title": "X", "contentType": "MOVIE" })),
            Err(RecordError::MissingField("titleId"))
        ));
        assert!(matches!(
            normalize_record(&json!({ "titleId": "X", "title": "X", "contentType": "EPISODE" })),
            Err(RecordError::MissingField("number"))
        ));
        assert!(matches!(
            normalize_record(&json!({
                "titleId": "X", "title": "X", "contentType": "SEASON", "number": 1,
                "ancestorTitles": [{ "contentType": "SERIES", "title": "No id" }]
            })),
            Err(RecordError::MissingField("ancestorTitles.titleId"))
        ));
        assert!(matches!(
            normalize_record(&json!({ "titleId": 5, "contentType": "MOVIE" })),
            Err(RecordError::Malformed(_))
        ));
    }

    #[test]
    fn test_normalize_records_skips_failures() {
        let values = vec![
            json!({ "titleId": "M1", "title": "Heat", "contentType": "MOVIE" }),
            json!({ "titleId": "X", "contentType": "TRAILER" }),
            json!("not even an object"),
            json!({ "titleId": "M2", "title": "Ronin", "contentType": "Movie" }),
        ];

        let ids: Vec<String> = normalize_records(&values)
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(ids, vec!["M1", "M2"]);
    }

    #[test]
    fn test_titles_to_episodes() {
        let mut placeholder = episode_record("E0", 1, 0);
        placeholder["title"] = json!("Trailer");

        let values = vec![
            episode_record("E12", 1, 2),
            episode_record("E21", 2, 1),
            placeholder,
            json!({ "titleId": "M1", "title": "Heat", "contentType": "MOVIE" }),
            episode_record("E11", 1, 1),
        ];

        let ids: Vec<String> = titles_to_episodes(&values)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["E11", "E12", "E21"]);
    }
}
