//! Catalog entities
//!
//! Every record the catalog hands back is one of four kinds of title. They
//! share an id, a display title and an optional cover image; seasons and
//! episodes additionally carry an ordinal and back-references to their
//! parents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL a title id is templated into to build its watch link
const WATCH_URL_ROOT: &str = "https://www.amazon.com/dp";

/// Builds the browser link that starts playback of the given title
pub fn watch_url(title_id: &str) -> String {
    format!("{}/{}/?autoplay=1", WATCH_URL_ROOT, title_id)
}

/// The kind of a catalog title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum TitleType {
    Episode,
    Movie,
    Season,
    Series,
}

impl fmt::Display for TitleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TitleType::Episode => "EPISODE",
            TitleType::Movie => "MOVIE",
            TitleType::Season => "SEASON",
            TitleType::Series => "SERIES",
        };
        f.write_str(name)
    }
}

/// A TV series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

/// A movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

/// A season of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// 1-based ordinal within the series
    pub number: u32,
    /// The parent series, absent for standalone seasons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Series>,
}

/// A single episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Ordinal within the season. Zero marks a placeholder record.
    pub number: u32,
    /// The season this episode belongs to. Its own `series` is never set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Series>,
}

/// Any title the catalog can return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Title {
    Episode(Episode),
    Movie(Movie),
    Season(Season),
    Series(Series),
}

impl Title {
    pub fn id(&self) -> &str {
        match self {
            Title::Episode(e) => &e.id,
            Title::Movie(m) => &m.id,
            Title::Season(s) => &s.id,
            Title::Series(s) => &s.id,
        }
    }

    /// The display title
    pub fn title(&self) -> &str {
        match self {
            Title::Episode(e) => &e.title,
            Title::Movie(m) => &m.title,
            Title::Season(s) => &s.title,
            Title::Series(s) => &s.title,
        }
    }

    pub fn cover(&self) -> Option<&str> {
        match self {
            Title::Episode(e) => e.cover.as_deref(),
            Title::Movie(m) => m.cover.as_deref(),
            Title::Season(s) => s.cover.as_deref(),
            Title::Series(s) => s.cover.as_deref(),
        }
    }

    pub fn title_type(&self) -> TitleType {
        match self {
            Title::Episode(_) => TitleType::Episode,
            Title::Movie(_) => TitleType::Movie,
            Title::Season(_) => TitleType::Season,
            Title::Series(_) => TitleType::Series,
        }
    }

    pub fn watch_url(&self) -> String {
        watch_url(self.id())
    }
}

impl Episode {
    /// The season ordinal, if this episode knows its season
    pub fn season_number(&self) -> Option<u32> {
        self.season.as_ref().map(|s| s.number)
    }
}

/// A title flattened for presentation, with its watch link filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleView<'a> {
    pub id: &'a str,
    pub title: &'a str,
    #[serde(rename = "type")]
    pub title_type: TitleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<&'a str>,
    #[serde(rename = "watchUrl")]
    pub watch_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

impl<'a> From<&'a Title> for TitleView<'a> {
    fn from(title: &'a Title) -> Self {
        let (season, number) = match title {
            Title::Episode(e) => (e.season_number(), Some(e.number)),
            Title::Season(s) => (None, Some(s.number)),
            Title::Movie(_) | Title::Series(_) => (None, None),
        };

        Self {
            id: title.id(),
            title: title.title(),
            title_type: title.title_type(),
            cover: title.cover(),
            watch_url: title.watch_url(),
            season,
            number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url("B00ABC123"),
            "https://www.amazon.com/dp/B00ABC123/?autoplay=1"
        );
    }

    #[test]
    fn test_title_serializes_with_type_tag() {
        let title = Title::Movie(Movie {
            id: "M1".to_string(),
            title: "Heat".to_string(),
            cover: None,
        });

        let json = serde_json::to_value(&title).unwrap();
        assert_eq!(json["type"], "MOVIE");
        assert_eq!(json["id"], "M1");

        let back: Title = serde_json::from_value(json).unwrap();
        assert_eq!(back, title);
    }

    #[test]
    fn test_title_view_for_episode() {
        let title = Title::Episode(Episode {
            id: "E1".to_string(),
            title: "Pilot".to_string(),
            cover: Some("https://img/cover.jpg".to_string()),
            number: 1,
            season: Some(Season {
                id: "S1".to_string(),
                title: "Season 1".to_string(),
                cover: None,
                number: 3,
                series: None,
            }),
            series: None,
        });

        let view = TitleView::from(&title);
        assert_eq!(view.title_type, TitleType::Episode);
        assert_eq!(view.season, Some(3));
        assert_eq!(view.number, Some(1));
        assert_eq!(view.watch_url, "https://www.amazon.com/dp/E1/?autoplay=1");
    }
}
