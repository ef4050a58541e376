use super::dedupe::dedupe;
use super::scorer::Scorer;
use crate::model::{Title, TitleType};
use std::collections::HashSet;
use tracing::debug;

/// Marker the catalog puts into the display title of 4K releases
const UHD_MARKER: &str = "4K UHD";

/// Parenthesized form of [`UHD_MARKER`] as it appears in titles
const UHD_TITLE_SUFFIX: &str = "(4K UHD)";

/// A free-text search over a catalog listing
///
/// # Examples
///
/// ```
/// use chakram::resolve::TitleQuery;
/// use chakram::{Movie, Title};
///
/// let movie = |id: &str, title: &str| Title::Movie(Movie {
///     id: id.into(),
///     title: title.into(),
///     cover: None,
/// });
///
/// let results = TitleQuery::new("planet earth").filter(
///     vec![movie("A", "Planet Earth"), movie("B", "Planet Earth (4K UHD)")],
///     None,
/// );
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].id(), "B");
/// ```
#[derive(Debug, Clone)]
pub struct TitleQuery {
    scorer: Scorer,
}

impl TitleQuery {
    pub fn new(query: &str) -> Self {
        Self {
            scorer: Scorer::new(query),
        }
    }

    /// Ranks the distinct titles of a listing against this query
    ///
    /// The listing is deduplicated first, so seasons surface as their series
    /// and episodes are dropped. When both a title and its 4K twin are in the
    /// listing only the 4K one is kept. Results are ordered by descending
    /// score; titles with equal scores keep their listing order.
    ///
    /// # Arguments
    ///
    /// * `titles` - The catalog listing to search
    /// * `type_filter` - Only consider titles of this kind, if given
    pub fn filter<I>(&self, titles: I, type_filter: Option<TitleType>) -> Vec<Title>
    where
        I: IntoIterator<Item = Title>,
    {
        let mut has_uhd_version: HashSet<String> = HashSet::new();
        let mut scored: Vec<(Title, f64)> = Vec::new();

        for title in dedupe(titles) {
            if type_filter.is_some_and(|t| t != title.title_type()) {
                continue;
            }

            if title.title().contains(UHD_MARKER) {
                has_uhd_version.insert(uhd_base_title(title.title()));
            } else if has_uhd_version.contains(title.title()) {
                debug!(title = %title.title(), "skipping title with 4K twin");
                continue;
            }

            let score = self.scorer.score(title.title());
            if score > 0.0 {
                scored.push((title, score));
            }
        }

        scored.retain(|(title, _)| !has_uhd_version.contains(title.title()));

        // sort_by is stable, so equal scores keep listing order
        scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        scored.into_iter().map(|(title, _)| title).collect()
    }
}

/// Strips the 4K marker from a title, leaving the title of its HD twin
fn uhd_base_title(title: &str) -> String {
    let base = if title.contains(UHD_TITLE_SUFFIX) {
        title.replacen(UHD_TITLE_SUFFIX, "", 1)
    } else {
        title.replacen(UHD_MARKER, "", 1)
    };

    base.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Episode, Movie, Season, Series};

    fn movie(id: &str, title: &str) -> Title {
        Title::Movie(Movie {
            id: id.to_string(),
            title: title.to_string(),
            cover: None,
        })
    }

    fn series(id: &str, title: &str) -> Series {
        Series {
            id: id.to_string(),
            title: title.to_string(),
            cover: None,
        }
    }

    fn season_of(id: &str, number: u32, parent: Series) -> Title {
        Title::Season(Season {
            id: id.to_string(),
            title: format!("{} - Season {}", parent.title, number),
            cover: None,
            number,
            series: Some(parent),
        })
    }

    fn ids(titles: &[Title]) -> Vec<&str> {
        titles.iter().map(Title::id).collect()
    }

    #[test]
    fn test_uhd_variant_replaces_plain_title() {
        let query = TitleQuery::new("planet earth");

        let results = query.filter(
            vec![
                movie("HD", "Planet Earth"),
                movie("UHD", "Planet Earth (4K UHD)"),
            ],
            None,
        );
        assert_eq!(ids(&results), vec!["UHD"]);

        let results = query.filter(
            vec![
                movie("UHD", "Planet Earth (4K UHD)"),
                movie("HD", "Planet Earth"),
            ],
            None,
        );
        assert_eq!(ids(&results), vec!["UHD"]);
    }

    #[test]
    fn test_ranks_by_score_descending() {
        let results = TitleQuery::new("earth").filter(
            vec![
                movie("long", "Journey to the Center of the Earth"),
                movie("exact", "Earth"),
                movie("none", "Mars"),
            ],
            None,
        );

        assert_eq!(ids(&results), vec!["exact", "long"]);
    }

    #[test]
    fn test_equal_scores_keep_listing_order() {
        let results = TitleQuery::new("heat").filter(
            vec![movie("first", "Heat"), movie("second", "heat")],
            None,
        );

        assert_eq!(ids(&results), vec!["first", "second"]);
    }

    #[test]
    fn test_seasons_surface_as_series() {
        let office = series("S1", "The Office");
        let results = TitleQuery::new("office").filter(
            vec![
                season_of("A", 1, office.clone()),
                season_of("B", 2, office.clone()),
                movie("M1", "Office Space"),
            ],
            None,
        );

        // "office" covers 6 of 10 characters of the series, 6 of 12 of the movie
        assert_eq!(ids(&results), vec!["S1", "M1"]);
        assert_eq!(results[0], Title::Series(office));
    }

    #[test]
    fn test_type_filter() {
        let titles = vec![
            season_of("A", 1, series("S1", "Dune")),
            movie("M1", "Dune"),
        ];

        let query = TitleQuery::new("dune");
        assert_eq!(ids(&query.filter(titles.clone(), Some(TitleType::Movie))), vec!["M1"]);
        assert_eq!(ids(&query.filter(titles.clone(), Some(TitleType::Series))), vec!["S1"]);
        assert!(query.filter(titles, Some(TitleType::Episode)).is_empty());
    }

    #[test]
    fn test_episodes_never_match() {
        let episode = Title::Episode(Episode {
            id: "E1".to_string(),
            title: "Dune".to_string(),
            cover: None,
            number: 1,
            season: None,
            series: None,
        });

        assert!(TitleQuery::new("dune").filter(vec![episode], None).is_empty());
    }

    #[test]
    fn test_uhd_twin_filtered_by_type_does_not_suppress() {
        // The UHD twin is excluded by the type filter before it is recorded
        let results = TitleQuery::new("planet earth").filter(
            vec![
                movie("UHD", "Planet Earth (4K UHD)"),
                Title::Series(series("HD", "Planet Earth")),
            ],
            Some(TitleType::Series),
        );

        assert_eq!(ids(&results), vec!["HD"]);
    }

    #[test]
    fn test_uhd_base_title() {
        assert_eq!(uhd_base_title("Planet Earth (4K UHD)"), "Planet Earth");
        assert_eq!(uhd_base_title("Planet Earth 4K UHD"), "Planet Earth");
        assert_eq!(uhd_base_title("(4K UHD) Planet Earth"), "Planet Earth");
    }
}
