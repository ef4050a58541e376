use crate::model::{Series, Title};
use std::collections::HashSet;
use tracing::trace;

/// Surfaces the distinct series and movies referenced by a listing
///
/// Created by [`dedupe`]. Seasons are replaced by their parent series the
/// first time that series id is seen; series records are emitted once per
/// id; movies always pass through; episodes are dropped.
pub struct Dedupe<I> {
    titles: I,
    seen: HashSet<String>,
}

/// Deduplicates a sequence of titles lazily, in first-occurrence order
///
/// # Examples
///
/// ```
/// use chakram::resolve::dedupe;
/// use chakram::{Season, Series, Title};
///
/// let season = |number| Title::Season(Season {
///     id: format!("S1-{}", number),
///     title: format!("Season {}", number),
///     cover: None,
///     number,
///     series: Some(Series { id: "S1".into(), title: "Show".into(), cover: None }),
/// });
///
/// let distinct: Vec<Title> = dedupe(vec![season(1), season(2)]).collect();
/// assert_eq!(distinct.len(), 1);
/// assert_eq!(distinct[0].id(), "S1");
/// ```
pub fn dedupe<I>(titles: I) -> Dedupe<I::IntoIter>
where
    I: IntoIterator<Item = Title>,
{
    Dedupe {
        titles: titles.into_iter(),
        seen: HashSet::new(),
    }
}

impl<I> Iterator for Dedupe<I>
where
    I: Iterator<Item = Title>,
{
    type Item = Title;

    fn next(&mut self) -> Option<Title> {
        for title in self.titles.by_ref() {
            match title {
                Title::Season(season) => {
                    let Some(series) = season.series else {
                        trace!(season = %season.id, "season without series, skipping");
                        continue;
                    };
                    if self.seen.insert(series.id.clone()) {
                        return Some(Title::Series(Series {
                            id: series.id,
                            title: series.title,
                            cover: series.cover,
                        }));
                    }
                }
                Title::Series(series) => {
                    if self.seen.insert(series.id.clone()) {
                        return Some(Title::Series(series));
                    }
                }
                movie @ Title::Movie(_) => return Some(movie),
                Title::Episode(_) => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Episode, Movie, Season};

    fn series(id: &str) -> Series {
        Series {
            id: id.to_string(),
            title: format!("Series {}", id),
            cover: None,
        }
    }

    fn season(id: &str, number: u32, parent: Option<Series>) -> Title {
        Title::Season(Season {
            id: id.to_string(),
            title: format!("Season {}", number),
            cover: None,
            number,
            series: parent,
        })
    }

    fn movie(id: &str) -> Title {
        Title::Movie(Movie {
            id: id.to_string(),
            title: format!("Movie {}", id),
            cover: None,
        })
    }

    #[test]
    fn test_seasons_collapse_into_one_series() {
        let titles = vec![
            season("A", 1, Some(series("S1"))),
            season("B", 2, Some(series("S1"))),
            season("C", 3, Some(series("S1"))),
        ];

        let result: Vec<Title> = dedupe(titles).collect();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0], Title::Series(series("S1")));
    }

    #[test]
    fn test_movies_are_never_deduplicated() {
        let titles = vec![movie("M1"), movie("M1"), movie("M2")];

        let ids: Vec<String> = dedupe(titles).map(|t| t.id().to_string()).collect();
        assert_eq!(ids, vec!["M1", "M1", "M2"]);
    }

    #[test]
    fn test_series_and_season_share_seen_set() {
        let titles = vec![
            Title::Series(series("S1")),
            season("A", 1, Some(series("S1"))),
            season("B", 1, Some(series("S2"))),
            Title::Series(series("S2")),
        ];

        let ids: Vec<String> = dedupe(titles).map(|t| t.id().to_string()).collect();
        assert_eq!(ids, vec!["S1", "S2"]);
    }

    #[test]
    fn test_orphan_seasons_and_episodes_are_dropped() {
        let titles = vec![
            season("A", 1, None),
            Title::Episode(Episode {
                id: "E1".to_string(),
                title: "Pilot".to_string(),
                cover: None,
                number: 1,
                season: None,
                series: Some(series("S9")),
            }),
            movie("M1"),
        ];

        let result: Vec<Title> = dedupe(titles).collect();
        assert_eq!(result, vec![movie("M1")]);
    }

    #[test]
    fn test_first_occurrence_order() {
        let titles = vec![
            season("A", 1, Some(series("S2"))),
            movie("M1"),
            season("B", 1, Some(series("S1"))),
            season("C", 2, Some(series("S2"))),
        ];

        let ids: Vec<String> = dedupe(titles).map(|t| t.id().to_string()).collect();
        assert_eq!(ids, vec!["S2", "M1", "S1"]);
    }
}
