use crate::model::Episode;

/// Puts a season listing into playback order
///
/// Placeholder episodes (number zero) are removed. The rest are sorted by
/// season number, then by episode number. Episodes without a known season
/// sort ahead of those with one.
pub fn order_episodes<I>(episodes: I) -> Vec<Episode>
where
    I: IntoIterator<Item = Episode>,
{
    let mut ordered: Vec<Episode> = episodes.into_iter().filter(|e| e.number != 0).collect();
    ordered.sort_by_key(|e| (e.season_number(), e.number));
    ordered
}
