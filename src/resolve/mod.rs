//! Title resolution and ranking
//!
//! Catalog listings are noisy: each season record embeds its parent series,
//! 4K releases show up as separately titled twins, and placeholder episodes
//! with number zero are mixed in. This module turns such a listing into
//! something a caller can pick from: distinct series and movies ranked
//! against a free-text query, or a season's episodes in playback order.
//!
//! Everything here is pure and synchronous; state such as the set of seen
//! ids lives only for the duration of a single call.

mod dedupe;
mod episodes;
mod query;
mod scorer;
mod slug;

pub use dedupe::{Dedupe, dedupe};
pub use episodes::order_episodes;
pub use query::TitleQuery;
pub use scorer::Scorer;
pub use slug::normalize;
