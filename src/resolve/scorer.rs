use super::slug::normalize;

/// Suffix a slug ends with when the title is a 4K release
const UHD_SLUG_SUFFIX: &str = "4k uhd";

/// Score added to 4K releases so they win ties against their HD twin
const UHD_BONUS: f64 = 0.5;

/// Query tokens this short or shorter don't count on the token path
const MAX_STOP_WORD_LEN: usize = 3;

/// Scores catalog titles against a free-text query
///
/// The query is normalized once on construction. A candidate that contains
/// the whole query slug scores by how much of the title the query covers;
/// otherwise the query's significant words are looked up in order and each
/// one found contributes its share of the candidate's length.
#[derive(Debug, Clone)]
pub struct Scorer {
    query_slug: String,
    query_tokens: Vec<String>,
}

impl Scorer {
    pub fn new(query: &str) -> Self {
        let query_slug = normalize(query);
        let query_tokens = query_slug.split(' ').map(str::to_string).collect();

        Self {
            query_slug,
            query_tokens,
        }
    }

    /// Returns the relevance of `candidate_title`, where 0 means no match
    pub fn score(&self, candidate_title: &str) -> f64 {
        if self.query_slug.is_empty() {
            return 0.0;
        }

        let mut candidate_slug = normalize(candidate_title);
        let mut bonus = 0.0;

        if let Some(stripped) = candidate_slug.strip_suffix(UHD_SLUG_SUFFIX) {
            bonus = UHD_BONUS;
            candidate_slug = stripped.trim_end().to_string();
        }

        if candidate_slug.contains(&self.query_slug) {
            let title_len = candidate_title.chars().count() as f64;
            return bonus + self.query_slug.len() as f64 / title_len;
        }

        let slug_len = candidate_slug.len() as f64;
        let mut score = 0.0;
        let mut last_idx = 0;

        for token in &self.query_tokens {
            if token.len() <= MAX_STOP_WORD_LEN {
                continue;
            }

            if let Some(offset) = candidate_slug[last_idx..].find(token.as_str()) {
                last_idx += offset;
                score += token.len() as f64 / slug_len;
            }
        }

        // A UHD bonus without any matched token is discarded.
        // TODO: return the bonus here as well, matching the substring path.
        if score > 0.0 { bonus + score } else { 0.0 }
    }
}
