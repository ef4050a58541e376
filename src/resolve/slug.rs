/// Folds a title into its canonical slug form
///
/// The text is lowercased and every run of characters outside `[a-z0-9]`
/// (whitespace included) becomes a single space. Leading and trailing
/// separators are dropped, so the result is a space-separated list of
/// ASCII alphanumeric tokens.
pub fn normalize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_space && !slug.is_empty() {
                slug.push(' ');
            }
            pending_space = false;
            slug.push(c);
        } else {
            pending_space = true;
        }
    }

    slug
}
