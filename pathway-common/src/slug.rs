//! URL-safe slugs for assessments

/// Derive a slug from a title: lower-case ASCII alphanumerics joined by `-`
///
/// ```
/// use pathway_common::slug::slugify;
///
/// assert_eq!(slugify("  Career Clarity: 2024! "), "career-clarity-2024");
/// assert_eq!(slugify("***"), "");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Whether a client-supplied slug is acceptable as-is
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 120
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Candidate slugs for a copy of `slug`: `<slug>-copy`, `<slug>-copy-2`, ...
pub fn copy_candidates(slug: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(format!("{}-copy", slug))
        .chain((2..).map(move |n| format!("{}-copy-{}", slug, n)))
}
