//! Project slugs.
//!
//! [`slugify`] lowercases, drops everything but ASCII letters, digits, `_`, `-` and
//! whitespace, then joins words with single hyphens. [`plan_slugs`] resolves a
//! whole table at once: every project ends up with a distinct slug, and a slug that
//! was already set stays as it is unless an earlier row holds the same one.

use std::collections::HashSet;

/// Used when neither an existing slug nor the title yields any characters.
pub const FALLBACK_SLUG: &str = "project";

/// Longest base slug kept before a `-N` suffix is appended.
pub const MAX_BASE_LENGTH: usize = 240;

/// Width of the `slug` column.
pub const MAX_SLUG_LENGTH: usize = 255;

pub fn slugify(value: &str) -> String {
    let mut base: String = clean(value).chars().take(MAX_BASE_LENGTH).collect();
    while base.ends_with('-') {
        base.pop();
    }
    base
}

/// Whether `value` can be stored as a slug unchanged.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_SLUG_LENGTH && clean(value) == value
}

fn clean(value: &str) -> String {
    let lowered = value.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// `slugify(existing slug, else title)`, or [`FALLBACK_SLUG`] when that is empty.
pub fn base_slug(existing: Option<&str>, title: &str) -> String {
    let source = match existing {
        Some(slug) if !slug.trim().is_empty() => slug,
        _ => title,
    };
    let base = slugify(source);
    if base.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        base
    }
}

/// First of `base`, `base-2`, `base-3`, ... that `is_taken` rejects.
pub fn next_free_slug(base: &str, mut is_taken: impl FnMut(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (2u64..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// One project row as seen by the slug backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugSource {
    pub id: i64,
    pub title: String,
    pub slug: Option<String>,
}

/// A slug to persist for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugAssignment {
    pub id: i64,
    pub slug: String,
    /// False when the row already held exactly this slug.
    pub changed: bool,
}

/// Resolves slugs for every row, in primary-key order.
///
/// Rows keep their current slug when it is already in slug form and no row with a
/// smaller key claimed it. Everything else gets the first free `base`, `base-2`,
/// ... after those reservations.
pub fn plan_slugs(rows: &[SlugSource]) -> Vec<SlugAssignment> {
    let mut ordered: Vec<&SlugSource> = rows.iter().collect();
    ordered.sort_by_key(|row| row.id);

    let mut taken: HashSet<String> = HashSet::new();
    let mut kept: HashSet<i64> = HashSet::new();

    for row in &ordered {
        if let Some(current) = row.slug.as_deref() {
            if is_slug(current) && taken.insert(current.to_string()) {
                kept.insert(row.id);
            }
        }
    }

    ordered
        .into_iter()
        .map(|row| {
            if kept.contains(&row.id) {
                let slug = row.slug.clone().unwrap_or_default();
                return SlugAssignment {
                    id: row.id,
                    slug,
                    changed: false,
                };
            }

            let base = base_slug(row.slug.as_deref(), &row.title);
            let slug = next_free_slug(&base, |candidate| taken.contains(candidate));
            taken.insert(slug.clone());
            SlugAssignment {
                id: row.id,
                changed: row.slug.as_deref() != Some(slug.as_str()),
                slug,
            }
        })
        .collect()
}
