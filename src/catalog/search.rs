// Catalog filtering and ranking.
// Text and category filters, repository extraction, and star-based ordering.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::stars::{RepoId, StarsSnapshot};

use super::benefit::{Benefit, Category};

/// Whether `benefit` passes the category filter and the search query.
///
/// `None` matches every category. The query matches case-insensitively
/// against the name, description, and tags; an empty query matches all.
pub fn matches(benefit: &Benefit, category: Option<Category>, query: &str) -> bool {
    if category.is_some_and(|category| benefit.category != category) {
        return false;
    }

    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    benefit.name.to_lowercase().contains(&query)
        || benefit.description.to_lowercase().contains(&query)
        || benefit
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&query))
}

/// Distinct repositories referenced by the catalog.
pub fn repo_ids(benefits: &[Benefit]) -> BTreeSet<RepoId> {
    benefits
        .iter()
        .filter_map(|benefit| benefit.repo.clone())
        .collect()
}

/// Filter the catalog and order it by stars, then popularity, both descending.
/// Unknown star counts rank as zero. Ties keep catalog order.
pub fn rank<'a>(
    benefits: &'a [Benefit],
    category: Option<Category>,
    query: &str,
    stars: &StarsSnapshot,
) -> Vec<&'a Benefit> {
    let mut ranked: Vec<&Benefit> = benefits
        .iter()
        .filter(|benefit| matches(benefit, category, query))
        .collect();

    ranked.sort_by_key(|benefit| {
        (
            Reverse(stars.rank_stars(benefit.repo.as_ref())),
            Reverse(benefit.popularity),
        )
    });
    ranked
}
