use crate::share_limits::group::{GroupConfig, MatchPredicate};
use std::collections::HashSet;

/// Every non-empty clause must hold; empty clauses are vacuously satisfied.
pub fn check_tags(
    tags: &[String],
    include_all: &[String],
    include_any: &[String],
    exclude_all: &[String],
    exclude_any: &[String],
) -> bool {
    let tags: HashSet<&str> = tags.iter().map(String::as_str).collect();
    let has = |t: &String| tags.contains(t.as_str());

    if !include_all.is_empty() && !include_all.iter().all(has) {
        return false;
    }
    if !include_any.is_empty() && !include_any.iter().any(has) {
        return false;
    }
    if !exclude_all.is_empty() && exclude_all.iter().all(has) {
        return false;
    }
    if !exclude_any.is_empty() && exclude_any.iter().any(has) {
        return false;
    }
    true
}

pub fn check_category(category: &str, allowed: &[String]) -> bool {
    allowed.is_empty() || allowed.iter().any(|c| c == category)
}

impl MatchPredicate {
    pub fn matches(&self, tags: &[String], category: &str) -> bool {
        check_tags(
            tags,
            &self.include_all_tags,
            &self.include_any_tags,
            &self.exclude_all_tags,
            &self.exclude_any_tags,
        ) && check_category(category, &self.categories)
    }
}

/// Assigns torrents to the first group, in evaluation order, whose predicate holds
pub struct GroupMatcher<'a> {
    groups: &'a [GroupConfig],
}

impl<'a> GroupMatcher<'a> {
    pub fn new(groups: &'a [GroupConfig]) -> Self {
        Self { groups }
    }

    /// Index of the matching group, or `None` when the torrent is unmanaged
    pub fn get_group(&self, tags: &[String], category: &str) -> Option<usize> {
        self.groups
            .iter()
            .position(|g| g.predicate.matches(tags, category))
    }
}

/// Pairs of group names with identical predicates. The later group of each
/// pair can never match anything.
pub fn shadowed_groups(groups: &[GroupConfig]) -> Vec<(String, String)> {
    let mut shadowed = Vec::new();
    for (i, later) in groups.iter().enumerate() {
        if let Some(earlier) = groups[..i].iter().find(|g| g.predicate == later.predicate) {
            shadowed.push((earlier.name.clone(), later.name.clone()));
        }
    }
    shadowed
}
