//! In-memory search, sorting, and relevance ranking over notes.
//!
//! These functions operate on already-fetched note slices so they can serve
//! both the SQL-backed listing path and callers holding an exported set.

use crate::{Note, Result, SortDirection, Workspace};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Returns the notes whose title contains `query`, case-insensitively.
/// Input order is preserved.
pub fn search_by_title(query: &str, notes: &[Note]) -> Vec<Note> {
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|n| n.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Returns the notes whose content contains `query`, case-insensitively.
/// Input order is preserved.
pub fn search_by_content(query: &str, notes: &[Note]) -> Vec<Note> {
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|n| n.content.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Stable sort by creation time.
pub fn sort_by_date(notes: &[Note], order: SortDirection) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sorted.sort_by(|a, b| directed(a.created_at.cmp(&b.created_at), order));
    sorted
}

/// Stable, case-insensitive sort by title.
pub fn sort_by_title(notes: &[Note], order: SortDirection) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sorted.sort_by(|a, b| directed(a.title.to_lowercase().cmp(&b.title.to_lowercase()), order));
    sorted
}

fn directed(ordering: Ordering, order: SortDirection) -> Ordering {
    match order {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Scores a note against a free-text query: the query is tokenised on
/// whitespace, and each distinct token contributes 1.0 when it appears as a
/// substring of the title and another 1.0 when it appears in the content.
pub fn relevance_score(note: &Note, query: &str) -> f64 {
    let title = note.title.to_lowercase();
    let content = note.content.to_lowercase();
    let mut tokens: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens.dedup();

    let mut score = 0.0;
    for token in &tokens {
        if title.contains(token.as_str()) {
            score += 1.0;
        }
        if content.contains(token.as_str()) {
            score += 1.0;
        }
    }
    score
}

/// Filters for [`advanced_search`]. All criteria are conjunctive; `tags`
/// matches any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    /// Free-text query. When present, results are ranked by relevance and
    /// zero-score notes are dropped.
    pub text: Option<String>,
    /// Restrict to one category by ID.
    pub category: Option<String>,
    /// Match notes carrying any of these tags.
    pub tags: Vec<String>,
    /// Inclusive creation-time range.
    pub created_after: Option<i64>,
    pub created_before: Option<i64>,
    pub archived: Option<bool>,
}

/// Applies a [`SearchQuery`] to a note slice: category, tag, date-range, and
/// archived filters first, then relevance ranking (descending) when a text
/// query is present.
pub fn advanced_search(notes: &[Note], query: &SearchQuery) -> Vec<Note> {
    let mut matched: Vec<Note> = notes
        .iter()
        .filter(|n| {
            if let Some(cat) = &query.category {
                if n.category.as_deref() != Some(cat.as_str()) {
                    return false;
                }
            }
            if !query.tags.is_empty() && !query.tags.iter().any(|t| n.tags.contains(t)) {
                return false;
            }
            if let Some(after) = query.created_after {
                if n.created_at < after {
                    return false;
                }
            }
            if let Some(before) = query.created_before {
                if n.created_at > before {
                    return false;
                }
            }
            if let Some(archived) = query.archived {
                if n.is_archived != archived {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect();

    if let Some(text) = query.text.as_deref().filter(|t| !t.trim().is_empty()) {
        let mut scored: Vec<(f64, Note)> = matched
            .into_iter()
            .map(|n| (relevance_score(&n, text), n))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        matched = scored.into_iter().map(|(_, n)| n).collect();
    }
    matched
}

impl Workspace {
    /// Runs an [`advanced_search`] over all of this owner's notes.
    pub fn search_notes(&self, query: &SearchQuery) -> Result<Vec<Note>> {
        let notes = self.list_all_notes()?;
        Ok(advanced_search(&notes, query))
    }
}
