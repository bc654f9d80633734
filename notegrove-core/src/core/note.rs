//! The [`Note`] record, its derived metadata, and the bounded edit history.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;

/// Maximum content length in characters.
pub const CONTENT_MAX: usize = 50_000;

/// Maximum length of a single tag.
pub const TAG_MAX: usize = 50;

/// Maximum number of history snapshots retained per note.
pub const HISTORY_MAX: usize = 10;

/// Default note color.
pub const DEFAULT_NOTE_COLOR: &str = "#ffffff";

/// Words-per-minute figure used for the reading-time estimate.
const READING_WPM: u64 = 200;

/// Importance level of a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Stable string form used in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses the database string form, defaulting unknown values to Medium.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

/// Metadata derived from a note's content. Never edited directly — always
/// recomputed from the current content before the note is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub word_count: i64,
    pub character_count: i64,
    /// Estimated reading time in minutes, rounded up.
    pub reading_time: i64,
    pub last_edited_by: String,
}

/// One retained snapshot of a note's title and content prior to an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub title: String,
    pub content: String,
    pub edited_at: i64,
    pub edited_by: String,
}

/// A single note belonging to one owner, optionally filed under a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    /// Category reference by ID, or `None` for an uncategorised note.
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_public: bool,
    pub priority: Priority,
    pub color: String,
    pub metadata: NoteMetadata,
    /// Bumped whenever title or content changes.
    pub version: i64,
    /// Up to [`HISTORY_MAX`] most recent pre-edit snapshots, oldest first.
    pub history: Vec<HistoryEntry>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Pushes the note's current title and content onto the history ring,
    /// evicting the oldest entry once [`HISTORY_MAX`] snapshots are held.
    ///
    /// Must be called *before* the new title/content are applied.
    pub fn snapshot_history(&mut self, edited_at: i64, edited_by: &str) {
        self.history.push(HistoryEntry {
            title: self.title.clone(),
            content: self.content.clone(),
            edited_at,
            edited_by: edited_by.to_string(),
        });
        while self.history.len() > HISTORY_MAX {
            self.history.remove(0);
        }
    }
}

fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn hex_color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap())
}

/// Computes word count, character count, and reading time from `content`.
///
/// Markup tags are stripped first; words are whitespace-separated runs of the
/// remaining text, and the character count covers the stripped text.
pub fn compute_metadata(content: &str, last_edited_by: &str) -> NoteMetadata {
    let stripped = markup_re().replace_all(content, " ");
    let word_count = stripped.split_whitespace().count() as i64;
    let character_count = stripped.chars().count() as i64;
    let reading_time = (word_count as u64).div_ceil(READING_WPM) as i64;
    NoteMetadata {
        word_count,
        character_count,
        reading_time,
        last_edited_by: last_edited_by.to_string(),
    }
}

/// Validates a note title: non-empty and at most [`TITLE_MAX`] characters.
pub fn validate_title(title: &str) -> crate::Result<()> {
    if title.trim().is_empty() {
        return Err(crate::NotegroveError::Validation(
            "Title is required".to_string(),
        ));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(crate::NotegroveError::Validation(format!(
            "Title must be at most {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

/// Validates note content length.
pub fn validate_content(content: &str) -> crate::Result<()> {
    if content.chars().count() > CONTENT_MAX {
        return Err(crate::NotegroveError::Validation(format!(
            "Content must be at most {CONTENT_MAX} characters"
        )));
    }
    Ok(())
}

/// Validates a `#rgb` / `#rrggbb` hex color string.
pub fn validate_color(color: &str) -> crate::Result<()> {
    if !hex_color_re().is_match(color) {
        return Err(crate::NotegroveError::Validation(format!(
            "\"{color}\" is not a valid hex color"
        )));
    }
    Ok(())
}

/// Normalises a tag list: trimmed, lowercased, deduplicated, empty entries
/// dropped. Errors if any tag exceeds [`TAG_MAX`] characters or contains a
/// comma (the comma is reserved as the tag list separator).
pub fn normalize_tags(tags: &[String]) -> crate::Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let t = tag.trim().to_lowercase();
        if t.is_empty() {
            continue;
        }
        if t.contains(',') {
            return Err(crate::NotegroveError::Validation(
                "Tags may not contain commas".to_string(),
            ));
        }
        if t.chars().count() > TAG_MAX {
            return Err(crate::NotegroveError::Validation(format!(
                "Tag must be at most {TAG_MAX} characters"
            )));
        }
        out.push(t);
    }
    out.sort();
    out.dedup();
    Ok(out)
}
