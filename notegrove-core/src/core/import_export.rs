//! Note import, export, and import-merge conflict resolution.
//!
//! Export and import work through the note and category stores only; the
//! merge functions are pure over note slices so they can be tested without a
//! database.

use crate::{
    compute_metadata, generate_id, normalize_tags, validate_content, validate_title, Category,
    Note, NotegroveError, Priority, Result, Workspace, DEFAULT_NOTE_COLOR,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Category name written to Markdown frontmatter for uncategorised notes.
const UNCATEGORIZED: &str = "uncategorized";

/// Lines that fit on one laid-out page.
const PAGE_LINES: usize = 54;

/// Column at which body text wraps.
const WRAP_COLS: usize = 90;

/// How an import reconciles notes that collide (by ID or title) with
/// existing notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    /// Colliding existing notes are removed; all imported notes are kept.
    Overwrite,
    /// The existing set is returned unchanged.
    Skip,
    /// Colliding imported notes are kept alongside the originals with a
    /// `" (Duplicate)"` title suffix.
    Rename,
}

/// Options for [`merge_imported_notes`]. The strategy is required; merging
/// without one fails rather than guessing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeOptions {
    pub duplicate_strategy: Option<DuplicateStrategy>,
}

/// Outcome of [`validate_import_data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportValidation {
    pub valid: bool,
    pub message: String,
}

/// One laid-out page of text, ready for a PDF renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfPage {
    pub lines: Vec<String>,
}

/// Serialises notes as a pretty-printed JSON array.
pub fn export_to_json(notes: &[Note]) -> Result<String> {
    Ok(serde_json::to_string_pretty(notes)?)
}

/// Renders notes as Markdown: a frontmatter block (`title`, `category`,
/// `timestamp`) and a heading plus body per note, joined with a
/// `\n\n---\n\n` divider. Category IDs are resolved to names through
/// `categories`; unresolved or absent references become `uncategorized`.
pub fn export_to_markdown(notes: &[Note], categories: &[Category]) -> String {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let blocks: Vec<String> = notes
        .iter()
        .map(|n| {
            let category = n
                .category
                .as_deref()
                .and_then(|id| names.get(id).copied())
                .unwrap_or(UNCATEGORIZED);
            format!(
                "---\ntitle: {}\ncategory: {}\ntimestamp: {}\n---\n\n# {}\n\n{}",
                n.title, category, n.created_at, n.title, n.content
            )
        })
        .collect();
    blocks.join("\n\n---\n\n")
}

/// Lays notes out into pages for a PDF renderer: each note starts on a new
/// page with its title, and body text is word-wrapped; a note longer than
/// one page continues onto the next.
pub fn export_to_pdf_pages(notes: &[Note]) -> Vec<PdfPage> {
    let mut pages: Vec<PdfPage> = Vec::new();
    for note in notes {
        let mut lines: Vec<String> = Vec::new();
        lines.push(note.title.clone());
        lines.push(String::new());
        for paragraph in note.content.lines() {
            if paragraph.is_empty() {
                lines.push(String::new());
            } else {
                lines.extend(wrap_line(paragraph, WRAP_COLS));
            }
        }
        for chunk in lines.chunks(PAGE_LINES) {
            pages.push(PdfPage {
                lines: chunk.to_vec(),
            });
        }
    }
    pages
}

fn wrap_line(text: &str, cols: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= cols {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Checks parsed import data: it must be a non-empty array whose elements
/// all carry a non-empty `title` and `content`.
pub fn validate_import_data(data: &Value) -> ImportValidation {
    let Some(items) = data.as_array() else {
        return ImportValidation {
            valid: false,
            message: "Import data must be an array of notes".to_string(),
        };
    };
    if items.is_empty() {
        return ImportValidation {
            valid: false,
            message: "Import data contains no notes".to_string(),
        };
    }
    for (i, item) in items.iter().enumerate() {
        let has_title = item
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.trim().is_empty());
        let has_content = item
            .get("content")
            .and_then(Value::as_str)
            .is_some_and(|c| !c.trim().is_empty());
        if !has_title || !has_content {
            return ImportValidation {
                valid: false,
                message: format!("Note {} is missing a title or content", i + 1),
            };
        }
    }
    ImportValidation {
        valid: true,
        message: "ok".to_string(),
    }
}

/// Parses a JSON export into normalised notes for `owner_id`.
///
/// Missing IDs are generated, missing timestamps set to now, and a missing
/// or empty category becomes no category. Both the hosted field names
/// (`createdAt`/`updatedAt`) and the local ones (`timestamp`/`lastModified`)
/// are accepted.
///
/// # Errors
///
/// Returns [`NotegroveError::Parse`] if the content is not a JSON array.
pub fn import_from_json(content: &str, owner_id: &str) -> Result<Vec<Note>> {
    let data: Value =
        serde_json::from_str(content).map_err(|e| NotegroveError::Parse(e.to_string()))?;
    let Some(items) = data.as_array() else {
        return Err(NotegroveError::Parse(
            "expected a JSON array of notes".to_string(),
        ));
    };

    let now = crate::core::workspace::now();
    Ok(items
        .iter()
        .map(|item| normalize_imported(item, owner_id, now))
        .collect())
}

fn normalize_imported(item: &Value, owner_id: &str, now: i64) -> Note {
    let field = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    let time_field = |keys: [&str; 2]| {
        keys.iter()
            .find_map(|k| item.get(*k).and_then(Value::as_i64))
            .unwrap_or(now)
    };

    let title = field("title").unwrap_or_default();
    let content = field("content").unwrap_or_default();
    let category = field("category").filter(|c| !c.is_empty());
    let tags: Vec<String> = item
        .get("tags")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let metadata = compute_metadata(&content, owner_id);
    Note {
        id: field("id").unwrap_or_else(generate_id),
        owner_id: owner_id.to_string(),
        title,
        content,
        category,
        tags,
        is_pinned: false,
        is_archived: false,
        is_public: false,
        priority: Priority::Medium,
        color: field("color").unwrap_or_else(|| DEFAULT_NOTE_COLOR.to_string()),
        metadata,
        version: 1,
        history: vec![],
        created_at: time_field(["createdAt", "timestamp"]),
        updated_at: time_field(["updatedAt", "lastModified"]),
    }
}

/// Reads Markdown files into notes, one note per file: the title is the
/// filename without extension and the content is the trimmed file text.
///
/// # Errors
///
/// Returns [`NotegroveError::Read`] if any file cannot be read.
pub fn import_from_markdown<P: AsRef<Path>>(paths: &[P], owner_id: &str) -> Result<Vec<Note>> {
    let now = crate::core::workspace::now();
    let mut notes = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| NotegroveError::Read(format!("{}: {e}", path.display())))?;
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string();
        let content = text.trim().to_string();
        let metadata = compute_metadata(&content, owner_id);
        notes.push(Note {
            id: generate_id(),
            owner_id: owner_id.to_string(),
            title,
            content,
            category: None,
            tags: vec![],
            is_pinned: false,
            is_archived: false,
            is_public: false,
            priority: Priority::Medium,
            color: DEFAULT_NOTE_COLOR.to_string(),
            metadata,
            version: 1,
            history: vec![],
            created_at: now,
            updated_at: now,
        });
    }
    Ok(notes)
}

fn collides(existing: &Note, imported: &Note) -> bool {
    existing.id == imported.id || existing.title == imported.title
}

/// Resolves imported notes against an existing set according to the
/// duplicate strategy:
///
/// - `Overwrite`: existing notes colliding with any import are dropped, and
///   every imported note is appended.
/// - `Skip`: the existing set is returned unchanged and no imported notes
///   are added.
/// - `Rename`: colliding imports get a `" (Duplicate)"` title suffix (and a
///   fresh ID when the IDs collide) and both sides are kept.
///
/// # Errors
///
/// Returns [`NotegroveError::MissingStrategy`] when `options` carries no
/// strategy.
pub fn merge_imported_notes(
    existing: &[Note],
    imported: &[Note],
    options: &MergeOptions,
) -> Result<Vec<Note>> {
    let strategy = options
        .duplicate_strategy
        .ok_or(NotegroveError::MissingStrategy)?;

    match strategy {
        DuplicateStrategy::Overwrite => {
            let mut merged: Vec<Note> = existing
                .iter()
                .filter(|e| !imported.iter().any(|i| collides(e, i)))
                .cloned()
                .collect();
            merged.extend(imported.iter().cloned());
            Ok(merged)
        }
        DuplicateStrategy::Skip => Ok(existing.to_vec()),
        DuplicateStrategy::Rename => {
            let mut merged: Vec<Note> = existing.to_vec();
            for import in imported {
                let mut note = import.clone();
                if existing.iter().any(|e| collides(e, import)) {
                    note.title = format!("{} (Duplicate)", note.title);
                    if existing.iter().any(|e| e.id == note.id) {
                        note.id = generate_id();
                    }
                }
                merged.push(note);
            }
            Ok(merged)
        }
    }
}

impl Workspace {
    /// Exports all of this owner's notes as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String> {
        export_to_json(&self.list_all_notes()?)
    }

    /// Exports all of this owner's notes as Markdown.
    pub fn export_markdown(&self) -> Result<String> {
        let notes = self.list_all_notes()?;
        let categories = self.list_categories()?;
        Ok(export_to_markdown(&notes, &categories))
    }

    /// Merges `imported` into the store under `options` and persists the
    /// result: notes removed by the merge are deleted, new ones inserted.
    /// Imported category references are resolved by ID first, then by name;
    /// unresolvable references import as uncategorised. Returns the number
    /// of notes added.
    ///
    /// # Errors
    ///
    /// Returns [`NotegroveError::Validation`] when a merged note carries an
    /// out-of-bounds title, content, or tag; nothing is persisted in that
    /// case.
    pub fn import_notes(&mut self, imported: Vec<Note>, options: &MergeOptions) -> Result<usize> {
        let existing = self.list_all_notes()?;
        let mut merged = merge_imported_notes(&existing, &imported, options)?;

        // Imported data went through normalisation, not validation, so the
        // merged set is checked like any other insert before touching rows.
        for note in &mut merged {
            validate_title(&note.title)?;
            validate_content(&note.content)?;
            note.tags = normalize_tags(&note.tags)?;
        }

        let existing_by_id: HashMap<&str, &Note> =
            existing.iter().map(|n| (n.id.as_str(), n)).collect();
        let merged_ids: HashSet<String> = merged.iter().map(|n| n.id.clone()).collect();

        for old in &existing {
            if !merged_ids.contains(&old.id) {
                self.delete_note(&old.id)?;
            }
        }

        let mut added = 0;
        for note in merged {
            match existing_by_id.get(note.id.as_str()) {
                Some(old) if **old == note => continue,
                Some(_) => {
                    // Same ID survived the merge with different data (an
                    // overwrite-by-id): replace the stored row.
                    self.delete_note(&note.id)?;
                }
                None => added += 1,
            }
            let mut note = note;
            note.owner_id = self.owner_id().to_string();
            note.category = match note.category.take() {
                Some(reference) => {
                    if self.get_category(&reference)?.is_some() {
                        Some(reference)
                    } else {
                        self.category_id_by_name(&reference)?
                    }
                }
                None => None,
            };
            self.insert_note(&note)?;
        }
        Ok(added)
    }
}
