//! High-level note operations over a Notegrove SQLite database.

use crate::core::xref::{self, Contribution};
use crate::{
    compute_metadata, generate_id, normalize_tags, validate_color, validate_content,
    validate_title, HistoryEntry, Note, NotegroveError, Priority, Result, Storage,
    DEFAULT_NOTE_COLOR,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field to order a note listing by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    #[default]
    UpdatedAt,
    Title,
    Category,
}

/// Listing or sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter and paging options for [`Workspace::list_notes`].
///
/// Every field is optional; the default filter lists everything for the
/// owner, newest first, twenty to a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteFilter {
    /// Restrict to one category by ID.
    pub category: Option<String>,
    /// Case-insensitive substring match over title and content.
    pub search: Option<String>,
    pub archived: Option<bool>,
    pub pinned: Option<bool>,
    /// Match notes carrying any of these tags.
    pub tags: Vec<String>,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for NoteFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            archived: None,
            pinned: None,
            tags: vec![],
            sort_by: SortField::default(),
            sort_dir: SortDirection::default(),
            page: 1,
            page_size: 20,
        }
    }
}

/// Paging summary returned alongside a note listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of notes plus its paging summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub items: Vec<Note>,
    pub pagination: Pagination,
}

/// Input for [`Workspace::create_note`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    /// Category reference by ID.
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_public: bool,
    pub priority: Priority,
    pub color: Option<String>,
}

/// Partial update for [`Workspace::update_note`]. Fields left as `None` are
/// not changed; `category` uses a nested option so the reference can be
/// cleared (`Some(None)`) as well as reassigned.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub is_public: Option<bool>,
    pub priority: Option<Priority>,
    pub color: Option<String>,
}

/// Aggregate counts over all of an owner's notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_notes: i64,
    pub total_words: i64,
    pub total_characters: i64,
    pub pinned_notes: i64,
    pub archived_notes: i64,
    pub public_notes: i64,
}

/// One item that failed during a best-effort bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkError {
    pub id: String,
    pub message: String,
}

/// Outcome of a best-effort bulk operation: how many items succeeded and
/// which items failed, so callers always know exactly what was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub errors: Vec<BulkError>,
}

/// An open Notegrove database bound to one owner.
///
/// `Workspace` is the primary interface for all note and category mutations.
/// Every query is implicitly scoped to the owner given at open time, and
/// every mutation that touches a note's category reference routes its
/// counter delta through [`crate::core::xref`].
pub struct Workspace {
    storage: Storage,
    owner_id: String,
}

const NOTE_SELECT: &str = "SELECT n.id, n.owner_id, n.title, n.content, n.category_id,
        n.is_pinned, n.is_archived, n.is_public, n.priority, n.color,
        n.word_count, n.character_count, n.reading_time, n.last_edited_by,
        n.version, n.history_json, n.created_at, n.updated_at,
        GROUP_CONCAT(nt.tag, ',') AS tags_csv
 FROM notes n
 LEFT JOIN note_tags nt ON nt.note_id = n.id";

type NoteRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    i64,
    i64,
    i64,
    String,
    String,
    i64,
    i64,
    i64,
    String,
    i64,
    String,
    i64,
    i64,
    Option<String>,
);

fn map_note_row(row: &rusqlite::Row) -> rusqlite::Result<NoteRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
        row.get(15)?,
        row.get(16)?,
        row.get(17)?,
        row.get(18)?,
    ))
}

fn note_from_row_tuple(row: NoteRow) -> Result<Note> {
    let history: Vec<HistoryEntry> = serde_json::from_str(&row.15)?;
    let mut tags: Vec<String> = row
        .18
        .map(|csv| csv.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    tags.sort();
    Ok(Note {
        id: row.0,
        owner_id: row.1,
        title: row.2,
        content: row.3,
        category: row.4,
        is_pinned: row.5 != 0,
        is_archived: row.6 != 0,
        is_public: row.7 != 0,
        priority: Priority::from_str_lossy(&row.8),
        color: row.9,
        metadata: crate::NoteMetadata {
            word_count: row.10,
            character_count: row.11,
            reading_time: row.12,
            last_edited_by: row.13,
        },
        version: row.14,
        history,
        created_at: row.16,
        updated_at: row.17,
        tags,
    })
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl Workspace {
    /// Creates a new database at `path` for `owner_id`, initialises the
    /// schema, and seeds the five default categories.
    pub fn create<P: AsRef<Path>>(path: P, owner_id: &str) -> Result<Self> {
        let storage = Storage::create(path)?;
        let mut ws = Self {
            storage,
            owner_id: owner_id.to_string(),
        };
        ws.create_default_categories()?;
        Ok(ws)
    }

    /// Opens an existing database at `path` as `owner_id`. A new owner on an
    /// existing file gets the default categories seeded on first open.
    ///
    /// # Errors
    ///
    /// Returns [`NotegroveError::InvalidDatabase`] if the file is not a
    /// Notegrove database.
    pub fn open<P: AsRef<Path>>(path: P, owner_id: &str) -> Result<Self> {
        let storage = Storage::open(path)?;
        let mut ws = Self {
            storage,
            owner_id: owner_id.to_string(),
        };
        let existing: i64 = ws.connection().query_row(
            "SELECT COUNT(*) FROM categories WHERE owner_id = ?",
            [owner_id],
            |row| row.get(0),
        )?;
        if existing == 0 {
            ws.create_default_categories()?;
        }
        Ok(ws)
    }

    /// The owner all operations on this workspace are scoped to.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        self.storage.connection()
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        self.storage.connection_mut()
    }

    /// Creates a note. Validates title, content, tags, and color; resolves
    /// and verifies the category reference; and increments the category's
    /// note counter inside the same transaction as the insert.
    ///
    /// # Errors
    ///
    /// Returns [`NotegroveError::Validation`] for a missing/oversized field
    /// or [`NotegroveError::NotFound`] for an unknown category.
    pub fn create_note(&mut self, input: NewNote) -> Result<Note> {
        validate_title(&input.title)?;
        validate_content(&input.content)?;
        let tags = normalize_tags(&input.tags)?;
        let color = input
            .color
            .unwrap_or_else(|| DEFAULT_NOTE_COLOR.to_string());
        validate_color(&color)?;
        if let Some(cat) = &input.category {
            self.require_category(cat)?;
        }

        let ts = now();
        let note = Note {
            id: generate_id(),
            owner_id: self.owner_id.clone(),
            title: input.title,
            content: input.content.clone(),
            category: input.category,
            tags,
            is_pinned: input.is_pinned,
            is_archived: input.is_archived,
            is_public: input.is_public,
            priority: input.priority,
            color,
            metadata: compute_metadata(&input.content, &self.owner_id),
            version: 1,
            history: vec![],
            created_at: ts,
            updated_at: ts,
        };

        self.insert_note(&note)?;
        Ok(note)
    }

    /// Inserts a fully-built note row, its tags, and the matching counter
    /// increment in one transaction. Callers validate beforehand.
    pub(crate) fn insert_note(&mut self, note: &Note) -> Result<()> {
        let ts = note.updated_at;
        let tx = self.connection_mut().transaction()?;
        tx.execute(
            "INSERT INTO notes (id, owner_id, title, content, category_id,
                                is_pinned, is_archived, is_public, priority, color,
                                word_count, character_count, reading_time, last_edited_by,
                                version, history_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                note.id,
                note.owner_id,
                note.title,
                note.content,
                note.category,
                note.is_pinned,
                note.is_archived,
                note.is_public,
                note.priority.as_str(),
                note.color,
                note.metadata.word_count,
                note.metadata.character_count,
                note.metadata.reading_time,
                note.metadata.last_edited_by,
                note.version,
                serde_json::to_string(&note.history)?,
                note.created_at,
                note.updated_at,
            ],
        )?;
        for tag in &note.tags {
            tx.execute(
                "INSERT OR IGNORE INTO note_tags (note_id, tag) VALUES (?, ?)",
                rusqlite::params![note.id, tag],
            )?;
        }
        xref::apply_transition(
            &tx,
            Contribution {
                category: None,
                archived: false,
            },
            Contribution {
                category: note.category.as_deref(),
                archived: note.is_archived,
            },
            ts,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Fetches a single note by ID, scoped to this workspace's owner.
    /// Returns `Ok(None)` when no such note exists for the owner.
    pub fn get_note(&self, note_id: &str) -> Result<Option<Note>> {
        let sql = format!("{NOTE_SELECT} WHERE n.id = ?1 AND n.owner_id = ?2 GROUP BY n.id");
        let result = self
            .connection()
            .query_row(&sql, rusqlite::params![note_id, self.owner_id], map_note_row);
        match result {
            Ok(row) => Ok(Some(note_from_row_tuple(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn require_note(&self, note_id: &str) -> Result<Note> {
        self.get_note(note_id)?
            .ok_or_else(|| NotegroveError::NotFound(format!("note {note_id}")))
    }

    /// Lists the owner's notes matching `filter`, with paging.
    ///
    /// `pagination.has_next` is `page * limit < total`.
    pub fn list_notes(&self, filter: &NoteFilter) -> Result<NotePage> {
        let mut clauses: Vec<String> = vec!["n.owner_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(self.owner_id.clone())];

        if let Some(cat) = &filter.category {
            clauses.push("n.category_id = ?".to_string());
            params.push(Box::new(cat.clone()));
        }
        if let Some(search) = &filter.search {
            let needle = format!("%{}%", search.to_lowercase());
            clauses.push("(lower(n.title) LIKE ? OR lower(n.content) LIKE ?)".to_string());
            params.push(Box::new(needle.clone()));
            params.push(Box::new(needle));
        }
        if let Some(archived) = filter.archived {
            clauses.push("n.is_archived = ?".to_string());
            params.push(Box::new(archived));
        }
        if let Some(pinned) = filter.pinned {
            clauses.push("n.is_pinned = ?".to_string());
            params.push(Box::new(pinned));
        }
        if !filter.tags.is_empty() {
            let placeholders = filter.tags.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM note_tags t WHERE t.note_id = n.id AND t.tag IN ({placeholders}))"
            ));
            for tag in &filter.tags {
                params.push(Box::new(tag.trim().to_lowercase()));
            }
        }

        let where_sql = clauses.join(" AND ");

        let total: u64 = self.connection().query_row(
            &format!("SELECT COUNT(*) FROM notes n WHERE {where_sql}"),
            rusqlite::params_from_iter(params.iter()),
            |row| row.get::<_, i64>(0).map(|v| v as u64),
        )?;

        let order_expr = match filter.sort_by {
            SortField::CreatedAt => "n.created_at".to_string(),
            SortField::UpdatedAt => "n.updated_at".to_string(),
            SortField::Title => "lower(n.title)".to_string(),
            SortField::Category => "lower(COALESCE(c.name, ''))".to_string(),
        };
        let dir = match filter.sort_dir {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };

        let page = filter.page.max(1);
        let limit = filter.page_size.max(1);
        let offset = u64::from(page - 1) * u64::from(limit);

        let sql = format!(
            "{NOTE_SELECT}
             LEFT JOIN categories c ON c.id = n.category_id
             WHERE {where_sql}
             GROUP BY n.id
             ORDER BY {order_expr} {dir}, n.id ASC
             LIMIT {limit} OFFSET {offset}"
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), map_note_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let items = rows
            .into_iter()
            .map(note_from_row_tuple)
            .collect::<Result<Vec<_>>>()?;

        let total_pages = (total as f64 / f64::from(limit)).ceil() as u32;
        Ok(NotePage {
            items,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
                has_next: u64::from(page) * u64::from(limit) < total,
                has_prev: page > 1,
            },
        })
    }

    /// Applies a partial update to a note.
    ///
    /// Absent fields are left unchanged. When the title or content actually
    /// changes, a history snapshot of the old values is pushed first and the
    /// version is bumped. A category change decrements the old category's
    /// counter and increments the new one inside the same transaction as the
    /// row update.
    ///
    /// # Errors
    ///
    /// Returns [`NotegroveError::NotFound`] if the note or a newly assigned
    /// category does not exist for this owner, or
    /// [`NotegroveError::Validation`] for an out-of-bounds field.
    pub fn update_note(&mut self, note_id: &str, patch: NotePatch) -> Result<Note> {
        let mut note = self.require_note(note_id)?;
        let before = note.clone();

        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(content) = &patch.content {
            validate_content(content)?;
        }
        if let Some(color) = &patch.color {
            validate_color(color)?;
        }
        let new_tags = match &patch.tags {
            Some(tags) => Some(normalize_tags(tags)?),
            None => None,
        };
        if let Some(Some(cat)) = &patch.category {
            self.require_category(cat)?;
        }

        let ts = now();
        let title_changed = patch
            .title
            .as_ref()
            .is_some_and(|t| *t != note.title);
        let content_changed = patch
            .content
            .as_ref()
            .is_some_and(|c| *c != note.content);
        if title_changed || content_changed {
            note.snapshot_history(ts, &self.owner_id);
            note.version += 1;
        }

        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        let category_patched = patch.category.is_some();
        if let Some(category) = patch.category {
            note.category = category;
        }
        if let Some(tags) = new_tags {
            note.tags = tags;
        }
        if let Some(pinned) = patch.is_pinned {
            note.is_pinned = pinned;
        }
        if let Some(archived) = patch.is_archived {
            note.is_archived = archived;
        }
        if let Some(public) = patch.is_public {
            note.is_public = public;
        }
        if let Some(priority) = patch.priority {
            note.priority = priority;
        }
        if let Some(color) = patch.color {
            note.color = color;
        }

        // An archived note can outlive its category (deletion only guards
        // against counted notes). When such a note leaves the archive, drop
        // the stale reference instead of incrementing a dead counter.
        if before.is_archived && !note.is_archived && !category_patched {
            let dangling = match &note.category {
                Some(cat) => self.get_category(cat)?.is_none(),
                None => false,
            };
            if dangling {
                note.category = None;
            }
        }

        note.metadata = compute_metadata(&note.content, &self.owner_id);
        note.updated_at = ts;

        let tx = self.connection_mut().transaction()?;
        tx.execute(
            "UPDATE notes SET title = ?, content = ?, category_id = ?,
                              is_pinned = ?, is_archived = ?, is_public = ?,
                              priority = ?, color = ?,
                              word_count = ?, character_count = ?, reading_time = ?,
                              last_edited_by = ?, version = ?, history_json = ?,
                              updated_at = ?
             WHERE id = ? AND owner_id = ?",
            rusqlite::params![
                note.title,
                note.content,
                note.category,
                note.is_pinned,
                note.is_archived,
                note.is_public,
                note.priority.as_str(),
                note.color,
                note.metadata.word_count,
                note.metadata.character_count,
                note.metadata.reading_time,
                note.metadata.last_edited_by,
                note.version,
                serde_json::to_string(&note.history)?,
                note.updated_at,
                note.id,
                note.owner_id,
            ],
        )?;
        if patch.tags.is_some() {
            tx.execute("DELETE FROM note_tags WHERE note_id = ?", [&note.id])?;
            for tag in &note.tags {
                tx.execute(
                    "INSERT OR IGNORE INTO note_tags (note_id, tag) VALUES (?, ?)",
                    rusqlite::params![note.id, tag],
                )?;
            }
        }
        xref::apply_transition(
            &tx,
            Contribution {
                category: before.category.as_deref(),
                archived: before.is_archived,
            },
            Contribution {
                category: note.category.as_deref(),
                archived: note.is_archived,
            },
            ts,
        )?;
        tx.commit()?;

        Ok(note)
    }

    /// Deletes a note. Returns `Ok(false)` when no matching note exists for
    /// the owner. On success the note's category counter is decremented in
    /// the same transaction.
    pub fn delete_note(&mut self, note_id: &str) -> Result<bool> {
        let note = match self.get_note(note_id)? {
            Some(n) => n,
            None => return Ok(false),
        };

        let ts = now();
        let tx = self.connection_mut().transaction()?;
        tx.execute("DELETE FROM note_tags WHERE note_id = ?", [note_id])?;
        tx.execute(
            "DELETE FROM notes WHERE id = ? AND owner_id = ?",
            rusqlite::params![note_id, note.owner_id],
        )?;
        xref::apply_transition(
            &tx,
            Contribution {
                category: note.category.as_deref(),
                archived: note.is_archived,
            },
            Contribution {
                category: None,
                archived: false,
            },
            ts,
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Flips `is_pinned`.
    pub fn toggle_pin(&mut self, note_id: &str) -> Result<Note> {
        let pinned = self.require_note(note_id)?.is_pinned;
        self.update_note(
            note_id,
            NotePatch {
                is_pinned: Some(!pinned),
                ..NotePatch::default()
            },
        )
    }

    /// Flips `is_archived`. Archiving a categorised note removes it from its
    /// category's counter; unarchiving adds it back. A note whose category
    /// was deleted while it sat in the archive comes back uncategorised.
    pub fn toggle_archive(&mut self, note_id: &str) -> Result<Note> {
        let archived = self.require_note(note_id)?.is_archived;
        self.update_note(
            note_id,
            NotePatch {
                is_archived: Some(!archived),
                ..NotePatch::default()
            },
        )
    }

    /// Flips `is_public`.
    pub fn toggle_public(&mut self, note_id: &str) -> Result<Note> {
        let public = self.require_note(note_id)?.is_public;
        self.update_note(
            note_id,
            NotePatch {
                is_public: Some(!public),
                ..NotePatch::default()
            },
        )
    }

    /// Copies a note into a brand-new one: fresh ID, version 1, empty
    /// history, title suffixed `" (Copy)"`. Category, tags, priority, and
    /// color carry over; pinned/archived/public flags do not.
    pub fn duplicate_note(&mut self, note_id: &str) -> Result<Note> {
        let source = self.require_note(note_id)?;
        let ts = now();
        let copy = Note {
            id: generate_id(),
            owner_id: self.owner_id.clone(),
            title: format!("{} (Copy)", source.title),
            content: source.content.clone(),
            category: source.category.clone(),
            tags: source.tags.clone(),
            is_pinned: false,
            is_archived: false,
            is_public: false,
            priority: source.priority,
            color: source.color.clone(),
            metadata: compute_metadata(&source.content, &self.owner_id),
            version: 1,
            history: vec![],
            created_at: ts,
            updated_at: ts,
        };
        self.insert_note(&copy)?;
        Ok(copy)
    }

    /// Deletes notes one by one, best effort. Items that fail are reported
    /// individually; earlier deletions are not rolled back.
    pub fn bulk_delete(&mut self, note_ids: &[String]) -> Result<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for id in note_ids {
            match self.delete_note(id) {
                Ok(true) => outcome.succeeded += 1,
                Ok(false) => outcome.errors.push(BulkError {
                    id: id.clone(),
                    message: "note not found".to_string(),
                }),
                Err(e) => {
                    log::warn!("bulk delete: note {id} failed: {e}");
                    outcome.errors.push(BulkError {
                        id: id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Moves notes into `category` (or out of any category when `None`),
    /// best effort per note. Each note's counter delta is applied relative
    /// to its prior category inside that note's own transaction.
    ///
    /// # Errors
    ///
    /// Returns [`NotegroveError::NotFound`] up front if the target category
    /// does not exist for this owner.
    pub fn bulk_move(
        &mut self,
        note_ids: &[String],
        category: Option<&str>,
    ) -> Result<BulkOutcome> {
        if let Some(cat) = category {
            self.require_category(cat)?;
        }
        let mut outcome = BulkOutcome::default();
        for id in note_ids {
            let result = self.update_note(
                id,
                NotePatch {
                    category: Some(category.map(str::to_string)),
                    ..NotePatch::default()
                },
            );
            match result {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    log::warn!("bulk move: note {id} failed: {e}");
                    outcome.errors.push(BulkError {
                        id: id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Aggregates counts over all of the owner's notes. Never fails on an
    /// empty workspace — all counts are zero.
    pub fn user_stats(&self) -> Result<UserStats> {
        let stats = self.connection().query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(word_count), 0),
                    COALESCE(SUM(character_count), 0),
                    COALESCE(SUM(is_pinned), 0),
                    COALESCE(SUM(is_archived), 0),
                    COALESCE(SUM(is_public), 0)
             FROM notes WHERE owner_id = ?",
            [&self.owner_id],
            |row| {
                Ok(UserStats {
                    total_notes: row.get(0)?,
                    total_words: row.get(1)?,
                    total_characters: row.get(2)?,
                    pinned_notes: row.get(3)?,
                    archived_notes: row.get(4)?,
                    public_notes: row.get(5)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Returns all of the owner's notes, newest first.
    pub fn list_all_notes(&self) -> Result<Vec<Note>> {
        let sql = format!(
            "{NOTE_SELECT} WHERE n.owner_id = ?1 GROUP BY n.id ORDER BY n.created_at DESC, n.id"
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt
            .query_map([&self.owner_id], map_note_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(note_from_row_tuple).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::xref;
    use tempfile::NamedTempFile;

    pub(crate) fn test_workspace() -> (Workspace, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let ws = Workspace::create(temp.path(), "alice").unwrap();
        (ws, temp)
    }

    pub(crate) fn assert_counters_consistent(ws: &Workspace) {
        let mismatches = xref::verify_counters(ws.connection(), ws.owner_id()).unwrap();
        assert!(mismatches.is_empty(), "counter drift: {mismatches:?}");
    }

    fn quick_note(ws: &mut Workspace, title: &str, content: &str) -> Note {
        ws.create_note(NewNote {
            title: title.to_string(),
            content: content.to_string(),
            ..NewNote::default()
        })
        .unwrap()
    }

    #[test]
    fn test_create_note_validates_title() {
        let (mut ws, _temp) = test_workspace();

        let err = ws
            .create_note(NewNote {
                title: String::new(),
                content: "x".to_string(),
                ..NewNote::default()
            })
            .unwrap_err();
        assert!(matches!(err, NotegroveError::Validation(_)));

        // Exactly 200 characters is fine; 201 is not.
        assert!(ws
            .create_note(NewNote {
                title: "a".repeat(200),
                content: "x".to_string(),
                ..NewNote::default()
            })
            .is_ok());
        let err = ws
            .create_note(NewNote {
                title: "a".repeat(201),
                content: "x".to_string(),
                ..NewNote::default()
            })
            .unwrap_err();
        assert!(matches!(err, NotegroveError::Validation(_)));
    }

    #[test]
    fn test_create_and_get_note() {
        let (mut ws, _temp) = test_workspace();
        let note = quick_note(&mut ws, "Plan", "Q1 plan");

        let fetched = ws.get_note(&note.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Plan");
        assert_eq!(fetched.content, "Q1 plan");
        assert_eq!(fetched.version, 1);
        assert_eq!(fetched.metadata.word_count, 2);
        assert!(fetched.history.is_empty());

        assert!(ws.get_note("missing").unwrap().is_none());
    }

    #[test]
    fn test_get_note_is_owner_scoped() {
        let temp = NamedTempFile::new().unwrap();
        let note_id = {
            let mut alice = Workspace::create(temp.path(), "alice").unwrap();
            quick_note(&mut alice, "Private", "secret").id
        };
        let bob = Workspace::open(temp.path(), "bob").unwrap();
        assert!(bob.get_note(&note_id).unwrap().is_none());
    }

    #[test]
    fn test_update_note_bumps_version_and_history() {
        let (mut ws, _temp) = test_workspace();
        let note = quick_note(&mut ws, "v1 title", "v1 content");

        let updated = ws
            .update_note(
                &note.id,
                NotePatch {
                    content: Some("v2 content".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.history.len(), 1);
        // Snapshot holds the pre-edit values.
        assert_eq!(updated.history[0].title, "v1 title");
        assert_eq!(updated.history[0].content, "v1 content");

        // A no-op patch neither bumps the version nor grows the history.
        let same = ws
            .update_note(
                &note.id,
                NotePatch {
                    content: Some("v2 content".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        assert_eq!(same.version, 2);
        assert_eq!(same.history.len(), 1);
    }

    #[test]
    fn test_update_note_history_bounded() {
        let (mut ws, _temp) = test_workspace();
        let note = quick_note(&mut ws, "t", "c0");
        for i in 1..=15 {
            ws.update_note(
                &note.id,
                NotePatch {
                    content: Some(format!("c{i}")),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        }
        let current = ws.get_note(&note.id).unwrap().unwrap();
        assert_eq!(current.version, 16);
        assert_eq!(current.history.len(), 10);
        assert_eq!(current.history[0].content, "c5");
        assert_eq!(current.history[9].content, "c14");
    }

    #[test]
    fn test_update_note_absent_fields_unchanged() {
        let (mut ws, _temp) = test_workspace();
        let note = ws
            .create_note(NewNote {
                title: "Keep".to_string(),
                content: "body".to_string(),
                tags: vec!["alpha".to_string()],
                ..NewNote::default()
            })
            .unwrap();

        let updated = ws
            .update_note(
                &note.id,
                NotePatch {
                    is_pinned: Some(true),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Keep");
        assert_eq!(updated.content, "body");
        assert_eq!(updated.tags, vec!["alpha".to_string()]);
        assert!(updated.is_pinned);
        // Flag-only change is not an edit.
        assert_eq!(updated.version, 1);
    }

    #[test]
    fn test_delete_note() {
        let (mut ws, _temp) = test_workspace();
        let note = quick_note(&mut ws, "gone", "soon");
        assert!(ws.delete_note(&note.id).unwrap());
        assert!(ws.get_note(&note.id).unwrap().is_none());
        assert!(!ws.delete_note(&note.id).unwrap());
    }

    #[test]
    fn test_metadata_recomputed_on_update() {
        let (mut ws, _temp) = test_workspace();
        let content = vec!["word"; 1000].join(" ");
        let note = quick_note(&mut ws, "long", &content);
        assert_eq!(note.metadata.word_count, 1000);
        assert_eq!(note.metadata.reading_time, 5);

        let updated = ws
            .update_note(
                &note.id,
                NotePatch {
                    content: Some("<p>two words</p>".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.metadata.word_count, 2);
        assert_eq!(updated.metadata.reading_time, 1);
    }

    #[test]
    fn test_duplicate_note() {
        let (mut ws, _temp) = test_workspace();
        let work = ws.category_id_by_name("Work").unwrap().unwrap();
        let original = ws
            .create_note(NewNote {
                title: "Plan".to_string(),
                content: "body".to_string(),
                category: Some(work.clone()),
                tags: vec!["q1".to_string()],
                is_pinned: true,
                priority: Priority::High,
                ..NewNote::default()
            })
            .unwrap();

        let copy = ws.duplicate_note(&original.id).unwrap();
        assert_eq!(copy.title, "Plan (Copy)");
        assert_eq!(copy.content, "body");
        assert_eq!(copy.category, Some(work.clone()));
        assert_eq!(copy.tags, vec!["q1".to_string()]);
        assert_eq!(copy.priority, Priority::High);
        assert!(!copy.is_pinned);
        assert_eq!(copy.version, 1);
        assert!(copy.history.is_empty());
        assert_ne!(copy.id, original.id);

        // Both notes now count towards Work.
        let cat = ws.get_category(&work).unwrap().unwrap();
        assert_eq!(cat.metadata.note_count, 2);
        assert_counters_consistent(&ws);
    }

    #[test]
    fn test_toggles() {
        let (mut ws, _temp) = test_workspace();
        let note = quick_note(&mut ws, "flags", "x");
        assert!(ws.toggle_pin(&note.id).unwrap().is_pinned);
        assert!(!ws.toggle_pin(&note.id).unwrap().is_pinned);
        assert!(ws.toggle_public(&note.id).unwrap().is_public);
        assert!(ws.toggle_archive(&note.id).unwrap().is_archived);
    }

    #[test]
    fn test_archive_toggle_adjusts_counter() {
        let (mut ws, _temp) = test_workspace();
        let work = ws.category_id_by_name("Work").unwrap().unwrap();
        let note = ws
            .create_note(NewNote {
                title: "n".to_string(),
                content: "c".to_string(),
                category: Some(work.clone()),
                ..NewNote::default()
            })
            .unwrap();
        assert_eq!(ws.get_category(&work).unwrap().unwrap().metadata.note_count, 1);

        ws.toggle_archive(&note.id).unwrap();
        assert_eq!(ws.get_category(&work).unwrap().unwrap().metadata.note_count, 0);

        ws.toggle_archive(&note.id).unwrap();
        assert_eq!(ws.get_category(&work).unwrap().unwrap().metadata.note_count, 1);
        assert_counters_consistent(&ws);
    }

    #[test]
    fn test_unarchive_after_category_deleted_clears_reference() {
        let (mut ws, _temp) = test_workspace();
        let work = ws.category_id_by_name("Work").unwrap().unwrap();
        let note = ws
            .create_note(NewNote {
                title: "stashed".to_string(),
                content: "c".to_string(),
                category: Some(work.clone()),
                ..NewNote::default()
            })
            .unwrap();

        ws.toggle_archive(&note.id).unwrap();
        // Deletable: the only referencing note is archived, so the counter
        // is zero.
        ws.delete_category(&work).unwrap();

        let restored = ws.toggle_archive(&note.id).unwrap();
        assert!(!restored.is_archived);
        assert_eq!(restored.category, None);
        assert_counters_consistent(&ws);
    }

    #[test]
    fn test_list_notes_filters_and_pagination() {
        let (mut ws, _temp) = test_workspace();
        let work = ws.category_id_by_name("Work").unwrap().unwrap();
        for i in 0..25 {
            ws.create_note(NewNote {
                title: format!("note {i:02}"),
                content: format!("body {i}"),
                category: if i % 2 == 0 { Some(work.clone()) } else { None },
                tags: if i % 5 == 0 {
                    vec!["five".to_string()]
                } else {
                    vec![]
                },
                ..NewNote::default()
            })
            .unwrap();
        }

        let page = ws
            .list_notes(&NoteFilter {
                page: 2,
                page_size: 10,
                sort_by: SortField::Title,
                sort_dir: SortDirection::Asc,
                ..NoteFilter::default()
            })
            .unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next);
        assert!(page.pagination.has_prev);
        assert_eq!(page.items[0].title, "note 10");

        let last = ws
            .list_notes(&NoteFilter {
                page: 3,
                page_size: 10,
                ..NoteFilter::default()
            })
            .unwrap();
        assert_eq!(last.items.len(), 5);
        assert!(!last.pagination.has_next);

        let by_category = ws
            .list_notes(&NoteFilter {
                category: Some(work.clone()),
                page_size: 50,
                ..NoteFilter::default()
            })
            .unwrap();
        assert_eq!(by_category.pagination.total, 13);

        let by_tag = ws
            .list_notes(&NoteFilter {
                tags: vec!["five".to_string()],
                page_size: 50,
                ..NoteFilter::default()
            })
            .unwrap();
        assert_eq!(by_tag.pagination.total, 5);

        let by_search = ws
            .list_notes(&NoteFilter {
                search: Some("BODY 17".to_string()),
                ..NoteFilter::default()
            })
            .unwrap();
        assert_eq!(by_search.pagination.total, 1);
        assert_eq!(by_search.items[0].title, "note 17");
    }

    #[test]
    fn test_bulk_delete_reports_per_item() {
        let (mut ws, _temp) = test_workspace();
        let a = quick_note(&mut ws, "a", "1");
        let b = quick_note(&mut ws, "b", "2");
        let ids = vec![a.id.clone(), "missing".to_string(), b.id.clone()];
        let outcome = ws.bulk_delete(&ids).unwrap();
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].id, "missing");
    }

    #[test]
    fn test_bulk_move_updates_counters() {
        let (mut ws, _temp) = test_workspace();
        let work = ws.category_id_by_name("Work").unwrap().unwrap();
        let personal = ws.category_id_by_name("Personal").unwrap().unwrap();
        let a = ws
            .create_note(NewNote {
                title: "a".to_string(),
                content: "1".to_string(),
                category: Some(work.clone()),
                ..NewNote::default()
            })
            .unwrap();
        let b = quick_note(&mut ws, "b", "2");

        let outcome = ws
            .bulk_move(&[a.id.clone(), b.id.clone()], Some(&personal))
            .unwrap();
        assert_eq!(outcome.succeeded, 2);
        assert!(outcome.errors.is_empty());

        assert_eq!(ws.get_category(&work).unwrap().unwrap().metadata.note_count, 0);
        assert_eq!(
            ws.get_category(&personal).unwrap().unwrap().metadata.note_count,
            2
        );
        assert_counters_consistent(&ws);
    }

    #[test]
    fn test_user_stats() {
        let (mut ws, _temp) = test_workspace();
        assert_eq!(ws.user_stats().unwrap(), UserStats::default());

        let a = quick_note(&mut ws, "a", "one two three");
        quick_note(&mut ws, "b", "four five");
        ws.toggle_pin(&a.id).unwrap();
        ws.toggle_public(&a.id).unwrap();

        let stats = ws.user_stats().unwrap();
        assert_eq!(stats.total_notes, 2);
        assert_eq!(stats.total_words, 5);
        assert_eq!(stats.pinned_notes, 1);
        assert_eq!(stats.public_notes, 1);
        assert_eq!(stats.archived_notes, 0);
    }
}
