//! Core library for Notegrove — a local-first personal note-taking
//! application with user-defined categories.
//!
//! The primary entry point is [`Workspace`], which represents an open
//! Notegrove database file bound to one owner. All note and category
//! mutations go through `Workspace` methods, and every mutation that touches
//! a note's category reference keeps the category's note counter in step via
//! the [`core::xref`] module.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    categories::{CategoryOrder, CategoryPatch, CategoryStats, MergeResult, NewCategory},
    category::{
        Category, CategoryMetadata, DEFAULT_CATEGORIES, DEFAULT_CATEGORY_COLOR,
        DEFAULT_CATEGORY_ICON, DESCRIPTION_MAX, NAME_MAX,
    },
    error::{NotegroveError, Result},
    id::generate_id,
    import_export::{
        export_to_json, export_to_markdown, export_to_pdf_pages, import_from_json,
        import_from_markdown, merge_imported_notes, validate_import_data, DuplicateStrategy,
        ImportValidation, MergeOptions, PdfPage,
    },
    note::{
        compute_metadata, normalize_tags, validate_color, validate_content, validate_title,
        HistoryEntry, Note, NoteMetadata, Priority, CONTENT_MAX, DEFAULT_NOTE_COLOR, HISTORY_MAX,
        TAG_MAX, TITLE_MAX,
    },
    search::{
        advanced_search, relevance_score, search_by_content, search_by_title, sort_by_date,
        sort_by_title, SearchQuery,
    },
    storage::Storage,
    workspace::{
        BulkError, BulkOutcome, NewNote, NoteFilter, NotePage, NotePatch, Pagination, SortDirection,
        SortField, UserStats, Workspace,
    },
    xref::{recount, verify_counters, CounterMismatch},
};
