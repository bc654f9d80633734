//! The [`Category`] record and the seed categories created for new owners.

use serde::{Deserialize, Serialize};

/// Maximum category name length in characters.
pub const NAME_MAX: usize = 50;

/// Maximum category description length in characters.
pub const DESCRIPTION_MAX: usize = 200;

/// Default category color.
pub const DEFAULT_CATEGORY_COLOR: &str = "#8b7355";

/// Default category icon.
pub const DEFAULT_CATEGORY_ICON: &str = "📁";

/// The five seed categories inserted for every new owner:
/// `(name, icon, color, order)`.
pub const DEFAULT_CATEGORIES: [(&str, &str, &str, i64); 5] = [
    ("Personal", "👤", "#4a90d9", 0),
    ("Work", "💼", "#4ecdc4", 1),
    ("Study", "📚", "#f5a623", 2),
    ("Ideas", "💡", "#bd10e0", 3),
    ("Archive", "📦", "#9b9b9b", 4),
];

/// Maintained usage metadata for a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMetadata {
    /// Denormalised count of non-archived notes referencing this category.
    pub note_count: i64,
    /// Timestamp of the most recent note assignment or the category's creation.
    pub last_used: i64,
}

/// A user-defined grouping for notes.
///
/// Names are case-insensitively unique per owner among active categories.
/// Deleting a category soft-deletes it (`is_active = false`); inactive
/// categories are excluded from listings and from the uniqueness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    /// Optional parent category by ID. A category can never be its own
    /// ancestor.
    pub parent_category: Option<String>,
    /// Manual sort position.
    pub order: i64,
    /// True for the seed categories created with a new owner.
    pub is_default: bool,
    /// Soft-delete flag.
    pub is_active: bool,
    pub metadata: CategoryMetadata,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Validates a category name: non-empty and at most [`NAME_MAX`] characters.
pub fn validate_name(name: &str) -> crate::Result<()> {
    if name.trim().is_empty() {
        return Err(crate::NotegroveError::Validation(
            "Category name is required".to_string(),
        ));
    }
    if name.chars().count() > NAME_MAX {
        return Err(crate::NotegroveError::Validation(format!(
            "Category name must be at most {NAME_MAX} characters"
        )));
    }
    Ok(())
}

/// Validates a category description length.
pub fn validate_description(description: &str) -> crate::Result<()> {
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(crate::NotegroveError::Validation(format!(
            "Description must be at most {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}
