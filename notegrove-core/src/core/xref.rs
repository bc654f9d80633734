//! Cross-reference maintenance between notes and category counters.
//!
//! Every mutation that adds, removes, or reassigns a note's category
//! reference goes through this module, so `note_count` and `last_used` are
//! only ever touched from one place. The contract: after any sequence of
//! note operations, a full recount of non-archived notes per category equals
//! the maintained counter. [`verify_counters`] checks exactly that and is
//! exercised by the workspace tests.

use crate::{NotegroveError, Result};
use rusqlite::{Connection, Transaction};

/// A note's contribution to category counters: the category it references
/// (if any) and whether it is archived. Archived notes do not count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Contribution<'a> {
    pub category: Option<&'a str>,
    pub archived: bool,
}

impl<'a> Contribution<'a> {
    fn counted(self) -> Option<&'a str> {
        if self.archived {
            None
        } else {
            self.category
        }
    }
}

/// Increments a category's note counter and refreshes `last_used`.
pub(crate) fn increment(tx: &Transaction, category_id: &str, now: i64) -> Result<()> {
    let changed = tx.execute(
        "UPDATE categories
         SET note_count = note_count + 1, last_used = ?1, updated_at = ?1
         WHERE id = ?2 AND is_active = 1",
        rusqlite::params![now, category_id],
    )?;
    if changed == 0 {
        return Err(NotegroveError::NotFound(category_id.to_string()));
    }
    Ok(())
}

/// Decrements a category's note counter. `last_used` is left untouched —
/// removing a note is not a "use" of the category.
pub(crate) fn decrement(tx: &Transaction, category_id: &str, now: i64) -> Result<()> {
    let changed = tx.execute(
        "UPDATE categories
         SET note_count = note_count - 1, updated_at = ?1
         WHERE id = ?2 AND is_active = 1",
        rusqlite::params![now, category_id],
    )?;
    if changed == 0 {
        return Err(NotegroveError::NotFound(category_id.to_string()));
    }
    Ok(())
}

/// Applies the counter delta for a note moving from one counting state to
/// another. Decrements the old category and increments the new one, each
/// only when the note actually counted there.
pub(crate) fn apply_transition(
    tx: &Transaction,
    before: Contribution<'_>,
    after: Contribution<'_>,
    now: i64,
) -> Result<()> {
    let old = before.counted();
    let new = after.counted();
    if old == new {
        return Ok(());
    }
    if let Some(cat) = old {
        decrement(tx, cat, now)?;
    }
    if let Some(cat) = new {
        increment(tx, cat, now)?;
    }
    Ok(())
}

/// Recounts a category's non-archived notes directly from the notes table.
pub fn recount(conn: &Connection, category_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notes WHERE category_id = ?1 AND is_archived = 0",
        [category_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// A counter that disagrees with a full recount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterMismatch {
    pub category_id: String,
    pub stored: i64,
    pub recounted: i64,
}

/// Compares every active category's stored counter for `owner_id` against a
/// full recount. An empty result means the invariant holds.
pub fn verify_counters(conn: &Connection, owner_id: &str) -> Result<Vec<CounterMismatch>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.note_count,
                (SELECT COUNT(*) FROM notes n
                 WHERE n.category_id = c.id AND n.is_archived = 0) AS recounted
         FROM categories c
         WHERE c.owner_id = ?1 AND c.is_active = 1",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .filter(|(_, stored, recounted)| stored != recounted)
        .map(|(category_id, stored, recounted)| CounterMismatch {
            category_id,
            stored,
            recounted,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(category: Option<&str>, archived: bool) -> Contribution<'_> {
        Contribution { category, archived }
    }

    #[test]
    fn test_archived_notes_do_not_count() {
        assert_eq!(counting(Some("c1"), true).counted(), None);
        assert_eq!(counting(Some("c1"), false).counted(), Some("c1"));
        assert_eq!(counting(None, false).counted(), None);
    }
}
