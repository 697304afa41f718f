//! Catalog filter predicate.
//!
//! The same match semantics back both query paths: the data service applies
//! them via `eq`/`ilike` operators, and the local fallback applies them here.
//! Keeping one predicate is what makes the two paths provably equivalent.

use crate::models::{FilterState, Note};

/// Case-insensitive substring match, OR'd across title, description, and
/// author. Per-field, not joined: the server side is an ILIKE disjunction
/// per column, and the fallback must agree with it exactly.
fn matches_query(note: &Note, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    [
        Some(note.title.as_str()),
        note.description.as_deref(),
        note.author.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Full filter predicate: category equality AND query substring match.
pub fn matches(note: &Note, filter: &FilterState) -> bool {
    filter.category.matches(note.category) && matches_query(note, &filter.query)
}

/// Apply the predicate to an already-fetched page, preserving order.
pub fn apply(notes: Vec<Note>, filter: &FilterState) -> Vec<Note> {
    notes.into_iter().filter(|n| matches(n, filter)).collect()
}
