//! Data models for the catalog

pub mod author;
pub mod book;
pub mod genre;

use validator::ValidationError;

// Re-export commonly used types
pub use author::{Author, CreateAuthor, UpdateAuthor};
pub use book::{Book, BookSearchQuery, CreateBook, NewBook, UpdateBook};
pub use genre::{CreateGenre, Genre, UpdateGenre};

/// Rejects empty and whitespace-only strings
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Identity equality: persisted entities compare by id, unsaved ones only
/// equal themselves.
fn same_identity<T>(a: &T, a_id: Option<i64>, b: &T, b_id: Option<i64>) -> bool {
    match (a_id, b_id) {
        (Some(a_id), Some(b_id)) => a_id == b_id,
        _ => std::ptr::eq(a, b),
    }
}
