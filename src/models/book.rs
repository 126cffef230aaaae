//! Book model, request payloads and the book/genre association helpers

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{genre::Genre, not_blank, same_identity};
use crate::error::{AppError, AppResult};

/// Book record
///
/// The genre set is only changed through [`Book::attach_genre`] and
/// [`Book::detach_genre`], which keep the genre's own book set in step.
/// A loaded book also remembers the genre set it was read with, so saving
/// writes only the links that changed since.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Book {
    /// Assigned by the repository on first save
    pub id: Option<i64>,
    pub title: String,
    /// Unique across all books
    pub isbn: String,
    pub page_count: i32,
    author_id: i64,
    #[sqlx(skip)]
    #[schema(value_type = Vec<i64>)]
    genre_ids: BTreeSet<i64>,
    #[sqlx(skip)]
    #[serde(skip)]
    loaded_genre_ids: BTreeSet<i64>,
}

impl Book {
    pub fn new(author_id: i64, data: CreateBook) -> Self {
        Self {
            id: None,
            title: data.title,
            isbn: data.isbn,
            page_count: data.page_count,
            author_id,
            genre_ids: BTreeSet::new(),
            loaded_genre_ids: BTreeSet::new(),
        }
    }

    /// Owning author. Fixed for the lifetime of the book.
    pub fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn genre_ids(&self) -> &BTreeSet<i64> {
        &self.genre_ids
    }

    pub fn has_genre(&self, genre_id: i64) -> bool {
        self.genre_ids.contains(&genre_id)
    }

    /// Link `genre` to this book on both sides. No-op when `genre` is `None`.
    pub fn attach_genre(&mut self, genre: Option<&mut Genre>) -> AppResult<()> {
        let Some(genre) = genre else {
            return Ok(());
        };
        let (book_id, genre_id) = link_ids(self, genre)?;
        self.genre_ids.insert(genre_id);
        genre.book_ids.insert(book_id);
        Ok(())
    }

    /// Unlink `genre` from this book on both sides. No-op when `genre` is `None`.
    pub fn detach_genre(&mut self, genre: Option<&mut Genre>) -> AppResult<()> {
        let Some(genre) = genre else {
            return Ok(());
        };
        let (book_id, genre_id) = link_ids(self, genre)?;
        self.genre_ids.remove(&genre_id);
        genre.book_ids.remove(&book_id);
        Ok(())
    }

    /// Set the genre links as read from storage
    pub(crate) fn with_genre_ids(mut self, genre_ids: BTreeSet<i64>) -> Self {
        self.loaded_genre_ids = genre_ids.clone();
        self.genre_ids = genre_ids;
        self
    }

    /// Genre links added and removed since the book was loaded
    pub(crate) fn genre_changes(&self) -> (Vec<i64>, Vec<i64>) {
        let added = self
            .genre_ids
            .difference(&self.loaded_genre_ids)
            .copied()
            .collect();
        let removed = self
            .loaded_genre_ids
            .difference(&self.genre_ids)
            .copied()
            .collect();
        (added, removed)
    }
}

fn link_ids(book: &Book, genre: &Genre) -> AppResult<(i64, i64)> {
    match (book.id, genre.id) {
        (Some(book_id), Some(genre_id)) => Ok((book_id, genre_id)),
        _ => Err(AppError::Validation(
            "Book and genre must be saved before they can be linked".to_string(),
        )),
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self, self.id, other, other.id)
    }
}

impl Eq for Book {}

/// Book fields supplied on creation
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub title: String,
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub isbn: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Page count must not be negative"))]
    pub page_count: i32,
}

/// Create book request for the top-level books endpoint
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewBook {
    pub author_id: i64,
    #[serde(flatten)]
    #[validate(nested)]
    pub book: CreateBook,
}

/// Update book request. Absent fields are left unchanged; the owning author
/// and the genres are not part of it.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub isbn: Option<String>,
    #[validate(range(min = 0, message = "Page count must not be negative"))]
    pub page_count: Option<i32>,
}

impl UpdateBook {
    pub fn apply(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(page_count) = self.page_count {
            book.page_count = page_count;
        }
    }
}

/// Title search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookSearchQuery {
    /// Case-insensitive substring of the title
    pub title: String,
}
