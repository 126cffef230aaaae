//! Genre model

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{not_blank, same_identity};

/// Genre record. `book_ids` is the inverse side of the book/genre link and
/// is maintained by [`crate::models::Book::attach_genre`] and
/// [`crate::models::Book::detach_genre`].
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: Option<i64>,
    pub name: String,
    #[sqlx(skip)]
    #[schema(value_type = Vec<i64>)]
    pub(super) book_ids: BTreeSet<i64>,
}

impl Genre {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            book_ids: BTreeSet::new(),
        }
    }

    pub fn book_ids(&self) -> &BTreeSet<i64> {
        &self.book_ids
    }

    pub fn has_book(&self, book_id: i64) -> bool {
        self.book_ids.contains(&book_id)
    }

    /// Set the book links as read from storage
    pub(crate) fn with_book_ids(mut self, book_ids: BTreeSet<i64>) -> Self {
        self.book_ids = book_ids;
        self
    }
}

impl PartialEq for Genre {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self, self.id, other, other.id)
    }
}

impl Eq for Genre {}

impl From<CreateGenre> for Genre {
    fn from(data: CreateGenre) -> Self {
        Genre::new(data.name)
    }
}

/// Create genre request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGenre {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: String,
}

/// Update genre request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGenre {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: Option<String>,
}

impl UpdateGenre {
    pub fn apply(self, genre: &mut Genre) {
        if let Some(name) = self.name {
            genre.name = name;
        }
    }
}
