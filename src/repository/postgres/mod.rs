//! PostgreSQL repositories

mod authors;
mod books;
mod genres;

pub use authors::PgAuthorRepository;
pub use books::PgBookRepository;
pub use genres::PgGenreRepository;

use crate::error::AppError;

/// Map constraint violations to validation errors; anything else stays a
/// database failure.
fn map_constraint_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = error {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("books_isbn_key") => {
                    AppError::Validation("A book with this ISBN already exists".to_string())
                }
                constraint => AppError::Validation(format!(
                    "Duplicate value violates {}",
                    constraint.unwrap_or("a unique constraint")
                )),
            };
        }
        if db.is_foreign_key_violation() {
            return match db.constraint() {
                Some("books_author_id_fkey") => AppError::Validation(
                    "Operation conflicts with the author's books".to_string(),
                ),
                constraint => AppError::Validation(format!(
                    "Referenced record does not exist or is still referenced ({})",
                    constraint.unwrap_or("foreign key")
                )),
            };
        }
        // string_data_right_truncation
        if db.code().as_deref() == Some("22001") {
            return AppError::Validation("Value is too long for its column".to_string());
        }
        if db.is_check_violation() {
            return AppError::Validation(format!(
                "Value violates {}",
                db.constraint().unwrap_or("a check constraint")
            ));
        }
    }
    AppError::Database(error)
}
