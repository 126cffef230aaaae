use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::map_constraint_error;
use crate::{
    error::{AppError, AppResult},
    models::Book,
    repository::BookRepository,
};

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fill in the genre links of freshly selected book rows
    async fn with_genres(&self, books: Vec<Book>) -> AppResult<Vec<Book>> {
        let ids: Vec<i64> = books.iter().filter_map(|book| book.id).collect();
        if ids.is_empty() {
            return Ok(books);
        }

        let links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT book_id, genre_id FROM book_genres WHERE book_id = ANY($1)",
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut by_book: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for (book_id, genre_id) in links {
            by_book.entry(book_id).or_default().insert(genre_id);
        }

        Ok(books
            .into_iter()
            .map(|book| {
                let genre_ids = book
                    .id
                    .and_then(|id| by_book.remove(&id))
                    .unwrap_or_default();
                book.with_genre_ids(genre_ids)
            })
            .collect())
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn find_all(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT id, title, isbn, page_count, author_id FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        self.with_genres(rows).await
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            "SELECT id, title, isbn, page_count, author_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.with_genres(vec![row]).await?.pop())
    }

    async fn find_by_author_id(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, isbn, page_count, author_id FROM books
            WHERE author_id = $1
            ORDER BY id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        self.with_genres(rows).await
    }

    async fn find_by_title_containing_ignore_case(&self, title: &str) -> AppResult<Vec<Book>> {
        // strpos instead of ILIKE so '%' and '_' in the input match literally
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, isbn, page_count, author_id FROM books
            WHERE strpos(lower(title), lower($1)) > 0
            ORDER BY id
            "#,
        )
        .bind(title)
        .fetch_all(&self.pool)
        .await?;
        self.with_genres(rows).await
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            "SELECT id, title, isbn, page_count, author_id FROM books WHERE isbn = $1",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.with_genres(vec![row]).await?.pop())
    }

    async fn save(&self, book: Book) -> AppResult<Book> {
        let (added, removed) = book.genre_changes();
        let mut tx = self.pool.begin().await?;

        let id = match book.id {
            None => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO books (title, isbn, page_count, author_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(&book.title)
            .bind(&book.isbn)
            .bind(book.page_count)
            .bind(book.author_id())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_constraint_error)?,
            Some(id) => sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE books SET title = $2, isbn = $3, page_count = $4
                WHERE id = $1
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(&book.title)
            .bind(&book.isbn)
            .bind(book.page_count)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_constraint_error)?
            .ok_or_else(|| AppError::not_found("Book", id))?,
        };

        if !removed.is_empty() {
            sqlx::query("DELETE FROM book_genres WHERE book_id = $1 AND genre_id = ANY($2)")
                .bind(id)
                .bind(&removed[..])
                .execute(&mut *tx)
                .await?;
        }

        if !added.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO book_genres (book_id, genre_id)
                SELECT $1, UNNEST($2::BIGINT[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(&added[..])
            .execute(&mut *tx)
            .await
            .map_err(map_constraint_error)?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Saved book id={} (+{} / -{} genre links)",
            id,
            added.len(),
            removed.len()
        );

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Book", id));
        }

        tx.commit().await?;
        Ok(())
    }
}
