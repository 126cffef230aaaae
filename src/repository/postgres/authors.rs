use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::map_constraint_error;
use crate::{
    error::{AppError, AppResult},
    models::Author,
    repository::AuthorRepository,
};

#[derive(Clone)]
pub struct PgAuthorRepository {
    pool: Pool<Postgres>,
}

impl PgAuthorRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for PgAuthorRepository {
    async fn find_all(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT id, name, biography FROM authors ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>(
            "SELECT id, name, biography FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save(&self, author: Author) -> AppResult<Author> {
        match author.id {
            None => {
                let row = sqlx::query_as::<_, Author>(
                    r#"
                    INSERT INTO authors (name, biography)
                    VALUES ($1, $2)
                    RETURNING id, name, biography
                    "#,
                )
                .bind(&author.name)
                .bind(&author.biography)
                .fetch_one(&self.pool)
                .await
                .map_err(map_constraint_error)?;
                Ok(row)
            }
            Some(id) => sqlx::query_as::<_, Author>(
                r#"
                UPDATE authors SET name = $2, biography = $3
                WHERE id = $1
                RETURNING id, name, biography
                "#,
            )
            .bind(id)
            .bind(&author.name)
            .bind(&author.biography)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_constraint_error)?
            .ok_or_else(|| AppError::not_found("Author", id)),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Author", id));
        }
        Ok(())
    }

    async fn delete_with_books(&self, id: i64) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        // Locking the author row holds back concurrent book inserts, whose
        // foreign key check needs a share lock on it
        let locked =
            sqlx::query_scalar::<_, i64>("SELECT id FROM authors WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::not_found("Author", id));
        }

        sqlx::query(
            r#"
            DELETE FROM book_genres
            WHERE book_id IN (SELECT id FROM books WHERE author_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let books = sqlx::query("DELETE FROM books WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_constraint_error)?;

        tx.commit().await?;
        Ok(books.rows_affected())
    }
}
