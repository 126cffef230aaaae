use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::map_constraint_error;
use crate::{
    error::{AppError, AppResult},
    models::Genre,
    repository::GenreRepository,
};

#[derive(Clone)]
pub struct PgGenreRepository {
    pool: Pool<Postgres>,
}

impl PgGenreRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fill in the inverse book links of freshly selected genre rows
    async fn with_books(&self, genres: Vec<Genre>) -> AppResult<Vec<Genre>> {
        let ids: Vec<i64> = genres.iter().filter_map(|genre| genre.id).collect();
        if ids.is_empty() {
            return Ok(genres);
        }

        let links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT genre_id, book_id FROM book_genres WHERE genre_id = ANY($1)",
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut by_genre: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for (genre_id, book_id) in links {
            by_genre.entry(genre_id).or_default().insert(book_id);
        }

        Ok(genres
            .into_iter()
            .map(|genre| {
                let book_ids = genre
                    .id
                    .and_then(|id| by_genre.remove(&id))
                    .unwrap_or_default();
                genre.with_book_ids(book_ids)
            })
            .collect())
    }
}

#[async_trait]
impl GenreRepository for PgGenreRepository {
    async fn find_all(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        self.with_books(rows).await
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Genre>> {
        let row = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.with_books(vec![row]).await?.pop())
    }

    async fn save(&self, genre: Genre) -> AppResult<Genre> {
        let id = match genre.id {
            None => sqlx::query_scalar::<_, i64>(
                "INSERT INTO genres (name) VALUES ($1) RETURNING id",
            )
            .bind(&genre.name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_constraint_error)?,
            Some(id) => sqlx::query_scalar::<_, i64>(
                "UPDATE genres SET name = $2 WHERE id = $1 RETURNING id",
            )
            .bind(id)
            .bind(&genre.name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_constraint_error)?
            .ok_or_else(|| AppError::not_found("Genre", id))?,
        };

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", id))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM book_genres WHERE genre_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Genre", id));
        }

        tx.commit().await?;
        Ok(())
    }
}
