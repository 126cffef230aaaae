//! Genre service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{CreateGenre, Genre, UpdateGenre},
    repository::Repository,
};

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn load(&self, id: i64) -> AppResult<Genre> {
        self.repository
            .genres
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.find_all().await
    }

    pub async fn get(&self, id: i64) -> AppResult<Genre> {
        self.load(id).await
    }

    pub async fn create(&self, data: CreateGenre) -> AppResult<Genre> {
        data.validate()?;
        self.repository.genres.save(data.into()).await
    }

    pub async fn update(&self, id: i64, data: UpdateGenre) -> AppResult<Genre> {
        data.validate()?;
        let mut genre = self.load(id).await?;
        data.apply(&mut genre);
        self.repository.genres.save(genre).await
    }

    /// Delete a genre; books carrying it lose the link but are kept
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.load(id).await?;
        self.repository.genres.delete(id).await?;
        tracing::info!("Deleted genre id={}", id);
        Ok(())
    }
}
