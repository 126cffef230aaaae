//! Author service

use validator::Validate;

use super::books::insert_book;
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, CreateAuthor, CreateBook, UpdateAuthor},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn load(&self, id: i64) -> AppResult<Author> {
        self.repository
            .authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Author", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.find_all().await
    }

    pub async fn get(&self, id: i64) -> AppResult<Author> {
        self.load(id).await
    }

    pub async fn create(&self, data: CreateAuthor) -> AppResult<Author> {
        data.validate()?;
        let author = self.repository.authors.save(data.into()).await?;
        tracing::info!("Created author id={:?}", author.id);
        Ok(author)
    }

    pub async fn update(&self, id: i64, data: UpdateAuthor) -> AppResult<Author> {
        data.validate()?;
        let mut author = self.load(id).await?;
        data.apply(&mut author);
        self.repository.authors.save(author).await
    }

    /// Delete an author together with every book it owns. Books first, then
    /// the author, in a single storage unit.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.load(id).await?;
        let removed = self.repository.authors.delete_with_books(id).await?;
        tracing::info!("Deleted author id={} and {} book(s)", id, removed);
        Ok(())
    }

    /// Books owned by an author
    pub async fn list_books(&self, id: i64) -> AppResult<Vec<Book>> {
        self.load(id).await?;
        self.repository.books.find_by_author_id(id).await
    }

    /// Create a new book owned by an author
    pub async fn add_book(&self, id: i64, data: CreateBook) -> AppResult<Book> {
        data.validate()?;
        self.load(id).await?;
        insert_book(&self.repository, id, data).await
    }
}
