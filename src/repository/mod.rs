//! Repository layer: persistence contracts for authors, books and genres
//!
//! Each entity has an async trait. [`postgres`] implements them over a
//! connection pool; [`memory`] implements them over an in-process store with
//! the same tables and constraints.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Author, Book, Genre},
};

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Author>>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Author>>;
    /// Insert when `author.id` is `None`, update otherwise
    async fn save(&self, author: Author) -> AppResult<Author>;
    /// Fails while the author still owns books
    async fn delete(&self, id: i64) -> AppResult<()>;
    /// Delete the author's books with their genre links, then the author, as
    /// one unit. Returns the number of books removed.
    async fn delete_with_books(&self, id: i64) -> AppResult<u64>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Book>>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;
    async fn find_by_author_id(&self, author_id: i64) -> AppResult<Vec<Book>>;
    async fn find_by_title_containing_ignore_case(&self, title: &str) -> AppResult<Vec<Book>>;
    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;
    /// Insert or update the book row and write the genre links added or
    /// removed since the book was loaded
    async fn save(&self, book: Book) -> AppResult<Book>;
    /// Remove the book and its genre links
    async fn delete(&self, id: i64) -> AppResult<()>;
}

#[async_trait]
pub trait GenreRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Genre>>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Genre>>;
    /// Persists the name only; book links are owned by the book side
    async fn save(&self, genre: Genre) -> AppResult<Genre>;
    /// Remove the genre and its book links
    async fn delete(&self, id: i64) -> AppResult<()>;
}

pub type AuthorRepositoryArc = Arc<dyn AuthorRepository>;
pub type BookRepositoryArc = Arc<dyn BookRepository>;
pub type GenreRepositoryArc = Arc<dyn GenreRepository>;

/// Main repository struct holding one repository per entity
#[derive(Clone)]
pub struct Repository {
    pool: Option<Pool<Postgres>>,
    pub authors: AuthorRepositoryArc,
    pub books: BookRepositoryArc,
    pub genres: GenreRepositoryArc,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(postgres::PgAuthorRepository::new(pool.clone())),
            books: Arc::new(postgres::PgBookRepository::new(pool.clone())),
            genres: Arc::new(postgres::PgGenreRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository over a fresh in-memory store
    pub fn memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            authors: Arc::new(memory::MemoryAuthorRepository::new(store.clone())),
            books: Arc::new(memory::MemoryBookRepository::new(store.clone())),
            genres: Arc::new(memory::MemoryGenreRepository::new(store)),
            pool: None,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
