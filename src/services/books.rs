//! Book service, including the genre attach/detach operations

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, Genre, NewBook, UpdateBook},
    repository::Repository,
};

/// Reject an isbn already used by a book other than `except`
async fn ensure_isbn_available(
    repository: &Repository,
    isbn: &str,
    except: Option<i64>,
) -> AppResult<()> {
    match repository.books.find_by_isbn(isbn).await? {
        Some(existing) if existing.id != except => Err(AppError::Validation(format!(
            "A book with ISBN {} already exists",
            isbn
        ))),
        _ => Ok(()),
    }
}

/// Create a book for an author already known to exist
pub(super) async fn insert_book(
    repository: &Repository,
    author_id: i64,
    data: CreateBook,
) -> AppResult<Book> {
    ensure_isbn_available(repository, &data.isbn, None).await?;
    let book = repository.books.save(Book::new(author_id, data)).await?;
    tracing::info!("Created book id={:?} for author id={}", book.id, author_id);
    Ok(book)
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn load(&self, id: i64) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn load_genre(&self, id: i64) -> AppResult<Genre> {
        self.repository
            .genres
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.find_all().await
    }

    /// Books whose title contains `title`, ignoring case
    pub async fn search(&self, title: &str) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .find_by_title_containing_ignore_case(title)
            .await
    }

    pub async fn get(&self, id: i64) -> AppResult<Book> {
        self.load(id).await
    }

    pub async fn create(&self, data: NewBook) -> AppResult<Book> {
        data.validate()?;
        if self
            .repository
            .authors
            .find_by_id(data.author_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Author", data.author_id));
        }
        insert_book(&self.repository, data.author_id, data.book).await
    }

    pub async fn update(&self, id: i64, data: UpdateBook) -> AppResult<Book> {
        data.validate()?;
        let mut book = self.load(id).await?;
        if let Some(isbn) = data.isbn.as_deref() {
            if isbn != book.isbn {
                ensure_isbn_available(&self.repository, isbn, Some(id)).await?;
            }
        }
        data.apply(&mut book);
        self.repository.books.save(book).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.load(id).await?;
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    pub async fn attach_genre(&self, book_id: i64, genre_id: i64) -> AppResult<Book> {
        let mut book = self.load(book_id).await?;
        let mut genre = self.load_genre(genre_id).await?;
        book.attach_genre(Some(&mut genre))?;
        let book = self.repository.books.save(book).await?;
        tracing::info!("Attached genre id={} to book id={}", genre_id, book_id);
        Ok(book)
    }

    pub async fn detach_genre(&self, book_id: i64, genre_id: i64) -> AppResult<Book> {
        let mut book = self.load(book_id).await?;
        let mut genre = self.load_genre(genre_id).await?;
        book.detach_genre(Some(&mut genre))?;
        let book = self.repository.books.save(book).await?;
        tracing::info!("Detached genre id={} from book id={}", genre_id, book_id);
        Ok(book)
    }
}
