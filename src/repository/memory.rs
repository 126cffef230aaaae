//! In-memory repositories
//!
//! The store mirrors the relational layout (`authors`, `books`, `genres`,
//! `book_genres`) and enforces the same constraints as the database schema:
//! unique isbn, existing author and genre references, and no author deletion
//! while books still reference it.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, Genre},
    repository::{AuthorRepository, BookRepository, GenreRepository},
};

#[derive(Debug, Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    genres: BTreeMap<i64, Genre>,
    /// (book_id, genre_id)
    book_genres: BTreeSet<(i64, i64)>,
    author_seq: i64,
    book_seq: i64,
    genre_seq: i64,
}

impl Tables {
    fn book(&self, book: &Book) -> Book {
        let genre_ids = match book.id {
            Some(id) => self
                .book_genres
                .iter()
                .filter(|(book_id, _)| *book_id == id)
                .map(|(_, genre_id)| *genre_id)
                .collect(),
            None => BTreeSet::new(),
        };
        book.clone().with_genre_ids(genre_ids)
    }

    fn genre(&self, genre: &Genre) -> Genre {
        let book_ids = match genre.id {
            Some(id) => self
                .book_genres
                .iter()
                .filter(|(_, genre_id)| *genre_id == id)
                .map(|(book_id, _)| *book_id)
                .collect(),
            None => BTreeSet::new(),
        };
        genre.clone().with_book_ids(book_ids)
    }

    fn books_where(&self, predicate: impl Fn(&Book) -> bool) -> Vec<Book> {
        self.books
            .values()
            .filter(|&book| predicate(book))
            .map(|book| self.book(book))
            .collect()
    }

    fn remove_book(&mut self, id: i64) -> bool {
        self.book_genres.retain(|(book_id, _)| *book_id != id);
        self.books.remove(&id).is_some()
    }
}

/// Shared handle to the in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Debug, Clone)]
pub struct MemoryAuthorRepository {
    store: MemoryStore,
}

impl MemoryAuthorRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthorRepository for MemoryAuthorRepository {
    async fn find_all(&self) -> AppResult<Vec<Author>> {
        let tables = self.store.tables.read().await;
        Ok(tables.authors.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Author>> {
        let tables = self.store.tables.read().await;
        Ok(tables.authors.get(&id).cloned())
    }

    async fn save(&self, mut author: Author) -> AppResult<Author> {
        let mut tables = self.store.tables.write().await;
        let id = match author.id {
            Some(id) if tables.authors.contains_key(&id) => id,
            Some(id) => return Err(AppError::not_found("Author", id)),
            None => {
                tables.author_seq += 1;
                tables.author_seq
            }
        };
        author.id = Some(id);
        tables.authors.insert(id, author.clone());
        Ok(author)
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tables = self.store.tables.write().await;
        if tables.books.values().any(|book| book.author_id() == id) {
            return Err(AppError::Validation(format!(
                "Author {} still owns books",
                id
            )));
        }
        tables
            .authors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Author", id))
    }

    async fn delete_with_books(&self, id: i64) -> AppResult<u64> {
        let mut tables = self.store.tables.write().await;
        if !tables.authors.contains_key(&id) {
            return Err(AppError::not_found("Author", id));
        }
        let book_ids: Vec<i64> = tables
            .books
            .values()
            .filter(|book| book.author_id() == id)
            .filter_map(|book| book.id)
            .collect();
        for book_id in &book_ids {
            tables.remove_book(*book_id);
        }
        tables.authors.remove(&id);
        Ok(book_ids.len() as u64)
    }
}

#[derive(Debug, Clone)]
pub struct MemoryBookRepository {
    store: MemoryStore,
}

impl MemoryBookRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn find_all(&self) -> AppResult<Vec<Book>> {
        let tables = self.store.tables.read().await;
        Ok(tables.books_where(|_| true))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let tables = self.store.tables.read().await;
        Ok(tables.books.get(&id).map(|book| tables.book(book)))
    }

    async fn find_by_author_id(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let tables = self.store.tables.read().await;
        Ok(tables.books_where(|book| book.author_id() == author_id))
    }

    async fn find_by_title_containing_ignore_case(&self, title: &str) -> AppResult<Vec<Book>> {
        let needle = title.to_lowercase();
        let tables = self.store.tables.read().await;
        Ok(tables.books_where(|book| book.title.to_lowercase().contains(&needle)))
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .books
            .values()
            .find(|book| book.isbn == isbn)
            .map(|book| tables.book(book)))
    }

    async fn save(&self, book: Book) -> AppResult<Book> {
        let mut tables = self.store.tables.write().await;

        if !tables.authors.contains_key(&book.author_id()) {
            return Err(AppError::Validation(format!(
                "Author {} does not exist",
                book.author_id()
            )));
        }
        if tables
            .books
            .values()
            .any(|other| other.isbn == book.isbn && other.id != book.id)
        {
            return Err(AppError::Validation(
                "A book with this ISBN already exists".to_string(),
            ));
        }
        let (added, removed) = book.genre_changes();
        if let Some(missing) = added.iter().find(|id| !tables.genres.contains_key(*id)) {
            return Err(AppError::Validation(format!(
                "Genre {} does not exist",
                missing
            )));
        }

        let id = match book.id {
            Some(id) if tables.books.contains_key(&id) => id,
            Some(id) => return Err(AppError::not_found("Book", id)),
            None => {
                tables.book_seq += 1;
                tables.book_seq
            }
        };

        let mut row = book.with_genre_ids(BTreeSet::new());
        row.id = Some(id);
        tables.books.insert(id, row.clone());
        for genre_id in removed {
            tables.book_genres.remove(&(id, genre_id));
        }
        for genre_id in added {
            tables.book_genres.insert((id, genre_id));
        }

        tracing::debug!("Saved book id={} in memory", id);
        Ok(tables.book(&row))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tables = self.store.tables.write().await;
        if !tables.remove_book(id) {
            return Err(AppError::not_found("Book", id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryGenreRepository {
    store: MemoryStore,
}

impl MemoryGenreRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GenreRepository for MemoryGenreRepository {
    async fn find_all(&self) -> AppResult<Vec<Genre>> {
        let tables = self.store.tables.read().await;
        Ok(tables.genres.values().map(|genre| tables.genre(genre)).collect())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Genre>> {
        let tables = self.store.tables.read().await;
        Ok(tables.genres.get(&id).map(|genre| tables.genre(genre)))
    }

    async fn save(&self, genre: Genre) -> AppResult<Genre> {
        let mut tables = self.store.tables.write().await;
        let id = match genre.id {
            Some(id) if tables.genres.contains_key(&id) => id,
            Some(id) => return Err(AppError::not_found("Genre", id)),
            None => {
                tables.genre_seq += 1;
                tables.genre_seq
            }
        };

        let mut row = genre.with_book_ids(BTreeSet::new());
        row.id = Some(id);
        tables.genres.insert(id, row.clone());
        Ok(tables.genre(&row))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tables = self.store.tables.write().await;
        tables.book_genres.retain(|(_, genre_id)| *genre_id != id);
        tables
            .genres
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Genre", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateBook;

    struct Fixture {
        authors: MemoryAuthorRepository,
        books: MemoryBookRepository,
        genres: MemoryGenreRepository,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::default();
        Fixture {
            authors: MemoryAuthorRepository::new(store.clone()),
            books: MemoryBookRepository::new(store.clone()),
            genres: MemoryGenreRepository::new(store),
        }
    }

    fn new_book(author_id: i64, title: &str, isbn: &str) -> Book {
        Book::new(
            author_id,
            CreateBook {
                title: title.to_string(),
                isbn: isbn.to_string(),
                page_count: 100,
            },
        )
    }

    async fn author(f: &Fixture) -> i64 {
        f.authors
            .save(Author::new("Tolstoy", None))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_ids() {
        let f = fixture();
        let first = f.authors.save(Author::new("A", None)).await.unwrap();
        let second = f.authors.save(Author::new("B", None)).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));

        let mut missing = Author::new("C", None);
        missing.id = Some(99);
        assert!(matches!(
            f.authors.save(missing).await,
            Err(AppError::NotFound { entity: "Author", id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_title_search_ignores_case() {
        let f = fixture();
        let author_id = author(&f).await;
        for (title, isbn) in [
            ("War and Peace", "1"),
            ("Warcraft History", "2"),
            ("Odyssey", "3"),
        ] {
            f.books.save(new_book(author_id, title, isbn)).await.unwrap();
        }

        let titles: Vec<String> = f
            .books
            .find_by_title_containing_ignore_case("war")
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();

        assert_eq!(titles, vec!["War and Peace", "Warcraft History"]);
    }

    #[tokio::test]
    async fn test_duplicate_isbn_rejected() {
        let f = fixture();
        let author_id = author(&f).await;
        f.books.save(new_book(author_id, "A", "123")).await.unwrap();

        let result = f.books.save(new_book(author_id, "B", "123")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(f.books.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_book_requires_existing_author() {
        let f = fixture();
        let result = f.books.save(new_book(7, "A", "123")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_author_with_books_cannot_be_deleted() {
        let f = fixture();
        let author_id = author(&f).await;
        f.books.save(new_book(author_id, "A", "1")).await.unwrap();

        assert!(f.authors.delete(author_id).await.is_err());
        assert!(f.authors.find_by_id(author_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_with_books() {
        let f = fixture();
        let author_id = author(&f).await;
        let other_id = f
            .authors
            .save(Author::new("Homer", None))
            .await
            .unwrap()
            .id
            .unwrap();
        let mut owned = f.books.save(new_book(author_id, "A", "1")).await.unwrap();
        f.books.save(new_book(author_id, "B", "2")).await.unwrap();
        let kept = f.books.save(new_book(other_id, "Odyssey", "3")).await.unwrap();
        let mut genre = f.genres.save(Genre::new("Classic")).await.unwrap();
        owned.attach_genre(Some(&mut genre)).unwrap();
        f.books.save(owned).await.unwrap();

        assert_eq!(f.authors.delete_with_books(author_id).await.unwrap(), 2);

        assert!(f.authors.find_by_id(author_id).await.unwrap().is_none());
        let remaining = f.books.find_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
        let genre = f.genres.find_by_id(genre.id.unwrap()).await.unwrap().unwrap();
        assert!(genre.book_ids().is_empty());

        assert!(matches!(
            f.authors.delete_with_books(author_id).await,
            Err(AppError::NotFound { entity: "Author", .. })
        ));
    }

    #[tokio::test]
    async fn test_links_visible_from_both_sides() {
        let f = fixture();
        let author_id = author(&f).await;
        let mut book = f.books.save(new_book(author_id, "A", "1")).await.unwrap();
        let mut genre = f.genres.save(Genre::new("Classic")).await.unwrap();

        book.attach_genre(Some(&mut genre)).unwrap();
        let book = f.books.save(book).await.unwrap();
        let genre = f.genres.find_by_id(genre.id.unwrap()).await.unwrap().unwrap();

        assert!(book.has_genre(genre.id.unwrap()));
        assert!(genre.has_book(book.id.unwrap()));
    }

    #[tokio::test]
    async fn test_concurrent_link_edits_merge() {
        let f = fixture();
        let author_id = author(&f).await;
        let book = f.books.save(new_book(author_id, "A", "1")).await.unwrap();
        let mut classic = f.genres.save(Genre::new("Classic")).await.unwrap();
        let mut epic = f.genres.save(Genre::new("Epic")).await.unwrap();

        // Two requests load the same book before either saves
        let mut first = f.books.find_by_id(book.id.unwrap()).await.unwrap().unwrap();
        let mut second = first.clone();
        first.attach_genre(Some(&mut classic)).unwrap();
        second.attach_genre(Some(&mut epic)).unwrap();
        f.books.save(first).await.unwrap();
        let saved = f.books.save(second).await.unwrap();

        assert!(saved.has_genre(classic.id.unwrap()));
        assert!(saved.has_genre(epic.id.unwrap()));
    }

    #[tokio::test]
    async fn test_deletes_clear_links() {
        let f = fixture();
        let author_id = author(&f).await;
        let mut kept = f.books.save(new_book(author_id, "Kept", "1")).await.unwrap();
        let mut dropped = f.books.save(new_book(author_id, "Dropped", "2")).await.unwrap();
        let mut classic = f.genres.save(Genre::new("Classic")).await.unwrap();
        let mut epic = f.genres.save(Genre::new("Epic")).await.unwrap();

        kept.attach_genre(Some(&mut classic)).unwrap();
        kept.attach_genre(Some(&mut epic)).unwrap();
        dropped.attach_genre(Some(&mut classic)).unwrap();
        let kept = f.books.save(kept).await.unwrap();
        let dropped = f.books.save(dropped).await.unwrap();

        f.books.delete(dropped.id.unwrap()).await.unwrap();
        let classic = f.genres.find_by_id(classic.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(classic.book_ids().len(), 1);
        assert!(classic.has_book(kept.id.unwrap()));

        f.genres.delete(epic.id.unwrap()).await.unwrap();
        let kept = f.books.find_by_id(kept.id.unwrap()).await.unwrap().unwrap();
        let genre_ids: Vec<i64> = kept.genre_ids().iter().copied().collect();
        assert_eq!(genre_ids, vec![classic.id.unwrap()]);
    }
}
