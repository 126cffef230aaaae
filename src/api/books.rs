//! Book endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{Book, BookSearchQuery, NewBook, UpdateBook},
};

use super::{AppJson, AppPath, AppQuery};

/// List all books
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    responses(
        (status = 200, description = "Book list", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Search books by title (case-insensitive)
#[utoipa::path(
    get,
    path = "/api/books/search",
    tag = "books",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    AppQuery(query): AppQuery<BookSearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.search(&query.title).await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get(id).await?;
    Ok(Json(book))
}

/// Create book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid book or duplicate ISBN", body = ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AppJson(data): AppJson<NewBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update book
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid book or duplicate ISBN", body = ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(data): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.update(id, data).await?;
    Ok(Json(book))
}

/// Delete book
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a genre to a book
#[utoipa::path(
    post,
    path = "/api/books/{book_id}/genres/{genre_id}",
    tag = "books",
    params(
        ("book_id" = i64, Path, description = "Book ID"),
        ("genre_id" = i64, Path, description = "Genre ID")
    ),
    responses(
        (status = 200, description = "Genre attached", body = Book),
        (status = 404, description = "Book or genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn attach_genre(
    State(state): State<crate::AppState>,
    AppPath((book_id, genre_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.attach_genre(book_id, genre_id).await?;
    Ok(Json(book))
}

/// Remove a genre from a book
#[utoipa::path(
    delete,
    path = "/api/books/{book_id}/genres/{genre_id}",
    tag = "books",
    params(
        ("book_id" = i64, Path, description = "Book ID"),
        ("genre_id" = i64, Path, description = "Genre ID")
    ),
    responses(
        (status = 200, description = "Genre detached", body = Book),
        (status = 404, description = "Book or genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn detach_genre(
    State(state): State<crate::AppState>,
    AppPath((book_id, genre_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.detach_genre(book_id, genre_id).await?;
    Ok(Json(book))
}
