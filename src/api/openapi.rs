//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, genres, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore Catalog API",
        version = "0.1.0",
        description = "Authors, books and genres REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        authors::list_author_books,
        authors::add_book_to_author,
        // Books
        books::list_books,
        books::search_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::attach_genre,
        books::detach_genre,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        genres::update_genre,
        genres::delete_genre,
    ),
    components(
        schemas(
            crate::models::Author,
            crate::models::CreateAuthor,
            crate::models::UpdateAuthor,
            crate::models::Book,
            crate::models::CreateBook,
            crate::models::NewBook,
            crate::models::UpdateBook,
            crate::models::Genre,
            crate::models::CreateGenre,
            crate::models::UpdateGenre,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book management"),
        (name = "genres", description = "Genre management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
