//! Genre endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{CreateGenre, Genre, UpdateGenre},
};

use super::{AppJson, AppPath};

/// List all genres
#[utoipa::path(
    get,
    path = "/api/genres",
    tag = "genres",
    responses(
        (status = 200, description = "Genre list", body = Vec<Genre>)
    )
)]
pub async fn list_genres(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.genres.list().await?;
    Ok(Json(genres))
}

/// Get genre by ID
#[utoipa::path(
    get,
    path = "/api/genres/{id}",
    tag = "genres",
    params(("id" = i64, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = Genre),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_genre(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Genre>> {
    let genre = state.services.genres.get(id).await?;
    Ok(Json(genre))
}

/// Create genre
#[utoipa::path(
    post,
    path = "/api/genres",
    tag = "genres",
    request_body = CreateGenre,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid genre", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<crate::AppState>,
    AppJson(data): AppJson<CreateGenre>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let genre = state.services.genres.create(data).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// Update genre
#[utoipa::path(
    put,
    path = "/api/genres/{id}",
    tag = "genres",
    params(("id" = i64, Path, description = "Genre ID")),
    request_body = UpdateGenre,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_genre(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(data): AppJson<UpdateGenre>,
) -> AppResult<Json<Genre>> {
    let genre = state.services.genres.update(id, data).await?;
    Ok(Json(genre))
}

/// Delete genre
#[utoipa::path(
    delete,
    path = "/api/genres/{id}",
    tag = "genres",
    params(("id" = i64, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_genre(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    state.services.genres.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
