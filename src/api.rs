//! Read-only JSON API over the film work projection.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    catalog::{self, FilmWorkRecord},
    error::{AppError, AppResult},
    pagination::{API_PAGE_SIZE, Page},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/movies", get(list_movies))
        .route("/api/v1/movies/", get(list_movies))
        .route("/api/v1/movies/{id}", get(get_movie))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoviesPage {
    pub count: u64,
    pub total_pages: u64,
    pub prev: Option<u64>,
    pub next: Option<u64>,
    pub results: Vec<FilmWorkRecord>,
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<MoviesPage>> {
    let count = catalog::count(&state.db).await?;
    let page = Page::resolve(q.page.as_deref(), count, API_PAGE_SIZE)?;
    let results = catalog::page(&state.db, page.offset(), page.per_page).await?;

    Ok(Json(MoviesPage {
        count: page.count,
        total_pages: page.total_pages,
        prev: page.prev(),
        next: page.next(),
        results,
    }))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<FilmWorkRecord>> {
    let not_found = || AppError::NotFound(format!("no movie with id {id}"));
    let movie_id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    catalog::get(&state.db, movie_id).await?.map(Json).ok_or_else(not_found)
}
