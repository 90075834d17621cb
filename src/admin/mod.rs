//! Server-rendered record management for persons, genres and film works.

pub mod form;
pub mod inline;
pub mod resources;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use self::{
    form::FormData,
    inline::InlineState,
    resources::{FormValues, Resource},
};
use crate::{
    AppState,
    error::AppError,
    templates::{self, FormPage},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(|| async { Redirect::permanent("/admin/") }))
        .route("/admin/", get(index))
        .route("/admin/{resource}/", get(change_list))
        .route("/admin/{resource}/add", get(add_form).post(create))
        .route("/admin/{resource}/{id}", get(edit_form).post(update))
        .route("/admin/{resource}/{id}/delete", get(confirm_delete).post(delete))
}

/// Admin-side error: same taxonomy as [`AppError`], rendered as an HTML page.
#[derive(Debug)]
pub struct AdminError(AppError);

impl From<AppError> for AdminError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for AdminError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body = templates::error_page(self.0.public_message());
        (status, Html(body)).into_response()
    }
}

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    q: String,
    page: Option<String>,
}

fn resolve(slug: &str) -> Result<Resource, AppError> {
    Resource::from_slug(slug)
        .ok_or_else(|| AppError::NotFound(format!("unknown admin section '{slug}'")))
}

fn parse_id(resource: Resource, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        AppError::NotFound(format!("{} with id {raw} does not exist", resource.descriptor().name))
    })
}

async fn inline_state(
    db: &DatabaseConnection,
    resource: Resource,
    id: Option<Uuid>,
) -> AdminResult<Option<InlineState>> {
    if !resource.has_inlines() {
        return Ok(None);
    }
    Ok(Some(InlineState::load(db, id).await?))
}

pub async fn index() -> Html<String> {
    Html(templates::admin_index())
}

pub async fn change_list(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(q): Query<ListQuery>,
) -> AdminResult<Html<String>> {
    let resource = resolve(&slug)?;
    let listing = resources::list(&state.db, resource, &q.q, q.page.as_deref()).await?;
    Ok(Html(templates::change_list(resource, &listing, &q.q)))
}

pub async fn add_form(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AdminResult<Html<String>> {
    let resource = resolve(&slug)?;
    let inline = inline_state(&state.db, resource, None).await?;
    let values = FormValues::new();
    Ok(Html(templates::change_form(&FormPage {
        resource,
        id: None,
        values: &values,
        error: None,
        inline: inline.as_ref(),
    })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AdminResult<Response> {
    let resource = resolve(&slug)?;
    submit(&state.db, resource, None, FormData::from_pairs(pairs)).await
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, String)>,
) -> AdminResult<Html<String>> {
    let resource = resolve(&slug)?;
    let id = parse_id(resource, &id)?;
    let values = resources::load(&state.db, resource, id).await?;
    let inline = inline_state(&state.db, resource, Some(id)).await?;
    Ok(Html(templates::change_form(&FormPage {
        resource,
        id: Some(id),
        values: &values,
        error: None,
        inline: inline.as_ref(),
    })))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AdminResult<Response> {
    let resource = resolve(&slug)?;
    let id = parse_id(resource, &id)?;
    submit(&state.db, resource, Some(id), FormData::from_pairs(pairs)).await
}

/// Saves the form and redirects to the change list, or re-renders the form
/// with the validation message.
async fn submit(
    db: &DatabaseConnection,
    resource: Resource,
    id: Option<Uuid>,
    form: FormData,
) -> AdminResult<Response> {
    match resources::save(db, resource, id, &form).await {
        Ok(saved) => {
            tracing::info!(
                resource = resource.slug(),
                id = %saved,
                created = id.is_none(),
                "saved"
            );
            Ok(Redirect::to(&templates::list_url(resource)).into_response())
        }
        Err(AppError::Validation(message)) => {
            tracing::debug!(resource = resource.slug(), reason = %message, "rejected form");
            let inline = if resource.has_inlines() {
                Some(InlineState::from_form(db, &form).await?)
            } else {
                None
            };
            let body = templates::change_form(&FormPage {
                resource,
                id,
                values: form.values(),
                error: Some(message.as_str()),
                inline: inline.as_ref(),
            });
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn confirm_delete(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, String)>,
) -> AdminResult<Html<String>> {
    let resource = resolve(&slug)?;
    let id = parse_id(resource, &id)?;
    let name = resources::display_name(&state.db, resource, id).await?;
    Ok(Html(templates::delete_confirm(resource, id, &name)))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, String)>,
) -> AdminResult<Redirect> {
    let resource = resolve(&slug)?;
    let id = parse_id(resource, &id)?;
    resources::delete(&state.db, resource, id).await?;
    tracing::info!(resource = resource.slug(), %id, "deleted");
    Ok(Redirect::to(&templates::list_url(resource)))
}
