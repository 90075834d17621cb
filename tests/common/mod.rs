#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use movies::{
    AppState,
    entities::{
        film_work::{self, FilmWorkType},
        genre, genre_film_work, person,
        person_film_work::{self, Role},
    },
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Fresh in-memory database with the catalog schema applied, plus the app
/// router bound to it.
pub async fn setup() -> (Router, DatabaseConnection) {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("Failed to open in-memory database");
    movies::db::prepare(&db).await.expect("Failed to prepare database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    let state = Arc::new(AppState { db: db.clone() });
    (movies::app(state), db)
}

pub async fn film(db: &DatabaseConnection, title: &str) -> film_work::Model {
    film_work::ActiveModel {
        title: Set(title.to_string()),
        description: Set(format!("About {title}")),
        creation_date: Set(None),
        certificate: Set(String::new()),
        file_path: Set(String::new()),
        rating: Set(Some(7.5)),
        kind: Set(FilmWorkType::Movie),
        ..film_work::ActiveModel::new()
    }
    .insert(db)
    .await
    .expect("Failed to insert film work")
}

pub async fn person(db: &DatabaseConnection, full_name: &str) -> person::Model {
    person::ActiveModel {
        full_name: Set(full_name.to_string()),
        birth_date: Set(None),
        ..person::ActiveModel::new()
    }
    .insert(db)
    .await
    .expect("Failed to insert person")
}

pub async fn genre(db: &DatabaseConnection, name: &str) -> genre::Model {
    genre::ActiveModel {
        name: Set(name.to_string()),
        description: Set(String::new()),
        ..genre::ActiveModel::new()
    }
    .insert(db)
    .await
    .expect("Failed to insert genre")
}

pub async fn cast(
    db: &DatabaseConnection,
    film_work_id: Uuid,
    person_id: Uuid,
    role: Role,
) -> Result<person_film_work::Model, sea_orm::DbErr> {
    person_film_work::ActiveModel {
        film_work_id: Set(film_work_id),
        person_id: Set(person_id),
        role: Set(role),
        ..person_film_work::ActiveModel::new()
    }
    .insert(db)
    .await
}

pub async fn tag(
    db: &DatabaseConnection,
    film_work_id: Uuid,
    genre_id: Uuid,
) -> Result<genre_film_work::Model, sea_orm::DbErr> {
    genre_film_work::ActiveModel {
        film_work_id: Set(film_work_id),
        genre_id: Set(genre_id),
        ..genre_film_work::ActiveModel::new()
    }
    .insert(db)
    .await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    form: Option<&[(&str, &str)]>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match form {
        Some(pairs) => {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            Body::from(encode_form(pairs))
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("Failed to build request"))
        .await
        .expect("router is infallible");

    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    TestResponse { status, location, body: String::from_utf8_lossy(&bytes).into_owned() }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

pub async fn post_form(app: &Router, uri: &str, pairs: &[(&str, &str)]) -> TestResponse {
    send(app, Method::POST, uri, Some(pairs)).await
}

pub fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
