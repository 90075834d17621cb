//! Read projection over film works: each record carries its genre names and
//! the person names of every role as separate, deduplicated lists.

use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, prelude::Date,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    entities::{
        film_work::{self, FilmWorkType},
        genre, genre_film_work, person,
        person_film_work::{self, Role},
    },
    error::AppResult,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilmWorkRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub creation_date: Option<Date>,
    pub rating: Option<f64>,
    #[serde(rename = "type")]
    pub kind: FilmWorkType,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
}

#[derive(Debug, FromQueryResult)]
struct NameRow {
    film_work_id: Uuid,
    name: String,
}

type NamesByFilm = HashMap<Uuid, BTreeSet<String>>;

pub async fn count(db: &DatabaseConnection) -> AppResult<u64> {
    Ok(film_work::Entity::find().count(db).await?)
}

/// Film works ordered by title (then id), `limit` records starting at `offset`.
pub async fn page(
    db: &DatabaseConnection,
    offset: u64,
    limit: u64,
) -> AppResult<Vec<FilmWorkRecord>> {
    let films = film_work::Entity::find()
        .order_by_asc(film_work::Column::Title)
        .order_by_asc(film_work::Column::Id)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    aggregate(db, films).await
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<FilmWorkRecord>> {
    let Some(film) = film_work::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    Ok(aggregate(db, vec![film]).await?.pop())
}

async fn aggregate(
    db: &DatabaseConnection,
    films: Vec<film_work::Model>,
) -> AppResult<Vec<FilmWorkRecord>> {
    if films.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = films.iter().map(|f| f.id).collect();

    let mut genres = genre_names(db, &ids).await?;
    let mut actors = person_names(db, &ids, Role::Actor).await?;
    let mut directors = person_names(db, &ids, Role::Director).await?;
    let mut writers = person_names(db, &ids, Role::Writer).await?;

    Ok(films
        .into_iter()
        .map(|film| FilmWorkRecord {
            genres: take(&mut genres, film.id),
            actors: take(&mut actors, film.id),
            directors: take(&mut directors, film.id),
            writers: take(&mut writers, film.id),
            id: film.id,
            title: film.title,
            description: film.description,
            creation_date: film.creation_date,
            rating: film.rating,
            kind: film.kind,
        })
        .collect())
}

async fn genre_names(db: &DatabaseConnection, ids: &[Uuid]) -> AppResult<NamesByFilm> {
    let rows = genre_film_work::Entity::find()
        .select_only()
        .column(genre_film_work::Column::FilmWorkId)
        .column_as(genre::Column::Name, "name")
        .inner_join(genre::Entity)
        .filter(genre_film_work::Column::FilmWorkId.is_in(ids.iter().copied()))
        .distinct()
        .into_model::<NameRow>()
        .all(db)
        .await?;
    Ok(group(rows))
}

/// Names of persons linked to `ids` through `role` only.
async fn person_names(db: &DatabaseConnection, ids: &[Uuid], role: Role) -> AppResult<NamesByFilm> {
    let rows = person_film_work::Entity::find()
        .select_only()
        .column(person_film_work::Column::FilmWorkId)
        .column_as(person::Column::FullName, "name")
        .inner_join(person::Entity)
        .filter(person_film_work::Column::FilmWorkId.is_in(ids.iter().copied()))
        .filter(person_film_work::Column::Role.eq(role))
        .distinct()
        .into_model::<NameRow>()
        .all(db)
        .await?;
    Ok(group(rows))
}

fn group(rows: Vec<NameRow>) -> NamesByFilm {
    let mut by_film = NamesByFilm::new();
    for row in rows {
        by_film.entry(row.film_work_id).or_default().insert(row.name);
    }
    by_film
}

fn take(names: &mut NamesByFilm, id: Uuid) -> Vec<String> {
    names.remove(&id).map(|set| set.into_iter().collect()).unwrap_or_default()
}
