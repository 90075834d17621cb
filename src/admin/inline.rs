//! Genre and person association rows edited inline on the film work form.
//!
//! Rows are submitted as `{prefix}-{index}-{field}` with a `{prefix}-TOTAL`
//! count. Existing rows carry their `id`; a checked `DELETE` removes them.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::form::FormData;
use crate::{
    entities::{
        genre, genre_film_work, person,
        person_film_work::{self, Role},
    },
    error::{AppError, AppResult},
};

pub const GENRE_PREFIX: &str = "genres";
pub const PERSON_PREFIX: &str = "persons";

const MAX_ROWS: usize = 1000;

pub fn field_name(prefix: &str, index: usize, field: &str) -> String {
    format!("{prefix}-{index}-{field}")
}

pub fn total_name(prefix: &str) -> String {
    format!("{prefix}-TOTAL")
}

fn total(form: &FormData, prefix: &str) -> usize {
    form.raw(&total_name(prefix)).parse::<usize>().unwrap_or(0).min(MAX_ROWS)
}

fn uuid_field(form: &FormData, name: &str) -> Option<Uuid> {
    Uuid::parse_str(form.raw(name)).ok()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenreRow {
    pub id: Option<Uuid>,
    pub genre_id: Option<Uuid>,
    pub delete: bool,
}

impl GenreRow {
    pub fn parse_all(form: &FormData) -> Vec<Self> {
        (0..total(form, GENRE_PREFIX))
            .map(|i| Self {
                id: uuid_field(form, &field_name(GENRE_PREFIX, i, "id")),
                genre_id: uuid_field(form, &field_name(GENRE_PREFIX, i, "genre")),
                delete: form.checked(&field_name(GENRE_PREFIX, i, "DELETE")),
            })
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonRow {
    pub id: Option<Uuid>,
    pub person_id: Option<Uuid>,
    pub role: Option<Role>,
    pub delete: bool,
}

impl PersonRow {
    pub fn parse_all(form: &FormData) -> Vec<Self> {
        (0..total(form, PERSON_PREFIX))
            .map(|i| Self {
                id: uuid_field(form, &field_name(PERSON_PREFIX, i, "id")),
                person_id: uuid_field(form, &field_name(PERSON_PREFIX, i, "person")),
                role: Role::from_code(form.raw(&field_name(PERSON_PREFIX, i, "role"))),
                delete: form.checked(&field_name(PERSON_PREFIX, i, "DELETE")),
            })
            .collect()
    }
}

/// An option of an inline select.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub id: Uuid,
    pub label: String,
}

/// Everything the film work form needs to render its inline sections.
#[derive(Clone, Debug, Default)]
pub struct InlineState {
    pub genres: Vec<GenreRow>,
    pub persons: Vec<PersonRow>,
    pub genre_choices: Vec<Choice>,
    pub person_choices: Vec<Choice>,
}

impl InlineState {
    /// Stored rows of `film_work_id`, or none for a new film work.
    pub async fn load(db: &DatabaseConnection, film_work_id: Option<Uuid>) -> AppResult<Self> {
        let mut state = Self::with_choices(db).await?;
        let Some(film_work_id) = film_work_id else {
            return Ok(state);
        };

        state.genres = genre_film_work::Entity::find()
            .filter(genre_film_work::Column::FilmWorkId.eq(film_work_id))
            .order_by_asc(genre_film_work::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(|m| GenreRow { id: Some(m.id), genre_id: Some(m.genre_id), delete: false })
            .collect();

        state.persons = person_film_work::Entity::find()
            .filter(person_film_work::Column::FilmWorkId.eq(film_work_id))
            .order_by_asc(person_film_work::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(|m| PersonRow {
                id: Some(m.id),
                person_id: Some(m.person_id),
                role: Some(m.role),
                delete: false,
            })
            .collect();

        Ok(state)
    }

    /// Rows as submitted, for re-rendering a rejected form.
    pub async fn from_form(db: &DatabaseConnection, form: &FormData) -> AppResult<Self> {
        let mut state = Self::with_choices(db).await?;
        state.genres = GenreRow::parse_all(form)
            .into_iter()
            .filter(|row| row.id.is_some() || row.genre_id.is_some())
            .collect();
        state.persons = PersonRow::parse_all(form)
            .into_iter()
            .filter(|row| row.id.is_some() || row.person_id.is_some())
            .collect();
        Ok(state)
    }

    async fn with_choices(db: &DatabaseConnection) -> AppResult<Self> {
        let genre_choices = genre::Entity::find()
            .order_by_asc(genre::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|g| Choice { id: g.id, label: g.name })
            .collect();
        let person_choices = person::Entity::find()
            .order_by_asc(person::Column::FullName)
            .all(db)
            .await?
            .into_iter()
            .map(|p| Choice { id: p.id, label: p.full_name })
            .collect();
        Ok(Self { genre_choices, person_choices, ..Default::default() })
    }
}

fn row_error(kind: &str, index: usize, message: &str) -> AppError {
    AppError::Validation(format!("{kind} row {}: {message}", index + 1))
}

pub async fn save_genres(
    txn: &DatabaseTransaction,
    film_work_id: Uuid,
    rows: &[GenreRow],
) -> AppResult<()> {
    let existing: HashMap<Uuid, genre_film_work::Model> = genre_film_work::Entity::find()
        .filter(genre_film_work::Column::FilmWorkId.eq(film_work_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    // deletions first so a removed pair can be re-added in the same submit
    for id in rows.iter().filter(|r| r.delete).filter_map(|r| r.id) {
        if existing.contains_key(&id) {
            genre_film_work::Entity::delete_by_id(id).exec(txn).await?;
        }
    }

    for (index, row) in rows.iter().enumerate().filter(|(_, r)| !r.delete) {
        match (row.id, row.genre_id) {
            (Some(id), Some(genre_id)) => {
                let model = existing
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| row_error("Genre", index, "unknown row"))?;
                if model.genre_id != genre_id {
                    let mut model = model.into_active_model();
                    model.genre_id = Set(genre_id);
                    model.update(txn).await?;
                }
            }
            (Some(_), None) => {
                return Err(row_error("Genre", index, "select a genre or mark it for deletion"));
            }
            (None, Some(genre_id)) => {
                genre_film_work::ActiveModel {
                    film_work_id: Set(film_work_id),
                    genre_id: Set(genre_id),
                    ..genre_film_work::ActiveModel::new()
                }
                .insert(txn)
                .await?;
            }
            (None, None) => {}
        }
    }
    Ok(())
}

pub async fn save_persons(
    txn: &DatabaseTransaction,
    film_work_id: Uuid,
    rows: &[PersonRow],
) -> AppResult<()> {
    let existing: HashMap<Uuid, person_film_work::Model> = person_film_work::Entity::find()
        .filter(person_film_work::Column::FilmWorkId.eq(film_work_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    for id in rows.iter().filter(|r| r.delete).filter_map(|r| r.id) {
        if existing.contains_key(&id) {
            person_film_work::Entity::delete_by_id(id).exec(txn).await?;
        }
    }

    for (index, row) in rows.iter().enumerate().filter(|(_, r)| !r.delete) {
        match (row.id, row.person_id, row.role) {
            (None, None, None) => {}
            (_, None, _) => return Err(row_error("Person", index, "select a person")),
            (_, _, None) => return Err(row_error("Person", index, "select a role")),
            (Some(id), Some(person_id), Some(role)) => {
                let model = existing
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| row_error("Person", index, "unknown row"))?;
                if model.person_id != person_id || model.role != role {
                    let mut model = model.into_active_model();
                    model.person_id = Set(person_id);
                    model.role = Set(role);
                    model.update(txn).await?;
                }
            }
            (None, Some(person_id), Some(role)) => {
                person_film_work::ActiveModel {
                    film_work_id: Set(film_work_id),
                    person_id: Set(person_id),
                    role: Set(role),
                    ..person_film_work::ActiveModel::new()
                }
                .insert(txn)
                .await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn parses_rows_up_to_total() {
        let genre = Uuid::new_v4();
        let row = Uuid::new_v4();
        let (genre_s, row_s) = (genre.to_string(), row.to_string());
        let f = form(&[
            ("genres-TOTAL", "2"),
            ("genres-0-id", row_s.as_str()),
            ("genres-0-genre", genre_s.as_str()),
            ("genres-0-DELETE", "on"),
            ("genres-1-genre", ""),
            ("genres-2-genre", genre_s.as_str()),
        ]);
        let rows = GenreRow::parse_all(&f);
        assert_eq!(
            rows,
            vec![
                GenreRow { id: Some(row), genre_id: Some(genre), delete: true },
                GenreRow::default(),
            ]
        );
    }

    #[test]
    fn person_rows_read_role_codes() {
        let person = Uuid::new_v4();
        let person_s = person.to_string();
        let f = form(&[
            ("persons-TOTAL", "2"),
            ("persons-0-person", person_s.as_str()),
            ("persons-0-role", "director"),
            ("persons-1-role", "stunt double"),
        ]);
        let rows = PersonRow::parse_all(&f);
        assert_eq!(rows[0].role, Some(Role::Director));
        assert_eq!(rows[0].person_id, Some(person));
        assert_eq!(rows[1].role, None);
    }

    #[test]
    fn missing_total_means_no_rows() {
        assert!(GenreRow::parse_all(&form(&[("genres-0-genre", "x")])).is_empty());
        assert!(PersonRow::parse_all(&form(&[("persons-TOTAL", "lots")])).is_empty());
    }
}
