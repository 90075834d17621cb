//! Per-entity admin descriptors and the record operations behind them.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbBackend, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};
use uuid::Uuid;

use super::{
    form::{Field, FieldKind, FormData, escape_like, search_terms},
    inline::{self, GenreRow, PersonRow},
};
use crate::{
    entities::{
        film_work::{self, FilmWorkType, RATING_MAX, RATING_MIN},
        genre, person,
    },
    error::{AppError, AppResult},
    pagination::{ADMIN_PAGE_SIZE, Page},
};

pub const FILM_WORK_TYPES: &[(&str, &str)] = &[("movie", "Movie"), ("tv_show", "TV Show")];

pub mod film_work_form {
    use super::*;

    pub const TITLE: Field = Field {
        name: "title",
        label: "Title",
        kind: FieldKind::Text { max_len: 255 },
        required: true,
    };
    pub const TYPE: Field = Field {
        name: "type",
        label: "Type",
        kind: FieldKind::Choice(FILM_WORK_TYPES),
        required: true,
    };
    pub const DESCRIPTION: Field = Field {
        name: "description",
        label: "Description",
        kind: FieldKind::TextArea,
        required: false,
    };
    pub const CREATION_DATE: Field = Field {
        name: "creation_date",
        label: "Creation date",
        kind: FieldKind::Date,
        required: false,
    };
    pub const CERTIFICATE: Field = Field {
        name: "certificate",
        label: "Certificate",
        kind: FieldKind::TextArea,
        required: false,
    };
    pub const FILE_PATH: Field = Field {
        name: "file_path",
        label: "File",
        kind: FieldKind::Text { max_len: 255 },
        required: false,
    };
    pub const RATING: Field = Field {
        name: "rating",
        label: "Rating",
        kind: FieldKind::Float { min: RATING_MIN, max: RATING_MAX },
        required: false,
    };

    pub const ALL: &[Field] =
        &[TITLE, TYPE, DESCRIPTION, CREATION_DATE, CERTIFICATE, FILE_PATH, RATING];
}

pub mod person_form {
    use super::*;

    pub const FULL_NAME: Field = Field {
        name: "full_name",
        label: "Full name",
        kind: FieldKind::Text { max_len: 255 },
        required: true,
    };
    pub const BIRTH_DATE: Field =
        Field { name: "birth_date", label: "Birth date", kind: FieldKind::Date, required: false };

    pub const ALL: &[Field] = &[FULL_NAME, BIRTH_DATE];
}

pub mod genre_form {
    use super::*;

    pub const NAME: Field = Field {
        name: "name",
        label: "Name",
        kind: FieldKind::Text { max_len: 255 },
        required: true,
    };
    pub const DESCRIPTION: Field = Field {
        name: "description",
        label: "Description",
        kind: FieldKind::TextArea,
        required: false,
    };

    pub const ALL: &[Field] = &[NAME, DESCRIPTION];
}

#[derive(Debug)]
pub struct Descriptor {
    pub slug: &'static str,
    pub name: &'static str,
    pub plural: &'static str,
    pub fields: &'static [Field],
    pub columns: &'static [&'static str],
    pub search_hint: &'static str,
}

static FILM_WORK: Descriptor = Descriptor {
    slug: "film_work",
    name: "filmwork",
    plural: "filmworks",
    fields: film_work_form::ALL,
    columns: &["Title", "Type", "Creation date", "Rating"],
    search_hint: "title, description or id",
};

static PERSON: Descriptor = Descriptor {
    slug: "person",
    name: "person",
    plural: "persons",
    fields: person_form::ALL,
    columns: &["Full name", "Birth date"],
    search_hint: "full name or id",
};

static GENRE: Descriptor = Descriptor {
    slug: "genre",
    name: "genre",
    plural: "genres",
    fields: genre_form::ALL,
    columns: &["Name"],
    search_hint: "name or id",
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    FilmWork,
    Person,
    Genre,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::FilmWork, Resource::Person, Resource::Genre];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.slug() == slug)
    }

    pub fn slug(self) -> &'static str {
        self.descriptor().slug
    }

    pub fn descriptor(self) -> &'static Descriptor {
        match self {
            Resource::FilmWork => &FILM_WORK,
            Resource::Person => &PERSON,
            Resource::Genre => &GENRE,
        }
    }

    pub fn has_inlines(self) -> bool {
        self == Resource::FilmWork
    }

    fn not_found(self, id: Uuid) -> AppError {
        AppError::NotFound(format!("{} with id {id} does not exist", self.descriptor().name))
    }
}

/// One row of an admin change list.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub id: Uuid,
    pub cells: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Listing {
    pub rows: Vec<Row>,
    pub page: Page,
}

/// Field values of an edit form, keyed by field name.
pub type FormValues = HashMap<String, String>;

pub async fn list(
    db: &DatabaseConnection,
    resource: Resource,
    query: &str,
    raw_page: Option<&str>,
) -> AppResult<Listing> {
    let terms = search_terms(query);
    let backend = db.get_database_backend();
    let (rows, page) = match resource {
        Resource::FilmWork => {
            let select = film_work::Entity::find()
                .filter(search_condition(
                    backend,
                    &terms,
                    &[film_work::Column::Title, film_work::Column::Description],
                    film_work::Column::Id,
                ))
                .order_by_asc(film_work::Column::Title)
                .order_by_asc(film_work::Column::Id);
            let (models, page) = fetch_page(db, select, raw_page).await?;
            let rows = models
                .into_iter()
                .map(|m| Row {
                    id: m.id,
                    cells: vec![
                        m.title,
                        m.kind.label().to_string(),
                        display_opt(m.creation_date),
                        display_opt(m.rating),
                    ],
                })
                .collect();
            (rows, page)
        }
        Resource::Person => {
            let select = person::Entity::find()
                .filter(search_condition(
                    backend,
                    &terms,
                    &[person::Column::FullName],
                    person::Column::Id,
                ))
                .order_by_asc(person::Column::FullName)
                .order_by_asc(person::Column::Id);
            let (models, page) = fetch_page(db, select, raw_page).await?;
            let rows = models
                .into_iter()
                .map(|m| Row { id: m.id, cells: vec![m.full_name, display_opt(m.birth_date)] })
                .collect();
            (rows, page)
        }
        Resource::Genre => {
            let select = genre::Entity::find()
                .filter(search_condition(
                    backend,
                    &terms,
                    &[genre::Column::Name],
                    genre::Column::Id,
                ))
                .order_by_asc(genre::Column::Name)
                .order_by_asc(genre::Column::Id);
            let (models, page) = fetch_page(db, select, raw_page).await?;
            let rows = models.into_iter().map(|m| Row { id: m.id, cells: vec![m.name] }).collect();
            (rows, page)
        }
    };
    Ok(Listing { rows, page })
}

async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    raw_page: Option<&str>,
) -> AppResult<(Vec<E::Model>, Page)>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let count = select.clone().count(db).await?;
    let page = Page::resolve(raw_page, count, ADMIN_PAGE_SIZE)?;
    let models = select.offset(page.offset()).limit(page.per_page).all(db).await?;
    Ok((models, page))
}

/// Every term must match at least one text column or the text form of the id,
/// as a case-insensitive substring.
fn search_condition<C>(
    backend: DbBackend,
    terms: &[String],
    text_columns: &[C],
    id_column: C,
) -> Condition
where
    C: ColumnTrait,
{
    let mut all = Condition::all();
    for term in terms {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        let mut any = Condition::any();
        for column in text_columns {
            any = any.add(
                Expr::expr(Func::lower(Expr::col(*column)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            );
        }
        if let Some(pattern) = id_pattern(backend, term) {
            any = any.add(Expr::expr(id_text(backend, id_column)).like(LikeExpr::new(pattern)));
        }
        all = all.add(any);
    }
    all
}

/// Lowercase text form of a uuid column. SQLite stores uuids as 16-byte blobs,
/// so there the text form is hex without hyphens.
fn id_text<C: ColumnTrait>(backend: DbBackend, id_column: C) -> SimpleExpr {
    match backend {
        DbBackend::Sqlite => {
            Func::lower(Func::cust(Alias::new("HEX")).arg(Expr::col(id_column))).into()
        }
        _ => Func::lower(Expr::col(id_column).cast_as(Alias::new("text"))).into(),
    }
}

/// LIKE pattern for a term matched against [`id_text`], or `None` when the term
/// cannot be part of an id.
fn id_pattern(backend: DbBackend, term: &str) -> Option<String> {
    if !term.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        return None;
    }
    let term = term.to_lowercase();
    let needle = match backend {
        DbBackend::Sqlite => term.replace('-', ""),
        _ => term,
    };
    (!needle.is_empty()).then(|| format!("%{needle}%"))
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn opt_to_form<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Human-readable name of a record, used on confirmation pages.
pub async fn display_name(
    db: &DatabaseConnection,
    resource: Resource,
    id: Uuid,
) -> AppResult<String> {
    let name = match resource {
        Resource::FilmWork => film_work::Entity::find_by_id(id).one(db).await?.map(|m| m.title),
        Resource::Person => person::Entity::find_by_id(id).one(db).await?.map(|m| m.full_name),
        Resource::Genre => genre::Entity::find_by_id(id).one(db).await?.map(|m| m.name),
    };
    name.ok_or_else(|| resource.not_found(id))
}

pub async fn load(db: &DatabaseConnection, resource: Resource, id: Uuid) -> AppResult<FormValues> {
    let pairs: Vec<(&str, String)> = match resource {
        Resource::FilmWork => {
            let m = film_work::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| resource.not_found(id))?;
            vec![
                ("title", m.title),
                ("type", sea_orm::ActiveEnum::to_value(&m.kind)),
                ("description", m.description),
                ("creation_date", opt_to_form(m.creation_date)),
                ("certificate", m.certificate),
                ("file_path", m.file_path),
                ("rating", opt_to_form(m.rating)),
            ]
        }
        Resource::Person => {
            let m = person::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| resource.not_found(id))?;
            vec![("full_name", m.full_name), ("birth_date", opt_to_form(m.birth_date))]
        }
        Resource::Genre => {
            let m = genre::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| resource.not_found(id))?;
            vec![("name", m.name), ("description", m.description)]
        }
    };
    Ok(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// Creates (`id == None`) or updates a record from a submitted form and
/// returns its id. A film work is saved together with its inline rows in one
/// transaction.
pub async fn save(
    db: &DatabaseConnection,
    resource: Resource,
    id: Option<Uuid>,
    form: &FormData,
) -> AppResult<Uuid> {
    match resource {
        Resource::FilmWork => save_film_work(db, id, form).await,
        Resource::Person => {
            let full_name = form.text(&person_form::FULL_NAME)?;
            let birth_date = form.date(&person_form::BIRTH_DATE)?;

            let mut model = match id {
                Some(id) => person::Entity::find_by_id(id)
                    .one(db)
                    .await?
                    .ok_or_else(|| resource.not_found(id))?
                    .into_active_model(),
                None => person::ActiveModel::new(),
            };
            model.full_name = Set(full_name);
            model.birth_date = Set(birth_date);
            let saved = match id {
                Some(_) => model.update(db).await?,
                None => model.insert(db).await?,
            };
            Ok(saved.id)
        }
        Resource::Genre => {
            let name = form.text(&genre_form::NAME)?;
            let description = form.text(&genre_form::DESCRIPTION)?;

            let mut model = match id {
                Some(id) => genre::Entity::find_by_id(id)
                    .one(db)
                    .await?
                    .ok_or_else(|| resource.not_found(id))?
                    .into_active_model(),
                None => genre::ActiveModel::new(),
            };
            model.name = Set(name);
            model.description = Set(description);
            let saved = match id {
                Some(_) => model.update(db).await?,
                None => model.insert(db).await?,
            };
            Ok(saved.id)
        }
    }
}

async fn save_film_work(
    db: &DatabaseConnection,
    id: Option<Uuid>,
    form: &FormData,
) -> AppResult<Uuid> {
    let title = form.text(&film_work_form::TITLE)?;
    let kind = FilmWorkType::from_code(&form.choice(&film_work_form::TYPE)?)
        .ok_or_else(|| AppError::Validation("Type: select a valid choice".into()))?;
    let description = form.text(&film_work_form::DESCRIPTION)?;
    let creation_date = form.date(&film_work_form::CREATION_DATE)?;
    let certificate = form.text(&film_work_form::CERTIFICATE)?;
    let file_path = form.text(&film_work_form::FILE_PATH)?;
    let rating = form.float(&film_work_form::RATING)?;

    let genre_rows = GenreRow::parse_all(form);
    let person_rows = PersonRow::parse_all(form);

    let txn = db.begin().await?;

    let mut model = match id {
        Some(id) => film_work::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| Resource::FilmWork.not_found(id))?
            .into_active_model(),
        None => film_work::ActiveModel::new(),
    };
    model.title = Set(title);
    model.kind = Set(kind);
    model.description = Set(description);
    model.creation_date = Set(creation_date);
    model.certificate = Set(certificate);
    model.file_path = Set(file_path);
    model.rating = Set(rating);
    let saved = match id {
        Some(_) => model.update(&txn).await?,
        None => model.insert(&txn).await?,
    };

    inline::save_genres(&txn, saved.id, &genre_rows).await?;
    inline::save_persons(&txn, saved.id, &person_rows).await?;

    txn.commit().await?;
    Ok(saved.id)
}

pub async fn delete(db: &DatabaseConnection, resource: Resource, id: Uuid) -> AppResult<()> {
    let result = match resource {
        Resource::FilmWork => film_work::Entity::delete_by_id(id).exec(db).await?,
        Resource::Person => person::Entity::delete_by_id(id).exec(db).await?,
        Resource::Genre => genre::Entity::delete_by_id(id).exec(db).await?,
    };
    if result.rows_affected == 0 {
        return Err(resource.not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(Resource::from_slug(resource.slug()), Some(resource));
        }
        assert_eq!(Resource::from_slug("person_film_work"), None);
    }

    #[test]
    fn film_work_type_choices_match_enum() {
        for (code, _) in FILM_WORK_TYPES {
            assert!(FilmWorkType::from_code(code).is_some());
        }
    }

    #[test]
    fn id_pattern_follows_backend_storage() {
        assert_eq!(id_pattern(DbBackend::Sqlite, "3F2A-9c"), Some("%3f2a9c%".to_string()));
        assert_eq!(id_pattern(DbBackend::Postgres, "3F2A-9c"), Some("%3f2a-9c%".to_string()));
        assert_eq!(id_pattern(DbBackend::Sqlite, "heat"), None);
        assert_eq!(id_pattern(DbBackend::Sqlite, "--"), None);
    }

    #[test]
    fn only_film_work_has_inlines() {
        assert!(Resource::FilmWork.has_inlines());
        assert!(!Resource::Person.has_inlines());
        assert!(!Resource::Genre.has_inlines());
    }
}
