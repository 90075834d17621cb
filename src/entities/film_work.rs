use sea_orm::{
    ActiveValue::{Set, Unchanged},
    Iterable,
    entity::prelude::*,
    sea_query::StringLen,
};
use serde::{Deserialize, Serialize};

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum FilmWorkType {
    #[sea_orm(string_value = "movie")]
    Movie,
    #[sea_orm(string_value = "tv_show")]
    TvShow,
}

impl FilmWorkType {
    pub fn label(self) -> &'static str {
        match self {
            FilmWorkType::Movie => "Movie",
            FilmWorkType::TvShow => "TV Show",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|kind| kind.to_value() == code)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "film_work")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub creation_date: Option<Date>,
    #[sea_orm(column_type = "Text")]
    pub certificate: String,
    pub file_path: String,
    pub rating: Option<f64>,
    #[sea_orm(column_name = "type")]
    pub kind: FilmWorkType,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::person_film_work::Entity")]
    PersonFilmWork,
    #[sea_orm(has_many = "super::genre_film_work::Entity")]
    GenreFilmWork,
}

impl Related<super::person_film_work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonFilmWork.def()
    }
}

impl Related<super::genre_film_work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenreFilmWork.def()
    }
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        super::person_film_work::Relation::Person.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::person_film_work::Relation::FilmWork.def().rev())
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::genre_film_work::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::genre_film_work::Relation::FilmWork.def().rev())
    }
}

/// Rejects ratings outside `[0, 10]`, including NaN.
pub fn validate_rating(rating: f64) -> Result<(), String> {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Ok(())
    } else {
        Err(format!("rating must be between {RATING_MIN} and {RATING_MAX}, got {rating}"))
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Set(Some(rating)) | Unchanged(Some(rating)) = self.rating {
            validate_rating(rating).map_err(DbErr::Custom)?;
        }

        let now = super::now();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
