pub mod film_work;
pub mod genre;
pub mod genre_film_work;
pub mod person;
pub mod person_film_work;

use sea_orm::prelude::DateTimeWithTimeZone;

pub(crate) fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().fixed_offset()
}
