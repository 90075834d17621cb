use sea_orm_migration::{
    prelude::*,
    schema::*,
    sea_orm::{ConnectionTrait, DatabaseBackend},
};

use crate::SCHEMA;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() == DatabaseBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {SCHEMA}"))
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_uuid(Person::Id))
                    .col(string_len(Person::FullName, 255))
                    .col(date_null(Person::BirthDate))
                    .col(timestamp_with_time_zone(Person::CreatedAt))
                    .col(timestamp_with_time_zone(Person::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(pk_uuid(Genre::Id))
                    .col(string_len(Genre::Name, 255))
                    .col(text(Genre::Description).default(""))
                    .col(timestamp_with_time_zone(Genre::CreatedAt))
                    .col(timestamp_with_time_zone(Genre::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmWork::Table)
                    .if_not_exists()
                    .col(pk_uuid(FilmWork::Id))
                    .col(string_len(FilmWork::Title, 255))
                    .col(text(FilmWork::Description).default(""))
                    .col(date_null(FilmWork::CreationDate))
                    .col(text(FilmWork::Certificate).default(""))
                    .col(string_len(FilmWork::FilePath, 255).default(""))
                    .col(
                        double_null(FilmWork::Rating)
                            .check(Expr::col(FilmWork::Rating).between(0.0, 10.0)),
                    )
                    .col(string_len(FilmWork::Type, 20))
                    .col(timestamp_with_time_zone(FilmWork::CreatedAt))
                    .col(timestamp_with_time_zone(FilmWork::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_work_title")
                    .table(FilmWork::Table)
                    .col(FilmWork::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PersonFilmWork::Table)
                    .if_not_exists()
                    .col(pk_uuid(PersonFilmWork::Id))
                    .col(uuid(PersonFilmWork::FilmWorkId))
                    .col(uuid(PersonFilmWork::PersonId))
                    .col(string_len(PersonFilmWork::Role, 255))
                    .col(timestamp_with_time_zone(PersonFilmWork::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_person_film_work_film_work")
                            .from(PersonFilmWork::Table, PersonFilmWork::FilmWorkId)
                            .to(FilmWork::Table, FilmWork::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_person_film_work_person")
                            .from(PersonFilmWork::Table, PersonFilmWork::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GenreFilmWork::Table)
                    .if_not_exists()
                    .col(pk_uuid(GenreFilmWork::Id))
                    .col(uuid(GenreFilmWork::FilmWorkId))
                    .col(uuid(GenreFilmWork::GenreId))
                    .col(timestamp_with_time_zone(GenreFilmWork::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_genre_film_work_film_work")
                            .from(GenreFilmWork::Table, GenreFilmWork::FilmWorkId)
                            .to(FilmWork::Table, FilmWork::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_genre_film_work_genre")
                            .from(GenreFilmWork::Table, GenreFilmWork::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(GenreFilmWork::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(PersonFilmWork::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmWork::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    FullName,
    BirthDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FilmWork {
    Table,
    Id,
    Title,
    Description,
    CreationDate,
    Certificate,
    FilePath,
    Rating,
    Type,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PersonFilmWork {
    Table,
    Id,
    FilmWorkId,
    PersonId,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GenreFilmWork {
    Table,
    Id,
    FilmWorkId,
    GenreId,
    CreatedAt,
}
