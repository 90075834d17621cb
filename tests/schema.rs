mod common;

use movies::{
    entities::{
        film_work::{self, FilmWorkType},
        genre, genre_film_work, person,
        person_film_work::{self, Role},
    },
    error::AppError,
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};

use common::{cast, film, genre as new_genre, person as new_person, setup, tag};

fn film_with_rating(rating: Option<f64>) -> film_work::ActiveModel {
    film_work::ActiveModel {
        title: Set("Rated".to_string()),
        description: Set(String::new()),
        creation_date: Set(None),
        certificate: Set(String::new()),
        file_path: Set(String::new()),
        rating: Set(rating),
        kind: Set(FilmWorkType::TvShow),
        ..film_work::ActiveModel::new()
    }
}

#[tokio::test]
async fn rating_must_lie_between_zero_and_ten() {
    let (_app, db) = setup().await;

    for rating in [None, Some(0.0), Some(10.0), Some(4.2)] {
        film_with_rating(rating).insert(&db).await.expect("rating within bounds");
    }

    for rating in [-0.5, 10.01, f64::NAN] {
        let err = film_with_rating(Some(rating)).insert(&db).await.unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Validation(_)), "{rating}");
    }
    assert_eq!(film_work::Entity::find().count(&db).await.unwrap(), 4);
}

#[tokio::test]
async fn database_rejects_out_of_range_rating_without_hooks() {
    let (_app, db) = setup().await;
    let now = chrono::Utc::now().fixed_offset();

    let mut model = film_with_rating(Some(11.0));
    model.created_at = Set(now);
    model.updated_at = Set(now);
    let result = film_work::Entity::insert(model).exec(&db).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn rating_is_checked_on_update() {
    let (_app, db) = setup().await;
    let movie = film(&db, "Heat").await;

    let mut model = movie.into_active_model();
    model.rating = Set(Some(12.0));
    assert!(model.update(&db).await.is_err());
}

#[tokio::test]
async fn person_role_triple_is_unique() {
    let (_app, db) = setup().await;
    let movie = film(&db, "Heat").await;
    let pacino = new_person(&db, "Al Pacino").await;

    cast(&db, movie.id, pacino.id, Role::Actor).await.unwrap();
    cast(&db, movie.id, pacino.id, Role::Director).await.expect("other role is allowed");

    let err = cast(&db, movie.id, pacino.id, Role::Actor).await.unwrap_err();
    assert!(matches!(AppError::from(err), AppError::Validation(_)));
    assert_eq!(person_film_work::Entity::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn genre_pair_is_unique() {
    let (_app, db) = setup().await;
    let movie = film(&db, "Heat").await;
    let other = film(&db, "Ronin").await;
    let crime = new_genre(&db, "Crime").await;

    tag(&db, movie.id, crime.id).await.unwrap();
    tag(&db, other.id, crime.id).await.expect("same genre on another film");

    let err = tag(&db, movie.id, crime.id).await.unwrap_err();
    assert!(matches!(AppError::from(err), AppError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_film_work_cascades_to_associations() {
    let (_app, db) = setup().await;
    let movie = film(&db, "Heat").await;
    let kept = film(&db, "Ronin").await;
    let pacino = new_person(&db, "Al Pacino").await;
    let crime = new_genre(&db, "Crime").await;
    cast(&db, movie.id, pacino.id, Role::Actor).await.unwrap();
    tag(&db, movie.id, crime.id).await.unwrap();
    tag(&db, kept.id, crime.id).await.unwrap();

    film_work::Entity::delete_by_id(movie.id).exec(&db).await.unwrap();

    let persons_left = person_film_work::Entity::find()
        .filter(person_film_work::Column::FilmWorkId.eq(movie.id))
        .count(&db)
        .await
        .unwrap();
    let genres_left = genre_film_work::Entity::find()
        .filter(genre_film_work::Column::FilmWorkId.eq(movie.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(persons_left, 0);
    assert_eq!(genres_left, 0);
    assert_eq!(genre_film_work::Entity::find().count(&db).await.unwrap(), 1);
    assert!(person::Entity::find_by_id(pacino.id).one(&db).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_person_removes_only_their_links() {
    let (_app, db) = setup().await;
    let movie = film(&db, "Heat").await;
    let pacino = new_person(&db, "Al Pacino").await;
    let de_niro = new_person(&db, "Robert De Niro").await;
    cast(&db, movie.id, pacino.id, Role::Actor).await.unwrap();
    cast(&db, movie.id, de_niro.id, Role::Actor).await.unwrap();

    person::Entity::delete_by_id(pacino.id).exec(&db).await.unwrap();

    let links = person_film_work::Entity::find().all(&db).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].person_id, de_niro.id);
    assert!(film_work::Entity::find_by_id(movie.id).one(&db).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_genre_removes_only_its_links() {
    let (_app, db) = setup().await;
    let movie = film(&db, "Heat").await;
    let crime = new_genre(&db, "Crime").await;
    let drama = new_genre(&db, "Drama").await;
    tag(&db, movie.id, crime.id).await.unwrap();
    tag(&db, movie.id, drama.id).await.unwrap();

    genre::Entity::delete_by_id(crime.id).exec(&db).await.unwrap();

    let links = genre_film_work::Entity::find().all(&db).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].genre_id, drama.id);
    assert!(film_work::Entity::find_by_id(movie.id).one(&db).await.unwrap().is_some());
}

#[tokio::test]
async fn ids_and_timestamps_are_generated() {
    let (_app, db) = setup().await;
    let first = new_person(&db, "A").await;
    let second = new_person(&db, "B").await;
    assert_ne!(first.id, second.id);
    assert_eq!(first.created_at, first.updated_at);

    let created_at = first.created_at;
    let mut model = first.into_active_model();
    model.full_name = Set("A. N. Other".to_string());
    let updated = model.update(&db).await.unwrap();
    assert_eq!(updated.created_at, created_at);
    assert!(updated.updated_at >= created_at);
}
