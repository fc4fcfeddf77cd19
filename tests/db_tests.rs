//! Database-backed tests. They need a Postgres server:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use sqlx::PgPool;

use marquee::{
    db,
    error::AppError,
    models::{CatalogFilter, ContentKind, ContentRef, MovieInput, NewUser, ReviewInput, Role, ShowInput},
    services::{auth, recommendations},
};

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "correct horse battery".to_string(),
        role: Role::NormalUser,
        age: Some(30),
        gender: None,
        verified_entity: None,
    }
}

async fn user(pool: &PgPool, name: &str) -> i64 {
    let email = format!("{}@example.com", name.to_lowercase());
    db::users::create_user(pool, &new_user(name, &email), "not-a-real-hash")
        .await
        .unwrap()
}

async fn genre(pool: &PgPool, name: &str) -> i64 {
    db::genres::create_genre(pool, name, None).await.unwrap()
}

async fn movie(pool: &PgPool, title: &str, genre_ids: Vec<i64>) -> i64 {
    let input = MovieInput {
        title: title.to_string(),
        description: None,
        year: 2020,
        length: Some(100),
        age_rating: None,
        genre_ids,
        cast: Vec::new(),
        production: Vec::new(),
    };
    db::movies::create_movie_with_details(pool, &input).await.unwrap()
}

async fn show(pool: &PgPool, title: &str) -> i64 {
    let input = ShowInput {
        title: title.to_string(),
        description: None,
        year: 2021,
        seasons: Some(1),
        episodes: Some(8),
        age_rating: None,
        genre_ids: Vec::new(),
    };
    db::shows::create_show_with_genres(pool, &input).await.unwrap()
}

async fn review_of(pool: &PgPool, user_id: i64, target: ContentRef, score: f64) -> i64 {
    let input = ReviewInput {
        score,
        title: format!("{} stars", score),
        content: None,
    };
    db::reviews::create_review(pool, user_id, target, &input)
        .await
        .unwrap()
}

async fn review(pool: &PgPool, user_id: i64, movie_id: i64, score: f64) -> i64 {
    review_of(pool, user_id, ContentRef::Movie(movie_id), score).await
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_second_review_of_same_movie_is_rejected(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let dune = movie(&pool, "Dune", vec![]).await;
    let first = review(&pool, alice, dune, 8.0).await;

    let again = ReviewInput {
        score: 2.0,
        title: "Changed my mind".to_string(),
        content: None,
    };
    let result = db::reviews::create_review(&pool, alice, ContentRef::Movie(dune), &again).await;
    assert!(matches!(result, Err(AppError::Duplicate(_))));

    let reviews = db::movies::get_movie_reviews(&pool, dune).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].review.review_id, first);
    assert_eq!(reviews[0].review.score, 8.0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_review_of_missing_movie_is_not_found(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let input = ReviewInput {
        score: 5.0,
        title: "Ghost".to_string(),
        content: None,
    };
    let result = db::reviews::create_review(&pool, alice, ContentRef::Movie(9999), &input).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_friendship_is_symmetric(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let bob = user(&pool, "Bob").await;

    db::friends::add_friend(&pool, bob, alice).await.unwrap();
    assert!(db::friends::are_friends(&pool, alice, bob).await.unwrap());
    assert!(db::friends::are_friends(&pool, bob, alice).await.unwrap());

    // Either orientation counts as the same friendship
    let again = db::friends::add_friend(&pool, alice, bob).await;
    assert!(matches!(again, Err(AppError::Duplicate(_))));

    let alice_friends = db::friends::list_friends(&pool, alice, None).await.unwrap();
    assert_eq!(alice_friends.len(), 1);
    assert_eq!(alice_friends[0].user_id, bob);

    assert!(db::friends::remove_friend(&pool, alice, bob).await.unwrap());
    assert!(!db::friends::are_friends(&pool, bob, alice).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_cannot_befriend_self_or_unknown_user(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    assert!(matches!(
        db::friends::add_friend(&pool, alice, alice).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        db::friends::add_friend(&pool, alice, alice + 1000).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_preference_ranking_excludes_reviewed_movies(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let critic = user(&pool, "Critic").await;
    let drama = genre(&pool, "Drama").await;
    let comedy = genre(&pool, "Comedy").await;

    // Alice likes drama (5) more than comedy (3)
    let seen_drama = movie(&pool, "Seen Drama", vec![drama]).await;
    let seen_comedy = movie(&pool, "Seen Comedy", vec![comedy]).await;
    review(&pool, alice, seen_drama, 5.0).await;
    review(&pool, alice, seen_comedy, 3.0).await;

    let new_drama = movie(&pool, "New Drama", vec![drama]).await;
    let new_comedy = movie(&pool, "New Comedy", vec![comedy]).await;
    // The comedy has the better average, which must not outrank preference
    review(&pool, critic, new_drama, 1.0).await;
    review(&pool, critic, new_comedy, 10.0).await;

    db::preferences::populate_user_preferences(&pool).await.unwrap();

    let recs = recommendations::get_recommendations(&pool, alice, recommendations::DEFAULT_LIMIT)
        .await
        .unwrap();
    let ids: Vec<i64> = recs.by_preference.iter().map(|r| r.movie.movie_id).collect();
    assert_eq!(ids, vec![new_drama, new_comedy]);
    assert_eq!(recs.by_preference[0].max_preference_score, Some(5.0));
    assert!(!ids.contains(&seen_drama));
    assert!(!ids.contains(&seen_comedy));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_friend_likes_start_at_seven(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let bob = user(&pool, "Bob").await;
    let carol = user(&pool, "Carol").await;
    db::friends::add_friend(&pool, alice, bob).await.unwrap();
    db::friends::add_friend(&pool, carol, alice).await.unwrap();

    let almost = movie(&pool, "Almost", vec![]).await;
    let liked = movie(&pool, "Liked", vec![]).await;
    let loved = movie(&pool, "Loved", vec![]).await;
    let seen = movie(&pool, "Seen", vec![]).await;

    review(&pool, bob, almost, 6.9).await;
    review(&pool, bob, liked, 7.0).await;
    review(&pool, bob, loved, 9.0).await;
    review(&pool, carol, loved, 8.0).await;
    review(&pool, bob, seen, 10.0).await;
    review(&pool, alice, seen, 4.0).await;

    let recs = recommendations::get_recommendations(&pool, alice, recommendations::DEFAULT_LIMIT)
        .await
        .unwrap();
    let ranked: Vec<(i64, Option<i64>)> = recs
        .from_friends
        .iter()
        .map(|r| (r.movie.movie_id, r.friend_likes))
        .collect();
    assert_eq!(ranked, vec![(loved, Some(2)), (liked, Some(1))]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_preference_rebuild_is_idempotent(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let drama = genre(&pool, "Drama").await;
    let first = movie(&pool, "First", vec![drama]).await;
    let second = movie(&pool, "Second", vec![drama]).await;
    review(&pool, alice, first, 6.0).await;
    review(&pool, alice, second, 7.5).await;

    db::preferences::populate_user_preferences(&pool).await.unwrap();
    let once = db::genres::get_user_preferences(&pool, alice).await.unwrap();
    db::preferences::populate_user_preferences(&pool).await.unwrap();
    let twice = db::genres::get_user_preferences(&pool, alice).await.unwrap();

    assert_eq!(once, twice);
    let drama_pref = once.iter().find(|p| p.genre_id == drama).unwrap();
    assert_eq!(drama_pref.preference_score, Some(6.75));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_duplicate_email_registration_fails(pool: PgPool) {
    auth::register(&pool, &new_user("Alice", "alice@example.com"))
        .await
        .unwrap();

    let result = auth::register(&pool, &new_user("Alice", "alice@example.com")).await;
    assert!(matches!(result, Err(AppError::Duplicate(_))));

    let users = db::users::list_users(&pool).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_registered_user_can_authenticate(pool: PgPool) {
    auth::register(&pool, &new_user("Alice", "alice@example.com"))
        .await
        .unwrap();

    let ok = auth::authenticate(&pool, "alice@example.com", "correct horse battery")
        .await
        .unwrap();
    assert_eq!(ok.map(|u| u.name), Some("Alice".to_string()));

    let wrong = auth::authenticate(&pool, "alice@example.com", "wrong")
        .await
        .unwrap();
    assert!(wrong.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_deleting_reviewed_movie_removes_it_everywhere(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let drama = genre(&pool, "Drama").await;
    let doomed = movie(&pool, "Doomed", vec![drama]).await;
    let kept = movie(&pool, "Kept", vec![drama]).await;
    let review_id = review(&pool, alice, doomed, 9.0).await;

    assert!(db::movies::delete_movie(&pool, doomed).await.unwrap());

    let listed = db::movies::list_movies(&pool, &CatalogFilter::default())
        .await
        .unwrap();
    let ids: Vec<i64> = listed.iter().map(|m| m.movie.movie_id).collect();
    assert_eq!(ids, vec![kept]);
    assert!(db::reviews::get_review(&pool, review_id).await.unwrap().is_none());
    assert!(!db::movies::delete_movie(&pool, doomed).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_deleting_celebrity_demotes_verified_account(pool: PgPool) {
    use marquee::models::{CelebrityInput, VerifiedEntity};

    let record = CelebrityInput {
        name: Some("Ada Star".into()),
        birth_year: Some("1980".into()),
        ..Default::default()
    }
    .validate()
    .unwrap();
    let celebrity_id = db::people::create_celebrity(&pool, &record).await.unwrap();

    let mut account = new_user("Ada", "ada@example.com");
    account.role = Role::VerifiedUser;
    account.verified_entity = Some(VerifiedEntity::Celebrity(celebrity_id));
    let user_id = db::users::create_user(&pool, &account, "hash").await.unwrap();

    assert!(db::people::delete_celebrity(&pool, celebrity_id).await.unwrap());

    let user = db::users::get_user_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(user.role, Role::NormalUser);
    assert_eq!(user.verified_entity(), None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_movie_listing_filters_and_sorts_case_insensitively(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let bob = user(&pool, "Bob").await;
    let drama = genre(&pool, "Drama").await;
    let comedy = genre(&pool, "Comedy").await;

    let zeta = movie(&pool, "Zeta Drama", vec![drama]).await;
    let alpha = movie(&pool, "alpha drama", vec![drama]).await;
    movie(&pool, "Drama Club", vec![comedy]).await;
    movie(&pool, "Quiet Night", vec![drama]).await;
    review(&pool, alice, alpha, 8.0).await;
    review(&pool, bob, alpha, 6.0).await;

    let filter = CatalogFilter::from_query(Some(drama.to_string().as_str()), Some("drama"));
    let listed = db::movies::list_movies(&pool, &filter).await.unwrap();

    let titles: Vec<&str> = listed.iter().map(|m| m.movie.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha drama", "Zeta Drama"]);

    assert_eq!(listed[0].review_count, 2);
    assert_eq!(listed[0].avg_rating, Some(7.0));
    assert_eq!(listed[1].movie.movie_id, zeta);
    assert_eq!(listed[1].review_count, 0);
    assert_eq!(listed[1].avg_rating, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_title_search_treats_wildcards_literally(pool: PgPool) {
    movie(&pool, "100% Pure", vec![]).await;
    movie(&pool, "1000 Days", vec![]).await;

    let filter = CatalogFilter::from_query(None, Some("100%"));
    let listed = db::movies::list_movies(&pool, &filter).await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|m| m.movie.title.as_str()).collect();
    assert_eq!(titles, vec!["100% Pure"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_friend_search_matches_name_or_email(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let bob = user(&pool, "Bob").await;
    let carol = user(&pool, "Carol").await;
    user(&pool, "Dave").await;
    db::friends::add_friend(&pool, alice, bob).await.unwrap();
    db::friends::add_friend(&pool, carol, alice).await.unwrap();

    let by_name = db::friends::list_friends(&pool, alice, Some("car")).await.unwrap();
    assert_eq!(by_name.iter().map(|f| f.user_id).collect::<Vec<_>>(), vec![carol]);

    let by_email = db::friends::list_friends(&pool, alice, Some("BOB@EXAMPLE"))
        .await
        .unwrap();
    assert_eq!(by_email.iter().map(|f| f.user_id).collect::<Vec<_>>(), vec![bob]);

    // Dave exists but is not a friend
    let stranger = db::friends::list_friends(&pool, alice, Some("dave")).await.unwrap();
    assert!(stranger.is_empty());

    let blank = db::friends::list_friends(&pool, alice, Some("   ")).await.unwrap();
    assert_eq!(blank.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_top_rated_requires_minimum_reviews(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let bob = user(&pool, "Bob").await;
    let steady = movie(&pool, "Steady", vec![]).await;
    let single = movie(&pool, "Single Rave", vec![]).await;

    review(&pool, alice, steady, 6.0).await;
    review(&pool, bob, steady, 7.0).await;
    review(&pool, alice, single, 10.0).await;

    let top = db::analytics::get_top_rated(&pool, ContentKind::Movie)
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].content_id, steady);
    assert_eq!(top[0].review_count, db::analytics::TOP_RATED_MIN_REVIEWS);
    assert_eq!(top[0].average_rating, 6.5);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_popularity_ranks_movies_and_shows_together(pool: PgPool) {
    let alice = user(&pool, "Alice").await;
    let bob = user(&pool, "Bob").await;
    let carol = user(&pool, "Carol").await;

    let series = show(&pool, "Long Series").await;
    let pair = movie(&pool, "Pair", vec![]).await;
    let solo = movie(&pool, "Solo", vec![]).await;
    movie(&pool, "Unseen", vec![]).await;

    // 3 × 9 = 27
    for reviewer in [alice, bob, carol] {
        review_of(&pool, reviewer, ContentRef::Show(series), 9.0).await;
    }
    // 2 × 6 = 12
    review(&pool, alice, pair, 5.0).await;
    review(&pool, bob, pair, 7.0).await;
    // 1 × 10 = 10
    review(&pool, carol, solo, 10.0).await;

    let popular = db::analytics::get_popular_content(&pool).await.unwrap();
    let ranked: Vec<(ContentKind, i64, f64)> = popular
        .iter()
        .map(|p| (p.content_type, p.content_id, p.popularity_score))
        .collect();

    assert_eq!(
        &ranked[..3],
        &[
            (ContentKind::Show, series, 27.0),
            (ContentKind::Movie, pair, 12.0),
            (ContentKind::Movie, solo, 10.0),
        ]
    );
    assert_eq!(popular[3].title, "Unseen");
    assert_eq!(popular[3].popularity_score, 0.0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_demoted_admin_session_is_refreshed(pool: PgPool) {
    use std::sync::Arc;

    use marquee::{
        services::Viewer,
        web::{self, SessionUser},
    };
    use tower_sessions::{MemoryStore, Session};

    let mut account = new_user("Ada", "ada@example.com");
    account.role = Role::Admin;
    let user_id = db::users::create_user(&pool, &account, "hash").await.unwrap();

    let session = Session::new(None, Arc::new(MemoryStore::default()), None);
    let viewer = Viewer {
        user_id,
        name: "Ada".to_string(),
        role: Role::Admin,
    };
    SessionUser::login(&session, &viewer).await.unwrap();

    assert!(db::users::set_role(&pool, user_id, Role::NormalUser).await.unwrap());

    let current = web::current_viewer(&pool, &session).await.unwrap();
    assert_eq!(current.role, Role::NormalUser);
    let stored = SessionUser::get(&session).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::NormalUser);
}
