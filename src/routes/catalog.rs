use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    models::{
        CatalogFilter, Celebrity, ContentKind, Credit, Genre, MovieSummary, PopularItem,
        ProductionCompany, ReviewWithTitles, Role, ShowSummary, TopRatedItem, VerifiedEntity,
    },
    services::access,
    web::{self, render, Id, PageResult},
};

const HOME_LIST_LEN: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub genre: Option<String>,
    pub q: Option<String>,
}

impl ListingQuery {
    fn filter(&self) -> CatalogFilter {
        CatalogFilter::from_query(self.genre.as_deref(), self.q.as_deref())
    }
}

#[derive(Serialize)]
struct HomePage {
    recent_reviews: Vec<ReviewWithTitles>,
    popular: Vec<PopularItem>,
    top_rated_movies: Vec<TopRatedItem>,
    total_movies: i64,
    total_reviews: i64,
}

pub async fn home(State(state): State<AppState>, session: Session) -> Response {
    let pool = &state.pool;

    let mut popular = web::fallback(db::analytics::get_popular_content(pool).await, "popular");
    popular.truncate(HOME_LIST_LEN);
    let mut top_rated_movies = web::fallback(
        db::analytics::get_top_rated(pool, ContentKind::Movie).await,
        "top rated movies",
    );
    top_rated_movies.truncate(HOME_LIST_LEN);
    let totals = web::fallback(db::analytics::get_dashboard_stats(pool).await, "totals");

    let page = HomePage {
        recent_reviews: web::fallback(
            db::reviews::get_recent_reviews(pool, HOME_LIST_LEN as i64).await,
            "recent reviews",
        ),
        popular,
        top_rated_movies,
        total_movies: totals.total_movies,
        total_reviews: totals.total_reviews,
    };

    render(&state, &session, "home.html", &page).await
}

#[derive(Serialize)]
struct MoviesPage {
    movies: Vec<MovieSummary>,
    genres: Vec<Genre>,
    selected_genre: Option<i64>,
    q: String,
}

pub async fn movies(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> Response {
    let filter = query.filter();
    let movies = match db::movies::list_movies(&state.pool, &filter).await {
        Ok(movies) => movies,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list movies");
            web::flash::error(&session, "Error loading movies. Please try again.").await;
            Vec::new()
        }
    };

    let page = MoviesPage {
        movies,
        genres: web::fallback(db::genres::list_genres(&state.pool).await, "genres"),
        selected_genre: filter.genre,
        q: filter.q.unwrap_or_default(),
    };
    render(&state, &session, "movies.html", &page).await
}

#[derive(Serialize)]
struct MovieDetailPage {
    movie: MovieSummary,
    popularity_score: Option<f64>,
    genres: Vec<Genre>,
    celebrities: Vec<Credit>,
    production_companies: Vec<Credit>,
    reviews: Vec<ReviewWithTitles>,
    can_edit: bool,
}

pub async fn movie_detail(
    State(state): State<AppState>,
    session: Session,
    Id(movie_id): Id,
) -> PageResult {
    let pool = &state.pool;
    let movie = match db::movies::get_movie(pool, movie_id).await {
        Ok(Some(movie)) => movie,
        Ok(None) => return Err(web::fail(&session, "Movie not found.", "/movies").await),
        Err(e) => {
            tracing::error!(error = %e, movie_id, "Failed to load movie");
            return Err(web::fail(
                &session,
                "Error loading movie details. Please try again.",
                "/movies",
            )
            .await);
        }
    };

    let can_edit = web::current_viewer(pool, &session)
        .await
        .is_some_and(|v| v.role == Role::Admin);

    let page = MovieDetailPage {
        popularity_score: movie.popularity_score(),
        movie,
        genres: web::fallback(db::movies::get_movie_genres(pool, movie_id).await, "genres"),
        celebrities: web::fallback(
            db::movies::get_movie_celebrities(pool, movie_id).await,
            "cast",
        ),
        production_companies: web::fallback(
            db::movies::get_movie_production_companies(pool, movie_id).await,
            "production companies",
        ),
        reviews: web::fallback(db::movies::get_movie_reviews(pool, movie_id).await, "reviews"),
        can_edit,
    };
    Ok(render(&state, &session, "movie_detail.html", &page).await)
}

#[derive(Serialize)]
struct ShowsPage {
    shows: Vec<ShowSummary>,
    genres: Vec<Genre>,
    selected_genre: Option<i64>,
    q: String,
}

pub async fn shows(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> Response {
    let filter = query.filter();
    let shows = match db::shows::list_shows(&state.pool, &filter).await {
        Ok(shows) => shows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list shows");
            web::flash::error(&session, "Error loading shows. Please try again.").await;
            Vec::new()
        }
    };

    let page = ShowsPage {
        shows,
        genres: web::fallback(db::genres::list_genres(&state.pool).await, "genres"),
        selected_genre: filter.genre,
        q: filter.q.unwrap_or_default(),
    };
    render(&state, &session, "shows.html", &page).await
}

#[derive(Serialize)]
struct ShowDetailPage {
    show: ShowSummary,
    genres: Vec<Genre>,
    reviews: Vec<ReviewWithTitles>,
    can_edit: bool,
}

pub async fn show_detail(
    State(state): State<AppState>,
    session: Session,
    Id(show_id): Id,
) -> PageResult {
    let pool = &state.pool;
    let show = match db::shows::get_show(pool, show_id).await {
        Ok(Some(show)) => show,
        Ok(None) => return Err(web::fail(&session, "Show not found.", "/shows").await),
        Err(e) => {
            tracing::error!(error = %e, show_id, "Failed to load show");
            return Err(web::fail(
                &session,
                "Error loading show details. Please try again.",
                "/shows",
            )
            .await);
        }
    };

    let can_edit = web::current_viewer(pool, &session)
        .await
        .is_some_and(|v| v.role == Role::Admin);

    let page = ShowDetailPage {
        show,
        genres: web::fallback(db::shows::get_show_genres(pool, show_id).await, "genres"),
        reviews: web::fallback(db::shows::get_show_reviews(pool, show_id).await, "reviews"),
        can_edit,
    };
    Ok(render(&state, &session, "show_detail.html", &page).await)
}

/// Whether the signed-in viewer may edit `target`, re-checked against the
/// stored user row
async fn viewer_can_edit(state: &AppState, session: &Session, target: VerifiedEntity) -> bool {
    let Some(viewer) = web::viewer(session).await else {
        return false;
    };
    match db::users::get_user_by_id(&state.pool, viewer.user_id).await {
        Ok(Some(user)) => access::can_edit_content(user.role, user.verified_entity(), target),
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Could not check edit permission");
            false
        }
    }
}

#[derive(Serialize)]
struct CelebrityPage {
    celebrity: Celebrity,
    credits: Vec<Credit>,
    can_edit: bool,
}

pub async fn celebrity_detail(
    State(state): State<AppState>,
    session: Session,
    Id(celebrity_id): Id,
) -> PageResult {
    let celebrity = match db::people::get_celebrity(&state.pool, celebrity_id).await {
        Ok(Some(celebrity)) => celebrity,
        Ok(None) => return Err(web::fail(&session, "Celebrity not found.", "/").await),
        Err(e) => {
            tracing::error!(error = %e, celebrity_id, "Failed to load celebrity");
            return Err(web::fail(&session, "Error loading celebrity. Please try again.", "/").await);
        }
    };

    let page = CelebrityPage {
        celebrity,
        credits: web::fallback(
            db::people::get_celebrity_credits(&state.pool, celebrity_id).await,
            "celebrity credits",
        ),
        can_edit: viewer_can_edit(&state, &session, VerifiedEntity::Celebrity(celebrity_id)).await,
    };
    Ok(render(&state, &session, "celebrity_detail.html", &page).await)
}

#[derive(Serialize)]
struct CompanyPage {
    company: ProductionCompany,
    credits: Vec<Credit>,
    can_edit: bool,
}

pub async fn company_detail(
    State(state): State<AppState>,
    session: Session,
    Id(company_id): Id,
) -> PageResult {
    let company = match db::people::get_company(&state.pool, company_id).await {
        Ok(Some(company)) => company,
        Ok(None) => return Err(web::fail(&session, "Production company not found.", "/").await),
        Err(e) => {
            tracing::error!(error = %e, company_id, "Failed to load production company");
            return Err(web::fail(&session, "Error loading company. Please try again.", "/").await);
        }
    };

    let page = CompanyPage {
        company,
        credits: web::fallback(
            db::people::get_company_credits(&state.pool, company_id).await,
            "company credits",
        ),
        can_edit: viewer_can_edit(&state, &session, VerifiedEntity::Company(company_id)).await,
    };
    Ok(render(&state, &session, "company_detail.html", &page).await)
}
