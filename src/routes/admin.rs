//! Admin-only catalog and account management. Every handler re-checks the
//! admin role against the database before doing anything.

use axum::{extract::State, Form};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    error::AppError,
    models::{
        ActiveUser, CatalogFilter, Celebrity, CelebrityInput, CompanyInput, CreditLink,
        DashboardStats, Genre, GenreInput, MovieInput, MovieSummary, ProductionCompany,
        ReviewWithTitles, Role, ShowInput, ShowSummary, User,
    },
    services::Capability,
    web::{self, flash, render, Id, PageResult},
};

const DASHBOARD_LIST_LEN: usize = 10;

/// Raw urlencoded pairs; the catalog forms repeat `genres`
type Pairs = Vec<(String, String)>;

fn input_message(e: AppError, fallback: &str) -> String {
    match e {
        AppError::InvalidInput(message) => message,
        _ => fallback.to_string(),
    }
}

#[derive(Serialize)]
struct DashboardPage {
    stats: DashboardStats,
    recent_reviews: Vec<ReviewWithTitles>,
    active_users: Vec<ActiveUser>,
}

pub async fn dashboard(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    let pool = &state.pool;

    let stats = match db::analytics::get_dashboard_stats(pool).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load dashboard stats");
            flash::error(&session, "Error loading admin dashboard.").await;
            DashboardStats::default()
        }
    };
    let mut active_users = web::fallback(db::analytics::get_active_users(pool).await, "active users");
    active_users.truncate(DASHBOARD_LIST_LEN);

    let page = DashboardPage {
        stats,
        recent_reviews: web::fallback(
            db::reviews::get_recent_reviews(pool, DASHBOARD_LIST_LEN as i64).await,
            "recent reviews",
        ),
        active_users,
    };
    Ok(render(&state, &session, "admin/dashboard.html", &page).await)
}

#[derive(Serialize)]
struct UsersPage {
    users: Vec<User>,
    roles: [Role; 3],
}

pub async fn users(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let users = match db::users::list_users(&state.pool).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list users");
            flash::error(&session, "Error loading users.").await;
            Vec::new()
        }
    };
    let page = UsersPage {
        users,
        roles: [Role::NormalUser, Role::VerifiedUser, Role::Admin],
    };
    Ok(render(&state, &session, "admin/users.html", &page).await)
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleForm {
    pub role: Option<String>,
}

pub async fn set_user_role(
    State(state): State<AppState>,
    session: Session,
    Id(user_id): Id,
    Form(form): Form<RoleForm>,
) -> PageResult {
    let admin = web::require(&state, &session, Capability::Admin).await?;

    let Some(role) = form.role.as_deref().and_then(Role::parse) else {
        return Err(web::fail(&session, "Please choose a valid role.", "/admin/users").await);
    };
    if user_id == admin.user_id {
        return Err(web::fail(&session, "You cannot change your own role.", "/admin/users").await);
    }

    match db::users::set_role(&state.pool, user_id, role).await {
        Ok(true) => {
            tracing::info!(user_id, role = role.as_str(), by = admin.user_id, "Role changed");
            flash::success(&session, "User role updated successfully!").await;
        }
        Ok(false) => flash::error(&session, "User not found.").await,
        Err(AppError::InvalidInput(message)) => flash::error(&session, message).await,
        Err(e) => {
            tracing::error!(error = %e, user_id, "Failed to change role");
            flash::error(&session, "Error updating user role. Please try again.").await;
        }
    }
    Ok(web::redirect("/admin/users"))
}

#[derive(Serialize)]
struct MoviesPage {
    movies: Vec<MovieSummary>,
}

pub async fn movies(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let movies = match db::movies::list_movies(&state.pool, &CatalogFilter::default()).await {
        Ok(movies) => movies,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list movies");
            flash::error(&session, "Error loading movies.").await;
            Vec::new()
        }
    };
    Ok(render(&state, &session, "admin/movies.html", &MoviesPage { movies }).await)
}

#[derive(Serialize)]
struct MovieFormPage {
    action: String,
    cancel: String,
    movie: Option<MovieSummary>,
    genres: Vec<Genre>,
    celebrities: Vec<Celebrity>,
    production_companies: Vec<ProductionCompany>,
    selected_genres: Vec<i64>,
    celebrity_data: String,
    production_data: String,
}

impl MovieFormPage {
    async fn load(state: &AppState, action: String, cancel: String) -> Self {
        let pool = &state.pool;
        Self {
            action,
            cancel,
            movie: None,
            genres: web::fallback(db::genres::list_genres(pool).await, "genres"),
            celebrities: web::fallback(db::people::list_celebrities(pool).await, "celebrities"),
            production_companies: web::fallback(
                db::people::list_companies(pool).await,
                "production companies",
            ),
            selected_genres: Vec::new(),
            celebrity_data: String::new(),
            production_data: String::new(),
        }
    }

    async fn with_movie(mut self, state: &AppState, movie: MovieSummary) -> Self {
        let pool = &state.pool;
        let movie_id = movie.movie.movie_id;
        self.selected_genres = web::fallback(db::movies::get_movie_genres(pool, movie_id).await, "genres")
            .into_iter()
            .map(|g| g.genre_id)
            .collect();
        self.celebrity_data = CreditLink::format_list(&web::fallback(
            db::movies::get_movie_celebrities(pool, movie_id).await,
            "cast",
        ));
        self.production_data = CreditLink::format_list(&web::fallback(
            db::movies::get_movie_production_companies(pool, movie_id).await,
            "production companies",
        ));
        self.movie = Some(movie);
        self
    }
}

pub async fn add_movie_page(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    let page = MovieFormPage::load(&state, "/admin/movies/add".into(), "/admin/movies".into()).await;
    Ok(render(&state, &session, "admin/movie_form.html", &page).await)
}

pub async fn add_movie(
    State(state): State<AppState>,
    session: Session,
    Form(pairs): Form<Pairs>,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let input = match MovieInput::from_pairs(&pairs) {
        Ok(input) => input,
        Err(e) => {
            let message = input_message(e, "Failed to add movie.");
            return Err(web::fail(&session, message, "/admin/movies/add").await);
        }
    };

    match db::movies::create_movie_with_details(&state.pool, &input).await {
        Ok(_) => {
            flash::success(&session, "Movie added successfully!").await;
            Ok(web::redirect("/admin/movies"))
        }
        Err(e) => {
            tracing::error!(error = %e, title = %input.title, "Failed to add movie");
            Err(web::fail(&session, format!("Error adding movie: {}", e), "/admin/movies/add").await)
        }
    }
}

/// Where a movie edit was started from decides where it returns to
#[derive(Clone, Copy)]
enum EditOrigin {
    Admin,
    DetailPage,
}

impl EditOrigin {
    fn form_path(self, movie_id: i64) -> String {
        match self {
            EditOrigin::Admin => format!("/admin/movies/edit/{}", movie_id),
            EditOrigin::DetailPage => format!("/movie/{}/edit", movie_id),
        }
    }

    fn done_path(self, movie_id: i64) -> String {
        match self {
            EditOrigin::Admin => "/admin/movies".to_string(),
            EditOrigin::DetailPage => format!("/movie/{}", movie_id),
        }
    }
}

async fn existing_movie(
    state: &AppState,
    session: &Session,
    movie_id: i64,
    origin: EditOrigin,
) -> Result<MovieSummary, axum::response::Response> {
    let list = match origin {
        EditOrigin::Admin => "/admin/movies",
        EditOrigin::DetailPage => "/movies",
    };
    match db::movies::get_movie(&state.pool, movie_id).await {
        Ok(Some(movie)) => Ok(movie),
        Ok(None) => Err(web::fail(session, "Movie not found.", list).await),
        Err(e) => {
            tracing::error!(error = %e, movie_id, "Failed to load movie");
            Err(web::fail(session, "Error loading edit form.", list).await)
        }
    }
}

async fn movie_edit_page(state: AppState, session: Session, movie_id: i64, origin: EditOrigin) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    let movie = existing_movie(&state, &session, movie_id, origin).await?;

    let page = MovieFormPage::load(&state, origin.form_path(movie_id), origin.done_path(movie_id))
        .await
        .with_movie(&state, movie)
        .await;
    Ok(render(&state, &session, "admin/movie_form.html", &page).await)
}

async fn movie_edit(
    state: AppState,
    session: Session,
    movie_id: i64,
    pairs: Pairs,
    origin: EditOrigin,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    existing_movie(&state, &session, movie_id, origin).await?;

    let form_path = origin.form_path(movie_id);
    let input = match MovieInput::from_pairs(&pairs) {
        Ok(input) => input,
        Err(e) => {
            let message = input_message(e, "Failed to update movie.");
            return Err(web::fail(&session, message, &form_path).await);
        }
    };

    match db::movies::update_movie_with_details(&state.pool, movie_id, &input).await {
        Ok(true) => {
            flash::success(&session, "Movie updated successfully!").await;
            Ok(web::redirect(&origin.done_path(movie_id)))
        }
        Ok(false) => Err(web::fail(&session, "Failed to update movie.", &form_path).await),
        Err(e) => {
            tracing::error!(error = %e, movie_id, "Failed to update movie");
            Err(web::fail(&session, format!("Error updating movie: {}", e), &form_path).await)
        }
    }
}

pub async fn edit_movie_page(
    State(state): State<AppState>,
    session: Session,
    Id(movie_id): Id,
) -> PageResult {
    movie_edit_page(state, session, movie_id, EditOrigin::Admin).await
}

pub async fn edit_movie(
    State(state): State<AppState>,
    session: Session,
    Id(movie_id): Id,
    Form(pairs): Form<Pairs>,
) -> PageResult {
    movie_edit(state, session, movie_id, pairs, EditOrigin::Admin).await
}

/// `/movie/:id/edit`, reached from the movie's own page
pub async fn edit_movie_inline_page(
    State(state): State<AppState>,
    session: Session,
    Id(movie_id): Id,
) -> PageResult {
    movie_edit_page(state, session, movie_id, EditOrigin::DetailPage).await
}

pub async fn edit_movie_inline(
    State(state): State<AppState>,
    session: Session,
    Id(movie_id): Id,
    Form(pairs): Form<Pairs>,
) -> PageResult {
    movie_edit(state, session, movie_id, pairs, EditOrigin::DetailPage).await
}

pub async fn delete_movie(
    State(state): State<AppState>,
    session: Session,
    Id(movie_id): Id,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    match db::movies::delete_movie(&state.pool, movie_id).await {
        Ok(true) => flash::success(&session, "Movie deleted successfully!").await,
        Ok(false) => flash::error(&session, "Failed to delete movie.").await,
        Err(e) => {
            tracing::error!(error = %e, movie_id, "Failed to delete movie");
            flash::error(&session, format!("Error deleting movie: {}", e)).await;
        }
    }
    Ok(web::redirect("/admin/movies"))
}

#[derive(Serialize)]
struct ShowsPage {
    shows: Vec<ShowSummary>,
}

pub async fn shows(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let shows = match db::shows::list_shows(&state.pool, &CatalogFilter::default()).await {
        Ok(shows) => shows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list shows");
            flash::error(&session, "Error loading shows.").await;
            Vec::new()
        }
    };
    Ok(render(&state, &session, "admin/shows.html", &ShowsPage { shows }).await)
}

#[derive(Serialize)]
struct ShowFormPage {
    action: String,
    show: Option<ShowSummary>,
    genres: Vec<Genre>,
    selected_genres: Vec<i64>,
}

pub async fn add_show_page(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let page = ShowFormPage {
        action: "/admin/shows/add".to_string(),
        show: None,
        genres: web::fallback(db::genres::list_genres(&state.pool).await, "genres"),
        selected_genres: Vec::new(),
    };
    Ok(render(&state, &session, "admin/show_form.html", &page).await)
}

pub async fn add_show(
    State(state): State<AppState>,
    session: Session,
    Form(pairs): Form<Pairs>,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let input = match ShowInput::from_pairs(&pairs) {
        Ok(input) => input,
        Err(e) => {
            let message = input_message(e, "Failed to add TV show.");
            return Err(web::fail(&session, message, "/admin/shows/add").await);
        }
    };

    match db::shows::create_show_with_genres(&state.pool, &input).await {
        Ok(_) => {
            flash::success(&session, "TV Show added successfully!").await;
            Ok(web::redirect("/admin/shows"))
        }
        Err(e) => {
            tracing::error!(error = %e, title = %input.title, "Failed to add show");
            Err(web::fail(&session, format!("Error adding TV show: {}", e), "/admin/shows/add").await)
        }
    }
}

pub async fn edit_show_page(
    State(state): State<AppState>,
    session: Session,
    Id(show_id): Id,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    let pool = &state.pool;

    let show = match db::shows::get_show(pool, show_id).await {
        Ok(Some(show)) => show,
        Ok(None) => return Err(web::fail(&session, "Show not found.", "/admin/shows").await),
        Err(e) => {
            tracing::error!(error = %e, show_id, "Failed to load show");
            return Err(web::fail(&session, "Error loading edit form.", "/admin/shows").await);
        }
    };

    let page = ShowFormPage {
        action: format!("/admin/shows/edit/{}", show_id),
        show: Some(show),
        genres: web::fallback(db::genres::list_genres(pool).await, "genres"),
        selected_genres: web::fallback(db::shows::get_show_genres(pool, show_id).await, "genres")
            .into_iter()
            .map(|g| g.genre_id)
            .collect(),
    };
    Ok(render(&state, &session, "admin/show_form.html", &page).await)
}

pub async fn edit_show(
    State(state): State<AppState>,
    session: Session,
    Id(show_id): Id,
    Form(pairs): Form<Pairs>,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let form_path = format!("/admin/shows/edit/{}", show_id);
    let input = match ShowInput::from_pairs(&pairs) {
        Ok(input) => input,
        Err(e) => {
            let message = input_message(e, "Failed to update TV show.");
            return Err(web::fail(&session, message, &form_path).await);
        }
    };

    match db::shows::update_show_with_genres(&state.pool, show_id, &input).await {
        Ok(true) => {
            flash::success(&session, "TV Show updated successfully!").await;
            Ok(web::redirect("/admin/shows"))
        }
        Ok(false) => Err(web::fail(&session, "Show not found.", "/admin/shows").await),
        Err(e) => {
            tracing::error!(error = %e, show_id, "Failed to update show");
            Err(web::fail(&session, format!("Error updating TV show: {}", e), &form_path).await)
        }
    }
}

pub async fn delete_show(
    State(state): State<AppState>,
    session: Session,
    Id(show_id): Id,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    match db::shows::delete_show(&state.pool, show_id).await {
        Ok(true) => flash::success(&session, "TV Show deleted successfully!").await,
        Ok(false) => flash::error(&session, "Failed to delete TV show.").await,
        Err(e) => {
            tracing::error!(error = %e, show_id, "Failed to delete show");
            flash::error(&session, format!("Error deleting TV show: {}", e)).await;
        }
    }
    Ok(web::redirect("/admin/shows"))
}

#[derive(Serialize)]
struct GenresPage {
    genres: Vec<Genre>,
}

pub async fn genres(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let genres = match db::genres::list_genres(&state.pool).await {
        Ok(genres) => genres,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list genres");
            flash::error(&session, "Error loading genres.").await;
            Vec::new()
        }
    };
    Ok(render(&state, &session, "admin/genres.html", &GenresPage { genres }).await)
}

#[derive(Serialize)]
struct GenreFormPage {
    action: String,
    genre: Option<Genre>,
}

pub async fn add_genre_page(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    let page = GenreFormPage {
        action: "/admin/add_genre".to_string(),
        genre: None,
    };
    Ok(render(&state, &session, "admin/genre_form.html", &page).await)
}

pub async fn add_genre(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<GenreInput>,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let (name, description) = match form.validate() {
        Ok(valid) => valid,
        Err(e) => {
            let message = input_message(e, "Error adding genre. Please try again.");
            return Err(web::fail(&session, message, "/admin/add_genre").await);
        }
    };

    match db::genres::create_genre(&state.pool, &name, description.as_deref()).await {
        Ok(_) => {
            flash::success(&session, format!("Genre \"{}\" added successfully!", name)).await;
            Ok(web::redirect("/admin/genres"))
        }
        Err(AppError::Duplicate(_)) => Err(web::fail(
            &session,
            format!("Genre \"{}\" already exists.", name),
            "/admin/add_genre",
        )
        .await),
        Err(e) => {
            tracing::error!(error = %e, name = %name, "Failed to add genre");
            Err(web::fail(&session, "Error adding genre. Please try again.", "/admin/add_genre").await)
        }
    }
}

pub async fn edit_genre_page(
    State(state): State<AppState>,
    session: Session,
    Id(genre_id): Id,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let genre = match db::genres::get_genre(&state.pool, genre_id).await {
        Ok(Some(genre)) => genre,
        Ok(None) => return Err(web::fail(&session, "Genre not found.", "/admin/genres").await),
        Err(e) => {
            tracing::error!(error = %e, genre_id, "Failed to load genre");
            return Err(web::fail(&session, "Error loading edit form.", "/admin/genres").await);
        }
    };
    let page = GenreFormPage {
        action: format!("/admin/genres/edit/{}", genre_id),
        genre: Some(genre),
    };
    Ok(render(&state, &session, "admin/genre_form.html", &page).await)
}

pub async fn edit_genre(
    State(state): State<AppState>,
    session: Session,
    Id(genre_id): Id,
    Form(form): Form<GenreInput>,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let form_path = format!("/admin/genres/edit/{}", genre_id);
    let (name, description) = match form.validate() {
        Ok(valid) => valid,
        Err(e) => {
            let message = input_message(e, "Error updating genre. Please try again.");
            return Err(web::fail(&session, message, &form_path).await);
        }
    };

    match db::genres::update_genre(&state.pool, genre_id, &name, description.as_deref()).await {
        Ok(true) => {
            flash::success(&session, format!("Genre \"{}\" updated successfully!", name)).await;
            Ok(web::redirect("/admin/genres"))
        }
        Ok(false) => Err(web::fail(&session, "Genre not found.", "/admin/genres").await),
        Err(AppError::Duplicate(_)) => Err(web::fail(
            &session,
            format!("Genre \"{}\" already exists.", name),
            &form_path,
        )
        .await),
        Err(e) => {
            tracing::error!(error = %e, genre_id, "Failed to update genre");
            Err(web::fail(&session, "Error updating genre. Please try again.", &form_path).await)
        }
    }
}

pub async fn delete_genre(
    State(state): State<AppState>,
    session: Session,
    Id(genre_id): Id,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    match db::genres::delete_genre(&state.pool, genre_id).await {
        Ok(true) => flash::success(&session, "Genre deleted successfully!").await,
        Ok(false) => flash::error(&session, "Genre not found.").await,
        Err(e) => {
            tracing::error!(error = %e, genre_id, "Failed to delete genre");
            flash::error(&session, "Error deleting genre. Please try again.").await;
        }
    }
    Ok(web::redirect("/admin/genres"))
}

#[derive(Serialize)]
struct CelebritiesPage {
    celebrities: Vec<Celebrity>,
}

pub async fn celebrities(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let celebrities = match db::people::list_celebrities(&state.pool).await {
        Ok(celebrities) => celebrities,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list celebrities");
            flash::error(&session, "Error loading celebrities.").await;
            Vec::new()
        }
    };
    Ok(render(&state, &session, "admin/celebrities.html", &CelebritiesPage { celebrities }).await)
}

/// Shared by the admin add screen and the verified edit screen
#[derive(Serialize)]
pub(super) struct CelebrityFormPage {
    pub action: String,
    pub cancel: String,
    pub celebrity: Option<Celebrity>,
}

pub async fn add_celebrity_page(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    let page = CelebrityFormPage {
        action: "/admin/add_celebrity".to_string(),
        cancel: "/admin/celebrities".to_string(),
        celebrity: None,
    };
    Ok(render(&state, &session, "celebrity_form.html", &page).await)
}

pub async fn add_celebrity(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CelebrityInput>,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let record = match form.validate() {
        Ok(record) => record,
        Err(e) => {
            let message = input_message(e, "Error adding celebrity. Please try again.");
            return Err(web::fail(&session, message, "/admin/add_celebrity").await);
        }
    };

    match db::people::create_celebrity(&state.pool, &record).await {
        Ok(_) => {
            flash::success(&session, format!("Celebrity \"{}\" added successfully!", record.name))
                .await;
            Ok(web::redirect("/admin/celebrities"))
        }
        Err(e) => {
            tracing::error!(error = %e, name = %record.name, "Failed to add celebrity");
            Err(web::fail(
                &session,
                "Error adding celebrity. Please try again.",
                "/admin/add_celebrity",
            )
            .await)
        }
    }
}

pub async fn delete_celebrity(
    State(state): State<AppState>,
    session: Session,
    Id(celebrity_id): Id,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    match db::people::delete_celebrity(&state.pool, celebrity_id).await {
        Ok(true) => flash::success(&session, "Celebrity deleted successfully!").await,
        Ok(false) => flash::error(&session, "Celebrity not found.").await,
        Err(e) => {
            tracing::error!(error = %e, celebrity_id, "Failed to delete celebrity");
            flash::error(&session, "Error deleting celebrity. Please try again.").await;
        }
    }
    Ok(web::redirect("/admin/celebrities"))
}

#[derive(Serialize)]
struct CompaniesPage {
    companies: Vec<ProductionCompany>,
}

pub async fn companies(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let companies = match db::people::list_companies(&state.pool).await {
        Ok(companies) => companies,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list production companies");
            flash::error(&session, "Error loading production companies.").await;
            Vec::new()
        }
    };
    Ok(render(&state, &session, "admin/companies.html", &CompaniesPage { companies }).await)
}

/// Shared by the admin add screen and the verified edit screen
#[derive(Serialize)]
pub(super) struct CompanyFormPage {
    pub action: String,
    pub cancel: String,
    pub company: Option<ProductionCompany>,
}

pub async fn add_company_page(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;
    let page = CompanyFormPage {
        action: "/admin/add_production_company".to_string(),
        cancel: "/admin/companies".to_string(),
        company: None,
    };
    Ok(render(&state, &session, "company_form.html", &page).await)
}

pub async fn add_company(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CompanyInput>,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    let record = match form.validate() {
        Ok(record) => record,
        Err(e) => {
            let message = input_message(e, "Error adding production company. Please try again.");
            return Err(web::fail(&session, message, "/admin/add_production_company").await);
        }
    };

    match db::people::create_company(&state.pool, &record).await {
        Ok(_) => {
            flash::success(
                &session,
                format!("Production company \"{}\" added successfully!", record.name),
            )
            .await;
            Ok(web::redirect("/admin/companies"))
        }
        Err(e) => {
            tracing::error!(error = %e, name = %record.name, "Failed to add production company");
            Err(web::fail(
                &session,
                "Error adding production company. Please try again.",
                "/admin/add_production_company",
            )
            .await)
        }
    }
}

pub async fn delete_company(
    State(state): State<AppState>,
    session: Session,
    Id(company_id): Id,
) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    match db::people::delete_company(&state.pool, company_id).await {
        Ok(true) => flash::success(&session, "Production company deleted successfully!").await,
        Ok(false) => flash::error(&session, "Production company not found.").await,
        Err(e) => {
            tracing::error!(error = %e, company_id, "Failed to delete production company");
            flash::error(&session, "Error deleting production company. Please try again.").await;
        }
    }
    Ok(web::redirect("/admin/companies"))
}

/// Rebuilds every user's genre weights from their review history
pub async fn populate_preferences(State(state): State<AppState>, session: Session) -> PageResult {
    web::require(&state, &session, Capability::Admin).await?;

    match db::preferences::populate_user_preferences(&state.pool).await {
        Ok(rows) => {
            tracing::info!(rows, "User preferences rebuilt");
            flash::success(&session, "User preferences populated successfully!").await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to populate preferences");
            flash::error(&session, "Error populating preferences. Please try again.").await;
        }
    }
    Ok(web::redirect("/admin"))
}
