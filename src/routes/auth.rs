use axum::{extract::State, response::Response, Form};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    error::AppError,
    models::{Celebrity, ProductionCompany, RegistrationForm},
    services::{auth, Viewer},
    web::{self, flash, render, SessionUser},
};

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
struct RegisterPage {
    celebrities: Vec<Celebrity>,
    companies: Vec<ProductionCompany>,
}

#[derive(Serialize)]
struct Empty {}

pub async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    render(&state, &session, "login.html", &Empty {}).await
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.filter(|e| !e.trim().is_empty());
    let password = form.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        flash::error(&session, "Please fill in all fields.").await;
        return render(&state, &session, "login.html", &Empty {}).await;
    };

    match auth::authenticate(&state.pool, &email, &password).await {
        Ok(Some(user)) => {
            let viewer = Viewer::from(&user);
            if let Err(e) = SessionUser::login(&session, &viewer).await {
                tracing::error!(error = %e, user_id = user.user_id, "Could not start session");
                flash::error(&session, "Login failed. Please try again.").await;
                return render(&state, &session, "login.html", &Empty {}).await;
            }
            tracing::info!(user_id = user.user_id, "User logged in");
            flash::success(&session, format!("Welcome back, {}!", user.name)).await;
            web::redirect("/")
        }
        Ok(None) => {
            flash::error(&session, "Invalid email or password.").await;
            render(&state, &session, "login.html", &Empty {}).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            flash::error(&session, "Login failed. Please try again.").await;
            render(&state, &session, "login.html", &Empty {}).await
        }
    }
}

async fn register_page_data(state: &AppState) -> RegisterPage {
    RegisterPage {
        celebrities: web::fallback(db::people::list_celebrities(&state.pool).await, "celebrities"),
        companies: web::fallback(db::people::list_companies(&state.pool).await, "companies"),
    }
}

pub async fn register_page(State(state): State<AppState>, session: Session) -> Response {
    let page = register_page_data(&state).await;
    render(&state, &session, "register.html", &page).await
}

/// Creates the account; the visitor signs in separately afterwards
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let outcome = match form.validate() {
        Ok(new_user) => auth::register(&state.pool, &new_user).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(user_id) => {
            tracing::info!(user_id, "User registered");
            flash::success(&session, "Registration successful! Please log in.").await;
            return web::redirect("/login");
        }
        Err(AppError::InvalidInput(message)) => flash::error(&session, message).await,
        Err(AppError::Duplicate(_)) => flash::error(&session, "Email already registered.").await,
        Err(e) => {
            tracing::error!(error = %e, "Registration failed");
            flash::error(&session, "Registration failed. Please try again.").await;
        }
    }

    let page = register_page_data(&state).await;
    render(&state, &session, "register.html", &page).await
}

pub async fn logout(session: Session) -> Response {
    if let Err(e) = SessionUser::logout(&session).await {
        tracing::warn!(error = %e, "Could not clear session on logout");
    }
    flash::info(&session, "You have been logged out.").await;
    web::redirect("/")
}
