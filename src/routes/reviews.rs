use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Form,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    error::AppError,
    models::{ContentKind, ContentRef, ReviewForm, ReviewWithTitles},
    services::{Capability, Viewer},
    web::{self, flash, render, Id, PageResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct ReviewTargetQuery {
    pub movie_id: Option<String>,
    pub show_id: Option<String>,
}

#[derive(Serialize)]
struct ReviewFormPage {
    kind: ContentKind,
    content_id: i64,
    content_title: String,
    review: Option<ReviewWithTitles>,
}

pub async fn add_review_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ReviewTargetQuery>,
) -> PageResult {
    web::require(&state, &session, Capability::Authenticated).await?;

    let form = ReviewForm {
        movie_id: query.movie_id,
        show_id: query.show_id,
        ..Default::default()
    };
    let target = match form.target() {
        Ok(target) => target,
        Err(_) => {
            return Err(web::fail(&session, "Please select a movie or show to review.", "/").await)
        }
    };

    let title = match target {
        ContentRef::Movie(id) => db::movies::get_movie(&state.pool, id)
            .await
            .map(|m| m.map(|m| m.movie.title)),
        ContentRef::Show(id) => db::shows::get_show(&state.pool, id)
            .await
            .map(|s| s.map(|s| s.show.title)),
    };

    let content_title = match title {
        Ok(Some(title)) => title,
        Ok(None) => {
            return Err(web::fail(&session, "Please select a movie or show to review.", "/").await)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load review target");
            return Err(web::fail(&session, "Error loading review form. Please try again.", "/").await);
        }
    };

    let page = ReviewFormPage {
        kind: target.kind(),
        content_id: target.id(),
        content_title,
        review: None,
    };
    Ok(render(&state, &session, "review_form.html", &page).await)
}

/// Validation happens before any database write; failures go back to the
/// referring page
pub async fn add_review(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ReviewForm>,
) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;

    let (target, input) = match form.validate() {
        Ok(valid) => valid,
        Err(AppError::InvalidInput(message)) => {
            flash::error(&session, message).await;
            return Err(web::back(&headers, "/"));
        }
        Err(e) => return Err(fail_add(&session, &headers, e).await),
    };

    match db::reviews::create_review(&state.pool, viewer.user_id, target, &input).await {
        Ok(_) => {
            flash::success(&session, "Review added successfully!").await;
            Ok(web::redirect(&target.path()))
        }
        Err(e) => Err(fail_add(&session, &headers, e).await),
    }
}

async fn fail_add(session: &Session, headers: &HeaderMap, e: AppError) -> axum::response::Response {
    match &e {
        AppError::Duplicate(_) | AppError::NotFound(_) => {
            tracing::warn!(error = %e, "Review rejected")
        }
        _ => tracing::error!(error = %e, "Failed to add review"),
    }
    flash::error(
        session,
        "Failed to add review. You may have already reviewed this content.",
    )
    .await;
    web::back(headers, "/")
}

/// Loads a review the viewer wrote, or the redirect explaining why not
async fn own_review(
    state: &AppState,
    session: &Session,
    viewer: &Viewer,
    review_id: i64,
    verb: &str,
) -> Result<ReviewWithTitles, axum::response::Response> {
    match db::reviews::get_review(&state.pool, review_id).await {
        Ok(Some(review)) if review.review.user_id == viewer.user_id => Ok(review),
        Ok(Some(_)) => {
            tracing::warn!(review_id, user_id = viewer.user_id, "Review owned by another user");
            Err(web::fail(
                session,
                format!("You can only {} your own reviews.", verb),
                "/profile",
            )
            .await)
        }
        Ok(None) => Err(web::fail(session, "Review not found.", "/profile").await),
        Err(e) => {
            tracing::error!(error = %e, review_id, "Failed to load review");
            Err(web::fail(session, "Error loading review. Please try again.", "/profile").await)
        }
    }
}

pub async fn edit_review_page(
    State(state): State<AppState>,
    session: Session,
    Id(review_id): Id,
) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;
    let review = own_review(&state, &session, &viewer, review_id, "edit").await?;

    let Some(target) = review.review.target() else {
        return Err(web::fail(&session, "Review not found.", "/profile").await);
    };

    let page = ReviewFormPage {
        kind: target.kind(),
        content_id: target.id(),
        content_title: review
            .movie_title
            .clone()
            .or_else(|| review.show_title.clone())
            .unwrap_or_default(),
        review: Some(review),
    };
    Ok(render(&state, &session, "review_form.html", &page).await)
}

pub async fn edit_review(
    State(state): State<AppState>,
    session: Session,
    Id(review_id): Id,
    Form(form): Form<ReviewForm>,
) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;
    own_review(&state, &session, &viewer, review_id, "edit").await?;

    let edit_path = format!("/edit_review/{}", review_id);
    let input = match form.body() {
        Ok(input) => input,
        Err(e) => {
            let message = match e {
                AppError::InvalidInput(message) => message,
                _ => "Please fill in all required fields.".to_string(),
            };
            return Err(web::fail(&session, message, &edit_path).await);
        }
    };

    match db::reviews::update_review(&state.pool, review_id, &input).await {
        Ok(_) => {
            flash::success(&session, "Review updated successfully!").await;
            Ok(web::redirect("/profile"))
        }
        Err(e) => {
            tracing::error!(error = %e, review_id, "Failed to update review");
            Err(web::fail(&session, "Error updating review. Please try again.", &edit_path).await)
        }
    }
}

pub async fn delete_review(
    State(state): State<AppState>,
    session: Session,
    Id(review_id): Id,
) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;
    own_review(&state, &session, &viewer, review_id, "delete").await?;

    match db::reviews::delete_review(&state.pool, review_id).await {
        Ok(_) => {
            flash::success(&session, "Review deleted successfully!").await;
            Ok(web::redirect("/profile"))
        }
        Err(e) => {
            tracing::error!(error = %e, review_id, "Failed to delete review");
            Err(web::fail(&session, "Error deleting review. Please try again.", "/profile").await)
        }
    }
}
