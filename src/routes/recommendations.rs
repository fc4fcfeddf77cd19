use axum::extract::State;
use serde::Serialize;
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    models::{GenrePreference, Recommendation},
    services::{recommendations as ranking, Capability},
    web::{self, render, PageResult},
};

#[derive(Serialize, Default)]
struct RecommendationsPage {
    movie_recommendations: Vec<Recommendation>,
    friend_recommendations: Vec<Recommendation>,
    user_preferences: Vec<GenrePreference>,
}

/// Both ranked lists plus the viewer's genre weights, computed fresh
pub async fn recommendations(State(state): State<AppState>, session: Session) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;

    let page = match ranking::get_recommendations(
        &state.pool,
        viewer.user_id,
        ranking::DEFAULT_LIMIT,
    )
    .await
    {
        Ok(recs) => RecommendationsPage {
            movie_recommendations: recs.by_preference,
            friend_recommendations: recs.from_friends,
            user_preferences: web::fallback(
                db::genres::get_user_preferences(&state.pool, viewer.user_id).await,
                "user preferences",
            ),
        },
        Err(e) => {
            tracing::error!(error = %e, user_id = viewer.user_id, "Failed to build recommendations");
            web::flash::error(&session, "Error loading recommendations. Please try again.").await;
            RecommendationsPage::default()
        }
    };

    Ok(render(&state, &session, "recommendations.html", &page).await)
}
