use axum::{
    extract::{Query, State},
    Form,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    models::{Friend, ReviewWithTitles, User, UserListing, UserStats},
    services::Capability,
    web::{self, flash, render, PageResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct FriendSearch {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FriendForm {
    pub friend_id: Option<String>,
}

impl FriendForm {
    fn friend_id(&self) -> Option<i64> {
        self.friend_id.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

#[derive(Serialize)]
struct FriendsPage {
    friends: Vec<Friend>,
    all_users: Vec<UserListing>,
    q: String,
}

pub async fn friends(
    State(state): State<AppState>,
    session: Session,
    Query(search): Query<FriendSearch>,
) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;
    let q = search.q.unwrap_or_default();

    let friends = match db::friends::list_friends(&state.pool, viewer.user_id, Some(&q)).await {
        Ok(friends) => friends,
        Err(e) => {
            tracing::error!(error = %e, user_id = viewer.user_id, "Failed to list friends");
            flash::error(&session, "Error loading friends. Please try again.").await;
            Vec::new()
        }
    };

    let page = FriendsPage {
        friends,
        all_users: web::fallback(
            db::users::list_other_users(&state.pool, viewer.user_id).await,
            "users",
        ),
        q,
    };
    Ok(render(&state, &session, "friends.html", &page).await)
}

pub async fn add_friend(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FriendForm>,
) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;

    let Some(friend_id) = form.friend_id() else {
        return Err(web::fail(&session, "Please select a user to add as friend.", "/friends").await);
    };

    match db::friends::add_friend(&state.pool, viewer.user_id, friend_id).await {
        Ok(()) => flash::success(&session, "Friend added successfully!").await,
        Err(e) => {
            tracing::warn!(error = %e, user_id = viewer.user_id, friend_id, "Failed to add friend");
            flash::error(&session, "Failed to add friend. You may already be friends.").await;
        }
    }
    Ok(web::redirect("/friends"))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FriendForm>,
) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;

    let Some(friend_id) = form.friend_id() else {
        return Err(web::fail(&session, "Please select a friend to remove.", "/friends").await);
    };

    match db::friends::remove_friend(&state.pool, viewer.user_id, friend_id).await {
        Ok(true) => flash::success(&session, "Friend removed successfully!").await,
        Ok(false) => flash::error(&session, "Failed to remove friend.").await,
        Err(e) => {
            tracing::error!(error = %e, user_id = viewer.user_id, friend_id, "Failed to remove friend");
            flash::error(&session, "Failed to remove friend.").await;
        }
    }
    Ok(web::redirect("/friends"))
}

#[derive(Serialize)]
struct ProfilePage {
    user: User,
    user_stats: UserStats,
    user_reviews: Vec<ReviewWithTitles>,
}

pub async fn profile(State(state): State<AppState>, session: Session) -> PageResult {
    let viewer = web::require(&state, &session, Capability::Authenticated).await?;

    let user = match db::users::get_user_by_id(&state.pool, viewer.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(web::fail(&session, "User not found.", "/").await),
        Err(e) => {
            tracing::error!(error = %e, user_id = viewer.user_id, "Failed to load profile");
            return Err(web::fail(&session, "Error loading profile. Please try again.", "/").await);
        }
    };

    let page = ProfilePage {
        user,
        user_stats: web::fallback(
            db::users::get_user_stats(&state.pool, viewer.user_id).await,
            "user stats",
        ),
        user_reviews: web::fallback(
            db::reviews::get_user_reviews(&state.pool, viewer.user_id).await,
            "user reviews",
        ),
    };
    Ok(render(&state, &session, "profile.html", &page).await)
}
