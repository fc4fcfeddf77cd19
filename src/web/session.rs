use tower_sessions::Session;

use crate::{error::AppResult, services::Viewer};

pub const SESSION_USER_KEY: &str = "marquee:user";

/// Signed-in user stored in the session
pub struct SessionUser;

impl SessionUser {
    pub async fn get(session: &Session) -> AppResult<Option<Viewer>> {
        Ok(session.get::<Viewer>(SESSION_USER_KEY).await?)
    }

    /// Stores the viewer under a fresh session id
    pub async fn login(session: &Session, viewer: &Viewer) -> AppResult<()> {
        session.cycle_id().await?;
        session.insert(SESSION_USER_KEY, viewer).await?;
        Ok(())
    }

    /// Replaces the stored viewer in place, keeping the session id
    pub async fn refresh(session: &Session, viewer: &Viewer) -> AppResult<()> {
        session.insert(SESSION_USER_KEY, viewer).await?;
        Ok(())
    }

    /// Forgets the user but keeps queued flashes
    pub async fn forget(session: &Session) -> AppResult<()> {
        session.remove::<Viewer>(SESSION_USER_KEY).await?;
        Ok(())
    }

    /// Drops the user and everything else in the session
    pub async fn logout(session: &Session) -> AppResult<()> {
        session.flush().await?;
        Ok(())
    }
}
