use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const FLASH_KEY: &str = "marquee:flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

/// A one-shot notice shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

/// Queues a notice. A session failure only costs the message.
pub async fn push(session: &Session, level: Level, message: impl Into<String>) {
    let message = message.into();
    let mut queued = match session.get::<Vec<Flash>>(FLASH_KEY).await {
        Ok(queued) => queued.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read queued flash messages");
            Vec::new()
        }
    };
    queued.push(Flash { level, message });

    if let Err(e) = session.insert(FLASH_KEY, queued).await {
        tracing::warn!(error = %e, "Could not queue flash message");
    }
}

pub async fn success(session: &Session, message: impl Into<String>) {
    push(session, Level::Success, message).await
}

pub async fn info(session: &Session, message: impl Into<String>) {
    push(session, Level::Info, message).await
}

pub async fn error(session: &Session, message: impl Into<String>) {
    push(session, Level::Error, message).await
}

/// Removes and returns every queued notice, oldest first
pub async fn take(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(FLASH_KEY).await {
        Ok(queued) => queued.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read flash messages");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_round_trip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        success(&session, "Review added successfully!").await;
        error(&session, "Second").await;

        let flashes = take(&session).await;
        assert_eq!(
            flashes,
            vec![
                Flash {
                    level: Level::Success,
                    message: "Review added successfully!".into()
                },
                Flash {
                    level: Level::Error,
                    message: "Second".into()
                },
            ]
        );

        assert!(take(&session).await.is_empty());
    }
}
