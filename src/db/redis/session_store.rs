use std::fmt::Display;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Value};
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Session(Id),
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKey::Session(id) => write!(f, "marquee:session:{}", id),
        }
    }
}

/// Opens a managed Redis connection for session storage
///
/// The connection manager reconnects on its own after a dropped connection,
/// so one instance is shared by every request.
pub async fn connect(redis_url: &str) -> AppResult<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    tracing::info!("Connected to Redis session store");
    Ok(manager)
}

/// Session records stored as JSON strings that Redis expires on its own
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore").finish_non_exhaustive()
    }
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Writes the record with an absolute expiry; `only_new` refuses to
    /// overwrite an existing key and reports whether the write happened
    async fn write(&self, record: &Record, only_new: bool) -> session_store::Result<bool> {
        let key = SessionKey::Session(record.id).to_string();
        let json = serde_json::to_string(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(&key).arg(json);
        if only_new {
            cmd.arg("NX");
        }
        cmd.arg("EXAT").arg(record.expiry_date.unix_timestamp());

        let mut conn = self.conn.clone();
        let reply: Value = cmd.query_async(&mut conn).await.map_err(backend)?;
        Ok(!matches!(reply, Value::Nil))
    }
}

fn backend(err: redis::RedisError) -> session_store::Error {
    tracing::error!(error = %err, "Redis session store failure");
    session_store::Error::Backend(err.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        // Regenerate on the rare id collision
        while !self.write(record, true).await? {
            record.id = Id::default();
        }
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.write(record, false).await?;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn
            .get(SessionKey::Session(*session_id).to_string())
            .await
            .map_err(backend)?;

        stored
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| session_store::Error::Decode(e.to_string()))
            })
            .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(SessionKey::Session(*session_id).to_string())
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_display() {
        let id = Id(42);
        let key = SessionKey::Session(id);
        assert_eq!(format!("{}", key), format!("marquee:session:{}", id));
        assert!(key.to_string().starts_with("marquee:session:"));
    }

    #[test]
    fn test_distinct_ids_give_distinct_keys() {
        let a = SessionKey::Session(Id(1)).to_string();
        let b = SessionKey::Session(Id(2)).to_string();
        assert_ne!(a, b);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_save_load_delete() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let store = RedisSessionStore::new(connect(&redis_url).await.unwrap());

        let mut record = Record {
            id: Id::default(),
            data: Default::default(),
            expiry_date: time::OffsetDateTime::now_utc() + time::Duration::minutes(5),
        };
        record
            .data
            .insert("marquee:user".to_string(), serde_json::json!({"user_id": 1}));

        store.create(&mut record).await.unwrap();
        let loaded = store.load(&record.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, record.data);

        store.delete(&record.id).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
    }
}
