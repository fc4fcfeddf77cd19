pub mod session_store;

pub use session_store::connect;
pub use session_store::RedisSessionStore;
pub use session_store::SessionKey;
