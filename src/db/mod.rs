pub mod analytics;
pub mod friends;
pub mod genres;
pub mod movies;
pub mod people;
pub mod postgres;
pub mod preferences;
pub mod recommendations;
pub mod redis;
pub mod reviews;
pub mod shows;
pub mod users;

pub use postgres::create_pool;
pub use postgres::run_migrations;
pub use redis::RedisSessionStore;
