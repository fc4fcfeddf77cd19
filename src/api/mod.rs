pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::api_routes;
pub use state::AppState;
