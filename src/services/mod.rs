pub mod access;
pub mod auth;
pub mod recommendations;

pub use access::{authorize, Capability, Denied, Viewer};
pub use recommendations::{get_recommendations, Recommendations};
