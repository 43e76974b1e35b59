pub mod auth;
pub mod dates;
pub mod foods;
pub mod meals;
pub mod middleware;
pub mod profile;
pub mod rest;
pub mod state;
pub mod stats;
pub mod workouts;

// Re-export the router builder to make it easily accessible to the binary
// and the integration tests.
pub use middleware::require_auth;
pub use rest::{build_router, ApiDoc};
pub use state::AppState;
