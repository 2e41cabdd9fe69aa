pub mod health;
pub mod lifecycle;
pub mod state;

pub use lifecycle::{build_router, serve_until, start_server};
pub use state::AppState;
