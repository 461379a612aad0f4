pub mod routes;
pub mod server;
pub mod state;
pub mod upload;

pub use server::{build_router, serve, start_server};
pub use state::AppState;
