mod error;
mod routes;
mod server;
mod state;
mod store;

pub use error::ApiError;
pub use server::{router, GatewayServer};
pub use state::AppState;
pub use store::{GraphStore, RunRecord, RunStore};
