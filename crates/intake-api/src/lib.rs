//! Local HTTP surface: a status page (with the login QR code while the
//! channel is pairing) and a health endpoint.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::{create_router, start_server};
pub use state::AppState;
