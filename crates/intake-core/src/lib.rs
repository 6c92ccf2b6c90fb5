pub mod config;
pub mod error;
pub mod sink;
pub mod store;
pub mod transport;
pub mod types;

pub use config::IntakeConfig;
pub use error::{IntakeError, Result};
pub use sink::CompletionSink;
pub use store::ContactStore;
pub use transport::{ConnectionState, EventKind, InboundEvent, Transport};
pub use types::*;
