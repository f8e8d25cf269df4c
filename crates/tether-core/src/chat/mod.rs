pub mod errors;
pub mod handler;

pub use errors::ChatError;
pub use handler::{RESTART_HEALTH_ATTEMPTS, RESTART_HEALTH_INTERVAL, RestartOutcome};
