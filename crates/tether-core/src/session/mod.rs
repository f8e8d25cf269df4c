pub mod state;
pub mod types;

pub use state::ClientState;
pub use types::{LogCursor, SessionContext};
