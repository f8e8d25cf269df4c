pub mod errors;
pub mod store;

pub use errors::PreferenceError;
pub use store::{LAST_SELECTED_CHAT_KEY, PreferenceStore, SPEECH_KEY};
