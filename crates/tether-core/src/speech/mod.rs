//! Reading agent responses aloud.

pub mod command;
pub mod errors;
pub mod gate;
pub mod traits;

pub use command::{CommandSpeaker, DEFAULT_SPEECH_COMMANDS};
pub use errors::SpeechError;
pub use gate::next_utterance;
pub use traits::Speaker;
