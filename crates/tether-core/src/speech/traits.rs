use super::errors::SpeechError;

/// Text-to-speech output.
pub trait Speaker: Send {
    /// Start reading `text` aloud, interrupting anything still playing.
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;

    /// Stop the current utterance, if any.
    fn stop(&mut self);
}
