use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use super::errors::SpeechError;
use super::traits::Speaker;
use crate::config::SpeechConfig;

/// Commands probed on PATH when none is configured.
pub const DEFAULT_SPEECH_COMMANDS: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

/// [`Speaker`] that runs an external text-to-speech program, passing the text
/// as its last argument.
#[derive(Debug)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandSpeaker {
    /// Build from a command line such as `"espeak -s 160"`.
    pub fn from_command(command: &str) -> Result<Self, SpeechError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(SpeechError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            current: None,
        })
    }

    /// Use the first known text-to-speech program found on PATH.
    pub fn detect() -> Result<Self, SpeechError> {
        DEFAULT_SPEECH_COMMANDS
            .iter()
            .find(|cmd| which::which(cmd).is_ok())
            .map(|cmd| Self::from_command(cmd))
            .unwrap_or_else(|| {
                Err(SpeechError::NoCommand {
                    tried: DEFAULT_SPEECH_COMMANDS.join(", "),
                })
            })
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        match config.command.as_deref() {
            Some(command) => Self::from_command(command),
            None => Self::detect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.stop();

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::SpawnFailed {
                command: self.program.clone(),
                source,
            })?;

        debug!(
            event = "core.speech.started",
            command = %self.program,
            pid = child.id(),
            chars = text.chars().count()
        );
        self.current = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(mut child) = self.current.take() else {
            return;
        };

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        if let Err(e) = child.kill() {
            warn!(event = "core.speech.stop_failed", pid = child.id(), error = %e);
        }
        let _ = child.wait();
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.stop();
    }
}
