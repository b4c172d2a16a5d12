// Speech backends
use crate::application::speech::{Announcer, SpeechError};
use async_trait::async_trait;
use tokio::process::Command;

/// Runs an external text-to-speech program with the phrase as its final argument.
#[derive(Debug, Clone)]
pub struct CommandAnnouncer {
    program: String,
    args: Vec<String>,
}

impl CommandAnnouncer {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

#[async_trait]
impl Announcer for CommandAnnouncer {
    async fn speak(&self, phrase: &str) -> Result<(), SpeechError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(phrase)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| SpeechError::Unavailable(format!("{}: {e}", self.program)))?;

        if !status.success() {
            return Err(SpeechError::Rejected(format!("{} exited with {status}", self.program)));
        }
        Ok(())
    }
}

/// Used when no speech program is configured.
#[derive(Debug, Clone, Default)]
pub struct LogAnnouncer;

#[async_trait]
impl Announcer for LogAnnouncer {
    async fn speak(&self, phrase: &str) -> Result<(), SpeechError> {
        tracing::info!(phrase, "announcement");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let announcer = CommandAnnouncer::new("definitely-not-a-tts-binary".to_string(), Vec::new());
        assert!(matches!(
            announcer.speak("valve open").await,
            Err(SpeechError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_is_checked() {
        let ok = CommandAnnouncer::new("true".to_string(), Vec::new());
        assert!(ok.speak("valve open").await.is_ok());

        let failing = CommandAnnouncer::new("false".to_string(), Vec::new());
        assert!(matches!(
            failing.speak("valve open").await,
            Err(SpeechError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_log_announcer_always_succeeds() {
        assert!(LogAnnouncer.speak("audio enabled").await.is_ok());
    }
}
