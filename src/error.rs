use thiserror::Error;

/// Application-level errors using thiserror for structured error handling.
///
/// These errors represent domain-specific failures that can occur during
/// application operation. They provide context and can be chained with anyhow.

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No audio source attached to the output")]
    NoSource,

    #[error("Seek to {position:.3}s failed: {reason}")]
    SeekFailed { position: f64, reason: String },

    #[error("Audio playback rejected: {0}")]
    PlaybackRejected(String),
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No API key found in environment variable {var}")]
    MissingApiKey { var: String },

    #[error("Chat request failed: {0}")]
    Request(String),

    #[error("Chat service returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Chat stream interrupted")]
    Stream(#[source] std::io::Error),

    #[error("Malformed chat response")]
    Decode(#[source] serde_json::Error),

    #[error("Chat service reported an error: {0}")]
    Service(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine a configuration directory")]
    NoConfigDir,

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoundboardError {
    #[error("There is no soundboard button {0}")]
    UnknownItem(u8),
}

/// Rejected user input on one of the pages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error(transparent)]
    Soundboard(#[from] SoundboardError),

    #[error("Nothing with id {0} is falling right now")]
    UnknownGameItem(u64),

    #[error("The game is not running")]
    GameNotRunning,

    #[error("Open the {0} page first")]
    NotOnPage(&'static str),

    #[error("Wait for the judge to finish answering")]
    ChatBusy,

    #[error("Type something to say")]
    EmptyMessage,

    #[error("Chat is unavailable: {0}")]
    ChatUnavailable(String),
}

/// A shell line that could not be understood
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("Unknown command '{0}' (type 'help')")]
    UnknownCommand(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = AudioError::PlaybackRejected("no output".to_string());
        assert_eq!(err.to_string(), "Audio playback rejected: no output");

        let err = ChatError::MissingApiKey {
            var: "GEMINI_API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No API key found in environment variable GEMINI_API_KEY"
        );

        let err = AudioError::SeekFailed {
            position: 1.88,
            reason: "unsupported".to_string(),
        };
        assert_eq!(err.to_string(), "Seek to 1.880s failed: unsupported");
    }

    #[test]
    fn test_error_source_chain() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let config_err = ConfigError::LoadFailed {
            path: "/test/config.json".to_string(),
            source: Box::new(io_err),
        };

        assert!(config_err.source().is_some());
        assert_eq!(
            config_err.to_string(),
            "Failed to load configuration from /test/config.json"
        );

        let audio_err = AudioError::LoadFailed {
            path: "clip.mp3".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(audio_err.source().is_some());
    }
}
