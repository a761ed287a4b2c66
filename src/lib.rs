pub mod analytics;
pub mod config;
pub mod conversation;
pub mod emotion;
pub mod feedback;
pub mod llm;
pub mod messages;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum NyayaError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Attachment error: {0}")]
    AttachmentError(String),

    #[error("Speech error: {0}")]
    SpeechError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for NyayaError {
    fn from(e: std::io::Error) -> Self {
        NyayaError::IOError(e.to_string())
    }
}

impl NyayaError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A missing key or malformed config file needs the user to fix it
            NyayaError::ConfigError(_) => false,
            NyayaError::AuthError(_) => false,
            // Remote failures are surfaced once and the user may send again
            NyayaError::RequestError(_) => true,
            NyayaError::ApiError(_) => true,
            NyayaError::StreamError(_) => true,
            NyayaError::AttachmentError(_) => true,
            NyayaError::SpeechError(_) => true,
            NyayaError::IOError(_) => false,
            NyayaError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            NyayaError::ConfigError(_) => {
                "Configuration error. Please check your settings and API key.".to_string()
            }
            NyayaError::AuthError(_) => {
                "The AI service rejected the API key. Please check it and restart.".to_string()
            }
            NyayaError::RequestError(_)
            | NyayaError::ApiError(_)
            | NyayaError::StreamError(_) => {
                "AI response generation failed. Please try again.".to_string()
            }
            NyayaError::AttachmentError(_) => {
                "That file could not be attached. Please choose an image.".to_string()
            }
            NyayaError::SpeechError(_) => "Voice output is unavailable right now.".to_string(),
            NyayaError::IOError(_) => "File system error occurred.".to_string(),
            NyayaError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }

    /// The text shown in the error slot when a remote call fails.
    pub fn display_message(&self) -> String {
        let detail = match self {
            NyayaError::ConfigError(m)
            | NyayaError::RequestError(m)
            | NyayaError::AuthError(m)
            | NyayaError::ApiError(m)
            | NyayaError::StreamError(m)
            | NyayaError::AttachmentError(m)
            | NyayaError::SpeechError(m)
            | NyayaError::IOError(m)
            | NyayaError::ChannelError(m) => m,
        };
        format!("Failed to get response from AI: {}", detail)
    }
}

pub type Result<T> = std::result::Result<T, NyayaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let err: NyayaError = io.into();
        assert!(matches!(err, NyayaError::IOError(ref m) if m.contains("missing.png")));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_display_message_wraps_detail() {
        let err = NyayaError::ApiError("quota exceeded".to_string());
        assert_eq!(
            err.display_message(),
            "Failed to get response from AI: quota exceeded"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_error_not_recoverable() {
        let err = NyayaError::ConfigError("no key".to_string());
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("API key"));
    }
}
