//! Error types shared by the extraction client and the screen state machine.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one extraction attempt, as reported by an [`crate::Extractor`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Extraction was invoked with nothing to send. No request is issued.
    #[error("no files were provided for extraction")]
    NoFiles,

    /// A staged file could not be read.
    #[error("could not read {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    /// No API key could be resolved when the call was about to be made.
    #[error("no API key is configured for the extraction service")]
    MissingCredential,

    /// The model endpoint call itself failed (network, quota, auth, server).
    #[error("{message}")]
    Service { message: String },

    /// The call succeeded but the body was not the expected JSON document.
    #[error("Could not parse the data from the bank statement. The document format might be unsupported.")]
    Unparseable,
}

impl ExtractionError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }
}

/// Errors surfaced to the user. None of them are fatal to the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Please select at least one bank statement image.")]
    Validation,

    /// The key selection action failed; the detail is kept for logs.
    #[error("Could not open the API key selection dialog.")]
    CredentialDialog(String),

    #[error("Your API key appears to be invalid. Please select a valid API key to continue.")]
    Authentication,

    #[error("Could not parse the data from the bank statement. The document format might be unsupported.")]
    Parse,

    #[error("{0}")]
    Transport(String),
}

impl AppError {
    /// Whether this failure should send the user back to key selection.
    pub fn revokes_credential(&self) -> bool {
        matches!(self, AppError::Authentication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages_match() {
        assert_eq!(
            ExtractionError::Unparseable.to_string(),
            AppError::Parse.to_string()
        );
        assert!(AppError::Parse.to_string().contains("document format might be unsupported"));
    }

    #[test]
    fn test_transport_message_is_passed_through() {
        let e = AppError::Transport("429 Too Many Requests: quota exhausted".to_string());
        assert_eq!(e.to_string(), "429 Too Many Requests: quota exhausted");
        assert!(!e.revokes_credential());
        assert!(AppError::Authentication.revokes_credential());
    }
}
