//! Mapping extraction failures onto the user-facing taxonomy.
//!
//! The provider reports a bad key only through free-text messages, so the
//! "is this an auth failure" rule lives behind [`AuthFailureClassifier`] and
//! can be swapped (or configured) without touching the state machine.

use crate::error::{AppError, ExtractionError};

pub trait AuthFailureClassifier: Send + Sync {
    fn is_auth_failure(&self, message: &str) -> bool;
}

/// Substring matcher over provider error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMarkers {
    markers: Vec<String>,
}

impl MessageMarkers {
    pub const DEFAULT_MARKERS: [&'static str; 2] =
        ["API key not valid", "Requested entity was not found"];

    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl Default for MessageMarkers {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKERS)
    }
}

impl AuthFailureClassifier for MessageMarkers {
    fn is_auth_failure(&self, message: &str) -> bool {
        self.markers.iter().any(|m| message.contains(m.as_str()))
    }
}

/// Translate an extraction failure into what the user sees.
///
/// Only failures of the service call are candidates for the auth class; an
/// unparseable body never touches credential state.
pub fn classify(err: ExtractionError, classifier: &dyn AuthFailureClassifier) -> AppError {
    match err {
        ExtractionError::NoFiles => AppError::Validation,
        ExtractionError::Unparseable => AppError::Parse,
        ExtractionError::MissingCredential => AppError::Authentication,
        ExtractionError::Service { message } if classifier.is_auth_failure(&message) => {
            AppError::Authentication
        }
        other => AppError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers() {
        let c = MessageMarkers::default();
        assert!(c.is_auth_failure(
            "400 Bad Request: API key not valid. Please pass a valid API key."
        ));
        assert!(c.is_auth_failure("404 Not Found: Requested entity was not found."));
        assert!(!c.is_auth_failure("429 Too Many Requests: Resource has been exhausted"));
    }

    #[test]
    fn test_classify_taxonomy() {
        let c = MessageMarkers::default();
        assert_eq!(
            classify(ExtractionError::service("API key not valid"), &c),
            AppError::Authentication
        );
        assert_eq!(classify(ExtractionError::Unparseable, &c), AppError::Parse);
        assert_eq!(classify(ExtractionError::NoFiles, &c), AppError::Validation);
        assert_eq!(
            classify(ExtractionError::MissingCredential, &c),
            AppError::Authentication
        );
        assert_eq!(
            classify(ExtractionError::service("connection reset"), &c),
            AppError::Transport("connection reset".to_string())
        );
    }

    #[test]
    fn test_custom_markers_replace_defaults() {
        let c = MessageMarkers::new(["PERMISSION_DENIED", ""]);
        assert_eq!(c.markers().len(), 1);
        assert!(c.is_auth_failure("403 Forbidden: PERMISSION_DENIED"));
        assert_eq!(
            classify(ExtractionError::service("API key not valid"), &c),
            AppError::Transport("API key not valid".to_string())
        );
    }
}
