//! Session-level credential gate.
//!
//! Selection is optimistic: once the selection dialog returns successfully the
//! gate opens immediately, without waiting for `has_selected_credential` to
//! agree. The hosting service's check can lag behind a fresh selection, so a
//! late or stale `false` never closes an open gate. Only an auth-class
//! extraction failure does.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyGate {
    #[default]
    NoKey,
    KeySelected,
}

impl KeyGate {
    pub fn is_open(self) -> bool {
        self == KeyGate::KeySelected
    }

    /// Fold the answer of a "has a key been chosen" check into the gate.
    /// A failed check counts as "no".
    pub fn after_check(self, checked: &Result<bool, String>) -> Self {
        match checked {
            Ok(true) => KeyGate::KeySelected,
            Ok(false) | Err(_) => self,
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CredentialError(pub String);

/// The two operations the hosting environment offers for API keys.
#[async_trait]
pub trait CredentialService: Send + Sync {
    async fn has_selected_credential(&self) -> Result<bool, CredentialError>;

    async fn open_selection_dialog(&self) -> Result<(), CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_failure_fails_closed() {
        let err: Result<bool, String> = Err("unavailable".to_string());
        assert_eq!(KeyGate::NoKey.after_check(&err), KeyGate::NoKey);
        assert_eq!(KeyGate::NoKey.after_check(&Ok(false)), KeyGate::NoKey);
        assert_eq!(KeyGate::NoKey.after_check(&Ok(true)), KeyGate::KeySelected);
    }

    #[test]
    fn test_check_never_downgrades() {
        assert_eq!(KeyGate::KeySelected.after_check(&Ok(false)), KeyGate::KeySelected);
        let err: Result<bool, String> = Err("timeout".to_string());
        assert_eq!(KeyGate::KeySelected.after_check(&err), KeyGate::KeySelected);
    }
}
