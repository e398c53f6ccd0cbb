use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Subcommand;
use ledgerscan_core::{CredentialError, CredentialService};
use ledgerscan_extract::ApiKeySource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::state::ensure_ledgerscan_home;

/// Checked in order before falling back to auth.json.
pub const KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Paste a Gemini API key and store it in ~/.ledgerscan/auth.json
    SetKey,

    /// Show where the active key comes from
    Status,

    /// Forget the stored key
    Clear,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthState {
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env(&'static str),
    File,
}

/// Key storage backed by `auth.json`, with environment overrides.
///
/// Once a key is entered through this store, the stored key wins over the
/// environment for the rest of the process, so a rejected `GEMINI_API_KEY`
/// can be replaced without restarting. Clones share that state.
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
    selected: Arc<AtomicBool>,
}

impl AuthStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            selected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(ensure_ledgerscan_home()?.join("auth.json")))
    }

    pub fn load(&self) -> Result<AuthState> {
        if !self.path.exists() {
            return Ok(AuthState::default());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", self.path.display()))
    }

    pub fn save(&self, auth: &AuthState) -> Result<()> {
        let s = serde_json::to_string_pretty(auth)?;
        fs::write(&self.path, s).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    pub fn set_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            bail!("no key entered");
        }
        let mut auth = self.load()?;
        auth.gemini_api_key = Some(key.to_string());
        self.save(&auth)?;
        self.selected.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn clear_key(&self) -> Result<()> {
        let mut auth = self.load()?;
        auth.gemini_api_key = None;
        self.save(&auth)?;
        self.selected.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Active key and where it came from. Read fresh on every call.
    pub fn resolve(&self) -> Result<Option<(String, KeySource)>> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    fn resolve_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<Option<(String, KeySource)>> {
        let stored = self
            .load()?
            .gemini_api_key
            .filter(|k| !k.trim().is_empty())
            .map(|k| (k, KeySource::File));
        if self.selected.load(Ordering::SeqCst) && stored.is_some() {
            return Ok(stored);
        }

        for var in KEY_ENV_VARS {
            if let Some(v) = env(var) {
                if !v.trim().is_empty() {
                    return Ok(Some((v.trim().to_string(), KeySource::Env(var))));
                }
            }
        }
        Ok(stored)
    }
}

impl ApiKeySource for AuthStore {
    fn api_key(&self) -> Option<String> {
        match self.resolve() {
            Ok(found) => found.map(|(k, _)| k),
            Err(e) => {
                warn!(error = %e, "could not read stored API key");
                None
            }
        }
    }
}

#[async_trait]
impl CredentialService for AuthStore {
    async fn has_selected_credential(&self) -> Result<bool, CredentialError> {
        self.resolve()
            .map(|found| found.is_some())
            .map_err(|e| CredentialError(format!("{e:#}")))
    }

    async fn open_selection_dialog(&self) -> Result<(), CredentialError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let key = prompt_secret("Paste Gemini API key")?;
            store.set_key(&key)?;
            info!("API key stored in {}", store.path.display());
            Ok(())
        })
        .await
        .map_err(|e| CredentialError(e.to_string()))?
        .map_err(|e| CredentialError(format!("{e:#}")))
    }
}

fn prompt_secret(label: &str) -> Result<String> {
    // Plain stdin read; the key is echoed.
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    let n = io::stdin().read_line(&mut s)?;
    if n == 0 {
        bail!("stdin closed before a key was entered");
    }
    Ok(s.trim().to_string())
}

fn masked(key: &str) -> String {
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{tail}")
}

pub async fn run(command: AuthCommand) -> Result<()> {
    let store = AuthStore::open_default()?;
    match command {
        AuthCommand::SetKey => {
            store.open_selection_dialog().await?;
            println!("Saved Gemini API key to {}", store.path.display());
        }
        AuthCommand::Status => match store.resolve()? {
            Some((key, KeySource::Env(var))) => println!("Using {} from ${var}", masked(&key)),
            Some((key, KeySource::File)) => {
                println!("Using {} from {}", masked(&key), store.path.display())
            }
            None => println!("No API key selected. Run: ledgerscan auth set-key"),
        },
        AuthCommand::Clear => {
            store.clear_key()?;
            println!("Removed stored key from {}", store.path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, AuthStore) {
        let dir = tempfile::tempdir().unwrap();
        let s = AuthStore::new(dir.path().join("auth.json"));
        (dir, s)
    }

    #[test]
    fn test_set_and_clear_key() {
        let (_dir, s) = store();
        assert_eq!(s.load().unwrap(), AuthState::default());

        s.set_key("  AIzaTestKey \n").unwrap();
        assert_eq!(s.load().unwrap().gemini_api_key.as_deref(), Some("AIzaTestKey"));

        s.clear_key().unwrap();
        assert_eq!(s.load().unwrap().gemini_api_key, None);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let (_dir, s) = store();
        assert!(s.set_key("   ").is_err());
        assert_eq!(s.load().unwrap().gemini_api_key, None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, s) = store();
        fs::write(&s.path, "{not json").unwrap();
        assert!(s.load().is_err());
    }

    fn stale_env(var: &str) -> Option<String> {
        (var == "GEMINI_API_KEY").then(|| "stale-bad-key".to_string())
    }

    #[test]
    fn test_env_key_wins_until_a_key_is_entered() {
        let (_dir, s) = store();
        fs::write(&s.path, r#"{"gemini_api_key":"from-file"}"#).unwrap();
        assert_eq!(
            s.resolve_with(stale_env).unwrap(),
            Some(("stale-bad-key".to_string(), KeySource::Env("GEMINI_API_KEY")))
        );

        s.set_key("fresh-good-key").unwrap();
        assert_eq!(
            s.resolve_with(stale_env).unwrap(),
            Some(("fresh-good-key".to_string(), KeySource::File))
        );
    }

    #[test]
    fn test_entered_key_is_shared_with_clones() {
        let (_dir, s) = store();
        let seen_by_extractor = s.clone();
        s.set_key("fresh-good-key").unwrap();
        assert_eq!(
            seen_by_extractor.resolve_with(stale_env).unwrap().map(|(k, _)| k),
            Some("fresh-good-key".to_string())
        );
    }

    #[test]
    fn test_clear_hands_back_to_env() {
        let (_dir, s) = store();
        s.set_key("fresh-good-key").unwrap();
        s.clear_key().unwrap();
        assert_eq!(
            s.resolve_with(stale_env).unwrap().map(|(_, src)| src),
            Some(KeySource::Env("GEMINI_API_KEY"))
        );
        assert_eq!(s.resolve_with(|_| None).unwrap(), None);
    }

    #[test]
    fn test_masked() {
        assert_eq!(masked("AIzaSyABCDEFG1234"), "****1234");
        assert_eq!(masked("ab"), "****ab");
    }
}
