use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use ledgerscan_core::MessageMarkers;
use ledgerscan_extract::GeminiSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_ledgerscan_home;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,

    /// Print the effective configuration
    Show,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiSection,
    pub auth: AuthSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiSection {
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthSection {
    /// Substrings of provider errors that mean "the key is bad".
    pub invalid_key_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputSection {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl Default for GeminiSection {
    fn default() -> Self {
        let s = GeminiSettings::default();
        Self {
            model: s.model,
            base_url: s.base_url,
        }
    }
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            invalid_key_markers: MessageMarkers::DEFAULT_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            model: self.gemini.model.clone(),
            base_url: self.gemini.base_url.clone(),
        }
    }

    pub fn classifier(&self) -> MessageMarkers {
        MessageMarkers::new(self.auth.invalid_key_markers.iter().cloned())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_ledgerscan_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            let p = config_path()?;
            if p.exists() {
                println!("Config already exists: {}", p.display());
                return Ok(());
            }
            save_config(&Config::default(), &p)?;
            println!("Wrote {}", p.display());
        }
        ConfigCommand::Show => {
            let cfg = load_config()?;
            print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.gemini.model, "gemini-2.5-flash");
        assert_eq!(cfg.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[gemini]\nmodel = \"gemini-2.5-pro\"\n\n[output]\nformat = \"csv\"\n").unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.gemini.model, "gemini-2.5-pro");
        assert_eq!(cfg.gemini.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(cfg.output.format, OutputFormat::Csv);
        assert_eq!(cfg.auth, AuthSection::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.auth.invalid_key_markers = vec!["PERMISSION_DENIED".to_string()];
        save_config(&cfg, &p).unwrap();

        let loaded = load_config_from(&p).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.classifier().markers(), &["PERMISSION_DENIED".to_string()]);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[gemini\nmodel = 1").unwrap();
        assert!(load_config_from(&p).is_err());
    }
}
