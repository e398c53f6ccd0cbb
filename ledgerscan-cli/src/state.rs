use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$LEDGERSCAN_HOME`, else `~/.ledgerscan`.
pub fn ledgerscan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("LEDGERSCAN_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".ledgerscan"))
}

pub fn ensure_ledgerscan_home() -> Result<PathBuf> {
    let dir = ledgerscan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn log_path() -> Result<PathBuf> {
    Ok(ensure_ledgerscan_home()?.join("ledgerscan.log"))
}
