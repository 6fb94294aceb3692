//! Where passbook keeps its files: `$PASSBOOK_HOME`, else `~/.passbook`.

use anyhow::{Context, Result, bail};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

const HOME_OVERRIDE: &str = "PASSBOOK_HOME";
const CONFIG_FILE: &str = "config.toml";

fn resolve_home(override_dir: Option<OsString>, user_home: Option<OsString>) -> Option<PathBuf> {
    match override_dir.filter(|d| !d.is_empty()) {
        Some(dir) => Some(PathBuf::from(dir)),
        None => user_home
            .filter(|h| !h.is_empty())
            .map(|h| PathBuf::from(h).join(".passbook")),
    }
}

pub fn passbook_home() -> Result<PathBuf> {
    match resolve_home(std::env::var_os(HOME_OVERRIDE), std::env::var_os("HOME")) {
        Some(dir) => Ok(dir),
        None => bail!("neither {HOME_OVERRIDE} nor HOME is set"),
    }
}

/// Default config location. Nothing is created; reads of a missing file fall
/// back to defaults.
pub fn config_file() -> Result<PathBuf> {
    Ok(passbook_home()?.join(CONFIG_FILE))
}

/// Default config location, creating its directory for a write.
pub fn config_file_for_write() -> Result<PathBuf> {
    let dir = passbook_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.join(CONFIG_FILE))
}
