//! Address list loading.
//!
//! The settings file is newline delimited; every line longer than
//! [`MIN_ADDRESS_LEN`] characters is one address. It is read once at startup.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Lines of this length or shorter are ignored.
pub const MIN_ADDRESS_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("error opening settings file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
}

pub fn read_addresses(path: &Path) -> Result<Vec<String>, SettingsError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;
    Ok(parse_addresses(&raw))
}

pub fn parse_addresses(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim_end)
        .filter(|line| line.chars().count() > MIN_ADDRESS_LEN)
        .map(str::to_owned)
        .collect()
}
