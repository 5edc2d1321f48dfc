//! Reading and writing ledger documents
//!
//! Format follows the file extension: `.toml`, `.json`, `.yaml`/`.yml`.

use crate::error::{CliError, CliResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> CliResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(DocumentFormat::Toml),
            Some("json") => Ok(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            _ => Err(CliError::InvalidArgument(format!(
                "{}: expected a .toml, .json or .yaml file",
                path.display()
            ))),
        }
    }
}

pub fn read_document<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let format = DocumentFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => CliError::NotFound(path.display().to_string()),
        _ => CliError::Io(err),
    })?;
    tracing::debug!(path = %path.display(), format = ?format, "Loading document");
    Ok(match format {
        DocumentFormat::Toml => toml::from_str(&raw)?,
        DocumentFormat::Json => serde_json::from_str(&raw)?,
        DocumentFormat::Yaml => serde_yaml::from_str(&raw)?,
    })
}

pub fn write_document<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let text = match DocumentFormat::from_path(path)? {
        DocumentFormat::Toml => toml::to_string_pretty(value)?,
        DocumentFormat::Json => serde_json::to_string_pretty(value)?,
        DocumentFormat::Yaml => serde_yaml::to_string(value)?,
    };
    std::fs::write(path, text)?;
    tracing::debug!(path = %path.display(), "Document written");
    Ok(())
}
