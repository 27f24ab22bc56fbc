//! Document loading and rendering; format follows the file extension

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Json,
    Yaml,
}

impl Format {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml" | "yml") => Ok(Format::Yaml),
            other => bail!(
                "{}: unsupported extension {:?}, expected .json, .yaml or .yml",
                path.display(),
                other.unwrap_or("")
            ),
        }
    }

    pub(crate) fn from_name(name: &str) -> Result<Self> {
        match name {
            "json" => Ok(Format::Json),
            "yaml" => Ok(Format::Yaml),
            other => bail!("unknown output format {other}"),
        }
    }
}

/// Read and parse a JSON or YAML document
pub(crate) fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = Format::from_path(path)?;
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value = match format {
        Format::Json => serde_json::from_str(&source).with_context(|| format!("parsing {}", path.display()))?,
        Format::Yaml => serde_yaml::from_str(&source).with_context(|| format!("parsing {}", path.display()))?,
    };
    tracing::debug!(path = %path.display(), ?format, "document loaded");
    Ok(value)
}

/// Render a value for stdout
pub(crate) fn render<T: Serialize>(value: &T, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    })
}
