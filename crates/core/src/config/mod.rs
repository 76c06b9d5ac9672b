use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{tree::ContainerKind, Result};

/// Top-level configuration structure for the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Container kind used for the root of a fresh layout.
    pub root_kind: ContainerKind,
    /// Root label of the widget catalogue index.
    pub catalogue_label: String,
    /// Layout restored on startup, if any.
    pub layout: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            root_kind: ContainerKind::Free,
            catalogue_label: "Widgets".to_string(),
            layout: None,
        }
    }
}

impl ShellConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config = ShellConfig::from_json(r#"{"root_kind":"stack"}"#).unwrap();
        assert_eq!(config.root_kind, ContainerKind::Stack);
        assert_eq!(config.catalogue_label, "Widgets");
        assert!(config.layout.is_none());

        assert_eq!(ShellConfig::from_json("{}").unwrap(), ShellConfig::default());
    }
}
