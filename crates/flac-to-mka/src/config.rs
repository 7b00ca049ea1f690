//! Locations of external tools, read from an optional TOML file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw config file contents.
#[derive(Debug, Default, Deserialize)]
pub struct ToolsConfig {
    /// Audio merge tool (SoX).
    pub sox: Option<String>,
    /// Matroska muxer.
    pub mkvmerge: Option<String>,
    /// Directory for finished MKA files; defaults to the source directory.
    pub output_dir: Option<String>,
}

/// Resolved tool locations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tools {
    pub sox: PathBuf,
    pub mkvmerge: PathBuf,
    pub output_dir: Option<PathBuf>,
}

impl Default for Tools {
    fn default() -> Self {
        ToolsConfig::default().resolve()
    }
}

impl ToolsConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<ToolsConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Fill unset entries with the executables found on `PATH`.
    pub fn resolve(&self) -> Tools {
        let tool = |value: &Option<String>, default: &str| {
            PathBuf::from(non_empty(value.as_deref()).unwrap_or(default))
        };
        let tools = Tools {
            sox: tool(&self.sox, "sox"),
            mkvmerge: tool(&self.mkvmerge, "mkvmerge"),
            output_dir: non_empty(self.output_dir.as_deref()).map(PathBuf::from),
        };
        tracing::debug!(?tools, "resolved tool configuration");
        tools
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_tools_use_path_lookup() {
        let tools = Tools::default();
        assert_eq!(tools.sox, PathBuf::from("sox"));
        assert_eq!(tools.mkvmerge, PathBuf::from("mkvmerge"));
        assert_eq!(tools.output_dir, None);
    }

    #[test]
    fn parses_partial_file() {
        let cfg: ToolsConfig = toml::from_str(
            r#"
            mkvmerge = "/opt/mkvtoolnix/bin/mkvmerge"
            output_dir = "  "
            "#,
        )
        .unwrap();
        let tools = cfg.resolve();
        assert_eq!(tools.mkvmerge, PathBuf::from("/opt/mkvtoolnix/bin/mkvmerge"));
        assert_eq!(tools.sox, PathBuf::from("sox"));
        assert_eq!(tools.output_dir, None);
    }

    #[test]
    fn load_reports_the_path() {
        let path = std::env::temp_dir().join("flac-to-mka-missing-config.toml");
        let err = ToolsConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("flac-to-mka-missing-config.toml"));
    }
}
