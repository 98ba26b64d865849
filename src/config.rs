use crate::hierarchy::HierarchyEntry;
use crate::pdf::{Orientation, DEFAULT_FILENAME};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "ENERGY_BALANCE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "energy-balance.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV export of the meter sheet.
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("EB.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub filename: String,
    pub orientation: Orientation,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            filename: DEFAULT_FILENAME.to_string(),
            orientation: Orientation::Portrait,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub export: ExportConfig,
    /// Added to, or overriding, the built-in hierarchy table.
    pub hierarchy: Vec<HierarchyEntry>,
}

impl AppConfig {
    /// Reads the file named by `ENERGY_BALANCE_CONFIG`, else
    /// `energy-balance.toml` when it exists, else the defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.dataset.path, PathBuf::from("EB.csv"));
        assert_eq!(cfg.export.filename, "Report.pdf");
        assert_eq!(cfg.export.orientation, Orientation::Portrait);
        assert!(cfg.hierarchy.is_empty());
    }

    #[test]
    fn parses_all_sections() {
        let cfg = AppConfig::from_toml(
            r#"
            [dataset]
            path = "data/linked_11kv.csv"

            [export]
            output_dir = "out"
            orientation = "landscape"

            [[hierarchy]]
            nocs = "Uttara"
            circle = "Uttara"
            zone = "North"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.dataset.path, PathBuf::from("data/linked_11kv.csv"));
        assert_eq!(cfg.export.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.export.filename, "Report.pdf");
        assert_eq!(cfg.export.orientation, Orientation::Landscape);
        assert_eq!(cfg.hierarchy.len(), 1);
        assert_eq!(cfg.hierarchy[0].zone, "North");
    }

    #[test]
    fn rejects_unknown_orientation() {
        assert!(AppConfig::from_toml("[export]\norientation = \"sideways\"").is_err());
    }
}
