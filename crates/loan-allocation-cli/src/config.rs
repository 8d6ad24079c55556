use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::input;

/// Optional YAML run configuration. Command-line flags take precedence over
/// every field here.
///
/// ```yaml
/// dataset_dir: data/large
/// output_dir: out
/// log_level: debug
/// diagnostics: out/rejections.csv
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub dataset_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub diagnostics: Option<PathBuf>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        input::file::read_yaml(path)
    }

    /// Dataset directory: flag, then config, then the working directory.
    pub fn dataset_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.dataset_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Output directory: flag, then config, then the dataset directory.
    pub fn output_dir(&self, flag: Option<PathBuf>, dataset_dir: &Path) -> PathBuf {
        flag.or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| dataset_dir.to_path_buf())
    }

    pub fn diagnostics(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.diagnostics.clone())
    }
}
