use super::EnvLookup;
use std::path::PathBuf;

/// Where the per-symbol CSV files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub prices_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            prices_dir: PathBuf::from("data/prices"),
        }
    }
}

impl SourceConfig {
    pub fn from_vars(lookup: EnvLookup<'_>) -> Self {
        lookup("PRICES_DIR")
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty())
            .map(|dir| Self {
                prices_dir: PathBuf::from(dir),
            })
            .unwrap_or_default()
    }
}
