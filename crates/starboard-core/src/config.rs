use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run settings for regenerating the pin table.
///
/// Loaded from a TOML file when one exists next to the README, otherwise
/// defaults. Identity and secrets stay out of here - they come from CLI
/// flags and env vars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The document whose pin table we own.
    #[serde(default = "default_readme_path")]
    pub readme_path: PathBuf,

    /// Literal marker bounding the start of the owned region.
    #[serde(default = "default_start_token")]
    pub start_token: String,

    /// Literal marker bounding the end of the owned region.
    #[serde(default = "default_end_token")]
    pub end_token: String,

    /// Columns in the rendered table.
    #[serde(default = "default_columns")]
    pub columns: usize,

    /// Losing more than this percentage of pins relative to the previous run
    /// fails the run instead of publishing a shrunken table.
    #[serde(default = "default_fatal_loss_percent")]
    pub fatal_loss_percent: u32,

    /// Items per API page, 1..=100.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Theme passed to the stats-card service.
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Where the JSON snapshot artifact goes.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_readme_path() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_start_token() -> String {
    "<!-- REPO-TABLE-INJECT-START -->".to_string()
}

fn default_end_token() -> String {
    "<!-- REPO-TABLE-INJECT-END -->".to_string()
}

fn default_columns() -> usize {
    2
}

fn default_fatal_loss_percent() -> u32 {
    // Losing up to 20% of pins to rate limits is tolerable
    80
}

fn default_page_size() -> u32 {
    100
}

fn default_theme() -> String {
    "vue-dark".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("self-starred-repos.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            readme_path: default_readme_path(),
            start_token: default_start_token(),
            end_token: default_end_token(),
            columns: default_columns(),
            fatal_loss_percent: default_fatal_loss_percent(),
            page_size: default_page_size(),
            theme: default_theme(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Config {
    /// Load config from `path`, or fall back to defaults when the file does
    /// not exist.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {e}")))
    }
}
