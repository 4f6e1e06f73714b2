mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use sitechunk_chunker::{TextSplitter, validate_selector};

pub const DEFAULT_CONFIG_PATH: &str = "sitechunk.toml";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file location: explicit path, then `SITECHUNK_CONFIG`, then
    /// [`DEFAULT_CONFIG_PATH`].
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var("SITECHUNK_CONFIG")
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    /// Reject configurations that cannot produce a valid run.
    ///
    /// Builds the splitter and parses the HTML selectors once so bad
    /// patterns and unavailable tokenizers are reported before any input is
    /// read.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        TextSplitter::new(&self.chunker)?;
        if self.loader.max_file_size == 0 {
            bail!("invalid configuration: loader.max_file_size must be positive");
        }
        if self.loader.html_selector.trim().is_empty() {
            bail!("invalid configuration: loader.html_selector must not be empty");
        }
        validate_selector(&self.loader.html_selector).context("loader.html_selector")?;
        if !self.loader.html_exclude_selector.trim().is_empty() {
            validate_selector(&self.loader.html_exclude_selector)
                .context("loader.html_exclude_selector")?;
        }
        if self.output.path.as_os_str().is_empty() {
            bail!("invalid configuration: output.path must not be empty");
        }
        Ok(())
    }
}
