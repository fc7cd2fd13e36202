//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. `unref.toml` in the user's config directory, if present,
//! 3. an explicit file (TOML, YAML or JSON, chosen by extension),
//! 4. environment variables prefixed `UNREF_`, with `__` between nested
//!    keys (`UNREF_ANALYSIS__BATCH_SIZE=20`).
//!
//! ```toml
//! project_root = "/home/me/game"
//! search_root = "/home/me/game/assets"
//!
//! [analysis]
//! batch_size = 10
//! yield_every = 100
//!
//! [cache]
//! max_entries = 2000
//! max_bytes = 209715200
//!
//! [quarantine]
//! suffix = "_temp_unused"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use unref_cache::CacheLimits;
use unref_library::Options;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "UNREF_";
/// Name of the per-user config file.
pub const FILE_NAME: &str = "unref.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Assets checked concurrently per batch.
    pub batch_size: usize,
    /// Files scanned between cooperative yields.
    pub yield_every: usize,
}
impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_size: unref_library::analyze::DEFAULT_BATCH_SIZE,
            yield_every: unref_library::scan::DEFAULT_YIELD_EVERY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineConfig {
    pub suffix: String,
}
impl Default for QuarantineConfig {
    fn default() -> Self {
        Self { suffix: unref_library::quarantine::DEFAULT_SUFFIX.to_owned() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the game project.
    pub project_root: Option<PathBuf>,
    /// Where references are searched for. Falls back to the project's
    /// `assets` folder, then to the folder being scanned.
    pub search_root: Option<PathBuf>,
    pub analysis: AnalysisConfig,
    pub cache: CacheLimits,
    pub quarantine: QuarantineConfig,
}

/// Location of the per-user config file, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "unref").map(|dirs| dirs.config_dir().join(FILE_NAME))
}

impl Config {
    /// Every source layered in precedence order, ready to extract.
    ///
    /// `user_file` is skipped when absent. `explicit` must exist.
    pub fn figment(user_file: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = user_file {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
            }
            let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Invalid)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the user config file, `explicit` and the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user_file = user_config_path();
        if let Some(path) = &user_file {
            tracing::debug!(path = %path.display(), "Looking for user config");
        }
        Self::from_figment(&Self::figment(user_file.as_deref(), explicit)?)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field, reason| ErrorKind::Validation { field, reason };
        if self.analysis.batch_size == 0 {
            exn::bail!(invalid("analysis.batch_size", "must be at least 1"));
        }
        if self.analysis.yield_every == 0 {
            exn::bail!(invalid("analysis.yield_every", "must be at least 1"));
        }
        if self.cache.max_entries == 0 {
            exn::bail!(invalid("cache.max_entries", "must be at least 1"));
        }
        if self.quarantine.suffix.is_empty() {
            exn::bail!(invalid("quarantine.suffix", "must not be empty"));
        }
        if self.quarantine.suffix.contains(['/', '\\']) {
            exn::bail!(invalid("quarantine.suffix", "must not contain path separators"));
        }
        Ok(())
    }

    /// Where references should be searched for when the caller doesn't say.
    pub fn effective_search_root(&self) -> Option<PathBuf> {
        self.search_root.clone().or_else(|| self.project_root.as_ref().map(|root| root.join("assets")))
    }

    /// Session options matching this configuration.
    pub fn session_options(&self) -> Options {
        Options {
            search_root: self.effective_search_root(),
            batch_size: self.analysis.batch_size,
            yield_every: self.analysis.yield_every,
            cache: self.cache,
            quarantine_suffix: self.quarantine.suffix.clone(),
        }
    }
}
