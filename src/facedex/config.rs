use crate::error::{FacedexError, Result};
use crate::model::ReplaceRule;
use crate::transform::ReplacePipeline;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_PER_PAGE: usize = 20;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Startup configuration, stored as JSON.
///
/// `host`, `port`, `debug` and `no_browser` belong to the server bootstrap and are only
/// carried through here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacedexConfig {
    /// Source documents, in switcher order. The first one is current by default.
    #[serde(default)]
    pub sources: Vec<PathBuf>,

    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Ordered `[old, new]` substitutions applied to every loaded document.
    #[serde(default)]
    pub replace: Vec<ReplaceRule>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub no_browser: bool,
}

fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for FacedexConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            per_page: DEFAULT_PER_PAGE,
            replace: Vec::new(),
            host: default_host(),
            port: DEFAULT_PORT,
            debug: false,
            no_browser: false,
        }
    }
}

impl FacedexConfig {
    /// Load config from `path`, or return defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: FacedexConfig = serde_json::from_str(&content)
            .map_err(|e| FacedexError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save config to `path`, creating the parent directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(FacedexError::NoSources);
        }
        if self.per_page == 0 {
            return Err(FacedexError::Config("per_page must be at least 1".to_string()));
        }
        if let Some(rule) = self
            .replace
            .iter()
            .find(|r| r.old.is_empty() || r.new.is_empty())
        {
            return Err(FacedexError::Config(format!(
                "replace rule [{:?}, {:?}] has an empty side",
                rule.old, rule.new
            )));
        }
        Ok(())
    }

    pub fn pipeline(&self) -> ReplacePipeline {
        ReplacePipeline::new(self.replace.clone())
    }
}
