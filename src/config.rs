use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::{Level, info};

use crate::resources::{LiteralResources, ResourceResolver, ResourceTable};
use crate::store::JsonFileStore;

/// Environment variable overriding the log level
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Environment variable overriding the store directory
pub const STORE_DIR_VAR: &str = "PREFS_TREE_STORE_DIR";

/// Settings for one CLI invocation.
/// Command-line flags win over environment variables, which win over defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub store_dir: PathBuf,
    /// JSON resource table for `@type/name` references
    pub resources: Option<PathBuf>,
    pub log_level: Level,
    /// Requested level name that was not recognised; logged once the
    /// subscriber is installed
    pub unknown_log_level: Option<String>,
}

impl RunConfig {
    pub fn resolve(
        store_dir: Option<PathBuf>,
        resources: Option<PathBuf>,
        log_level: Option<&str>,
    ) -> Self {
        let store_dir = store_dir
            .or_else(|| env::var_os(STORE_DIR_VAR).map(PathBuf::from))
            .unwrap_or_else(JsonFileStore::default_dir);

        let requested = match log_level {
            Some(level) => level.to_string(),
            None => env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "info".to_string()),
        };
        let (log_level, unknown_log_level) = match parse_level(&requested) {
            Some(level) => (level, None),
            None => (Level::INFO, Some(requested)),
        };

        Self {
            store_dir,
            resources,
            log_level,
            unknown_log_level,
        }
    }

    /// Resource table from `resources`, or literal-only resolution
    pub fn load_resources(&self) -> Result<Box<dyn ResourceResolver + Send + Sync>> {
        let Some(path) = &self.resources else {
            return Ok(Box::new(LiteralResources));
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read resources from {}", path.display()))?;
        let table = ResourceTable::from_json(&text)
            .with_context(|| format!("Failed to parse resources in {}", path.display()))?;
        info!(path = %path.display(), "Loaded resource table");
        Ok(Box::new(table))
    }

    pub fn open_store(&self, namespace: &str) -> Result<JsonFileStore> {
        JsonFileStore::open(&self.store_dir, namespace).with_context(|| {
            format!(
                "Failed to open store '{namespace}' in {}",
                self.store_dir.display()
            )
        })
    }
}

pub fn parse_level(text: &str) -> Option<Level> {
    match text.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
