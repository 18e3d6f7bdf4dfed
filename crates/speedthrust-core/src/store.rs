//! Configuration persistence - load once per session, fall back to defaults.
//!
//! The config lives as pretty-printed JSON in session-scoped storage. A file
//! that cannot be read, parsed or validated is archived under `<name>.old`
//! and replaced by defaults; a good file is re-saved so its layout is
//! normalised (keys from older versions are dropped, new keys filled in).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use speedthrust_logic::config::{validate_config, ConfigError, ThrustConfig};

/// File name of the persisted configuration.
pub const CONFIG_FILE_NAME: &str = "SpeedRelativeThrustConfig.json";

/// Name a rejected file is archived under.
pub fn archive_name(name: &str) -> String {
    format!("{}.old", name)
}

/// Session-scoped named file storage.
pub trait ConfigStore {
    fn exists(&self, name: &str) -> bool;
    fn read(&self, name: &str) -> io::Result<String>;
    fn write(&mut self, name: &str, contents: &str) -> io::Result<()>;
    /// Rename a file, replacing any existing file at `to`.
    fn rename(&mut self, from: &str, to: &str) -> io::Result<()>;
}

/// Storage backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ConfigStore for DirStore {
    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.path(name))
    }

    fn write(&mut self, name: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path(name), contents)
    }

    fn rename(&mut self, from: &str, to: &str) -> io::Result<()> {
        let target = self.path(to);
        if target.exists() {
            fs::remove_file(&target)?;
        }
        fs::rename(self.path(from), target)
    }
}

/// In-memory storage, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(name.into(), contents.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

impl ConfigStore for MemoryStore {
    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    fn read(&self, name: &str) -> io::Result<String> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
    }

    fn write(&mut self, name: &str, contents: &str) -> io::Result<()> {
        self.files.insert(name.to_string(), contents.to_string());
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> io::Result<()> {
        let contents = self
            .files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, from.to_string()))?;
        self.files.insert(to.to_string(), contents);
        Ok(())
    }
}

/// Errors that can occur while loading or saving the configuration
#[derive(Debug)]
pub enum ConfigLoadError {
    Io(io::Error),
    Parse(serde_json::Error),
    Invalid(Vec<ConfigError>),
}

impl From<io::Error> for ConfigLoadError {
    fn from(e: io::Error) -> Self {
        ConfigLoadError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigLoadError {
    fn from(e: serde_json::Error) -> Self {
        ConfigLoadError::Parse(e)
    }
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::Io(e) => write!(f, "IO error: {}", e),
            ConfigLoadError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigLoadError::Invalid(errors) => {
                write!(f, "Invalid configuration: ")?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigLoadError::Io(e) => Some(e),
            ConfigLoadError::Parse(e) => Some(e),
            ConfigLoadError::Invalid(_) => None,
        }
    }
}

/// Read, parse and validate the stored configuration.
pub fn try_load_config(store: &impl ConfigStore) -> Result<ThrustConfig, ConfigLoadError> {
    let text = store.read(CONFIG_FILE_NAME)?;
    let config: ThrustConfig = serde_json::from_str(&text)?;

    let errors = validate_config(&config);
    if !errors.is_empty() {
        return Err(ConfigLoadError::Invalid(errors));
    }
    Ok(config)
}

/// Write the configuration in its normalised form.
pub fn save_config(
    store: &mut impl ConfigStore,
    config: &ThrustConfig,
) -> Result<(), ConfigLoadError> {
    let text = serde_json::to_string_pretty(config)?;
    store.write(CONFIG_FILE_NAME, &text)?;
    Ok(())
}

/// Load the session configuration, never failing.
///
/// Missing file: defaults are written and returned. Bad file: archived,
/// then defaults are written and returned. Good file: re-saved and
/// returned.
pub fn load_config(store: &mut impl ConfigStore) -> ThrustConfig {
    if store.exists(CONFIG_FILE_NAME) {
        match try_load_config(store) {
            Ok(config) => {
                persist(store, &config);
                return config;
            }
            Err(e) => {
                log::warn!("Failed to load thrust configuration: {}", e);
                let archive = archive_name(CONFIG_FILE_NAME);
                match store.rename(CONFIG_FILE_NAME, &archive) {
                    Ok(()) => log::info!("Archived rejected configuration as {}", archive),
                    Err(e) => log::warn!("Failed to archive rejected configuration: {}", e),
                }
            }
        }
    } else {
        log::info!("No thrust configuration found, writing defaults");
    }

    let config = ThrustConfig::default();
    persist(store, &config);
    config
}

fn persist(store: &mut impl ConfigStore, config: &ThrustConfig) {
    if let Err(e) = save_config(store, config) {
        log::warn!("Failed to save thrust configuration: {}", e);
    }
}
