//! Save repositories.
//!
//! One save slot per level, keyed by level name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

use super::LevelSnapshot;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("save repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("level name '{0}' cannot be used as a save slot")]
    InvalidLevelName(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Repository for level snapshots.
pub trait SaveRepository {
    fn save(&self, snapshot: &LevelSnapshot) -> Result<()>;

    fn load(&self, level: &str) -> Result<Option<LevelSnapshot>>;

    fn exists(&self, level: &str) -> bool;

    fn delete(&self, level: &str) -> Result<()>;

    /// Levels with a save, sorted by name.
    fn list_levels(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// On-disk encoding of a save slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveFormat {
    /// Compact bincode, `{level}.bin`.
    #[default]
    Binary,
    /// Human-readable JSON, `{level}.json`.
    Json,
}

impl SaveFormat {
    fn extension(self) -> &'static str {
        match self {
            SaveFormat::Binary => "bin",
            SaveFormat::Json => "json",
        }
    }
}

/// File-based implementation of SaveRepository.
///
/// Writes go to a temporary file that is then renamed over the slot, so a
/// crash never leaves a half-written save behind.
pub struct FileSaveRepository {
    base_dir: PathBuf,
    format: SaveFormat,
}

impl FileSaveRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            format: SaveFormat::Binary,
        })
    }

    pub fn with_format(mut self, format: SaveFormat) -> Self {
        self.format = format;
        self
    }

    fn slot_path(&self, level: &str) -> Result<PathBuf> {
        if level.is_empty() || level.contains(['/', '\\']) || level.starts_with('.') {
            return Err(RepositoryError::InvalidLevelName(level.to_string()));
        }
        Ok(self
            .base_dir
            .join(format!("{}.{}", level, self.format.extension())))
    }

    fn encode(&self, snapshot: &LevelSnapshot) -> Result<Vec<u8>> {
        match self.format {
            SaveFormat::Binary => bincode::serialize(snapshot)
                .map_err(|e| RepositoryError::Serialization(e.to_string())),
            SaveFormat::Json => serde_json::to_vec_pretty(snapshot)
                .map_err(|e| RepositoryError::Json(e.to_string())),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<LevelSnapshot> {
        match self.format {
            SaveFormat::Binary => bincode::deserialize(bytes)
                .map_err(|e| RepositoryError::Serialization(e.to_string())),
            SaveFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| RepositoryError::Json(e.to_string()))
            }
        }
    }
}

impl SaveRepository for FileSaveRepository {
    fn save(&self, snapshot: &LevelSnapshot) -> Result<()> {
        let path = self.slot_path(&snapshot.level)?;
        let temp_path = path.with_extension(format!("{}.tmp", self.format.extension()));

        let bytes = self.encode(snapshot)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved level '{}' to {}", snapshot.level, path.display());
        Ok(())
    }

    fn load(&self, level: &str) -> Result<Option<LevelSnapshot>> {
        let path = self.slot_path(level)?;
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let snapshot = self.decode(&bytes)?;

        tracing::debug!("Loaded level '{}' from {}", level, path.display());
        Ok(Some(snapshot))
    }

    fn exists(&self, level: &str) -> bool {
        self.slot_path(level).is_ok_and(|path| path.exists())
    }

    fn delete(&self, level: &str) -> Result<()> {
        let path = self.slot_path(level)?;
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted save of level '{}'", level);
        }
        Ok(())
    }

    fn list_levels(&self) -> Result<Vec<String>> {
        let suffix = format!(".{}", self.format.extension());
        let mut levels = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(level) = filename.strip_suffix(suffix.as_str())
            {
                levels.push(level.to_string());
            }
        }

        levels.sort_unstable();
        Ok(levels)
    }
}

/// In-memory implementation of SaveRepository
#[derive(Default)]
pub struct InMemorySaveRepository {
    saves: RwLock<BTreeMap<String, LevelSnapshot>>,
}

impl InMemorySaveRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveRepository for InMemorySaveRepository {
    fn save(&self, snapshot: &LevelSnapshot) -> Result<()> {
        let mut saves = self
            .saves
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        saves.insert(snapshot.level.clone(), snapshot.clone());
        Ok(())
    }

    fn load(&self, level: &str) -> Result<Option<LevelSnapshot>> {
        let saves = self
            .saves
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(saves.get(level).cloned())
    }

    fn exists(&self, level: &str) -> bool {
        self.saves
            .read()
            .is_ok_and(|saves| saves.contains_key(level))
    }

    fn delete(&self, level: &str) -> Result<()> {
        let mut saves = self
            .saves
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        saves.remove(level);
        Ok(())
    }

    fn list_levels(&self) -> Result<Vec<String>> {
        let saves = self
            .saves
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(saves.keys().cloned().collect())
    }
}
