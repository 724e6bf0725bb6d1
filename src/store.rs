//! Durable project store.
//!
//! Projects are persisted one-per-file as pretty-printed JSON
//! (`project_<id>.json`) under the configured projects directory. Writes go
//! through a temp-file-then-rename so a crash mid-write never leaves a
//! half-written record. An in-memory map behind an `RwLock` serves reads;
//! mutations hold the write lock across the disk write and persist before
//! they are visible.

use crate::errors::StoreError;
use crate::project::Project;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ProjectStore {
    dir: PathBuf,
    cache: RwLock<HashMap<Uuid, Project>>,
}

impl ProjectStore {
    /// Open a store rooted at `dir`, creating the directory if needed and
    /// loading every `project_*.json` found there. Unparseable files are
    /// skipped with a warning; schema-invalid records load but are flagged.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::WriteFailed {
            path: dir.clone(),
            source,
        })?;

        let mut cache = HashMap::new();
        let entries = fs::read_dir(&dir).map_err(|source| StoreError::ReadFailed {
            path: dir.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !Self::is_project_file(&path) {
                continue;
            }
            match Self::load_file(&path) {
                Ok(project) => {
                    cache.insert(project.id, project);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unparseable project file");
                }
            }
        }
        info!(count = cache.len(), dir = %dir.display(), "project store loaded");

        Ok(Self {
            dir,
            cache: RwLock::new(cache),
        })
    }

    fn is_project_file(path: &Path) -> bool {
        path.extension().is_some_and(|e| e == "json")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("project_"))
    }

    fn load_file(path: &Path) -> Result<Project, StoreError> {
        let data = fs::read_to_string(path).map_err(|source| StoreError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut project: Project =
            serde_json::from_str(&data).map_err(|e| StoreError::Other(anyhow::anyhow!(
                "invalid JSON in {}: {e}",
                path.display()
            )))?;
        if let Err(e) = project.validate_schema() {
            warn!(id = %project.id, error = %e, "project failed schema validation, flagging");
            project.schema_flagged = true;
        }
        Ok(project)
    }

    fn file_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("project_{id}.json"))
    }

    /// Persist `project` atomically and update the cache.
    pub fn save(&self, project: &Project) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(project).map_err(|source| {
            StoreError::SerializeFailed {
                id: project.id,
                source,
            }
        })?;

        // The lock is held across the disk write: saves of the same project
        // share one temp path, and an unserialized pair could rename each
        // other's half-written temp into place.
        let mut cache = self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
        let path = self.file_path(project.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::WriteFailed {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        cache.insert(project.id, project.clone());
        Ok(())
    }

    /// Fetch a project by id.
    pub fn get(&self, id: Uuid) -> Result<Project, StoreError> {
        let cache = self.cache.read().map_err(|_| StoreError::LockPoisoned)?;
        cache
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProjectNotFound { id })
    }

    /// All projects, newest first by creation time.
    pub fn list(&self) -> Result<Vec<Project>, StoreError> {
        let cache = self.cache.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut projects: Vec<Project> = cache.values().cloned().collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    /// Remove a project from disk and cache.
    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut cache = self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
        if cache.remove(&id).is_none() {
            return Err(StoreError::ProjectNotFound { id });
        }
        let path = self.file_path(id);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| StoreError::WriteFailed { path, source })?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
