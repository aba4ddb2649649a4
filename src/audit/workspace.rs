/// Run-scoped directory for audit artifacts
use crate::config::types::{HarnessError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One uuid-named directory under the artifact root, removed on drop
pub struct AuditWorkspace {
    run_id: String,
    run_dir: PathBuf,
}

impl AuditWorkspace {
    pub fn new(base_dir: &Path) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let run_dir = base_dir.join(&run_id);

        fs::create_dir_all(&run_dir).map_err(|e| {
            HarnessError::Audit(format!(
                "Failed to create workspace directory {}: {}",
                run_dir.display(),
                e
            ))
        })?;

        Ok(Self { run_id, run_dir })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Path for an artifact inside the run directory
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.run_dir.join(name)
    }

    /// Remove the run directory (idempotent)
    pub fn cleanup(&self) {
        if self.run_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.run_dir) {
                log::warn!(
                    "Failed to remove audit workspace {}: {}",
                    self.run_dir.display(),
                    e
                );
            }
        }
    }
}

impl Drop for AuditWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
