//! Working-directory handling for a single bridge call.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::BridgeError;

// Serializes every chdir done by the bridge; held until the previous cwd is restored.
static CWD_LOCK: Mutex<()> = Mutex::new(());

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkDirMode {
    /// Resolve paths against the directory; process cwd is untouched.
    #[default]
    Resolve,
    /// Change the process cwd for the duration of the call, then restore it.
    Chdir,
}

pub struct WorkDirScope {
    dir: PathBuf,
    restore: Option<(PathBuf, MutexGuard<'static, ()>)>,
}

impl WorkDirScope {
    pub fn enter(dir: &Path, mode: WorkDirMode) -> Result<Self, BridgeError> {
        let meta = std::fs::metadata(dir).map_err(|source| BridgeError::WorkDir { path: dir.to_path_buf(), source })?;
        if !meta.is_dir() {
            return Err(BridgeError::NotADirectory { path: dir.to_path_buf() });
        }

        let restore = match mode {
            WorkDirMode::Resolve => None,
            WorkDirMode::Chdir => {
                let guard = CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let previous = std::env::current_dir()
                    .map_err(|source| BridgeError::WorkDir { path: dir.to_path_buf(), source })?;
                std::env::set_current_dir(dir)
                    .map_err(|source| BridgeError::WorkDir { path: dir.to_path_buf(), source })?;
                Some((previous, guard))
            }
        };
        tracing::debug!(dir = %dir.display(), ?mode, "entered working directory");
        Ok(Self { dir: dir.to_path_buf(), restore })
    }

    /// Path to hand to the loader. Bare names (no separator) stay as-is so the
    /// linker search path applies; other relative paths are anchored here,
    /// unless the process already sits in this directory (chdir mode).
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if self.restore.is_some() || path.is_absolute() || path.components().count() <= 1 {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for WorkDirScope {
    fn drop(&mut self) {
        if let Some((previous, _guard)) = self.restore.take() {
            if let Err(e) = std::env::set_current_dir(&previous) {
                tracing::warn!(previous = %previous.display(), "failed to restore working directory: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_mode_anchors_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let scope = WorkDirScope::enter(tmp.path(), WorkDirMode::Resolve).unwrap();
        assert_eq!(scope.resolve(Path::new("lib/libqemu.so")), tmp.path().join("lib/libqemu.so"));
        assert_eq!(scope.resolve(Path::new("libc.so.6")), Path::new("libc.so.6"));
        assert_eq!(scope.resolve(Path::new("/abs/lib.so")), Path::new("/abs/lib.so"));
    }

    #[test]
    fn chdir_mode_leaves_relative_paths_to_the_new_cwd() {
        let tmp = tempfile::tempdir().unwrap();
        let scope = WorkDirScope::enter(tmp.path(), WorkDirMode::Chdir).unwrap();
        assert_eq!(scope.resolve(Path::new("lib/libqemu.so")), Path::new("lib/libqemu.so"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let gone = tmp.path().join("gone");
        let err = WorkDirScope::enter(&gone, WorkDirMode::Resolve).err().unwrap();
        assert!(matches!(err, BridgeError::WorkDir { .. }));
    }

    #[test]
    fn file_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = WorkDirScope::enter(file.path(), WorkDirMode::Chdir).err().unwrap();
        assert!(matches!(err, BridgeError::NotADirectory { .. }));
    }
}
