//! Bridge errors and the status codes handed back across the JNI boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Returned to the managed caller when the library was loaded and released.
pub const STATUS_OK: i32 = 1;
pub const STATUS_WORKDIR_FAILED: i32 = -1;
pub const STATUS_LOAD_FAILED: i32 = -2;
pub const STATUS_INVALID_ARGUMENT: i32 = -3;
pub const STATUS_UNLOAD_FAILED: i32 = -4;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The working directory could not be inspected or entered
    #[error("working directory {}: {source}", .path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("working directory {} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    /// A path or string argument that cannot cross into C (interior NUL, bad encoding)
    #[error("invalid argument: {0}")]
    InvalidPath(String),

    #[error("failed to load {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    #[error("failed to unload {}: {reason}", .path.display())]
    Unload { path: PathBuf, reason: String },
}

impl BridgeError {
    pub fn status(&self) -> i32 {
        match self {
            BridgeError::WorkDir { .. } | BridgeError::NotADirectory { .. } => STATUS_WORKDIR_FAILED,
            BridgeError::InvalidPath(_) => STATUS_INVALID_ARGUMENT,
            BridgeError::Load { .. } => STATUS_LOAD_FAILED,
            BridgeError::Unload { .. } => STATUS_UNLOAD_FAILED,
        }
    }
}

/// Collapse a bridge result into the integer the managed caller receives.
pub fn status_of<T>(res: &Result<T, BridgeError>) -> i32 {
    match res {
        Ok(_) => STATUS_OK,
        Err(e) => e.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_failure_is_distinguishable_from_success() {
        let errs = [
            BridgeError::WorkDir { path: "/x".into(), source: io::Error::from(io::ErrorKind::NotFound) },
            BridgeError::NotADirectory { path: "/x".into() },
            BridgeError::InvalidPath("nul".into()),
            BridgeError::Load { path: "/x.so".into(), reason: "nope".into() },
            BridgeError::Unload { path: "/x.so".into(), reason: "nope".into() },
        ];
        for e in &errs {
            assert_ne!(e.status(), STATUS_OK, "{e}");
        }
        assert_eq!(errs[0].status(), errs[1].status());
        assert_eq!(status_of::<()>(&Ok(())), STATUS_OK);
    }
}
