//! Load a QEMU shared object into the calling process and release it again.

use std::path::{Path, PathBuf};

use crate::error::BridgeError;
use crate::loader::QemuLibrary;
use crate::workdir::{WorkDirMode, WorkDirScope};

/// Receives lines of VM output.
pub trait LineSink {
    fn line(&mut self, line: &str);
}

impl<F: FnMut(&str)> LineSink for F {
    fn line(&mut self, line: &str) {
        self(line)
    }
}

#[derive(Clone, Debug)]
pub struct LaunchRequest {
    pub working_dir: PathBuf,
    pub library: PathBuf,
    pub cmdline: String,
}

impl LaunchRequest {
    pub fn new(working_dir: impl Into<PathBuf>, library: impl Into<PathBuf>, cmdline: impl Into<String>) -> Self {
        Self { working_dir: working_dir.into(), library: library.into(), cmdline: cmdline.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    /// Path actually handed to the dynamic loader
    pub library: PathBuf,
    pub exports_main: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Bridge {
    mode: WorkDirMode,
}

impl Bridge {
    pub fn new(mode: WorkDirMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> WorkDirMode {
        self.mode
    }

    /// Enter the working directory, dlopen the library with immediate binding,
    /// then dlclose it. Nothing is loaded if the directory step fails.
    pub fn run(&self, req: &LaunchRequest, sink: &mut dyn LineSink) -> Result<LoadReport, BridgeError> {
        // Not consumed: the library is loaded but never entered, so there is no
        // argv to build and no output to forward.
        let _ = (&req.cmdline, sink);

        let scope = WorkDirScope::enter(&req.working_dir, self.mode).map_err(|e| {
            tracing::error!(target: "bridge.workdir", dir = %req.working_dir.display(), "{e}");
            e
        })?;

        let path = scope.resolve(&req.library);
        let report = load_and_release(&path)?;
        drop(scope);
        Ok(report)
    }
}

fn load_and_release(path: &Path) -> Result<LoadReport, BridgeError> {
    let lib = QemuLibrary::open(path).map_err(|e| {
        tracing::error!(target: "bridge.load", path = %path.display(), "{e}");
        e
    })?;
    let exports_main = lib.has_symbol("main");
    tracing::info!(target: "bridge.load", path = %path.display(), exports_main, "library loaded");

    lib.close()?;
    tracing::info!(target: "bridge.unload", path = %path.display(), "library released");
    Ok(LoadReport { library: path.to_path_buf(), exports_main })
}
