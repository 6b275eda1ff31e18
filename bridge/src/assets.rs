//! Where the QEMU libraries and their firmware/keymap assets live on the device.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use crate::bridge::LineSink;

const LIB_PREFIX: &str = "libqemu-system-";
const LIB_SUFFIX: &str = ".so";
const COMMAND_PREFIX: &str = "qemu-system-";
const ASSETS_DIR_PREFIX: &str = "qemu-assets-";
/// Bumped whenever the bundled asset archive changes.
pub const ASSETS_VERSION: &str = "v9.1-5";

#[derive(Clone, Debug)]
pub struct QemuInstall {
    pub native_lib_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl QemuInstall {
    pub fn new(native_lib_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self { native_lib_dir: native_lib_dir.into(), cache_dir: cache_dir.into() }
    }

    /// Architectures with a `libqemu-system-<arch>.so` present, sorted.
    pub fn architectures(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.native_lib_dir)
            .with_context(|| format!("listing {}", self.native_lib_dir.display()))?;
        let mut archs = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(arch) = name.strip_prefix(LIB_PREFIX).and_then(|s| s.strip_suffix(LIB_SUFFIX)) {
                if !arch.is_empty() {
                    archs.push(arch.to_string());
                }
            }
        }
        archs.sort();
        Ok(archs)
    }

    pub fn binary_path(&self, arch: &str) -> PathBuf {
        self.native_lib_dir.join(format!("{LIB_PREFIX}{arch}{LIB_SUFFIX}"))
    }

    /// Map a `qemu-system-*` command to the library that implements it.
    pub fn binary_for_command(&self, cmd: &str) -> Result<PathBuf> {
        if !cmd.to_ascii_lowercase().starts_with(COMMAND_PREFIX) {
            bail!("not a qemu-system command: {cmd}");
        }
        Ok(self.native_lib_dir.join(format!("lib{cmd}{LIB_SUFFIX}")))
    }

    pub fn resource_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{ASSETS_DIR_PREFIX}{ASSETS_VERSION}"))
    }

    /// Unpack the asset archive into [`Self::resource_path`] unless that version is
    /// already there. Older `qemu-assets-*` directories are removed first.
    /// Returns whether anything was extracted.
    pub fn extract_assets<R: Read + Seek>(&self, archive: R, sink: &mut dyn LineSink) -> Result<bool> {
        let target = self.resource_path();
        if target.exists() {
            return Ok(false);
        }

        self.remove_stale_assets()?;
        tracing::info!(dir = %target.display(), "extracting qemu assets");
        fs::create_dir_all(&target)
            .with_context(|| format!("unable to create folder for qemu resources: {}", target.display()))?;

        if let Err(e) = unpack(archive, &target, sink) {
            // half-extracted trees would be mistaken for a complete install next time
            let _ = fs::remove_dir_all(&target);
            return Err(e);
        }
        Ok(true)
    }

    fn remove_stale_assets(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).with_context(|| format!("listing {}", self.cache_dir.display())),
        };
        for entry in entries {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(ASSETS_DIR_PREFIX) {
                tracing::debug!(path = %entry.path().display(), "removing stale qemu assets");
                let removed = if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(entry.path())
                } else {
                    fs::remove_file(entry.path())
                };
                removed.with_context(|| format!("removing {}", entry.path().display()))?;
            }
        }
        Ok(())
    }
}

fn unpack<R: Read + Seek>(archive: R, target: &Path, sink: &mut dyn LineSink) -> Result<()> {
    let mut zip = zip::ZipArchive::new(archive).context("opening qemu asset archive")?;
    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let Some(rel) = file.enclosed_name().map(Path::to_path_buf) else {
            bail!("archive entry escapes the asset directory: {}", file.name());
        };
        sink.line(&format!("Extracting: {}", file.name()));

        let out_path = target.join(rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&out_path).with_context(|| format!("creating {}", out_path.display()))?;
        io::copy(&mut file, &mut out).with_context(|| format!("writing {}", out_path.display()))?;
    }
    Ok(())
}
