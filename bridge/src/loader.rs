//! Owned handle over the platform dynamic loader.
//! All unsafe for dlopen/dlsym/dlclose lives here.

use std::ffi::{c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use crate::error::BridgeError;

/// A QEMU shared object mapped into this process.
///
/// The handle is released by [`QemuLibrary::close`] or, failing that, on drop.
pub struct QemuLibrary {
    handle: Option<NonNull<c_void>>,
    path: PathBuf,
}

impl QemuLibrary {
    /// `dlopen(path, RTLD_NOW | RTLD_LOCAL)`. A path without a `/` goes through the
    /// linker search path, same as dlopen itself.
    pub fn open(path: &Path) -> Result<Self, BridgeError> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| BridgeError::InvalidPath(format!("{} contains a NUL byte", path.display())))?;

        let raw = unsafe {
            // Clear stale state so a failure below reports our own error.
            libc::dlerror();
            libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL)
        };
        let handle = NonNull::new(raw).ok_or_else(|| BridgeError::Load {
            path: path.to_path_buf(),
            reason: last_dl_error(),
        })?;

        Ok(Self { handle: Some(handle), path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the library exports `name`.
    pub fn has_symbol(&self, name: &str) -> bool {
        let (Some(handle), Ok(c_name)) = (self.handle, CString::new(name)) else {
            return false;
        };
        unsafe {
            libc::dlerror();
            let sym = libc::dlsym(handle.as_ptr(), c_name.as_ptr());
            !sym.is_null() && libc::dlerror().is_null()
        }
    }

    /// Unload now and report a dlclose failure instead of swallowing it.
    pub fn close(mut self) -> Result<(), BridgeError> {
        match self.handle.take() {
            Some(handle) => {
                let rc = unsafe { libc::dlclose(handle.as_ptr()) };
                if rc != 0 {
                    return Err(BridgeError::Unload { path: self.path.clone(), reason: last_dl_error() });
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for QemuLibrary {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let rc = unsafe { libc::dlclose(handle.as_ptr()) };
            if rc != 0 {
                tracing::warn!(path = %self.path.display(), "dlclose failed during drop: {}", last_dl_error());
            }
        }
    }
}

fn last_dl_error() -> String {
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            "unknown dynamic loader error".to_string()
        } else {
            CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_loader_text() {
        let err = QemuLibrary::open(Path::new("/nonexistent/libqemu-system-none.so")).err().unwrap();
        match err {
            BridgeError::Load { path, reason } => {
                assert_eq!(path, Path::new("/nonexistent/libqemu-system-none.so"));
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn nul_in_path_is_rejected_before_dlopen() {
        let err = QemuLibrary::open(Path::new("lib\0qemu.so")).err().unwrap();
        assert!(matches!(err, BridgeError::InvalidPath(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn libc_opens_and_closes() {
        let lib = QemuLibrary::open(Path::new("libc.so.6")).unwrap();
        assert!(lib.has_symbol("getpid"));
        assert!(!lib.has_symbol("definitely_not_a_qemu_symbol"));
        lib.close().unwrap();
    }
}
