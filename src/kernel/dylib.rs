//! Thin wrappers over the platform dynamic loader
//!
//! `dlopen`/`dlsym`/`dlclose` are the only unsafe surface here. Everything
//! above this module works with [`DynamicLibrary`] and raw addresses and
//! never touches loader state directly.

use crate::config::types::{HarnessError, Result};
use std::ffi::{c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Owned `dlopen` handle, closed on drop
#[derive(Debug)]
pub struct DynamicLibrary {
    handle: NonNull<c_void>,
    path: PathBuf,
}

fn last_loader_error() -> String {
    // dlerror returns thread-local storage owned by the loader
    let message = unsafe { libc::dlerror() };
    if message.is_null() {
        "unknown dynamic loader error".to_string()
    } else {
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }
}

impl DynamicLibrary {
    /// Open a shared object with eager binding so unresolved imports fail here,
    /// not halfway through a trial.
    pub fn open(path: &Path) -> Result<Self> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            HarnessError::Load(format!("library path contains NUL: {}", path.display()))
        })?;

        unsafe { libc::dlerror() };
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };

        match NonNull::new(handle) {
            Some(handle) => {
                log::debug!("Opened shared object {}", path.display());
                Ok(Self {
                    handle,
                    path: path.to_path_buf(),
                })
            }
            None => Err(HarnessError::Load(format!(
                "{}: {}",
                path.display(),
                last_loader_error()
            ))),
        }
    }

    /// Address of `name`, searched in this object and then its dependencies
    pub fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        let c_name = CString::new(name).ok()?;
        unsafe { libc::dlerror() };
        let address = unsafe { libc::dlsym(self.handle.as_ptr(), c_name.as_ptr()) };
        if address.is_null() {
            log::debug!(
                "Symbol '{}' not found in {}: {}",
                name,
                self.path.display(),
                last_loader_error()
            );
        }
        NonNull::new(address)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DynamicLibrary {
    fn drop(&mut self) {
        let rc = unsafe { libc::dlclose(self.handle.as_ptr()) };
        if rc != 0 {
            log::warn!(
                "dlclose failed for {}: {}",
                self.path.display(),
                last_loader_error()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_loader_message() {
        let err = DynamicLibrary::open(Path::new("/nonexistent/libplayer.so")).unwrap_err();
        match err {
            HarnessError::Load(message) => assert!(message.contains("/nonexistent/libplayer.so")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn system_libc_exports_strtok() {
        let lib = DynamicLibrary::open(Path::new("libc.so.6")).unwrap();
        assert!(lib.symbol("strtok").is_some());
        assert!(lib.symbol("definitely_not_exported_here").is_none());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn nul_in_symbol_name_is_not_found() {
        let lib = DynamicLibrary::open(Path::new("libc.so.6")).unwrap();
        assert!(lib.symbol("str\0tok").is_none());
    }
}
