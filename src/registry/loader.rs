//! Dynamic Library Loader
//!
//! Safe wrapper around libloading for opening the plugin and resolving its
//! exports by name.

use std::ffi::{c_void, CString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use libloading::Library;
use tracing::debug;

use super::OpenError;

/// An untyped, non-null address of an exported function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSymbol(NonNull<c_void>);

impl RawSymbol {
    /// Wrap an address, rejecting null
    pub fn from_ptr(ptr: *const ()) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(Self)
    }

    pub fn as_ptr(&self) -> *const () {
        self.0.as_ptr() as *const ()
    }
}

/// Something symbols can be resolved from.
///
/// [`DynamicLibrary`] is the production implementation. Tests substitute a
/// table of Rust `extern "C"` functions so they can count resolutions.
pub trait SymbolSource: Sized {
    /// Open the library at `path`
    fn load(path: &Path) -> Result<Self, OpenError>;

    /// Look up an export by exact name
    fn resolve(&self, name: &str) -> Option<RawSymbol>;
}

/// A dynamically loaded library
pub struct DynamicLibrary {
    /// Path the library was opened from
    path: PathBuf,
    /// The loaded library handle
    library: Library,
}

impl SymbolSource for DynamicLibrary {
    fn load(path: &Path) -> Result<Self, OpenError> {
        // Safety: loading a library runs its initializers. The caller chose
        // the path and is trusted to point at a genuine plugin.
        let library = unsafe {
            Library::new(path).map_err(|e| OpenError::LibraryLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        debug!(path = %path.display(), "library loaded");
        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    fn resolve(&self, name: &str) -> Option<RawSymbol> {
        // A name with an interior NUL can never be exported
        let c_name = CString::new(name).ok()?;

        // Safety: the symbol is only read as an address here; its type is
        // asserted later by the caller's arity.
        let symbol = unsafe {
            self.library
                .get::<*mut c_void>(c_name.as_bytes_with_nul())
                .map_err(|e| {
                    debug!(name, path = %self.path.display(), error = %e, "symbol lookup failed");
                })
                .ok()?
        };

        RawSymbol::from_ptr(*symbol as *const ())
    }
}

/// Find a library by name or path.
///
/// An existing file is returned as-is. Otherwise the platform file name for
/// `name` is tried in each search path in order.
pub fn find_library(name: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    // Only bare names are searched for
    if path.components().count() != 1 {
        return None;
    }

    let lib_name = library_filename(name);
    search_paths
        .iter()
        .map(|dir| dir.join(&lib_name))
        .find(|candidate| candidate.is_file())
}

/// Get the default library search paths for this platform
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // Current directory
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/local/lib"));
        paths.push(PathBuf::from("/usr/lib"));
        paths.push(PathBuf::from("/usr/lib64"));
        paths.push(PathBuf::from("/lib"));
        paths.push(PathBuf::from("/lib64"));

        if let Ok(ld_path) = std::env::var("LD_LIBRARY_PATH") {
            paths.extend(ld_path.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/usr/local/lib"));
        paths.push(PathBuf::from("/opt/homebrew/lib"));
        paths.push(PathBuf::from("/usr/lib"));

        if let Ok(dyld_path) = std::env::var("DYLD_LIBRARY_PATH") {
            paths.extend(dyld_path.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(path) = std::env::var("PATH") {
            paths.extend(path.split(';').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
    }

    paths
}

/// Construct the platform-specific library filename
pub fn library_filename(name: &str) -> String {
    #[cfg(target_os = "linux")]
    {
        if name.starts_with("lib") && name.contains(".so") {
            name.to_string()
        } else {
            format!("lib{}.so", name)
        }
    }

    #[cfg(target_os = "macos")]
    {
        if name.starts_with("lib") && name.ends_with(".dylib") {
            name.to_string()
        } else {
            format!("lib{}.dylib", name)
        }
    }

    #[cfg(target_os = "windows")]
    {
        if name.ends_with(".dll") {
            name.to_string()
        } else {
            format!("{}.dll", name)
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        name.to_string()
    }
}
