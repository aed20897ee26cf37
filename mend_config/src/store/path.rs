//! Resolution of the backing file location.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{MendError, MendResult};

/// Default location of the backing file, relative to the executable.
pub const DEFAULT_CONFIG_PATH: &str = "resources/config/config.toml";

/// Resolve `path` for use as the backing file.
///
/// Absolute paths are returned unchanged. Relative paths are joined onto the
/// directory containing the running executable.
///
/// # Errors
///
/// Returns [`MendError::Resource`] when the executable location cannot be
/// determined or is not valid UTF-8.
pub fn resolve_store_path(path: impl AsRef<Utf8Path>) -> MendResult<Utf8PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let resource_error = |source: io::Error| MendError::Resource {
        resource: path.to_string(),
        source,
    };
    let exe = std::env::current_exe().map_err(resource_error)?;
    let exe_dir = exe.parent().ok_or_else(|| {
        resource_error(io::Error::new(
            io::ErrorKind::NotFound,
            "executable path has no parent directory",
        ))
    })?;
    let base = Utf8Path::from_path(exe_dir).ok_or_else(|| {
        resource_error(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("executable directory is not valid UTF-8: {}", exe_dir.display()),
        ))
    })?;
    Ok(resolve_against(base, path))
}

/// Join `path` onto `base` unless `path` is already absolute.
#[must_use]
pub fn resolve_against(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
