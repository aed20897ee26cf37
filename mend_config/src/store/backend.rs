//! Storage backends holding the persisted document text.

use std::fmt;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use parking_lot::Mutex;

/// Storage for the rendered document.
pub trait Backend: fmt::Debug + Send + Sync {
    /// Human-readable name of the resource, used in diagnostics.
    fn describe(&self) -> String;

    /// Read the stored text. Returns `Ok(None)` when the resource does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than the resource being absent.
    fn read(&self) -> io::Result<Option<String>>;

    /// Replace the stored text, creating the resource if needed.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing.
    fn write(&self, contents: &str) -> io::Result<()>;
}

/// Return the parent directory of `path`, falling back to `"."` when the path
/// has no parent or the parent is empty.
fn parent_or_dot(path: &Utf8Path) -> &Utf8Path {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."))
}

/// Open the parent directory of `path` via `cap-std` and extract the file name.
fn open_parent_dir_and_name(path: &Utf8Path) -> io::Result<(Dir, &str)> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot determine file name for configuration file path",
        )
    })?;
    let dir = Dir::open_ambient_dir(parent_or_dot(path), ambient_authority())?;
    Ok((dir, file_name))
}

fn absent_as_none<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Backend storing the document in a file.
#[derive(Clone, Debug)]
pub struct FileBackend {
    path: Utf8PathBuf,
}

impl FileBackend {
    /// Store the document at `path`. The path is used as given; see
    /// [`crate::resolve_store_path`] for executable-relative resolution.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Backend for FileBackend {
    fn describe(&self) -> String {
        self.path.to_string()
    }

    fn read(&self) -> io::Result<Option<String>> {
        let Some((dir, name)) = absent_as_none(open_parent_dir_and_name(&self.path))? else {
            return Ok(None);
        };
        absent_as_none(dir.read_to_string(name))
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        Dir::create_ambient_dir_all(parent_or_dot(&self.path), ambient_authority())?;
        let (dir, name) = open_parent_dir_and_name(&self.path)?;
        dir.write(name, contents)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    contents: Option<String>,
    writes: usize,
    fail_writes: bool,
}

/// In-process backend.
///
/// Clones share the same state, so a clone kept by the caller observes every
/// write made through the store. Useful for embedding and for tests that need
/// to count persists or simulate write failures.
///
/// ```
/// use mend_config::{Backend, MemoryBackend};
///
/// let backend = MemoryBackend::with_contents("retries = 5\n");
/// let observer = backend.clone();
/// backend.write("retries = 6\n")?;
/// assert_eq!(observer.contents().as_deref(), Some("retries = 6\n"));
/// assert_eq!(observer.writes(), 1);
/// # Ok::<_, std::io::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// Empty backend; the resource does not exist until first written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `contents`.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let backend = Self::new();
        backend.state.lock().contents = Some(contents.into());
        backend
    }

    /// Current stored text, if the resource exists.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.state.lock().contents.clone()
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }
}

impl Backend for MemoryBackend {
    fn describe(&self) -> String {
        "<memory>".to_owned()
    }

    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(io::Error::other("simulated write failure"));
        }
        state.contents = Some(contents.to_owned());
        state.writes += 1;
        Ok(())
    }
}
