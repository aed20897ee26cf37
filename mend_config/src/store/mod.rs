//! Ownership, loading and persistence of the configuration document.
//!
//! [`ConfigStore`] owns the single document and its [`Backend`]. Every access
//! to the document, from loading and saving to view reads and writes, runs
//! under one reentrant lock, so a write followed by its save is atomic with
//! respect to other callers. Saves always render the whole document.
//!
//! The store also counts layout shifts: changes that may move records inside
//! lists. Views addressing a record by list position use the count to notice
//! that their position may now hold a different record.

mod backend;
mod format;
mod path;

use std::cell::{Ref, RefCell, RefMut};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::ReentrantMutex;
use toml::Table;
use tracing::{debug, error, warn};

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use format::Format;
pub use path::{DEFAULT_CONFIG_PATH, resolve_against, resolve_store_path};

use crate::{MendError, MendResult};


/// How [`ConfigStore::load`] reacts to unreadable or malformed documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Log a warning and continue with an empty document.
    #[default]
    Degrade,
    /// Return the error to the caller.
    Strict,
}

/// Owner of the persisted document.
pub struct ConfigStore {
    backend: Box<dyn Backend>,
    format: Format,
    parse_policy: ParsePolicy,
    document: ReentrantMutex<RefCell<Table>>,
    layout: AtomicU64,
}

impl ConfigStore {
    /// Create a store with an empty, unloaded document.
    #[must_use]
    pub fn new(backend: Box<dyn Backend>, format: Format, parse_policy: ParsePolicy) -> Self {
        Self {
            backend,
            format,
            parse_policy,
            document: ReentrantMutex::new(RefCell::new(Table::new())),
            layout: AtomicU64::new(0),
        }
    }

    /// Create a store and load its document.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::load`].
    pub fn open(
        backend: Box<dyn Backend>,
        format: Format,
        parse_policy: ParsePolicy,
    ) -> MendResult<Self> {
        let store = Self::new(backend, format, parse_policy);
        store.load()?;
        Ok(store)
    }

    /// Replace the in-memory document with the backing resource's contents.
    ///
    /// A missing resource is created empty. Blank contents yield an empty
    /// document. Unreadable or malformed contents are handled according to
    /// the store's [`ParsePolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Resource`] when a missing resource cannot be
    /// created, and, under [`ParsePolicy::Strict`], [`MendError::Resource`] or
    /// [`MendError::Parse`] when the contents cannot be read or parsed.
    /// Returns [`MendError::Reentrant`] when called while the document is
    /// borrowed on this thread.
    pub fn load(&self) -> MendResult<()> {
        let guard = self.document.lock();
        let resource = self.backend.describe();
        let loaded = match self.backend.read() {
            Ok(None) => {
                self.backend
                    .write("")
                    .map_err(|source| MendError::Resource {
                        resource: resource.clone(),
                        source,
                    })?;
                debug!(resource = %resource, "created empty configuration resource");
                Table::new()
            }
            Ok(Some(data)) if data.trim().is_empty() => Table::new(),
            Ok(Some(data)) => match self.format.parse(&data) {
                Ok(document) => document,
                Err(source) => self.degrade(MendError::parse(resource, source))?,
            },
            Err(source) => self.degrade(MendError::Resource { resource, source })?,
        };
        *self.borrow_mut(&guard)? = loaded;
        self.shift_layout();
        Ok(())
    }

    fn degrade(&self, err: MendError) -> MendResult<Table> {
        match self.parse_policy {
            ParsePolicy::Strict => Err(err),
            ParsePolicy::Degrade => {
                warn!(error = %err, "continuing with an empty configuration document");
                Ok(Table::new())
            }
        }
    }

    /// Render the document and write it to the backing resource.
    ///
    /// Failures are logged and returned; the in-memory document is left as
    /// it is and no retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Persist`] when rendering or writing fails, and
    /// [`MendError::Reentrant`] when the document is mutably borrowed on this
    /// thread.
    pub fn save(&self) -> MendResult<()> {
        let guard = self.document.lock();
        let rendered = self.format.render(&*self.borrow(&guard)?);
        rendered
            .and_then(|text| self.backend.write(&text).map_err(Into::into))
            .map_err(|source| self.persist_failure(source))
    }

    fn persist_failure(&self, source: Box<dyn Error + Send + Sync>) -> MendError {
        let resource = self.backend.describe();
        error!(resource = %resource, error = %source, "failed to persist configuration document");
        MendError::persist(resource, source)
    }

    /// Run `f` against the document under the lock.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or [`MendError::Reentrant`] when `f` runs
    /// inside an [`update`](Self::update) closure on the same thread.
    pub fn read<R>(&self, f: impl FnOnce(&Table) -> MendResult<R>) -> MendResult<R> {
        let guard = self.document.lock();
        let document = self.borrow(&guard)?;
        f(&*document)
    }

    /// Mutate the document with `f` and save it, holding the lock throughout.
    ///
    /// When `f` fails nothing is saved. When the save fails the mutation is
    /// kept in memory. Any successful edit counts as a layout shift, so views
    /// bound to list positions detach afterwards.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, [`MendError::Reentrant`] when called from
    /// inside another `read` or `update` closure on the same thread, or
    /// [`MendError::Persist`] from the save.
    pub fn update<R>(&self, f: impl FnOnce(&mut Table) -> MendResult<R>) -> MendResult<R> {
        self.modify(|document| {
            let out = f(document)?;
            self.shift_layout();
            Ok(out)
        })
    }

    /// Mutate the document with `f` and save it only if `f` reports a
    /// change. Returns whatever `f` reported.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Reentrant`] when called from inside a `read` or
    /// `update` closure on the same thread, and [`MendError::Persist`] when
    /// the save fails.
    pub fn update_if(&self, f: impl FnOnce(&mut Table) -> bool) -> MendResult<bool> {
        let guard = self.document.lock();
        let changed = f(&mut *self.borrow_mut(&guard)?);
        if changed {
            self.shift_layout();
            self.save()?;
        }
        Ok(changed)
    }

    /// Mutate and save without counting a layout shift; views report their
    /// own shifts.
    pub(crate) fn modify<R>(&self, f: impl FnOnce(&mut Table) -> MendResult<R>) -> MendResult<R> {
        let guard = self.document.lock();
        let out = {
            let mut document = self.borrow_mut(&guard)?;
            f(&mut *document)?
        };
        self.save()?;
        Ok(out)
    }

    /// Clone of the current document.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Reentrant`] when called from inside an `update`
    /// closure on the same thread.
    pub fn snapshot(&self) -> MendResult<Table> {
        self.read(|document| Ok(document.clone()))
    }

    /// Number of layout shifts so far. Only read under the document lock.
    pub(crate) fn layout(&self) -> u64 {
        self.layout.load(Ordering::Relaxed)
    }

    /// Count a layout shift and return the new count.
    pub(crate) fn shift_layout(&self) -> u64 {
        self.layout.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn borrow<'a>(&self, cell: &'a RefCell<Table>) -> MendResult<Ref<'a, Table>> {
        cell.try_borrow().map_err(|_| self.reentrant())
    }

    fn borrow_mut<'a>(&self, cell: &'a RefCell<Table>) -> MendResult<RefMut<'a, Table>> {
        cell.try_borrow_mut().map_err(|_| self.reentrant())
    }

    fn reentrant(&self) -> MendError {
        MendError::Reentrant {
            resource: self.backend.describe(),
        }
    }

    /// Format used to parse and render the document.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Description of the backing resource.
    #[must_use]
    pub fn resource(&self) -> String {
        self.backend.describe()
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("backend", &self.backend)
            .field("format", &self.format)
            .field("parse_policy", &self.parse_policy)
            .finish_non_exhaustive()
    }
}
