//! Entry point tying a store to schema-typed views.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tracing::debug;

use crate::view::Binding;
use crate::{
    Backend, BooleanZero, ConfigSchema, ConfigStore, FileBackend, Format, MendResult, NodePath,
    ParsePolicy, ProxyObject, RecordSchema, DEFAULT_CONFIG_PATH, derive_defaults, merge_defaults,
    resolve_store_path,
};

/// Owns a [`ConfigStore`] and hands out root views that self-heal against
/// their schema.
///
/// ```
/// use mend_config::{ConfigManager, FieldDefault, FieldKind, FieldSchema, MemoryBackend, RecordSchema};
///
/// let backend = MemoryBackend::new();
/// let manager = ConfigManager::with_backend(backend.clone()).build()?;
/// let schema = RecordSchema::builder("App")
///     .field(FieldSchema::new("name", FieldKind::String).with_default(FieldDefault::value("demo")))
///     .shared();
/// let view = manager.typed_view(&schema)?;
/// assert!(view.contains("name")?);
/// assert!(backend.contents().is_some_and(|text| text.contains("name = \"demo\"")));
/// # Ok::<_, mend_config::MendError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ConfigManager {
    store: Arc<ConfigStore>,
    auto_fill: bool,
    booleans: BooleanZero,
}

impl ConfigManager {
    /// Start configuring a manager backed by the file at `path`.
    ///
    /// Relative paths resolve against the directory of the running
    /// executable when the manager is built.
    #[must_use]
    pub fn builder(path: impl Into<Utf8PathBuf>) -> ConfigManagerBuilder {
        ConfigManagerBuilder::new(Location::Path(path.into()))
    }

    /// Start configuring a manager over a caller-supplied backend.
    #[must_use]
    pub fn with_backend(backend: impl Backend + 'static) -> ConfigManagerBuilder {
        ConfigManagerBuilder::new(Location::Backend(Box::new(backend)))
    }

    /// Open the file at `path` with default options.
    ///
    /// # Errors
    ///
    /// See [`ConfigManagerBuilder::build`].
    pub fn open(path: impl Into<Utf8PathBuf>) -> MendResult<Self> {
        Self::builder(path).build()
    }

    /// Open the file at [`DEFAULT_CONFIG_PATH`] with default options.
    ///
    /// # Errors
    ///
    /// See [`ConfigManagerBuilder::build`].
    pub fn open_default() -> MendResult<Self> {
        Self::open(DEFAULT_CONFIG_PATH)
    }

    /// Root view of the document typed by `schema`.
    ///
    /// A fresh default tree is derived on every call. An empty document is
    /// replaced by it wholesale and always persisted, even when the tree is
    /// empty too. Otherwise, when auto-fill is enabled, the missing keys are
    /// merged in and the document is persisted only if a key was added.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MendError::Schema`] when defaults cannot be derived,
    /// propagates factory errors, and returns [`crate::MendError::Persist`]
    /// when the healed document cannot be saved. A failed save keeps the
    /// healed document in memory.
    pub fn typed_view(&self, schema: &Arc<RecordSchema>) -> MendResult<ProxyObject> {
        let defaults = derive_defaults(schema, self.booleans)?;
        let resource = self.store.resource();
        self.store.update_if(|document| {
            if document.is_empty() {
                debug!(resource = %resource, schema = schema.name(), "initialising empty document from defaults");
                *document = defaults;
                true
            } else if self.auto_fill {
                let changed = merge_defaults(&defaults, document);
                if changed {
                    debug!(resource = %resource, schema = schema.name(), "filled missing keys from defaults");
                }
                changed
            } else {
                false
            }
        })?;
        Ok(ProxyObject::new(self.binding(), NodePath::root(), Arc::clone(schema)))
    }

    /// Root view typed by `T`'s schema.
    ///
    /// # Errors
    ///
    /// See [`ConfigManager::typed_view`].
    pub fn view<T: ConfigSchema>(&self) -> MendResult<ProxyObject> {
        self.typed_view(&T::schema())
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    fn binding(&self) -> Binding {
        Binding::new(Arc::clone(&self.store), self.booleans)
    }
}

#[derive(Debug)]
enum Location {
    Path(Utf8PathBuf),
    Backend(Box<dyn Backend>),
}

/// Options for [`ConfigManager`].
#[derive(Debug)]
#[must_use]
pub struct ConfigManagerBuilder {
    location: Location,
    auto_fill: bool,
    booleans: BooleanZero,
    parse_policy: ParsePolicy,
    format: Option<Format>,
}

impl ConfigManagerBuilder {
    const fn new(location: Location) -> Self {
        Self {
            location,
            auto_fill: true,
            booleans: BooleanZero::False,
            parse_policy: ParsePolicy::Degrade,
            format: None,
        }
    }

    /// Merge missing defaults into non-empty documents. Enabled by default.
    pub const fn auto_fill(mut self, enabled: bool) -> Self {
        self.auto_fill = enabled;
        self
    }

    /// Zero value for boolean fields without a default.
    pub const fn boolean_zero(mut self, booleans: BooleanZero) -> Self {
        self.booleans = booleans;
        self
    }

    /// Reaction to malformed documents on load.
    pub const fn parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }

    /// Force a document format instead of inferring it from the path.
    pub const fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Open the store and load its document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MendError::Resource`] when the path cannot be resolved
    /// or the resource cannot be created,
    /// [`crate::MendError::UnsupportedFormat`] when the inferred format is not
    /// compiled in, and [`crate::MendError::Parse`] for malformed documents
    /// under [`ParsePolicy::Strict`].
    pub fn build(self) -> MendResult<ConfigManager> {
        let (backend, format): (Box<dyn Backend>, Format) = match self.location {
            Location::Path(path) => {
                let path = resolve_store_path(&path)?;
                let format = match self.format {
                    Some(format) => format,
                    None => Format::from_path(&path)?,
                };
                (Box::new(FileBackend::new(path)), format)
            }
            Location::Backend(backend) => (backend, self.format.unwrap_or_default()),
        };
        let store = ConfigStore::open(backend, format, self.parse_policy)?;
        debug!(resource = %store.resource(), ?format, "configuration store opened");
        Ok(ConfigManager {
            store: Arc::new(store),
            auto_fill: self.auto_fill,
            booleans: self.booleans,
        })
    }
}
