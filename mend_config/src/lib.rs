//! Schema-aware, self-healing configuration store.
//!
//! A [`ConfigManager`] owns a single persisted document. Asking it for a view
//! typed by a [`RecordSchema`] derives that schema's defaults, fills whatever
//! the document is missing without touching existing values, and returns a
//! [`ProxyObject`] whose reads and writes go straight to the live document.
//! Every write persists the whole document before returning.
//!
//! Schemas are built by hand with [`RecordSchema::builder`] or generated with
//! `#[derive(ConfigSchema)]`, implemented in the companion
//! `mend_config_macros` crate.
//!
//! ```
//! use mend_config::{ConfigManager, ConfigSchema, MemoryBackend};
//!
//! #[derive(ConfigSchema)]
//! struct Server {
//!     #[config(default = "localhost")]
//!     host: String,
//! }
//!
//! #[derive(ConfigSchema)]
//! struct App {
//!     retries: u32,
//!     server: Server,
//! }
//!
//! let backend = MemoryBackend::with_contents("retries = 5\n");
//! let manager = ConfigManager::with_backend(backend.clone()).build()?;
//! let app = manager.view::<App>()?;
//! let server = app.object("server")?.expect("server is filled in");
//! assert_eq!(
//!     server.get("host")?.and_then(|entry| entry.as_raw().cloned()),
//!     Some(toml::Value::from("localhost")),
//! );
//! assert_eq!(backend.writes(), 1);
//! # Ok::<_, mend_config::MendError>(())
//! ```

pub use mend_config_macros::ConfigSchema;

mod error;
mod manager;
mod merge;
mod schema;
mod store;
mod view;

pub use error::{MendError, MendResult};
pub use manager::{ConfigManager, ConfigManagerBuilder};
pub use merge::merge_defaults;
pub use schema::{
    BooleanZero, ConfigSchema, DefaultValue, FieldDefault, FieldKind, FieldSchema, RecordSchema,
    RecordSchemaBuilder, SchemaRef, declared_default, derive_defaults,
};
pub use store::{
    Backend, ConfigStore, DEFAULT_CONFIG_PATH, FileBackend, Format, MemoryBackend, ParsePolicy,
    resolve_against, resolve_store_path,
};
pub use view::{
    Entry, IndexKey, IndexedListView, IntoNode, ListIter, NodePath, ProxyObject, Segment,
    Serialized,
};

/// Node stored in the document: a scalar, an array or a table.
pub type RawNode = toml::Value;

/// Root table of the persisted document.
pub type Document = toml::Table;
