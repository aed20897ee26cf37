//! Format-specific parsing and rendering of the persisted document.

use std::error::Error;

use camino::Utf8Path;
use toml::Table;

use crate::MendResult;

type BoxedError = Box<dyn Error + Send + Sync>;

/// Textual format of the backing document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum Format {
    /// TOML, the default.
    #[default]
    Toml,
    /// JSON, available with the `json` feature.
    #[cfg(feature = "json")]
    Json,
}

impl Format {
    /// Select the format from the extension of `path`.
    ///
    /// `.json` selects JSON; every other extension selects TOML.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::UnsupportedFormat`] for `.json` paths when the
    /// `json` feature is disabled.
    pub fn from_path(path: &Utf8Path) -> MendResult<Self> {
        let ext = path.extension().map(str::to_ascii_lowercase);
        let format = match ext.as_deref() {
            Some("json") => {
                #[cfg(feature = "json")]
                {
                    Self::Json
                }
                #[cfg(not(feature = "json"))]
                {
                    return Err(crate::MendError::UnsupportedFormat {
                        resource: path.to_string(),
                        reason: "json feature disabled: enable the 'json' feature to support this file format"
                            .to_owned(),
                    });
                }
            }
            _ => Self::Toml,
        };
        Ok(format)
    }

    pub(crate) fn parse(self, data: &str) -> Result<Table, BoxedError> {
        match self {
            Self::Toml => toml::from_str::<Table>(data).map_err(Into::into),
            #[cfg(feature = "json")]
            Self::Json => serde_json::from_str::<Table>(data).map_err(Into::into),
        }
    }

    pub(crate) fn render(self, document: &Table) -> Result<String, BoxedError> {
        match self {
            Self::Toml => toml::to_string(document).map_err(Into::into),
            #[cfg(feature = "json")]
            Self::Json => serde_json::to_string_pretty(document).map_err(Into::into),
        }
    }
}
