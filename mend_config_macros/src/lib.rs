//! Procedural macros for `mend_config`.
//!
//! `#[derive(ConfigSchema)]` turns a struct with named fields into a cached
//! `RecordSchema` descriptor. Field kinds are inferred from the declared Rust
//! types: integers, floats, strings, booleans, `Vec<T>`, map types and nested
//! structs that derive `ConfigSchema` themselves. Stored names follow
//! `#[config(rename = "...")]`, then `#[serde(rename = "...")]`, then the
//! container's `#[serde(rename_all = "...")]`.
//!
//! Struct attributes:
//! - `#[config(key = "field")]` designates the field keying lists of this
//!   record.
//! - `#[config(name = "...")]` overrides the schema name used in diagnostics.
//! - `#[config(crate = "path")]` points generated code at a renamed
//!   dependency.
//!
//! Field attributes:
//! - `#[config(default = expr)]` declares a default value. The value must
//!   have the field's type; string literals are converted with `Into` and
//!   integer literals on float fields are read as floats.
//! - `#[config(default_fn = path)]` declares a default factory.
//! - `#[config(rename = "...")]` sets the stored name.
//! - `#[config(skip)]` leaves the field out of the schema.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive;

#[cfg(test)]
mod tests;

/// Derive macro for `mend_config::ConfigSchema`.
#[proc_macro_derive(ConfigSchema, attributes(config))]
pub fn derive_config_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
