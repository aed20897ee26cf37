//! Expansion of `#[derive(ConfigSchema)]`.

mod crate_path;
mod generate;
pub(crate) mod parse;

use proc_macro2::TokenStream;
use syn::DeriveInput;

#[cfg(test)]
pub(crate) use generate::{FieldKindSpec, classify};

/// Parse `input` and generate its `ConfigSchema` implementation.
pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let schema = parse::parse_input(input)?;
    let krate = crate_path::resolve(schema.crate_path.as_ref());
    Ok(generate::schema_impl(&schema, &krate))
}
