//! Crate path resolution for dependency aliasing support.
//!
//! Converts the optional `#[config(crate = "...")]` attribute value into the
//! tokens prefixed to every `mend_config` item named by generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// Resolve the crate path from the parsed struct attribute.
///
/// Defaults to `mend_config` when no override is present.
pub(crate) fn resolve(crate_path: Option<&syn::Path>) -> TokenStream {
    crate_path.map_or_else(|| quote! { mend_config }, |path| quote! { #path })
}
