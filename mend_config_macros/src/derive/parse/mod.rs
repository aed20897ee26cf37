//! Parsing utilities for the `ConfigSchema` derive macro.

use syn::parenthesized;
use syn::{Attribute, Expr, LitStr, Token};

mod input;
mod literals;
mod serde_attrs;
mod type_utils;

pub(crate) use input::{SchemaField, SchemaInput, parse_input};
use literals::{flag, lit_str};
pub(crate) use serde_attrs::{SerdeRenameAll, serde_field_rename, serde_rename_all, serde_skips};
pub(crate) use type_utils::{is_map, last_segment, option_inner, vec_inner};

/// Struct-level `#[config(...)]` attributes.
#[derive(Default, Clone)]
pub(crate) struct StructAttrs {
    /// Stored name of the field keying lists of this record.
    pub key: Option<LitStr>,
    /// Schema name override.
    pub name: Option<String>,
    /// Overrides the generated crate path for dependency aliasing.
    pub crate_path: Option<syn::Path>,
}

/// Where a field's default comes from.
#[derive(Clone)]
pub(crate) enum DefaultSource {
    /// `#[config(default = expr)]`
    Expr(Box<Expr>),
    /// `#[config(default_fn = path)]`
    Fn(syn::Path),
}

/// Field-level `#[config(...)]` attributes.
#[derive(Default, Clone)]
pub(crate) struct FieldAttrs {
    pub default: Option<DefaultSource>,
    pub rename: Option<String>,
    pub skip: bool,
}

/// Iterate all `#[config(...)]` attributes once and apply a callback.
fn parse_config<F>(attrs: &[Attribute], mut f: F) -> syn::Result<()>
where
    F: FnMut(&syn::meta::ParseNestedMeta) -> syn::Result<()>,
{
    for attr in attrs.iter().filter(|a| a.path().is_ident("config")) {
        attr.parse_nested_meta(|meta| f(&meta))?;
    }
    Ok(())
}

/// Consumes an unrecognised key-value or list without recording it.
fn discard_unknown(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<proc_macro2::TokenStream>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

fn unknown_key(meta: &syn::meta::ParseNestedMeta, allowed: &str) -> syn::Error {
    let key = meta
        .path
        .get_ident()
        .map_or_else(|| "<path>".to_owned(), ToString::to_string);
    meta.error(format!("unknown config attribute '{key}'; expected one of {allowed}"))
}

/// Extracts `#[config(...)]` metadata applied to a struct.
///
/// Recognised keys are `key`, `name` and `crate`. Unknown keys are rejected
/// so typos surface at compile time.
pub(crate) fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut out = StructAttrs::default();
    parse_config(attrs, |meta| {
        match meta.path.get_ident().map(ToString::to_string).as_deref() {
            Some("key") => out.key = Some(lit_str(meta, "key")?),
            Some("name") => out.name = Some(lit_str(meta, "name")?.value()),
            Some("crate") => {
                let s = lit_str(meta, "crate")?;
                let path: syn::Path =
                    syn::parse_str(&s.value()).map_err(|e| syn::Error::new(s.span(), e))?;
                out.crate_path = Some(path);
            }
            _ => return Err(unknown_key(meta, "`key`, `name` or `crate`")),
        }
        Ok(())
    })?;
    Ok(out)
}

/// Parses field-level `#[config(...)]` attributes.
///
/// Recognised keys are `default`, `default_fn`, `rename` and `skip`.
/// `default` and `default_fn` are mutually exclusive.
pub(crate) fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    parse_config(&field.attrs, |meta| {
        match meta.path.get_ident().map(ToString::to_string).as_deref() {
            Some("default") => set_default(meta, &mut out, |meta| {
                Ok(DefaultSource::Expr(Box::new(meta.value()?.parse()?)))
            })?,
            Some("default_fn") => set_default(meta, &mut out, |meta| {
                Ok(DefaultSource::Fn(meta.value()?.parse()?))
            })?,
            Some("rename") => out.rename = Some(lit_str(meta, "rename")?.value()),
            Some("skip") => out.skip = flag(meta, "skip")?,
            _ => {
                return Err(unknown_key(
                    meta,
                    "`default`, `default_fn`, `rename` or `skip`",
                ));
            }
        }
        Ok(())
    })?;
    Ok(out)
}

fn set_default(
    meta: &syn::meta::ParseNestedMeta,
    out: &mut FieldAttrs,
    parse: impl FnOnce(&syn::meta::ParseNestedMeta) -> syn::Result<DefaultSource>,
) -> syn::Result<()> {
    if out.default.is_some() {
        return Err(meta.error("only one of `default` or `default_fn` may be given"));
    }
    out.default = Some(parse(meta)?);
    Ok(())
}
