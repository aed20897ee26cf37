//! Input parsing for the `ConfigSchema` derive macro.
//!
//! This module gathers the struct identifier, its stored field names and all
//! attribute metadata in one pass so expansion can fail fast with useful
//! errors.

use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields};

use super::{
    DefaultSource, SerdeRenameAll, parse_field_attrs, parse_struct_attrs, serde_field_rename,
    serde_rename_all, serde_skips,
};

/// One field included in the generated schema.
pub(crate) struct SchemaField {
    pub ident: syn::Ident,
    pub ty: syn::Type,
    /// Name stored in the document.
    pub key: String,
    pub default: Option<DefaultSource>,
}

/// Everything needed to generate one `ConfigSchema` implementation.
pub(crate) struct SchemaInput {
    pub ident: syn::Ident,
    pub name: String,
    pub key_field: Option<String>,
    pub fields: Vec<SchemaField>,
    pub crate_path: Option<syn::Path>,
}

/// Gathers information from the user-provided struct.
///
/// Generic structs are rejected because the generated descriptor is cached
/// in a single static. A declared `key` must name one of the stored fields.
pub(crate) fn parse_input(input: &DeriveInput) -> syn::Result<SchemaInput> {
    let ident = input.ident.clone();
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ConfigSchema cannot be derived for generic structs",
        ));
    }
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    data.struct_token,
                    "ConfigSchema requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &ident,
                "ConfigSchema can only be derived for structs",
            ));
        }
    };

    let struct_attrs = parse_struct_attrs(&input.attrs)?;
    let rename_all = serde_rename_all(&input.attrs)?;
    let mut fields = Vec::with_capacity(named.len());
    for field in named {
        if let Some(parsed) = parse_field(field, rename_all)? {
            fields.push(parsed);
        }
    }

    let key_field = match struct_attrs.key {
        Some(key) => {
            let value = key.value();
            if !fields.iter().any(|field| field.key == value) {
                return Err(syn::Error::new(
                    key.span(),
                    format!("key field '{value}' is not a stored field of {ident}"),
                ));
            }
            Some(value)
        }
        None => None,
    };

    Ok(SchemaInput {
        name: struct_attrs.name.unwrap_or_else(|| ident.unraw().to_string()),
        ident,
        key_field,
        fields,
        crate_path: struct_attrs.crate_path,
    })
}

fn parse_field(
    field: &syn::Field,
    rename_all: Option<SerdeRenameAll>,
) -> syn::Result<Option<SchemaField>> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new_spanned(field, "unnamed fields are not supported"));
    };
    let attrs = parse_field_attrs(field)?;
    if attrs.skip || serde_skips(&field.attrs)? {
        return Ok(None);
    }
    let key = match attrs.rename {
        Some(rename) => rename,
        None => match serde_field_rename(&field.attrs)? {
            Some(rename) => rename,
            None => {
                let name = ident.unraw().to_string();
                rename_all.map_or_else(|| name.clone(), |rule| rule.apply(&name))
            }
        },
    };
    Ok(Some(SchemaField {
        ident,
        ty: field.ty.clone(),
        key,
        default: attrs.default,
    }))
}
