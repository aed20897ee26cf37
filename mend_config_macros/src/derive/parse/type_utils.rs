//! Type introspection helpers.
//!
//! These utilities perform shallow inspection of `syn::Type` values to
//! recognise wrapper types such as `Option<T>` and collection containers such
//! as `Vec<T>` and `BTreeMap<K, V>`.

use syn::{GenericArgument, PathArguments, Type};

/// Extract the first type argument from a `PathArguments` container.
fn extract_first_type_argument(args: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(angle_args) = args else {
        return None;
    };
    let GenericArgument::Type(inner) = angle_args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Final path segment of `ty`, when `ty` is a plain path type.
pub(crate) fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    let Type::Path(p) = ty else {
        return None;
    };
    if p.qself.is_some() {
        return None;
    }
    p.path.segments.last()
}

/// Returns the generic parameter if `ty` is the provided wrapper.
///
/// The check is shallow: only the final path segment is compared, so
/// `std::vec::Vec<T>` and `Vec<T>` both match.
fn type_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let last = last_segment(ty)?;
    if last.ident != wrapper {
        return None;
    }
    extract_first_type_argument(&last.arguments)
}

/// Returns the inner type if `ty` is `Option<T>`.
pub(crate) fn option_inner(ty: &Type) -> Option<&Type> {
    type_inner(ty, "Option")
}

/// Extracts the element type `T` if `ty` is `Vec<T>`.
pub(crate) fn vec_inner(ty: &Type) -> Option<&Type> {
    type_inner(ty, "Vec")
}

/// Returns `true` if `ty` is one of the map containers stored as a
/// free-form table.
pub(crate) fn is_map(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|last| {
        ["BTreeMap", "HashMap", "IndexMap", "Map", "Table"]
            .iter()
            .any(|name| last.ident == *name)
    })
}
