//! Code generation for `#[derive(ConfigSchema)]`.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{Expr, ExprLit, ExprUnary, Lit, LitFloat, Type, UnOp};

use super::parse::{
    DefaultSource, SchemaField, SchemaInput, is_map, last_segment, option_inner, vec_inner,
};

const INTEGERS: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

/// Field kind inferred from a declared Rust type.
#[derive(Clone)]
pub(crate) enum FieldKindSpec {
    Integer,
    Float,
    String,
    Boolean,
    Sequence(Box<FieldKindSpec>),
    Mapping,
    Record(Type),
    Unresolved(String),
}

/// Infer the field kind of `ty`.
///
/// Argument-free paths not recognised as scalars are treated as nested
/// records and must implement `ConfigSchema`. `Option<T>`, references,
/// tuples, arrays and other generic containers have no zero value and are
/// reported as unresolved.
pub(crate) fn classify(ty: &Type) -> FieldKindSpec {
    if let Some(inner) = vec_inner(ty) {
        return FieldKindSpec::Sequence(Box::new(classify(inner)));
    }
    if is_map(ty) {
        return FieldKindSpec::Mapping;
    }
    let unresolved = || FieldKindSpec::Unresolved(render(ty));
    if option_inner(ty).is_some() {
        return unresolved();
    }
    let Some(last) = last_segment(ty) else {
        return unresolved();
    };
    if !last.arguments.is_none() {
        return unresolved();
    }
    let name = last.ident.to_string();
    match name.as_str() {
        "f32" | "f64" => FieldKindSpec::Float,
        "String" => FieldKindSpec::String,
        "bool" => FieldKindSpec::Boolean,
        "char" | "PathBuf" | "Utf8PathBuf" | "Value" | "Box" => unresolved(),
        other if INTEGERS.contains(&other) => FieldKindSpec::Integer,
        _ => FieldKindSpec::Record(ty.clone()),
    }
}

fn render(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

fn kind_tokens(kind: &FieldKindSpec, krate: &TokenStream) -> TokenStream {
    match kind {
        FieldKindSpec::Integer => quote! { #krate::FieldKind::Integer },
        FieldKindSpec::Float => quote! { #krate::FieldKind::Float },
        FieldKindSpec::String => quote! { #krate::FieldKind::String },
        FieldKindSpec::Boolean => quote! { #krate::FieldKind::Boolean },
        FieldKindSpec::Mapping => quote! { #krate::FieldKind::Mapping },
        FieldKindSpec::Sequence(element) => {
            let element = kind_tokens(element, krate);
            quote! { #krate::FieldKind::sequence(#element) }
        }
        FieldKindSpec::Record(ty) => {
            let schema_ref = schema_ref_tokens(ty, krate);
            quote! { #krate::FieldKind::Record(#schema_ref) }
        }
        FieldKindSpec::Unresolved(name) => {
            quote! { #krate::FieldKind::Unresolved(::std::string::String::from(#name)) }
        }
    }
}

fn schema_ref_tokens(ty: &Type, krate: &TokenStream) -> TokenStream {
    quote_spanned! {ty.span()=>
        #krate::SchemaRef::lazy(<#ty as #krate::ConfigSchema>::schema)
    }
}

/// Expression producing the declared default.
///
/// String literals are converted into the field type, and integer literals
/// given for float fields are written as float literals. Every other
/// expression must already have the field's type.
fn produce_tokens(source: &DefaultSource, kind: &FieldKindSpec) -> TokenStream {
    match source {
        DefaultSource::Fn(path) => quote! { #path() },
        DefaultSource::Expr(expr) => match (&**expr, kind) {
            (Expr::Lit(ExprLit { lit: Lit::Str(text), .. }), _) => {
                quote! { ::core::convert::Into::into(#text) }
            }
            (Expr::Lit(ExprLit { lit: Lit::Int(int), .. }), FieldKindSpec::Float) => {
                let float = LitFloat::new(&format!("{}.0", int.base10_digits()), int.span());
                quote! { #float }
            }
            (Expr::Unary(ExprUnary { op: UnOp::Neg(_), expr: inner, .. }), FieldKindSpec::Float)
                if matches!(&**inner, Expr::Lit(ExprLit { lit: Lit::Int(_), .. })) =>
            {
                let magnitude = produce_tokens(&DefaultSource::Expr(inner.clone()), kind);
                quote! { -#magnitude }
            }
            _ => quote! { #expr },
        },
    }
}

fn default_tokens(
    field: &SchemaField,
    kind: &FieldKindSpec,
    krate: &TokenStream,
) -> Option<TokenStream> {
    let produce = produce_tokens(field.default.as_ref()?, kind);
    let ty = &field.ty;
    let span = field.ident.span();
    let tokens = if let FieldKindSpec::Record(record) = kind {
        // A record-typed default contributes its schema's defaults.
        let schema_ref = schema_ref_tokens(record, krate);
        quote_spanned! {span=>
            #krate::FieldDefault::factory(|| {
                let _: #record = #produce;
                #krate::DefaultValue::Record(#schema_ref)
            })
        }
    } else {
        quote_spanned! {span=>
            #krate::FieldDefault::try_factory(|| {
                let value: #ty = #produce;
                #krate::DefaultValue::serialize(&value)
            })
        }
    };
    Some(tokens)
}

fn field_tokens(field: &SchemaField, krate: &TokenStream) -> TokenStream {
    let key = &field.key;
    let kind = classify(&field.ty);
    let kind_expr = kind_tokens(&kind, krate);
    let with_default = default_tokens(field, &kind, krate)
        .map(|default| quote! { .with_default(#default) });
    quote! {
        #krate::FieldSchema::new(#key, #kind_expr) #with_default
    }
}

/// Generate the `ConfigSchema` implementation for `input`.
pub(crate) fn schema_impl(input: &SchemaInput, krate: &TokenStream) -> TokenStream {
    let ident = &input.ident;
    let name = &input.name;
    let fields = input.fields.iter().map(|field| field_tokens(field, krate));
    let key_field = input
        .key_field
        .as_ref()
        .map(|key| quote! { .key_field(#key) });
    quote! {
        impl #krate::ConfigSchema for #ident {
            fn schema() -> ::std::sync::Arc<#krate::RecordSchema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<#krate::RecordSchema>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(SCHEMA.get_or_init(|| {
                    #krate::RecordSchema::builder(#name)
                        #( .field(#fields) )*
                        #key_field
                        .shared()
                }))
            }
        }
    }
}
