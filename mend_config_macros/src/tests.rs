//! Unit tests for the `ConfigSchema` derive expansion.

use anyhow::{Result, anyhow, ensure};
use rstest::rstest;
use syn::{DeriveInput, Field, Type, parse_quote};

use crate::derive::{FieldKindSpec, classify, expand};

fn expand_to_string(input: &DeriveInput) -> Result<String> {
    expand(input)
        .map(|tokens| tokens.to_string())
        .map_err(|err| anyhow!(err.to_string()))
}

fn expand_error(input: &DeriveInput) -> Result<String> {
    match expand(input) {
        Ok(tokens) => Err(anyhow!("expected an error, got {tokens}")),
        Err(err) => Ok(err.to_string()),
    }
}

#[rstest]
#[case(parse_quote!(u16), "integer")]
#[case(parse_quote!(i64), "integer")]
#[case(parse_quote!(f32), "float")]
#[case(parse_quote!(String), "string")]
#[case(parse_quote!(std::string::String), "string")]
#[case(parse_quote!(bool), "boolean")]
#[case(parse_quote!(Vec<String>), "sequence")]
#[case(parse_quote!(std::collections::BTreeMap<String, u8>), "mapping")]
#[case(parse_quote!(HashMap<String, String>), "mapping")]
#[case(parse_quote!(toml::Table), "mapping")]
#[case(parse_quote!(Server), "record")]
#[case(parse_quote!(crate::settings::Server), "record")]
#[case(parse_quote!(Option<u8>), "unresolved")]
#[case(parse_quote!(&'static str), "unresolved")]
#[case(parse_quote!((u8, u8)), "unresolved")]
#[case(parse_quote!(char), "unresolved")]
#[case(parse_quote!(std::path::PathBuf), "unresolved")]
#[case(parse_quote!(serde_json::Value), "unresolved")]
#[case(parse_quote!(Box<Server>), "unresolved")]
fn classifies_declared_types(#[case] ty: Type, #[case] expected: &str) {
    let actual = match classify(&ty) {
        FieldKindSpec::Integer => "integer",
        FieldKindSpec::Float => "float",
        FieldKindSpec::String => "string",
        FieldKindSpec::Boolean => "boolean",
        FieldKindSpec::Sequence(_) => "sequence",
        FieldKindSpec::Mapping => "mapping",
        FieldKindSpec::Record(_) => "record",
        FieldKindSpec::Unresolved(_) => "unresolved",
    };
    assert_eq!(actual, expected);
}

#[rstest]
fn sequence_of_records_keeps_element_kind() {
    let ty: Type = parse_quote!(Vec<Plugin>);
    assert!(matches!(
        classify(&ty),
        FieldKindSpec::Sequence(element) if matches!(*element, FieldKindSpec::Record(_))
    ));
}

#[rstest]
fn unresolved_types_render_without_spaces() {
    let ty: Type = parse_quote!(Option<Vec<u8>>);
    assert!(matches!(
        classify(&ty),
        FieldKindSpec::Unresolved(name) if name == "Option<Vec<u8>>"
    ));
}

#[rstest]
fn generates_cached_schema_impl() -> Result<()> {
    let input: DeriveInput = parse_quote! {
        #[config(key = "id")]
        struct Plugin {
            id: String,
            #[config(default = 3)]
            retries: u32,
            #[config(skip)]
            cache: Vec<u8>,
        }
    };
    let out = expand_to_string(&input)?;
    ensure!(out.contains("impl mend_config :: ConfigSchema for Plugin"), "{out}");
    ensure!(out.contains("OnceLock"), "{out}");
    ensure!(out.contains("RecordSchema :: builder (\"Plugin\")"), "{out}");
    ensure!(out.contains("FieldSchema :: new (\"id\" , mend_config :: FieldKind :: String)"), "{out}");
    ensure!(out.contains("try_factory"), "{out}");
    ensure!(out.contains(". key_field (\"id\")"), "{out}");
    ensure!(!out.contains("\"cache\""), "skipped field leaked: {out}");
    Ok(())
}

#[rstest]
#[case::integer_for_float(parse_quote! { #[config(default = 1)] ratio: f64 }, "let value : f64 = 1.0")]
#[case::negative_for_float(parse_quote! { #[config(default = -2)] ratio: f32 }, "let value : f32 = - 2.0")]
#[case::string_converted(
    parse_quote! { #[config(default = "localhost")] host: String },
    "let value : String = :: core :: convert :: Into :: into (\"localhost\")"
)]
#[case::integer_kept(parse_quote! { #[config(default = 3)] retries: u32 }, "let value : u32 = 3")]
#[case::factory_called(parse_quote! { #[config(default_fn = make)] tags: Vec<String> }, "let value : Vec < String > = make ()")]
fn defaults_are_checked_against_field_type(#[case] field: Field, #[case] expected: &str) -> Result<()> {
    let input: DeriveInput = parse_quote! { struct S { #field } };
    let out = expand_to_string(&input)?;
    ensure!(out.contains(expected), "expected {expected} in {out}");
    Ok(())
}

#[rstest]
fn nested_records_are_referenced_lazily() -> Result<()> {
    let input: DeriveInput = parse_quote! {
        struct App {
            server: Server,
            #[config(default_fn = Server::fallback)]
            backup: Server,
        }
    };
    let out = expand_to_string(&input)?;
    ensure!(
        out.contains("SchemaRef :: lazy (< Server as mend_config :: ConfigSchema > :: schema)"),
        "{out}"
    );
    ensure!(out.contains("DefaultValue :: Record"), "{out}");
    ensure!(out.contains("let _ : Server = Server :: fallback ()"), "{out}");
    Ok(())
}

#[rstest]
#[case::config_rename(
    parse_quote! { struct S { #[config(rename = "listen")] listen_port: u16 } },
    "\"listen\""
)]
#[case::serde_rename(
    parse_quote! { struct S { #[serde(rename = "port")] listen_port: u16 } },
    "\"port\""
)]
#[case::serde_rename_all(
    parse_quote! { #[serde(rename_all = "kebab-case")] struct S { listen_port: u16 } },
    "\"listen-port\""
)]
#[case::config_beats_serde(
    parse_quote! {
        #[serde(rename_all = "camelCase")]
        struct S { #[config(rename = "lp")] #[serde(rename = "port")] listen_port: u16 }
    },
    "\"lp\""
)]
#[case::raw_identifier(parse_quote! { struct S { r#type: String } }, "\"type\"")]
fn stored_names_follow_rename_rules(#[case] input: DeriveInput, #[case] expected: &str) -> Result<()> {
    let out = expand_to_string(&input)?;
    ensure!(out.contains(expected), "expected {expected} in {out}");
    Ok(())
}

#[rstest]
fn honours_crate_override() -> Result<()> {
    let input: DeriveInput = parse_quote! {
        #[config(crate = "settings", name = "Application")]
        struct App { retries: u8 }
    };
    let out = expand_to_string(&input)?;
    ensure!(out.contains("impl settings :: ConfigSchema for App"), "{out}");
    ensure!(out.contains("builder (\"Application\")"), "{out}");
    Ok(())
}

#[rstest]
#[case::unknown_key(
    parse_quote! { #[config(key = "missing")] struct S { id: String } },
    "key field 'missing' is not a stored field of S"
)]
#[case::generic(parse_quote! { struct S<T> { value: T } }, "generic structs")]
#[case::tuple(parse_quote! { struct S(u8); }, "requires named fields")]
#[case::enumeration(parse_quote! { enum S { A } }, "can only be derived for structs")]
#[case::bad_rename_all(
    parse_quote! { #[serde(rename_all = "Title Case")] struct S { id: String } },
    "unsupported serde rename_all value"
)]
fn rejects_invalid_input(#[case] input: DeriveInput, #[case] expected: &str) -> Result<()> {
    let message = expand_error(&input)?;
    ensure!(message.contains(expected), "unexpected message: {message}");
    Ok(())
}
