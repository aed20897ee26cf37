//! Unit tests for view navigation and the record and list views.

use std::sync::Arc;

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};
use toml::{Table, Value, toml};

use super::*;
use crate::{
    BooleanZero, ConfigStore, FieldDefault, FieldKind, FieldSchema, Format, MemoryBackend,
    ParsePolicy, RecordSchema,
};

struct Harness {
    backend: MemoryBackend,
    root: ProxyObject,
}

fn plugin_schema(keyed: bool) -> Arc<RecordSchema> {
    let builder = RecordSchema::builder("Plugin")
        .field(FieldSchema::new("id", FieldKind::String))
        .field(FieldSchema::new("enabled", FieldKind::Boolean).with_default(FieldDefault::value(true)));
    let builder = if keyed { builder.key_field("id") } else { builder };
    builder.shared()
}

fn app_schema(keyed: bool) -> Arc<RecordSchema> {
    let server = RecordSchema::builder("Server")
        .field(FieldSchema::new("host", FieldKind::String).with_default(FieldDefault::value("localhost")))
        .build();
    RecordSchema::builder("App")
        .field(FieldSchema::new("retries", FieldKind::Integer).with_default(FieldDefault::value(3)))
        .field(FieldSchema::new("server", FieldKind::record(server)))
        .field(FieldSchema::new("plugins", FieldKind::sequence(FieldKind::record(plugin_schema(keyed)))))
        .field(FieldSchema::new("tags", FieldKind::sequence(FieldKind::String)))
        .shared()
}

fn harness_with(document: &Table, keyed: bool) -> Result<Harness> {
    let text = toml::to_string(document)?;
    let backend = MemoryBackend::with_contents(text);
    let store = ConfigStore::open(Box::new(backend.clone()), Format::Toml, ParsePolicy::Strict)
        .map_err(|err| anyhow!(err))?;
    let binding = Binding::new(Arc::new(store), BooleanZero::False);
    let root = ProxyObject::new(binding, NodePath::root(), app_schema(keyed));
    Ok(Harness { backend, root })
}

fn sample_document() -> Table {
    toml! {
        tags = ["x", "y"]
        [server]
        host = "example"
        [[plugins]]
        id = "a"
        [[plugins]]
        id = "b"
    }
}

#[fixture]
fn harness() -> Result<Harness> {
    harness_with(&sample_document(), true)
}

#[fixture]
fn unkeyed() -> Result<Harness> {
    harness_with(&sample_document(), false)
}

fn plugins(harness: &Harness) -> Result<IndexedListView> {
    harness
        .root
        .list("plugins")
        .map_err(|err| anyhow!(err))?
        .ok_or_else(|| anyhow!("plugins should be a list view"))
}

fn id_of(entry: Option<Entry>) -> Result<Option<String>> {
    let Some(entry) = entry else {
        return Ok(None);
    };
    let object = entry
        .into_object()
        .ok_or_else(|| anyhow!("expected a record element"))?;
    let id = object
        .get("id")
        .map_err(|err| anyhow!(err))?
        .and_then(|entry| entry.as_raw().and_then(Value::as_str).map(str::to_owned));
    Ok(id)
}

#[rstest]
#[case(NodePath::root(), "(root)")]
#[case(NodePath::root().child_key("server"), "server")]
#[case(NodePath::root().child_key("plugins").child_index(2).child_key("id"), "plugins[2].id")]
#[case(NodePath::root().child_key("plugins").child_keyed("id", IndexKey::from("b")), "plugins[id=b]")]
fn node_paths_render_readably(#[case] path: NodePath, #[case] expected: &str) {
    assert_eq!(path.to_string(), expected);
}

#[rstest]
fn navigation_follows_keys_and_positions() {
    let doc = toml! {
        [[plugins]]
        id = "a"
        [[plugins]]
        id = "b"
    };
    let path = NodePath::root().child_key("plugins").child_index(1).child_key("id");
    assert_eq!(value_at(&doc, &path).and_then(Value::as_str), Some("b"));
    let beyond = NodePath::root().child_key("plugins").child_index(5);
    assert!(value_at(&doc, &beyond).is_none());
    let wrong_shape = NodePath::root().child_key("plugins").child_key("id");
    assert!(value_at(&doc, &wrong_shape).is_none());
    assert!(table_at(&doc, &NodePath::root()).is_some());
}

#[rstest]
fn keyed_segments_resolve_the_last_match() {
    let doc = toml! {
        [[plugins]]
        id = "a"
        enabled = true
        [[plugins]]
        id = "a"
        enabled = false
    };
    let path = NodePath::root()
        .child_key("plugins")
        .child_keyed("id", IndexKey::from("a"))
        .child_key("enabled");
    assert_eq!(value_at(&doc, &path).and_then(Value::as_bool), Some(false));
    let missing = NodePath::root().child_key("plugins").child_keyed("id", IndexKey::from("z"));
    assert!(value_at(&doc, &missing).is_none());
}

#[rstest]
fn get_wraps_by_declared_kind(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let server = harness.root.get("server").map_err(|err| anyhow!(err))?;
    ensure!(matches!(server, Some(Entry::Object(_))), "server should be an object view");
    let list = harness.root.get("plugins").map_err(|err| anyhow!(err))?;
    ensure!(matches!(list, Some(Entry::List(_))), "plugins should be a list view");
    let tags = harness.root.get("tags").map_err(|err| anyhow!(err))?;
    ensure!(
        tags.as_ref().and_then(Entry::as_raw) == Some(&Value::from(vec!["x", "y"])),
        "tags should be raw: {tags:?}"
    );
    Ok(())
}

#[rstest]
fn mismatched_shapes_are_returned_raw() -> Result<()> {
    let harness = harness_with(&toml! { server = "not a table" }, true)?;
    let server = harness.root.get("server").map_err(|err| anyhow!(err))?;
    ensure!(
        server.as_ref().and_then(Entry::as_raw).and_then(Value::as_str) == Some("not a table"),
        "unexpected entry {server:?}"
    );
    Ok(())
}

#[rstest]
fn missing_field_reads_declared_default_without_writing(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let retries = harness.root.get("retries").map_err(|err| anyhow!(err))?;
    ensure!(
        retries.as_ref().and_then(Entry::as_raw).and_then(Value::as_integer) == Some(3),
        "expected declared default, got {retries:?}"
    );
    ensure!(!harness.root.contains("retries").map_err(|err| anyhow!(err))?, "default must not be stored");
    ensure!(harness.backend.writes() == 0, "reads must not persist");
    Ok(())
}

#[rstest]
fn missing_field_without_default_is_absent(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    ensure!(harness.root.get("unknown").map_err(|err| anyhow!(err))?.is_none(), "expected absence");
    Ok(())
}

#[rstest]
fn set_writes_through(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    harness.root.set("retries", 9).map_err(|err| anyhow!(err))?;
    ensure!(harness.backend.writes() == 1, "set should persist once");
    let written = harness.backend.contents().unwrap_or_default();
    ensure!(written.contains("retries = 9"), "unexpected document {written}");
    Ok(())
}

#[rstest]
fn set_accepts_views_and_serialized_values(harness: Result<Harness>) -> Result<()> {
    #[derive(serde::Serialize)]
    struct Server {
        host: String,
    }

    let harness = harness?;
    let server = harness
        .root
        .object("server")
        .map_err(|err| anyhow!(err))?
        .ok_or_else(|| anyhow!("server should be an object view"))?;
    harness.root.set("backup", &server).map_err(|err| anyhow!(err))?;
    harness
        .root
        .set("server", Serialized(Server { host: "other".into() }))
        .map_err(|err| anyhow!(err))?;

    let doc = harness.root.to_raw().map_err(|err| anyhow!(err))?;
    let host = |name: &str| {
        doc.get(name)
            .and_then(|node| node.get("host"))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };
    ensure!(host("backup").as_deref() == Some("example"), "backup should copy the old node");
    ensure!(host("server").as_deref() == Some("other"), "server should be replaced");
    Ok(())
}

#[rstest]
fn delete_removes_or_reports_missing(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    harness.root.delete("tags").map_err(|err| anyhow!(err))?;
    ensure!(!harness.root.contains("tags").map_err(|err| anyhow!(err))?, "tags should be gone");
    let err = harness
        .root
        .delete("tags")
        .err()
        .ok_or_else(|| anyhow!("second delete should fail"))?;
    ensure!(matches!(err, MendError::MissingKey { .. }), "unexpected error {err}");
    ensure!(harness.backend.writes() == 1, "failed delete must not persist");
    Ok(())
}

#[rstest]
fn nested_writes_persist_whole_document(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let server = harness
        .root
        .object("server")
        .map_err(|err| anyhow!(err))?
        .ok_or_else(|| anyhow!("server should be an object view"))?;
    server.set("port", 8080).map_err(|err| anyhow!(err))?;
    let written = harness.backend.contents().unwrap_or_default();
    let reparsed: Table = toml::from_str(&written)?;
    let port = reparsed
        .get("server")
        .and_then(|server| server.get("port"))
        .and_then(Value::as_integer);
    ensure!(port == Some(8080), "nested write lost: {written}");
    ensure!(reparsed.contains_key("plugins"), "siblings must be kept: {written}");
    Ok(())
}

#[rstest]
fn views_detach_when_their_node_disappears(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let server = harness
        .root
        .object("server")
        .map_err(|err| anyhow!(err))?
        .ok_or_else(|| anyhow!("server should be an object view"))?;
    harness.root.delete("server").map_err(|err| anyhow!(err))?;
    let err = server
        .get("host")
        .err()
        .ok_or_else(|| anyhow!("detached view should fail"))?;
    ensure!(matches!(err, MendError::Detached { .. }), "unexpected error {err}");
    Ok(())
}

#[rstest]
fn list_find_and_keys_follow_mutations(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let mut list = plugins(&harness)?;
    ensure!(id_of(list.find("b").map_err(|err| anyhow!(err))?)?.as_deref() == Some("b"), "b present");

    let b = list.find("b").map_err(|err| anyhow!(err))?.ok_or_else(|| anyhow!("b present"))?;
    list.remove(b).map_err(|err| anyhow!(err))?;
    ensure!(list.find("b").map_err(|err| anyhow!(err))?.is_none(), "b removed");

    list.append(toml! { id = "c" }).map_err(|err| anyhow!(err))?;
    ensure!(id_of(list.find("c").map_err(|err| anyhow!(err))?)?.as_deref() == Some("c"), "c present");
    let keys = list.keys().map_err(|err| anyhow!(err))?;
    ensure!(keys == vec![IndexKey::from("a"), IndexKey::from("c")], "unexpected keys {keys:?}");
    ensure!(harness.backend.writes() == 2, "each mutation persists once");
    Ok(())
}

#[rstest]
fn unkeyed_lists_reject_lookups() -> Result<()> {
    let document = toml! {
        [[plugins]]
        id = "a"
    };
    let harness = harness_with(&document, false)?;
    let list = plugins(&harness)?;
    let err = list.find("a").err().ok_or_else(|| anyhow!("find should fail"))?;
    ensure!(matches!(err, MendError::NotIndexed { .. }), "unexpected error {err}");
    ensure!(matches!(list.keys(), Err(MendError::NotIndexed { .. })), "keys should fail too");
    ensure!(list.len().map_err(|err| anyhow!(err))? == 1, "positional access still works");
    Ok(())
}

#[rstest]
fn positional_operations(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let mut list = plugins(&harness)?;
    ensure!(list.get(5).map_err(|err| anyhow!(err))?.is_none(), "past the end is absent");
    ensure!(
        matches!(list.set(5, toml! { id = "z" }), Err(MendError::MissingKey { .. })),
        "set past the end should fail"
    );
    ensure!(
        matches!(list.delete(5), Err(MendError::MissingKey { .. })),
        "delete past the end should fail"
    );

    list.set(0, toml! { id = "z" }).map_err(|err| anyhow!(err))?;
    ensure!(id_of(list.get(0).map_err(|err| anyhow!(err))?)?.as_deref() == Some("z"), "replaced");
    ensure!(list.find("a").map_err(|err| anyhow!(err))?.is_none(), "old key dropped from index");

    list.delete(0).map_err(|err| anyhow!(err))?;
    ensure!(list.keys().map_err(|err| anyhow!(err))? == vec![IndexKey::from("b")], "only b left");

    let missing = list.remove(toml! { id = "nope" });
    ensure!(matches!(missing, Err(MendError::ValueNotFound { .. })), "unexpected {missing:?}");

    list.clear().map_err(|err| anyhow!(err))?;
    ensure!(list.is_empty().map_err(|err| anyhow!(err))?, "list should be empty");
    ensure!(list.keys().map_err(|err| anyhow!(err))?.is_empty(), "index should be empty");
    Ok(())
}

#[rstest]
fn elements_read_their_own_defaults(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let list = plugins(&harness)?;
    let first = list
        .get(0)
        .map_err(|err| anyhow!(err))?
        .and_then(Entry::into_object)
        .ok_or_else(|| anyhow!("first element should be an object"))?;
    let enabled = first.get("enabled").map_err(|err| anyhow!(err))?;
    ensure!(
        enabled.as_ref().and_then(Entry::as_raw).and_then(Value::as_bool) == Some(true),
        "element default should be served: {enabled:?}"
    );
    Ok(())
}

#[rstest]
fn iteration_is_restartable(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let list = plugins(&harness)?;
    for _ in 0..2 {
        let ids = list
            .iter()
            .map(|entry| id_of(Some(entry.map_err(|err| anyhow!(err))?)))
            .collect::<Result<Vec<_>>>()?;
        ensure!(
            ids == vec![Some("a".to_owned()), Some("b".to_owned())],
            "unexpected ids {ids:?}"
        );
    }
    Ok(())
}

#[rstest]
fn iteration_stops_after_detaching(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let list = plugins(&harness)?;
    harness.root.delete("plugins").map_err(|err| anyhow!(err))?;
    let results: Vec<_> = list.iter().collect();
    ensure!(results.len() == 1, "expected a single error, got {results:?}");
    ensure!(
        matches!(results.first(), Some(Err(MendError::Detached { .. }))),
        "unexpected results {results:?}"
    );
    Ok(())
}

fn element(list: &IndexedListView, position: usize) -> Result<ProxyObject> {
    list.get(position)
        .map_err(|err| anyhow!(err))?
        .and_then(Entry::into_object)
        .ok_or_else(|| anyhow!("element {position} should be a record view"))
}

fn enabled_flags(harness: &Harness) -> Result<Vec<(String, Option<bool>)>> {
    let written = harness.backend.contents().unwrap_or_default();
    let reparsed: Table = toml::from_str(&written)?;
    let flags = reparsed
        .get("plugins")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let id = item.get("id").and_then(Value::as_str).unwrap_or_default().to_owned();
                    (id, item.get("enabled").and_then(Value::as_bool))
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(flags)
}

#[rstest]
fn keyed_element_follows_its_record_across_shifts() -> Result<()> {
    let document = toml! {
        [[plugins]]
        id = "a"
        enabled = true
        [[plugins]]
        id = "b"
        enabled = true
    };
    let harness = harness_with(&document, true)?;
    let mut list = plugins(&harness)?;
    let b = list
        .find("b")
        .map_err(|err| anyhow!(err))?
        .and_then(Entry::into_object)
        .ok_or_else(|| anyhow!("b should be a record view"))?;
    ensure!(b.path().to_string() == "plugins[id=b]", "unexpected path {}", b.path());

    list.delete(0).map_err(|err| anyhow!(err))?;
    list.append(toml! { id = "c" }).map_err(|err| anyhow!(err))?;
    b.set("enabled", false).map_err(|err| anyhow!(err))?;

    let flags = enabled_flags(&harness)?;
    let expected = vec![("b".to_owned(), Some(false)), ("c".to_owned(), None)];
    ensure!(flags == expected, "write landed on the wrong record: {flags:?}");
    Ok(())
}

#[rstest]
fn keyed_element_detaches_when_its_record_goes(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let mut list = plugins(&harness)?;
    let a = element(&list, 0)?;
    list.delete(0).map_err(|err| anyhow!(err))?;

    let err = a
        .set("enabled", false)
        .err()
        .ok_or_else(|| anyhow!("write through a removed record should fail"))?;
    ensure!(matches!(err, MendError::Detached { .. }), "unexpected error {err}");
    let flags = enabled_flags(&harness)?;
    ensure!(flags == vec![("b".to_owned(), None)], "neighbour must be untouched: {flags:?}");
    Ok(())
}

#[rstest]
#[case::delete_before(|list: &mut IndexedListView| list.delete(0))]
#[case::overwrite(|list: &mut IndexedListView| list.set(0, toml! { id = "z" }))]
#[case::clear(|list: &mut IndexedListView| list.clear())]
fn unkeyed_element_detaches_after_positions_shift(
    #[case] shift: fn(&mut IndexedListView) -> MendResult<()>,
    unkeyed: Result<Harness>,
) -> Result<()> {
    let harness = unkeyed?;
    let mut list = plugins(&harness)?;
    let second = element(&list, 1)?;
    ensure!(second.path().to_string() == "plugins[1]", "unexpected path {}", second.path());

    shift(&mut list).map_err(|err| anyhow!(err))?;
    let before = enabled_flags(&harness)?;

    let err = second
        .set("enabled", false)
        .err()
        .ok_or_else(|| anyhow!("positional view should detach"))?;
    ensure!(matches!(err, MendError::Detached { .. }), "unexpected error {err}");
    ensure!(enabled_flags(&harness)? == before, "no element may be written");
    Ok(())
}

#[rstest]
fn unkeyed_element_survives_appends_and_its_own_writes(unkeyed: Result<Harness>) -> Result<()> {
    let harness = unkeyed?;
    let mut list = plugins(&harness)?;
    let first = element(&list, 0)?;

    list.append(toml! { id = "c" }).map_err(|err| anyhow!(err))?;
    first.set("enabled", false).map_err(|err| anyhow!(err))?;
    first.set("label", "primary").map_err(|err| anyhow!(err))?;

    let flags = enabled_flags(&harness)?;
    let expected = vec![
        ("a".to_owned(), Some(false)),
        ("b".to_owned(), None),
        ("c".to_owned(), None),
    ];
    ensure!(flags == expected, "unexpected flags {flags:?}");
    Ok(())
}

#[rstest]
fn replacing_the_list_through_its_parent_detaches_positional_elements(
    unkeyed: Result<Harness>,
) -> Result<()> {
    let harness = unkeyed?;
    let list = plugins(&harness)?;
    let first = element(&list, 0)?;

    let replacement = vec![Value::Table(toml! { id = "z" })];
    harness.root.set("plugins", replacement).map_err(|err| anyhow!(err))?;

    let err = first
        .get("id")
        .err()
        .ok_or_else(|| anyhow!("element of a replaced list should detach"))?;
    ensure!(matches!(err, MendError::Detached { .. }), "unexpected error {err}");
    Ok(())
}

#[rstest]
fn appending_to_untouched_keyed_list_indexes_new_key(harness: Result<Harness>) -> Result<()> {
    let harness = harness?;
    let mut list = plugins(&harness)?;
    list.append(toml! { id = "c" }).map_err(|err| anyhow!(err))?;

    let keys = list.keys().map_err(|err| anyhow!(err))?;
    ensure!(
        keys == vec![IndexKey::from("a"), IndexKey::from("b"), IndexKey::from("c")],
        "unexpected keys {keys:?}"
    );
    ensure!(id_of(list.find("c").map_err(|err| anyhow!(err))?)?.as_deref() == Some("c"), "c present");
    Ok(())
}
