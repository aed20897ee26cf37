//! Additive merge of default trees into live documents.

use toml::{Table, Value};

/// Fill the keys of `target` that are missing from `defaults`.
///
/// Behaviour:
/// - A key absent from `target` receives the default subtree verbatim.
/// - A key holding a table in both trees is merged recursively.
/// - Any other combination leaves `target` untouched, including shape
///   mismatches and arrays, which are never merged element by element.
///
/// Returns `true` when at least one key was inserted. A second call with the
/// same inputs returns `false` and changes nothing.
///
/// # Examples
///
/// ```rust
/// use mend_config::merge_defaults;
/// use toml::toml;
///
/// let defaults = toml! {
///     retries = 0
///     [server]
///     host = "localhost"
/// };
/// let mut document = toml! { retries = 5 };
/// assert!(merge_defaults(&defaults, &mut document));
/// assert_eq!(document, toml! {
///     retries = 5
///     [server]
///     host = "localhost"
/// });
/// assert!(!merge_defaults(&defaults, &mut document));
/// ```
pub fn merge_defaults(defaults: &Table, target: &mut Table) -> bool {
    let mut changed = false;
    for (key, default) in defaults {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), default.clone());
                changed = true;
            }
            Some(Value::Table(existing)) => {
                if let Value::Table(nested) = default {
                    changed |= merge_defaults(nested, existing);
                }
            }
            Some(_) => {}
        }
    }
    changed
}
