//! Helpers shared by unit tests.
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use crate::content::{
    Block,
    BlockSchema,
    ContentTree,
};
use crate::locale_store::{
    LocaleRecord,
    LocaleSnapshot,
};

/// Builds a snapshot from `(locale, key, value)` triples.
pub(crate) fn locale_snapshot(entries: &[(&str, &str, &str)]) -> LocaleSnapshot {
    let mut by_locale: BTreeMap<&str, LocaleRecord> = BTreeMap::new();
    for (locale, key, value) in entries {
        by_locale.entry(*locale).or_default().insert((*key).into(), (*value).to_string());
    }

    let mut snapshot = LocaleSnapshot::new();
    for (locale, record) in by_locale {
        snapshot.insert(locale, record);
    }
    snapshot
}

/// Parses front matter YAML and returns its block tree.
pub(crate) fn block_tree(yaml: &str, schema: &BlockSchema) -> Block {
    let header = serde_yaml::from_str(yaml).unwrap();
    ContentTree::from_header(header, schema).unwrap().root().clone()
}
