//! Shared helpers for integration tests.

use parking_lot::{const_mutex, Mutex};
use std::sync::Arc;
use studiotree::store::SledEntryStore;
use studiotree::tree::validation::name_key;
use studiotree::tree::{path, Forest};
use studiotree::types::EntryKind;
use studiotree::ProjectApi;
use tempfile::TempDir;

static ENV_LOCK: Mutex<()> = const_mutex(());

/// Run `f` with HOME and the XDG directories pointed into `temp`.
///
/// Serialized, since the environment is process-wide.
pub fn with_xdg_env<R>(temp: &TempDir, f: impl FnOnce() -> R) -> R {
    let _guard = ENV_LOCK.lock();
    let keys = ["HOME", "XDG_DATA_HOME", "XDG_CONFIG_HOME"];
    let saved: Vec<Option<String>> = keys.iter().map(|k| std::env::var(k).ok()).collect();

    std::env::set_var("HOME", temp.path());
    std::env::set_var("XDG_DATA_HOME", temp.path().join("data"));
    std::env::set_var("XDG_CONFIG_HOME", temp.path().join("config"));

    let result = f();

    for (key, value) in keys.iter().zip(saved) {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    result
}

pub fn temp_api() -> Arc<ProjectApi> {
    let store = Arc::new(SledEntryStore::temporary().unwrap());
    Arc::new(ProjectApi::from_sled(store))
}

/// Sorted (path, kind, content) triples
pub fn shape(forest: &Forest) -> Vec<(String, EntryKind, Option<String>)> {
    let mut out: Vec<_> = forest
        .iter()
        .map(|e| (e.path.clone(), e.kind(), e.content().map(str::to_string)))
        .collect();
    out.sort();
    out
}

/// Paths derive from parents and sibling names never collide
pub fn assert_consistent(forest: &Forest) {
    for entry in forest.iter() {
        let expected = match &entry.parent {
            Some(parent) => {
                let parent = forest.get(parent).expect("parent exists");
                assert!(parent.is_folder(), "{} has a file parent", entry.path);
                path::join(&parent.path, &entry.name)
            }
            None => entry.name.clone(),
        };
        assert_eq!(entry.path, expected);
    }

    let mut groups: Vec<Vec<&str>> = vec![forest.sibling_names(None)];
    groups.extend(
        forest
            .iter()
            .filter(|e| e.is_folder())
            .map(|e| forest.sibling_names(Some(&e.id))),
    );
    for names in groups {
        let mut keys: Vec<String> = names.iter().map(|n| name_key(n)).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total, "colliding sibling names in {:?}", names);
    }
}
