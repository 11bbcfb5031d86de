use std::sync::Arc;
use studiotree::flat::{flatten, hydrate_by_parent, FlatRecord};
use studiotree::reconcile::ReconcileStrategy;
use studiotree::store::{EntryStore, PersistedEntry, SledEntryStore};
use studiotree::template;
use studiotree::types::EntryKind;
use studiotree::ProjectApi;
use tempfile::TempDir;

use crate::integration::support::{shape, temp_api};

fn persisted_shape(entries: &[PersistedEntry]) -> Vec<(String, EntryKind, String)> {
    let mut out: Vec<_> = entries
        .iter()
        .map(|e| (e.path.clone(), e.kind, e.content.clone()))
        .collect();
    out.sort();
    out
}

#[test]
fn full_replace_links_file_to_persisted_folder() {
    let api = temp_api();
    let project = api.create_project("p", Some(&[])).unwrap().project.id;
    let records = vec![FlatRecord::folder("src"), FlatRecord::file("src/a.js", "1")];

    let entries = api.replace_files(&project, &records).unwrap();
    assert_eq!(entries.len(), 2);
    let folder = entries.iter().find(|e| e.path == "src").unwrap();
    let file = entries.iter().find(|e| e.path == "src/a.js").unwrap();
    assert_eq!(folder.kind, EntryKind::Folder);
    assert_eq!(file.parent_id.as_ref(), Some(&folder.id));
    assert_eq!(file.content, "1");
}

#[test]
fn repeated_replace_yields_identical_shape() {
    let api = temp_api();
    let project = api.create_project("p", None).unwrap().project.id;
    let records = flatten(&template::default_forest());

    let first = api.replace_files(&project, &records).unwrap();
    let second = api.replace_files(&project, &records).unwrap();
    assert_eq!(persisted_shape(&first), persisted_shape(&second));
}

#[test]
fn repeated_sync_is_a_noop_and_keeps_ids() {
    let api = temp_api();
    let project = api.create_project("p", None).unwrap().project.id;
    let records = flatten(&template::default_forest());

    let first = api.sync_files(&project, &records).unwrap();
    let (second, stats) = api.reconciler().sync(&project, &records).unwrap();
    assert_eq!(first, second);
    assert_eq!(stats.unchanged, records.len());
    assert_eq!(stats.inserted + stats.updated + stats.removed, 0);
}

#[test]
fn persisted_tree_hydrates_back_to_same_shape() {
    let api = temp_api();
    let snapshot = api.create_project("p", None).unwrap();
    let forest = hydrate_by_parent(&snapshot.files);
    assert_eq!(shape(&forest), shape(&template::default_forest()));
    // Store ids survive hydration
    assert!(snapshot.files.iter().all(|e| forest.contains(&e.id)));
}

#[test]
fn entry_rename_and_delete_cascade_in_store() {
    let api = temp_api();
    let project = api
        .create_project(
            "p",
            Some(&[
                FlatRecord::folder("src"),
                FlatRecord::folder("src/lib"),
                FlatRecord::file("src/lib/u.js", "u"),
                FlatRecord::folder("src2"),
                FlatRecord::file("src2/keep.js", "k"),
            ]),
        )
        .unwrap()
        .project
        .id;
    let files = api.get_project(&project).unwrap().files;
    let src = files.iter().find(|e| e.path == "src").unwrap().id.clone();

    api.update_entry(&src, Some("app"), None).unwrap();
    let paths: Vec<String> = api
        .get_project(&project)
        .unwrap()
        .files
        .into_iter()
        .map(|e| e.path)
        .collect();
    assert!(paths.contains(&"app/lib/u.js".to_string()));
    assert!(paths.contains(&"src2/keep.js".to_string()));

    let removed = api.delete_entry(&src).unwrap();
    assert_eq!(removed, 3);
    let remaining = api.get_project(&project).unwrap().files;
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|e| e.path.starts_with("src2")));
}

#[test]
fn store_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let store_path = temp.path().join("store");
    let project = {
        let store = Arc::new(SledEntryStore::new(&store_path).unwrap());
        let api = ProjectApi::from_sled(store.clone());
        let id = api.create_project("durable", None).unwrap().project.id;
        store.flush().unwrap();
        id
    };

    let store = Arc::new(SledEntryStore::new(&store_path).unwrap());
    let api = ProjectApi::from_sled(store.clone());
    let snapshot = api.get_project(&project).unwrap();
    assert_eq!(snapshot.project.name, "durable");
    assert_eq!(snapshot.files.len(), 5);
    assert!(store.get_by_path(&project, "src/App.jsx").unwrap().is_some());
}

#[test]
fn strategies_agree_through_update_project() {
    let api = temp_api();
    let records = vec![
        FlatRecord::folder("a"),
        FlatRecord::file("a/x.txt", "x"),
        FlatRecord::file("b.txt", "b"),
    ];
    let p1 = api.create_project("one", Some(&[])).unwrap().project.id;
    let p2 = api.create_project("two", Some(&[])).unwrap().project.id;

    let replaced = api
        .update_project(&p1, None, Some(&records), ReconcileStrategy::Replace)
        .unwrap();
    let synced = api
        .update_project(&p2, None, Some(&records), ReconcileStrategy::Sync)
        .unwrap();
    assert_eq!(persisted_shape(&replaced.files), persisted_shape(&synced.files));
}

#[test]
fn case_variant_records_are_rejected_instead_of_lost_on_load() {
    let api = temp_api();
    let variants = [FlatRecord::file("A.txt", "upper"), FlatRecord::file("a.txt", "lower")];

    let err = api.create_project("p", Some(&variants)).unwrap_err();
    assert!(err.is_conflict());
    assert!(api.list_projects().unwrap().is_empty());

    let project = api.create_project("p", None).unwrap().project.id;
    for strategy in [ReconcileStrategy::Replace, ReconcileStrategy::Sync] {
        let err = api
            .update_project(&project, None, Some(&variants), strategy)
            .unwrap_err();
        assert!(err.is_conflict(), "{:?}", strategy);
    }

    let stored = api.get_project(&project).unwrap().files;
    let forest = api.load_forest(&project).unwrap();
    assert_eq!(stored.len(), forest.len());
    let mut expected: Vec<_> = template::default_records()
        .into_iter()
        .map(|r| (r.path.clone(), r.kind, r.content_or_empty().to_string()))
        .collect();
    expected.sort();
    assert_eq!(persisted_shape(&stored), expected);
}
