use studiotree::error::TreeError;
use studiotree::flat::{flatten, hydrate_by_path, FlatRecord};
use studiotree::tree::Forest;

use crate::integration::support::{assert_consistent, shape};

#[test]
fn create_then_rename_leaves_single_cascaded_file() {
    let forest = Forest::new();
    let (forest, src) = forest.create_folder(None, "src").unwrap();
    let (forest, _) = forest.create_file(Some(&src), "a.js", "x").unwrap();
    let forest = forest.rename_node(&src, "lib").unwrap();

    let files: Vec<_> = forest.iter().filter(|e| e.is_file()).collect();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "lib/a.js");
    assert_eq!(files[0].content(), Some("x"));
    assert_consistent(&forest);
}

#[test]
fn move_to_root_with_collision_gets_suffix() {
    let forest = Forest::new();
    let (forest, folder) = forest.create_folder(None, "folder").unwrap();
    let (forest, nested) = forest.create_file(Some(&folder), "a.txt", "moved").unwrap();
    let (forest, original) = forest.create_file(None, "a.txt", "original").unwrap();

    let forest = forest.move_node_to_folder(&nested, None, None).unwrap();

    let kept = forest.find_by_path("a.txt").unwrap();
    assert_eq!(kept.id, original);
    assert_eq!(kept.content(), Some("original"));
    let moved = forest.find_by_path("a (1).txt").unwrap();
    assert_eq!(moved.id, nested);
    assert_eq!(moved.content(), Some("moved"));
    assert!(forest.get(&folder).unwrap().children().is_empty());
}

#[test]
fn deep_rename_cascade_rewrites_every_descendant() {
    let records = vec![
        FlatRecord::folder("a"),
        FlatRecord::folder("a/b"),
        FlatRecord::folder("a/b/c"),
        FlatRecord::file("a/b/c/d.txt", "d"),
        FlatRecord::file("a/b/e.txt", "e"),
        FlatRecord::folder("a/bb"),
        FlatRecord::file("a/bb/keep.txt", "k"),
    ];
    let forest = hydrate_by_path(&records);
    let b = forest.find_by_path("a/b").unwrap().id.clone();
    let forest = forest.rename_node(&b, "c").unwrap();

    let paths: Vec<&str> = forest.iter().map(|e| e.path.as_str()).collect();
    assert!(paths.iter().all(|p| !p.starts_with("a/b/") && *p != "a/b"));
    assert!(paths.contains(&"a/c/c/d.txt"));
    assert!(paths.contains(&"a/c/e.txt"));
    assert!(paths.contains(&"a/bb/keep.txt"));
    assert_consistent(&forest);
}

#[test]
fn cycle_moves_return_input_unchanged() {
    let forest = hydrate_by_path(&[
        FlatRecord::folder("f"),
        FlatRecord::folder("f/child"),
        FlatRecord::folder("f/child/grandchild"),
    ]);
    let f = forest.find_by_path("f").unwrap().id.clone();
    let child = forest.find_by_path("f/child").unwrap().id.clone();
    let grandchild = forest.find_by_path("f/child/grandchild").unwrap().id.clone();

    for dest in [&f, &child, &grandchild] {
        let next = forest.move_node_to_folder(&f, Some(dest), None).unwrap();
        assert!(next.ptr_eq(&forest));
    }
}

#[test]
fn failed_operations_do_not_partially_apply() {
    let forest = hydrate_by_path(&[FlatRecord::file("App.jsx", ""), FlatRecord::file("b.js", "")]);
    let b = forest.find_by_path("b.js").unwrap().id.clone();

    let err = forest.rename_node(&b, "app.JSX").unwrap_err();
    assert!(matches!(err, TreeError::Validation(_)));
    let err = forest.create_file(None, "bad/name", "").unwrap_err();
    assert!(matches!(err, TreeError::Validation(_)));

    assert_eq!(shape(&forest), shape(&hydrate_by_path(&flatten(&forest))));
    assert!(forest.find_by_path("b.js").is_some());
}

#[test]
fn delete_does_not_touch_textual_prefix_siblings() {
    let forest = hydrate_by_path(&[
        FlatRecord::folder("src"),
        FlatRecord::file("src/a.js", ""),
        FlatRecord::folder("src2"),
        FlatRecord::file("src2/b.js", ""),
    ]);
    let src = forest.find_by_path("src").unwrap().id.clone();
    let forest = forest.delete_node(&src).unwrap();

    let paths: Vec<&str> = forest.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["src2", "src2/b.js"]);
}
