use proptest::prelude::*;
use studiotree::flat::{flatten, hydrate_by_path};
use studiotree::tree::{Direction, Forest};

use crate::integration::support::{assert_consistent, shape};

#[derive(Debug, Clone)]
enum Op {
    CreateFile { parent: usize, name: String },
    CreateFolder { parent: usize, name: String },
    Rename { target: usize, name: String },
    Move { target: usize, dest: usize, index: usize },
    Sibling { target: usize, up: bool },
    Outdent { target: usize },
    Delete { target: usize },
    Duplicate { target: usize },
}

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "A", "b.txt", "B.TXT", "src", "Src", "lib", "x.js"])
        .prop_map(str::to_string)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), name()).prop_map(|(parent, name)| Op::CreateFile { parent, name }),
        (any::<usize>(), name()).prop_map(|(parent, name)| Op::CreateFolder { parent, name }),
        (any::<usize>(), name()).prop_map(|(target, name)| Op::Rename { target, name }),
        (any::<usize>(), any::<usize>(), 0usize..4)
            .prop_map(|(target, dest, index)| Op::Move { target, dest, index }),
        (any::<usize>(), any::<bool>()).prop_map(|(target, up)| Op::Sibling { target, up }),
        any::<usize>().prop_map(|target| Op::Outdent { target }),
        any::<usize>().prop_map(|target| Op::Delete { target }),
        any::<usize>().prop_map(|target| Op::Duplicate { target }),
    ]
}

/// Apply `op`, keeping the previous forest when the op is rejected
fn apply(forest: Forest, op: &Op) -> Forest {
    let ids: Vec<_> = forest.iter().map(|e| e.id.clone()).collect();
    let folders: Vec<_> = forest
        .iter()
        .filter(|e| e.is_folder())
        .map(|e| e.id.clone())
        .collect();
    // Index 0 of a folder pick means the root
    let folder_at = |i: usize| -> Option<_> {
        match i % (folders.len() + 1) {
            0 => None,
            n => Some(folders[n - 1].clone()),
        }
    };

    let result = match op {
        Op::CreateFile { parent, name } => forest
            .create_file(folder_at(*parent).as_ref(), name, "c")
            .map(|(f, _)| f),
        Op::CreateFolder { parent, name } => {
            forest.create_folder(folder_at(*parent).as_ref(), name).map(|(f, _)| f)
        }
        _ if ids.is_empty() => return forest,
        Op::Rename { target, name } => forest.rename_node(&ids[target % ids.len()], name),
        Op::Move { target, dest, index } => {
            forest.move_node_to_folder(&ids[target % ids.len()], folder_at(*dest).as_ref(), Some(*index))
        }
        Op::Sibling { target, up } => {
            let direction = if *up { Direction::Up } else { Direction::Down };
            forest.move_node_within_siblings(&ids[target % ids.len()], direction)
        }
        Op::Outdent { target } => forest.move_node_to_parent_folder(&ids[target % ids.len()]),
        Op::Delete { target } => forest.delete_node(&ids[target % ids.len()]),
        Op::Duplicate { target } => forest.duplicate_node(&ids[target % ids.len()]).map(|(f, _)| f),
    };
    result.unwrap_or(forest)
}

proptest! {
    #[test]
    fn random_edits_keep_paths_and_sibling_names_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let mut forest = Forest::new();
        for op in &ops {
            forest = apply(forest, op);
            assert_consistent(&forest);
        }
    }

    #[test]
    fn flatten_then_hydrate_preserves_shape(ops in prop::collection::vec(op(), 1..40)) {
        let forest = ops.iter().fold(Forest::new(), apply);
        let rebuilt = hydrate_by_path(&flatten(&forest));
        prop_assert_eq!(shape(&rebuilt), shape(&forest));
        prop_assert_eq!(rebuilt.len(), forest.len());
    }

    #[test]
    fn rename_cascade_moves_whole_subtree(ops in prop::collection::vec(op(), 1..30), pick in any::<usize>()) {
        let forest = ops.iter().fold(Forest::new(), apply);
        let folders: Vec<_> = forest.iter().filter(|e| e.is_folder()).cloned().collect();
        prop_assume!(!folders.is_empty());
        let folder = &folders[pick % folders.len()];
        let old_prefix = format!("{}/", folder.path);
        let below = forest.iter().filter(|e| e.path.starts_with(&old_prefix)).count();

        let renamed = forest.rename_node(&folder.id, "renamed_zz").unwrap();
        let new_path = renamed.get(&folder.id).unwrap().path.clone();
        let new_prefix = format!("{}/", new_path);

        prop_assert!(renamed.iter().all(|e| !e.path.starts_with(&old_prefix)));
        prop_assert_eq!(renamed.iter().filter(|e| e.path.starts_with(&new_prefix)).count(), below);
    }
}
