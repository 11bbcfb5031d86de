use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use studiotree::flat::{flatten, hydrate_by_path, FlatRecord};
use studiotree::history::HistoryStack;
use studiotree::tree::Forest;

/// `folders` folders under `src/`, each holding `files` files
fn project(folders: usize, files: usize) -> Vec<FlatRecord> {
    let mut records = vec![FlatRecord::folder("src")];
    for d in 0..folders {
        records.push(FlatRecord::folder(&format!("src/mod{}", d)));
        for f in 0..files {
            records.push(FlatRecord::file(&format!("src/mod{}/file{}.js", d, f), "export {};"));
        }
    }
    records
}

fn bench_forest(c: &mut Criterion) {
    let sizes = [(10usize, 10usize), (50, 40)];
    let mut group = c.benchmark_group("forest");
    group.sample_size(30);

    for &(folders, files) in &sizes {
        let records = project(folders, files);
        let n = records.len();
        let label = n.to_string();
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("hydrate_by_path", &label), &records, |b, records| {
            b.iter(|| black_box(hydrate_by_path(records)));
        });

        let forest = hydrate_by_path(&records);
        group.bench_with_input(BenchmarkId::new("flatten", &label), &forest, |b, forest| {
            b.iter(|| black_box(flatten(forest)));
        });

        // Renaming the top folder rewrites every path
        let src = forest.find_by_path("src").map(|e| e.id.clone());
        group.bench_with_input(BenchmarkId::new("rename_root_cascade", &label), &forest, |b, forest| {
            let Some(src) = &src else { return };
            b.iter(|| black_box(forest.rename_node(src, "lib")));
        });

        let leaf = forest.find_by_path("src/mod0/file0.js").map(|e| e.id.clone());
        group.bench_with_input(BenchmarkId::new("update_content", &label), &forest, |b, forest| {
            let Some(leaf) = &leaf else { return };
            b.iter(|| black_box(forest.update_content(leaf, "changed")));
        });

        group.bench_with_input(BenchmarkId::new("history_50_edits", &label), &forest, |b, forest| {
            let Some(leaf) = &leaf else { return };
            b.iter(|| {
                let mut history: HistoryStack<Forest> = HistoryStack::new();
                let mut current = forest.clone();
                for i in 0..50 {
                    if let Ok(next) = current.update_content(leaf, &i.to_string()) {
                        history.record(std::mem::replace(&mut current, next));
                    }
                }
                black_box(history.undo_depth())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_forest);
criterion_main!(benches);
