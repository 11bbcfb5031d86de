use std::sync::Arc;
use std::time::Duration;
use studiotree::flat::hydrate_by_parent;
use studiotree::reconcile::ReconcileStrategy;
use studiotree::session::{Autosave, StoreSink, WorkspaceSession};

use crate::integration::support::{shape, temp_api};

#[tokio::test]
async fn burst_of_edits_is_saved_once() {
    let api = temp_api();
    let project = api.create_project("p", None).unwrap().project.id;
    let forest = api.load_forest(&project).unwrap();

    let mut session = WorkspaceSession::new(forest.clone());
    let sink = Arc::new(StoreSink::new(api.clone(), project.clone(), ReconcileStrategy::Sync));
    session.attach_autosave(Autosave::spawn(sink, Duration::from_millis(50), forest));

    let src = session.forest().find_by_path("src").unwrap().id.clone();
    session.create_file(Some(&src), "a.js", "a").unwrap();
    session.create_file(Some(&src), "b.js", "b").unwrap();
    session.rename(&src, "app").unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(session.autosave_stats().unwrap().pushes, 1);

    let expected = shape(session.forest());
    session.close().await.unwrap();
    let stored = hydrate_by_parent(&api.get_project(&project).unwrap().files);
    assert_eq!(shape(&stored), expected);
}

#[tokio::test]
async fn close_flushes_pending_edit() {
    let api = temp_api();
    let project = api.create_project("p", None).unwrap().project.id;
    let forest = api.load_forest(&project).unwrap();

    let mut session = WorkspaceSession::new(forest.clone());
    let sink = Arc::new(StoreSink::new(api.clone(), project.clone(), ReconcileStrategy::Replace));
    session.attach_autosave(Autosave::spawn(sink, Duration::from_secs(60), forest));
    session.update_content_by_path("src/App.jsx", "changed").unwrap();
    session.close().await.unwrap();

    let files = api.get_project(&project).unwrap().files;
    let app = files.iter().find(|e| e.path == "src/App.jsx").unwrap();
    assert_eq!(app.content, "changed");
}

#[tokio::test]
async fn undo_after_save_is_saved_again() {
    let api = temp_api();
    let project = api.create_project("p", None).unwrap().project.id;
    let forest = api.load_forest(&project).unwrap();
    let original = shape(&forest);

    let mut session = WorkspaceSession::new(forest.clone());
    let sink = Arc::new(StoreSink::new(api.clone(), project.clone(), ReconcileStrategy::Sync));
    session.attach_autosave(Autosave::spawn(sink, Duration::from_secs(60), forest));

    let css = session.forest().find_by_path("src/index.css").unwrap().id.clone();
    session.delete(&css).unwrap();
    session.flush().await.unwrap();
    assert_eq!(api.get_project(&project).unwrap().files.len(), 4);
    assert!(!session.is_dirty());

    assert!(session.undo());
    session.close().await.unwrap();
    let stored = hydrate_by_parent(&api.get_project(&project).unwrap().files);
    assert_eq!(shape(&stored), original);
}
