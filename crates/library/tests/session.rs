mod common;

use common::{Project, unindexed, verdict};
use std::fs;
use std::sync::Arc;
use unref_assetdb::{AssetInfo, DatabaseHandle, MockDatabase};
use unref_library::error::ErrorKind;
use unref_library::quarantine::{Move, Restore};
use unref_library::{Options, Session, Strategy, UuidMap};

fn fixture() -> Project {
    let project = Project::new();
    project.asset("scenes/main.scene", r#"[{"__uuid__":"id-icon"}]"#, "id-scene");
    project.asset("ui/icon.png", "icon", "id-icon");
    project.asset("ui/unused/old.png", "old", "id-old");
    project.file("ui/untracked.png", "no sidecar");
    project
}

#[tokio::test]
async fn test_operations_need_their_preconditions() {
    let session = Session::new(unindexed(), Options::default());

    let err = session.scan(None, |_, _, _| {}).await.unwrap_err();
    assert_eq!(*err, ErrorKind::NoFolderSelected);
    assert_eq!(*session.restore().await.unwrap_err(), ErrorKind::NoFolderSelected);
    assert_eq!(*session.delete(|_| true).await.unwrap_err(), ErrorKind::NoFolderSelected);
    let err = session.move_unused().await.unwrap_err();
    assert_eq!(*err, ErrorKind::NoScanResult);
    assert!(err.is_precondition());
}

#[tokio::test]
async fn test_scan_root_must_be_a_directory() {
    let project = fixture();
    let session = Session::new(unindexed(), Options::default());

    session.select(project.root().join("missing")).await;
    let err = session.scan(None, |_, _, _| {}).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::ScanRoot(_)));
    assert!(!err.is_precondition());

    session.select(project.root().join("ui/icon.png")).await;
    let err = session.scan(None, |_, _, _| {}).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::ScanRoot(_)));
}

#[tokio::test]
async fn test_concurrent_operations_are_refused() {
    let project = fixture();
    let session = Session::new(unindexed(), Options::default());
    session.select(project.root()).await;

    let (scanned, restored) = tokio::join!(session.scan(None, |_, _, _| {}), session.restore());
    assert!(scanned.is_ok());
    assert_eq!(*restored.unwrap_err(), ErrorKind::Busy);

    // The permit is released afterwards.
    assert_eq!(session.restore().await.unwrap(), Restore::NothingToRestore);
}

#[tokio::test]
async fn test_scan_move_restore() {
    let project = fixture();
    let root = project.root();
    let session = Session::new(unindexed(), Options::default());
    session.select(&root).await;

    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert_eq!(result.summary.total, 3);
    assert_eq!(result.summary.used, 1);
    assert_eq!(result.summary.unused, 2);
    assert_eq!(result.summary.excluded, 1);
    assert_eq!(result.summary.strategy, Strategy::FileSearch);
    assert_eq!(result.excluded[0].path, root.join("ui/untracked.png"));
    let mut unused: Vec<_> = result.unused().map(|v| v.id()).collect();
    unused.sort_unstable();
    assert_eq!(unused, vec!["id-old", "id-scene"]);
    assert!(session.scan_result().await.is_some());

    let Move::Moved { moved, .. } = session.move_unused().await.unwrap() else {
        panic!("expected assets to move");
    };
    assert_eq!(moved.len(), 2);
    assert!(!root.join("ui/unused").exists());
    assert!(session.quarantine_dir().await.unwrap().join("ui/unused/old.png").exists());

    session.restore().await.unwrap();
    assert_eq!(fs::read_to_string(root.join("ui/unused/old.png")).unwrap(), "old");
}

#[tokio::test]
async fn test_reset_forgets_result_and_strategy() {
    let project = fixture();
    let db = Arc::new(MockDatabase::default());
    let session = Session::new(db.clone() as DatabaseHandle, Options::default());
    session.select(project.root()).await;

    session.scan(None, |_, _, _| {}).await.unwrap();
    assert_eq!(session.strategy(), Strategy::FileSearch);
    assert!(session.cache_stats().await.entries > 0);

    session.clear_cache().await;
    assert_eq!(session.cache_stats().await.entries, 0);
    assert!(session.scan_result().await.is_some());

    session.reset().await.unwrap();
    assert_eq!(session.strategy(), Strategy::Indexed);
    assert!(session.scan_result().await.is_none());
}

#[tokio::test]
async fn test_selecting_another_folder_drops_result() {
    let project = fixture();
    let session = Session::new(unindexed(), Options::default());
    session.select(project.root()).await;
    session.scan(None, |_, _, _| {}).await.unwrap();

    session.select(project.root()).await;
    assert!(session.scan_result().await.is_some());
    session.select(project.root().join("ui")).await;
    assert!(session.scan_result().await.is_none());
}

#[tokio::test]
async fn test_search_root_comes_from_options() {
    let project = fixture();
    let options = Options { search_root: Some(project.root().join("ui")), ..Default::default() };
    let session = Session::new(unindexed(), options);
    session.select(project.root()).await;

    // The only reference lives in scenes/, outside the search root.
    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert_eq!(result.summary.used, 0);
    let result = session.scan(Some(&project.root()), |_, _, _| {}).await.unwrap();
    assert_eq!(result.summary.used, 1);
}

#[tokio::test]
async fn test_replace_rewrites_and_refreshes() {
    let project = fixture();
    project.file("prefabs/hud.prefab", r#"{"a":"id-icon","b":"id-icon"}"#);
    project.file("anims/spin.anim", r#"["id-other"]"#);
    let db = Arc::new(MockDatabase::default());
    let session = Session::new(db.clone() as DatabaseHandle, Options::default());
    session.select(project.root()).await;

    let map = UuidMap::new([("id-icon", "id-new-icon")]);
    let report = session.replace(&map).await.unwrap();
    assert_eq!(report.processed, 3);
    assert_eq!(report.modified, 2);
    assert_eq!(report.replacements, 3);
    assert!(report.failures.is_empty());
    assert_eq!(
        fs::read_to_string(project.root().join("prefabs/hud.prefab")).unwrap(),
        r#"{"a":"id-new-icon","b":"id-new-icon"}"#
    );
    assert_eq!(db.refresh_count(), 1);

    // Nothing left to change: no rewrite, no refresh.
    let report = session.replace(&map).await.unwrap();
    assert_eq!(report.modified, 0);
    assert_eq!(db.refresh_count(), 1);
}

#[tokio::test]
async fn test_rescan_after_replace_reads_new_content() {
    let project = fixture();
    project.asset("ui/new.png", "new", "id-new");
    let session = Session::new(unindexed(), Options::default());
    session.select(project.root()).await;

    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert!(verdict(&result.verdicts, "id-icon").is_used());
    assert!(!verdict(&result.verdicts, "id-new").is_used());

    session.replace(&UuidMap::new([("id-icon", "id-new")])).await.unwrap();
    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert!(!verdict(&result.verdicts, "id-icon").is_used());
    assert_eq!(verdict(&result.verdicts, "id-new").references(), [project.root().join("scenes/main.scene")]);
}

#[tokio::test]
async fn test_rescan_after_move_forgets_moved_referrers() {
    let project = Project::new();
    project.asset("prefabs/orphan.prefab", r#"{"texture":"id-tex"}"#, "id-orphan");
    project.asset("ui/tex.png", "tex", "id-tex");
    let session = Session::new(unindexed(), Options::default());
    session.select(project.root()).await;

    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert!(verdict(&result.verdicts, "id-tex").is_used());
    assert!(!verdict(&result.verdicts, "id-orphan").is_used());

    let Move::Moved { moved, .. } = session.move_unused().await.unwrap() else {
        panic!("expected the orphan to move");
    };
    assert_eq!(moved, vec![std::path::PathBuf::from("prefabs/orphan.prefab")]);

    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    let tex = verdict(&result.verdicts, "id-tex");
    assert!(tex.references().is_empty());
    assert!(!tex.is_used());
    assert_eq!(result.summary.total, 1);
}

#[tokio::test]
async fn test_rescan_drops_skip_records() {
    let project = fixture();
    let root = project.root();
    let scene = AssetInfo::new(root.join("scenes/main.scene"), Some("id-scene".to_owned()));
    let db = Arc::new(MockDatabase::default());
    db.set_assets(vec![scene.clone(), AssetInfo::new(root.join("ghost.prefab"), None)]).await;
    let session = Session::new(db.clone() as DatabaseHandle, Options::default());
    session.select(&root).await;

    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert_eq!(result.summary.strategy, Strategy::Indexed);
    assert_eq!(result.summary.skipped, 1);

    db.set_assets(vec![scene]).await;
    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert!(result.skipped.is_empty());
    assert_eq!(result.summary.skipped, 0);
    // The listing was asked for again.
    assert_eq!(db.query_count(), 2);
}

#[tokio::test]
async fn test_rescan_keeps_downgrade() {
    let project = fixture();
    let root = project.root();
    let db = Arc::new(MockDatabase::default());
    let session = Session::new(db.clone() as DatabaseHandle, Options::default());
    session.select(&root).await;

    session.scan(None, |_, _, _| {}).await.unwrap();
    assert_eq!(session.strategy(), Strategy::FileSearch);
    assert_eq!(db.query_count(), 1);

    db.set_assets(vec![AssetInfo::new(root.join("scenes/main.scene"), None)]).await;
    let result = session.scan(None, |_, _, _| {}).await.unwrap();
    assert_eq!(result.summary.strategy, Strategy::FileSearch);
    assert_eq!(result.summary.used, 1);
    assert_eq!(db.query_count(), 1);
}

#[tokio::test]
async fn test_fresh_session_restores_without_scanning() {
    let project = fixture();
    let root = project.root();
    let first = Session::new(unindexed(), Options::default());
    first.select(&root).await;
    first.scan(None, |_, _, _| {}).await.unwrap();
    first.move_unused().await.unwrap();
    assert!(!root.join("ui/unused/old.png").exists());

    let second = Session::new(unindexed(), Options::default());
    second.select(&root).await;
    assert!(second.scan_result().await.is_none());
    second.restore().await.unwrap();
    assert_eq!(fs::read_to_string(root.join("ui/unused/old.png")).unwrap(), "old");
}
