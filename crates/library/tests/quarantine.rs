mod common;

use common::{Project, record};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use unref_assetdb::{DatabaseHandle, MockDatabase};
use unref_library::quarantine::{Delete, Move, Restore};
use unref_library::{QuarantineManager, UsageVerdict};

fn unused(root: &Path, relative: &str, id: &str) -> UsageVerdict {
    UsageVerdict::new(record(root, relative, id), vec![], false)
}

fn used(root: &Path, relative: &str, id: &str) -> UsageVerdict {
    UsageVerdict::new(record(root, relative, id), vec![root.join("scenes/main.scene")], false)
}

fn manager() -> (Arc<MockDatabase>, QuarantineManager) {
    let db = Arc::new(MockDatabase::default());
    let manager = QuarantineManager::new(db.clone() as DatabaseHandle);
    (db, manager)
}

fn read(path: impl AsRef<Path>) -> Vec<u8> {
    fs::read(path).unwrap()
}

#[tokio::test]
async fn test_move_then_restore_round_trips() {
    let project = Project::new();
    let root = project.root();
    project.asset("ui/old/button.png", "button-bytes", "id-button");
    project.asset("ui/icon.png", "icon-bytes", "id-icon");
    project.asset("audio/theme.ogg", "theme-bytes", "id-theme");
    project.asset("scenes/main.scene", "[\"id-icon\"]", "id-scene");
    let originals: Vec<_> = ["ui/old/button.png", "audio/theme.ogg"]
        .iter()
        .flat_map(|r| [root.join(r), root.join(format!("{r}.meta"))])
        .map(|p| (p.clone(), read(&p)))
        .collect();

    let verdicts = vec![
        unused(&root, "ui/old/button.png", "id-button"),
        used(&root, "ui/icon.png", "id-icon"),
        unused(&root, "audio/theme.ogg", "id-theme"),
    ];
    let (db, manager) = manager();
    let quarantine = project.base().join("assets_temp_unused");

    let Move::Moved { moved, failures, replaced_existing, pruned_dirs, .. } =
        manager.move_unused(&verdicts, &root).await.unwrap()
    else {
        panic!("expected assets to move");
    };
    assert!(failures.is_empty());
    assert!(!replaced_existing);
    assert_eq!(moved.len(), 2);
    // ui/old and audio were emptied.
    assert_eq!(pruned_dirs, 2);
    assert!(!root.join("ui/old").exists());
    assert!(!root.join("audio").exists());
    assert!(root.join("ui/icon.png").exists());
    assert_eq!(read(quarantine.join("ui/old/button.png")), b"button-bytes");
    assert!(quarantine.join("ui/old/button.png.meta").exists());
    assert!(quarantine.join("audio/theme.ogg.meta").exists());

    let Restore::Restored { restored, failures } = manager.restore(&root).await.unwrap() else {
        panic!("expected a restore");
    };
    assert!(failures.is_empty());
    assert_eq!(restored.len(), 2);
    for (path, bytes) in originals {
        assert_eq!(read(&path), bytes, "{} differs after restore", path.display());
    }
    assert!(!quarantine.exists());
    assert_eq!(db.refresh_count(), 2);
}

#[tokio::test]
async fn test_second_move_replaces_quarantine() {
    let project = Project::new();
    let root = project.root();
    project.asset("a.png", "a", "id-a");
    project.asset("b.png", "b", "id-b");
    let (_db, manager) = manager();
    let quarantine = manager.quarantine_dir(&root).unwrap();

    manager.move_unused(&[unused(&root, "a.png", "id-a")], &root).await.unwrap();
    assert!(quarantine.join("a.png").exists());

    let second = manager.move_unused(&[unused(&root, "b.png", "id-b")], &root).await.unwrap();
    assert!(matches!(second, Move::Moved { replaced_existing: true, .. }));
    assert!(quarantine.join("b.png").exists());
    assert!(!quarantine.join("a.png").exists());
    assert!(!quarantine.join("a.png.meta").exists());
}

#[tokio::test]
async fn test_nothing_unused_leaves_quarantine_alone() {
    let project = Project::new();
    let root = project.root();
    project.asset("a.png", "a", "id-a");
    let (db, manager) = manager();
    let quarantine = manager.quarantine_dir(&root).unwrap();
    fs::create_dir_all(&quarantine).unwrap();
    fs::write(quarantine.join("kept.png"), "kept").unwrap();

    let outcome = manager.move_unused(&[used(&root, "a.png", "id-a")], &root).await.unwrap();
    assert_eq!(outcome, Move::NothingToMove);
    assert!(quarantine.join("kept.png").exists());
    assert_eq!(db.refresh_count(), 0);
}

#[tokio::test]
async fn test_per_file_failures_do_not_stop_the_move() {
    let project = Project::new();
    let root = project.root();
    project.asset("real.png", "real", "id-real");
    let (_db, manager) = manager();

    let verdicts = [unused(&root, "ghost.png", "id-ghost"), unused(&root, "real.png", "id-real")];
    let Move::Moved { moved, failures, .. } = manager.move_unused(&verdicts, &root).await.unwrap() else {
        panic!("expected assets to move");
    };
    assert_eq!(moved, vec![Path::new("real.png").to_path_buf()]);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, root.join("ghost.png"));
}

#[tokio::test]
async fn test_refresh_failure_is_not_fatal() {
    let project = Project::new();
    let root = project.root();
    project.asset("a.png", "a", "id-a");
    let (db, manager) = manager();
    db.fail_refresh(true);

    assert!(manager.move_unused(&[unused(&root, "a.png", "id-a")], &root).await.is_ok());
    assert!(manager.restore(&root).await.is_ok());
    assert_eq!(db.refresh_count(), 2);
}

#[tokio::test]
async fn test_absent_quarantine_is_a_no_op() {
    let project = Project::new();
    let root = project.root();
    let (db, manager) = manager();
    let mut asked = false;

    assert_eq!(manager.restore(&root).await.unwrap(), Restore::NothingToRestore);
    let outcome = manager.delete(&root, |_| {
        asked = true;
        true
    });
    assert_eq!(outcome.await.unwrap(), Delete::NothingToDelete);
    assert!(!asked);
    assert_eq!(db.refresh_count(), 0);
}

#[tokio::test]
async fn test_delete_needs_confirmation() {
    let project = Project::new();
    let root = project.root();
    project.asset("a.png", "a", "id-a");
    let (db, manager) = manager();
    manager.move_unused(&[unused(&root, "a.png", "id-a")], &root).await.unwrap();
    let quarantine = manager.quarantine_dir(&root).unwrap();

    assert_eq!(manager.delete(&root, |_| false).await.unwrap(), Delete::Cancelled);
    assert!(quarantine.exists());

    let outcome = manager.delete(&root, |path| path == quarantine).await.unwrap();
    assert_eq!(outcome, Delete::Deleted { quarantine: quarantine.clone(), files: 1 });
    assert!(!quarantine.exists());
    // move + delete; the cancelled attempt doesn't refresh.
    assert_eq!(db.refresh_count(), 2);
}
