use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::FsActor;
use super::debouncer::Debouncer;
use super::types::{ChangeEvent, ChangeKind, is_temp_file};
use crate::actor::messages::WatchMsg;

const QUIET: Duration = Duration::from_millis(300);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn change(path: &str, kind: ChangeKind, at: Instant) -> ChangeEvent {
    ChangeEvent {
        path: PathBuf::from(path),
        kind,
        at,
    }
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

// =============================================================================
// Event conversion
// =============================================================================

#[test]
fn test_temp_files_ignored() {
    assert!(is_temp_file(Path::new("/p/src/.doc.tex.swp")));
    assert!(is_temp_file(Path::new("/p/src/doc.tex~")));
    assert!(is_temp_file(Path::new("/p/src/doc.bak")));
    assert!(is_temp_file(Path::new("/p/src/4913.tmp")));
    assert!(!is_temp_file(Path::new("/p/src/doc.tex")));
    assert!(!is_temp_file(Path::new("/p/src/figures/plot.pdf")));
    assert!(is_temp_file(Path::new("/p/src/.#doc.tex")));
    assert!(is_temp_file(Path::new("/p/src/#doc.tex#")));
    assert!(is_temp_file(Path::new("/p/src/4913")));
    assert!(is_temp_file(Path::new("/p/src/.goutputstream-X1Y2Z3")));
}

#[test]
fn test_dotfile_sources_are_changes() {
    assert!(!is_temp_file(Path::new("/p/src/.latexmkrc")));
    assert!(!is_temp_file(Path::new("/p/src/chapters/.hidden.tex")));

    let event = make_event(
        vec!["/p/src/.latexmkrc"],
        notify::EventKind::Modify(notify::event::ModifyKind::Data(
            notify::event::DataChange::Content,
        )),
    );
    let changes = ChangeEvent::from_notify(&event, Instant::now());

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Modified);
    assert!(changes[0].path.ends_with(".latexmkrc"));
}

#[test]
fn test_metadata_only_change_ignored() {
    let event = make_event(
        vec!["/p/src/doc.tex"],
        notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
            notify::event::MetadataKind::WriteTime,
        )),
    );
    assert!(ChangeEvent::from_notify(&event, Instant::now()).is_empty());

    let access = make_event(
        vec!["/p/src/doc.tex"],
        notify::EventKind::Access(notify::event::AccessKind::Any),
    );
    assert!(ChangeEvent::from_notify(&access, Instant::now()).is_empty());
}

#[test]
fn test_event_kinds_mapped() {
    let now = Instant::now();
    let create = make_event(
        vec!["/p/src/a.tex", "/p/src/.a.tex.swp"],
        notify::EventKind::Create(notify::event::CreateKind::File),
    );
    let changes = ChangeEvent::from_notify(&create, now);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Created);
    assert_eq!(changes[0].path, PathBuf::from("/p/src/a.tex"));

    let modify = ChangeEvent::from_notify(&make_event(vec!["/p/src/b.tex"], modify_kind()), now);
    assert_eq!(modify[0].kind, ChangeKind::Modified);

    let remove = make_event(
        vec!["/p/src/c.tex"],
        notify::EventKind::Remove(notify::event::RemoveKind::File),
    );
    assert_eq!(ChangeEvent::from_notify(&remove, now)[0].kind, ChangeKind::Removed);
}

// =============================================================================
// Debouncer timing
// =============================================================================

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let now = Instant::now();
    assert!(!debouncer.is_ready_at(now));
    assert!(debouncer.take_trigger(now + ms(1000)).is_none());
    assert!(debouncer.sleep_duration_at(now) > Duration::from_secs(3600));
}

#[test]
fn test_two_edits_50ms_apart_one_trigger() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    debouncer.add(change("/p/src/doc.tex", ChangeKind::Modified, t0));
    debouncer.add(change("/p/src/doc.tex", ChangeKind::Modified, t0 + ms(50)));

    // The second edit restarted the window.
    assert!(debouncer.take_trigger(t0 + ms(300)).is_none());
    assert_eq!(debouncer.sleep_duration_at(t0 + ms(300)), ms(50));

    let (trigger, changes) = debouncer.take_trigger(t0 + ms(350)).unwrap();
    assert_eq!(trigger.seq(), 1);
    assert_eq!(changes, vec![(PathBuf::from("/p/src/doc.tex"), ChangeKind::Modified)]);

    assert!(debouncer.take_trigger(t0 + ms(2000)).is_none());
}

#[test]
fn test_burst_across_files_one_trigger() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    for (i, file) in ["a.tex", "b.tex", "c.bib"].iter().enumerate() {
        let at = t0 + ms(100 * i as u64);
        debouncer.add(change(&format!("/p/src/{file}"), ChangeKind::Modified, at));
    }

    assert!(debouncer.take_trigger(t0 + ms(450)).is_none());
    let (_, changes) = debouncer.take_trigger(t0 + ms(500)).unwrap();
    assert_eq!(changes.len(), 3);
}

#[test]
fn test_sequence_numbers_increase() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    debouncer.add(change("/p/src/a.tex", ChangeKind::Modified, t0));
    let (first, _) = debouncer.take_trigger(t0 + QUIET).unwrap();

    debouncer.add(change("/p/src/a.tex", ChangeKind::Modified, t0 + ms(1000)));
    let (second, _) = debouncer.take_trigger(t0 + ms(1000) + QUIET).unwrap();

    assert_eq!(first.seq(), 1);
    assert_eq!(second.seq(), 2);
    assert!(second.supersedes(first));
}

#[test]
fn test_out_of_order_instants_keep_latest() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    debouncer.add(change("/p/src/a.tex", ChangeKind::Modified, t0 + ms(100)));
    debouncer.add(change("/p/src/b.tex", ChangeKind::Modified, t0));

    assert!(!debouncer.is_ready_at(t0 + ms(350)));
    assert!(debouncer.is_ready_at(t0 + ms(400)));
}

// =============================================================================
// Debouncer dedup transitions
// =============================================================================

#[test]
fn test_removed_then_created_is_restore() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    // Editors that save by delete + rename.
    debouncer.add(change("/p/src/doc.tex", ChangeKind::Removed, t0));
    debouncer.add(change("/p/src/doc.tex", ChangeKind::Created, t0 + ms(1)));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/p/src/doc.tex")],
        ChangeKind::Created
    );
}

#[test]
fn test_modified_then_removed_is_removed() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    debouncer.add(change("/p/src/doc.tex", ChangeKind::Modified, t0));
    debouncer.add(change("/p/src/doc.tex", ChangeKind::Removed, t0 + ms(1)));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/p/src/doc.tex")],
        ChangeKind::Removed
    );
}

#[test]
fn test_created_then_modified_first_wins() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    debouncer.add(change("/p/src/new.tex", ChangeKind::Created, t0));
    debouncer.add(change("/p/src/new.tex", ChangeKind::Modified, t0 + ms(10)));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/p/src/new.tex")],
        ChangeKind::Created
    );
    // Still restarts the window.
    assert_eq!(debouncer.last_event, Some(t0 + ms(10)));
}

#[test]
fn test_created_then_removed_emits_nothing() {
    let mut debouncer = Debouncer::new(QUIET, 1);
    let t0 = Instant::now();

    debouncer.add(change("/p/src/scratch.aux", ChangeKind::Created, t0));
    debouncer.add(change("/p/src/scratch.aux", ChangeKind::Removed, t0 + ms(5)));

    assert!(debouncer.take_trigger(t0 + ms(1000)).is_none());
    // Window is closed again.
    assert!(debouncer.last_event.is_none());

    // The netted-out burst did not consume a sequence number.
    debouncer.add(change("/p/src/doc.tex", ChangeKind::Modified, t0 + ms(2000)));
    let (trigger, _) = debouncer.take_trigger(t0 + ms(2000) + QUIET).unwrap();
    assert_eq!(trigger.seq(), 1);
}

// =============================================================================
// Actor
// =============================================================================

async fn recv(rx: &mut mpsc::Receiver<WatchMsg>, within: Duration) -> Option<WatchMsg> {
    tokio::time::timeout(within, rx.recv()).await.ok().flatten()
}

#[test]
fn test_missing_root_fails_at_start() {
    let dir = TempDir::new().unwrap();
    let (tx, _rx) = mpsc::channel(8);
    assert!(FsActor::new(dir.path().join("src"), QUIET, tx).is_err());
}

#[tokio::test]
async fn test_actor_emits_trigger_for_new_subdirectory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("src");
    std::fs::create_dir(&root).unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let actor = FsActor::new(root.clone(), ms(50), tx).unwrap();
    tokio::spawn(actor.run());

    std::fs::create_dir(root.join("chapters")).unwrap();
    tokio::time::sleep(ms(200)).await;
    while recv(&mut rx, ms(200)).await.is_some() {}

    std::fs::write(root.join("chapters/intro.tex"), "hello").unwrap();
    match recv(&mut rx, Duration::from_secs(5)).await {
        Some(WatchMsg::Trigger(trigger)) => assert!(trigger.seq() >= 1),
        other => panic!("expected trigger, got {other:?}"),
    }
}

#[tokio::test]
async fn test_actor_coalesces_quick_edits() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("src");
    std::fs::create_dir(&root).unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let actor = FsActor::new(root.clone(), QUIET, tx).unwrap();
    tokio::spawn(actor.run());

    std::fs::write(root.join("doc.tex"), "one").unwrap();
    tokio::time::sleep(ms(50)).await;
    std::fs::write(root.join("doc.tex"), "two").unwrap();

    assert!(matches!(
        recv(&mut rx, Duration::from_secs(5)).await,
        Some(WatchMsg::Trigger(_))
    ));
    assert!(recv(&mut rx, Duration::from_secs(1)).await.is_none());
}

#[tokio::test]
async fn test_actor_ignores_editor_swap_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("src");
    std::fs::create_dir(&root).unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let actor = FsActor::new(root.clone(), ms(50), tx).unwrap();
    tokio::spawn(actor.run());

    std::fs::write(root.join(".doc.tex.swp"), "swap").unwrap();
    std::fs::write(root.join("doc.tex~"), "backup").unwrap();

    assert!(recv(&mut rx, ms(800)).await.is_none());
}

#[tokio::test]
async fn test_actor_fatal_when_root_removed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("src");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("doc.tex"), "x").unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let actor = FsActor::new(root.clone(), ms(50), tx).unwrap();
    tokio::spawn(actor.run());

    std::fs::remove_dir_all(&root).unwrap();

    match recv(&mut rx, Duration::from_secs(5)).await {
        Some(WatchMsg::Fatal(err)) => assert!(err.reason.contains("removed")),
        other => panic!("expected fatal, got {other:?}"),
    }
}
