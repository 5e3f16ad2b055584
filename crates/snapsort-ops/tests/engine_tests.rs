use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use snapsort_core::NamingScheme;
use snapsort_ops::{
    ConflictEvent, ConflictResolver, EngineError, FixedResolver, Verdict, reorder,
};

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, name.as_bytes()).unwrap();
    path
}

fn read(path: &Path) -> String {
    String::from_utf8(fs::read(path).unwrap()).unwrap()
}

/// Counts resolver round-trips; used where none are expected.
struct CountingResolver(AtomicUsize);

impl ConflictResolver for CountingResolver {
    fn resolve(&self, _event: ConflictEvent) -> impl Future<Output = Verdict> + Send {
        async move {
            self.0.fetch_add(1, Ordering::SeqCst);
            Verdict::Retry
        }
    }
}

#[tokio::test]
async fn test_reorder_numbers_entries_in_input_order() {
    let temp = TempDir::new().unwrap();
    let b = touch(temp.path(), "b.jpg");
    let a = touch(temp.path(), "a.jpg");
    let c = touch(temp.path(), "c.jpg");

    // The file at input index 0 receives the first number.
    let renamed = reorder(&[b, a, c], &NamingScheme::new("img"), &FixedResolver(Verdict::Cancel))
        .await
        .unwrap();

    assert_eq!(
        renamed,
        vec![
            temp.path().join("img1.jpg"),
            temp.path().join("img2.jpg"),
            temp.path().join("img3.jpg"),
        ]
    );
    assert_eq!(read(&temp.path().join("img1.jpg")), "b.jpg");
    assert_eq!(read(&temp.path().join("img2.jpg")), "a.jpg");
    assert_eq!(read(&temp.path().join("img3.jpg")), "c.jpg");
    assert!(!temp.path().join("a.jpg").exists());
}

#[tokio::test]
async fn test_listed_folder_reorders_to_scenario_names() {
    use snapsort_scan::{ListOptions, list_folder};

    let temp = TempDir::new().unwrap();
    touch(temp.path(), "b.jpg");
    touch(temp.path(), "a.jpg");
    touch(temp.path(), "c.jpg");

    let entries = list_folder(&ListOptions::new(temp.path())).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.basename()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);

    let paths: Vec<PathBuf> = entries.iter().map(|e| e.path.clone()).collect();
    let renamed = reorder(&paths, &NamingScheme::new("img"), &FixedResolver(Verdict::Cancel))
        .await
        .unwrap();

    assert_eq!(
        renamed,
        vec![
            temp.path().join("img1.jpg"),
            temp.path().join("img2.jpg"),
            temp.path().join("img3.jpg"),
        ]
    );
    assert_eq!(read(&temp.path().join("img1.jpg")), "a.jpg");
}

#[tokio::test]
async fn test_ten_files_pad_to_two_digits() {
    let temp = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..10)
        .map(|i| touch(temp.path(), &format!("photo{i}.jpg")))
        .collect();

    let renamed = reorder(&paths, &NamingScheme::new("img"), &FixedResolver(Verdict::Cancel))
        .await
        .unwrap();

    assert_eq!(renamed[0], temp.path().join("img01.jpg"));
    assert_eq!(renamed[9], temp.path().join("img10.jpg"));
}

#[tokio::test]
async fn test_reorder_to_existing_names_is_noop() {
    let temp = TempDir::new().unwrap();
    let paths = vec![
        touch(temp.path(), "img1.jpg"),
        touch(temp.path(), "img2.jpg"),
        touch(temp.path(), "img3.jpg"),
    ];

    let renamed = reorder(&paths, &NamingScheme::new("img"), &FixedResolver(Verdict::Cancel))
        .await
        .unwrap();

    assert_eq!(renamed, paths);
    assert_eq!(read(&temp.path().join("img2.jpg")), "img2.jpg");
}

#[tokio::test]
async fn test_swapped_order_exchanges_names_without_collision() {
    let temp = TempDir::new().unwrap();
    let first = touch(temp.path(), "img1.jpg");
    let second = touch(temp.path(), "img2.jpg");

    // A naive single-pass rename would collide here: each entry wants
    // the name the other currently holds.
    let renamed = reorder(
        &[second, first],
        &NamingScheme::new("img"),
        &FixedResolver(Verdict::Cancel),
    )
    .await
    .unwrap();

    assert_eq!(
        renamed,
        vec![temp.path().join("img1.jpg"), temp.path().join("img2.jpg")]
    );
    assert_eq!(read(&temp.path().join("img1.jpg")), "img2.jpg");
    assert_eq!(read(&temp.path().join("img2.jpg")), "img1.jpg");
}

#[tokio::test]
async fn test_missing_source_aborts_without_resolver_round_trip() {
    let temp = TempDir::new().unwrap();
    let a = touch(temp.path(), "a.jpg");
    let ghost = temp.path().join("ghost.jpg");

    let resolver = CountingResolver(AtomicUsize::new(0));
    let scheme = NamingScheme::new("img");
    let result = reorder(&[a.clone(), ghost], &scheme, &resolver).await;

    assert!(matches!(result, Err(EngineError::Io { .. })));
    assert_eq!(resolver.0.load(Ordering::SeqCst), 0);

    // No rollback: the entry staged before the failure stays staged.
    assert!(!a.exists());
    assert!(temp.path().join(scheme.staging_name(0, ".jpg")).exists());
}

#[cfg(unix)]
mod contention {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    use snapsort_ops::{DELETE_RETRY_ATTEMPTS, DeleteError, delete_file};

    fn set_mode(path: &Path, mode: u32) {
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    /// Permission bits do not stop root; nothing can be induced then.
    fn perms_enforced(locked_dir: &Path) -> bool {
        fs::File::create(locked_dir.join(".probe")).is_err()
    }

    struct LockedBatch {
        temp: TempDir,
        locked: PathBuf,
        paths: Vec<PathBuf>,
    }

    /// Three-file batch with one entry inside a read-only subdirectory,
    /// so that entry's stage rename fails with a contention-class error
    /// while the others proceed.
    fn locked_batch(locked_index: usize) -> LockedBatch {
        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();

        let paths: Vec<PathBuf> = ["a.jpg", "b.jpg", "c.jpg"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == locked_index {
                    touch(&locked, name)
                } else {
                    touch(temp.path(), name)
                }
            })
            .collect();

        set_mode(&locked, 0o555);
        LockedBatch { temp, locked, paths }
    }

    /// Restores write access on the first conflict, then answers with
    /// the configured verdict.
    struct UnlockOnConflict {
        locked_dir: PathBuf,
        verdict: Verdict,
        calls: AtomicUsize,
    }

    impl ConflictResolver for UnlockOnConflict {
        fn resolve(&self, _event: ConflictEvent) -> impl Future<Output = Verdict> + Send {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                set_mode(&self.locked_dir, 0o755);
                self.verdict
            }
        }
    }

    #[tokio::test]
    async fn test_retry_verdict_reattempts_step() {
        let batch = locked_batch(1);
        if !perms_enforced(&batch.locked) {
            return;
        }

        let resolver = UnlockOnConflict {
            locked_dir: batch.locked.clone(),
            verdict: Verdict::Retry,
            calls: AtomicUsize::new(0),
        };
        let renamed = reorder(&batch.paths, &NamingScheme::new("img"), &resolver)
            .await
            .unwrap();

        let root = batch.temp.path();
        assert_eq!(
            renamed,
            vec![
                root.join("img1.jpg"),
                root.join("img2.jpg"),
                root.join("img3.jpg"),
            ]
        );
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_skip_verdict_keeps_entry_and_numbering_gap() {
        let batch = locked_batch(1);
        if !perms_enforced(&batch.locked) {
            return;
        }

        let resolver = UnlockOnConflict {
            locked_dir: batch.locked.clone(),
            verdict: Verdict::Skip,
            calls: AtomicUsize::new(0),
        };
        let renamed = reorder(&batch.paths, &NamingScheme::new("img"), &resolver)
            .await
            .unwrap();

        // The skipped entry is omitted and its number stays unused:
        // numbering follows the original index, not a compacted one.
        let root = batch.temp.path();
        assert_eq!(renamed, vec![root.join("img1.jpg"), root.join("img3.jpg")]);
        assert!(!root.join("img2.jpg").exists());
        assert!(batch.locked.join("b.jpg").exists());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_verdict_keeps_completed_renames() {
        let batch = locked_batch(2);
        if !perms_enforced(&batch.locked) {
            set_mode(&batch.locked, 0o755);
            return;
        }

        let scheme = NamingScheme::new("img");
        let result = reorder(&batch.paths, &scheme, &FixedResolver(Verdict::Cancel)).await;

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert!(matches!(
            err,
            EngineError::Cancelled { ref basename } if basename.as_str() == "c.jpg"
        ));

        // Entries staged before the cancel stay staged; nothing was
        // committed and nothing is rolled back.
        let root = batch.temp.path();
        assert!(root.join(scheme.staging_name(0, ".jpg")).exists());
        assert!(root.join(scheme.staging_name(1, ".jpg")).exists());
        assert!(batch.locked.join("c.jpg").exists());
        assert!(!root.join("img1.jpg").exists());

        set_mode(&batch.locked, 0o755);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_delete_retries_while_locked() {
        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let file = touch(&locked, "clip.mp4");
        set_mode(&locked, 0o555);
        if !perms_enforced(&locked) {
            set_mode(&locked, 0o755);
            return;
        }

        let unlock = {
            let locked = locked.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(450)).await;
                set_mode(&locked, 0o755);
            })
        };

        delete_file(&file).await.unwrap();
        assert!(!file.exists());
        unlock.await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_gives_up_after_retries_exhausted() {
        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let file = touch(&locked, "clip.mp4");
        set_mode(&locked, 0o555);
        if !perms_enforced(&locked) {
            set_mode(&locked, 0o755);
            return;
        }

        let result = delete_file(&file).await;
        assert!(matches!(
            result,
            Err(DeleteError::Busy { attempts, .. }) if attempts == DELETE_RETRY_ATTEMPTS
        ));
        assert!(file.exists());

        set_mode(&locked, 0o755);
    }
}
