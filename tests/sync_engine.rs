//! Sync engine tests against an in-memory content store

mod common;

use common::{
    MockContentStore, Notified, RecordingNotifier, ScriptedFailure, connected_state, make_creds,
    make_record, memory_state, two_sum, wait_for,
};
use leetsync::storage::{JsonFileStore, LocalState};
use leetsync::store::ContentStore;
use leetsync::sync::{QueueReason, SyncEngine, SyncOutcome, UPDATE_MESSAGE};
use leetsync::types::Difficulty;
use std::sync::Arc;
use std::time::Duration;

fn engine_with(store: &Arc<MockContentStore>, state: LocalState) -> SyncEngine {
    let store: Arc<dyn ContentStore> = Arc::<MockContentStore>::clone(store);
    SyncEngine::new(store, state, "main")
}

#[tokio::test]
async fn test_no_credentials_queues_without_requests() {
    let store = Arc::new(MockContentStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = engine_with(&store, memory_state()).with_notifier(notifier.clone());

    let outcome = engine.sync(&two_sum(), None).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Queued {
            reason: QueueReason::NoCredentials,
            pending: 1,
        }
    );
    assert_eq!(store.request_count(), 0);
    assert_eq!(engine.state().pending().await.unwrap(), vec![two_sum()]);
    assert_eq!(notifier.events(), vec![Notified::Pending(1)]);
}

#[tokio::test]
async fn test_new_file_is_created_without_sha() {
    let store = Arc::new(MockContentStore::new());
    let engine = engine_with(&store, memory_state());

    let outcome = engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Created {
            path: "easy/1-TwoSum.py".to_string()
        }
    );
    let puts = store.puts_to("easy/1-TwoSum.py");
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].request.sha, None);
    assert_eq!(puts[0].request.branch, "main");
    assert_eq!(puts[0].request.message, "Add solution: 1 - 1. TwoSum");
}

#[tokio::test]
async fn test_existing_file_is_updated_with_its_sha() {
    let store = Arc::new(MockContentStore::new());
    store.insert_file("easy/1-TwoSum.py", "abc", "old");
    let engine = engine_with(&store, memory_state());

    let outcome = engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            path: "easy/1-TwoSum.py".to_string()
        }
    );
    let puts = store.puts_to("easy/1-TwoSum.py");
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].request.sha.as_deref(), Some("abc"));
    assert_eq!(puts[0].request.message, UPDATE_MESSAGE);
}

#[tokio::test]
async fn test_written_file_carries_header() {
    let store = Arc::new(MockContentStore::new());
    let engine = engine_with(&store, memory_state());
    engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    let text = store.file_text("easy/1-TwoSum.py").unwrap();
    insta::assert_snapshot!(text, @r#"
    """
     * Problem: 1. TwoSum
     * Difficulty: Easy
     * Date: 2024-03-09
     """

    class Solution:
        def solve(self):
            return 1
    "#);
}

#[tokio::test]
async fn test_directory_placeholders_created_once() {
    let store = Arc::new(MockContentStore::new());
    let engine = engine_with(&store, memory_state());
    let creds = make_creds();

    engine.sync(&two_sum(), Some(&creds)).await.unwrap();
    engine
        .sync(&make_record("15", "3Sum", Difficulty::Medium, "cpp"), Some(&creds))
        .await
        .unwrap();
    engine
        .sync(&make_record("2", "AddTwoNumbers", Difficulty::Easy, "py"), Some(&creds))
        .await
        .unwrap();

    for dir in ["easy", "medium", "hard"] {
        let readme = format!("{dir}/README.md");
        let puts = store.puts_to(&readme);
        assert_eq!(puts.len(), 1, "{readme} written {} times", puts.len());
        assert_eq!(puts[0].request.message, format!("Create {dir} folder"));
    }
    assert_eq!(
        store.file_text("hard/README.md").unwrap(),
        "# Hard Problems\n\nThis folder contains LeetCode problems of hard difficulty."
    );
}

#[tokio::test]
async fn test_conflict_is_retried_once() {
    let store = Arc::new(MockContentStore::new());
    store.fail_next("easy/1-TwoSum.py", ScriptedFailure::Conflict);
    let engine = engine_with(&store, memory_state());

    let outcome = engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    assert!(outcome.is_synced());
    assert_eq!(store.puts_to("easy/1-TwoSum.py").len(), 2);
    assert_eq!(engine.state().pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_not_found_is_retried_once() {
    let store = Arc::new(MockContentStore::new());
    store.fail_next("easy/1-TwoSum.py", ScriptedFailure::NotFound);
    let engine = engine_with(&store, memory_state());

    let outcome = engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();
    assert!(outcome.is_synced());
    assert!(store.has_file("easy/1-TwoSum.py"));
}

#[tokio::test]
async fn test_not_found_retry_bootstraps_once_then_rewrites() {
    let store = Arc::new(MockContentStore::new());
    store.fail_next("easy/1-TwoSum.py", ScriptedFailure::NotFound);
    let engine = engine_with(&store, memory_state());

    engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    let puts: Vec<String> = store.puts().into_iter().map(|c| c.path).collect();
    assert_eq!(
        puts,
        vec![
            "easy/README.md",
            "medium/README.md",
            "hard/README.md",
            "easy/1-TwoSum.py",
            "easy/1-TwoSum.py",
        ]
    );
    // The second bootstrap finds every directory and writes nothing.
    assert_eq!(
        store.lookups(),
        vec![
            "easy",
            "medium",
            "hard",
            "easy/1-TwoSum.py",
            "easy",
            "medium",
            "hard",
            "easy/1-TwoSum.py",
        ]
    );
    let retried = store.puts_to("easy/1-TwoSum.py");
    assert!(retried.iter().all(|c| c.request.sha.is_none()));
}

#[tokio::test]
async fn test_second_conflict_queues() {
    let store = Arc::new(MockContentStore::new());
    store.fail_next("easy/1-TwoSum.py", ScriptedFailure::Conflict);
    store.fail_next("easy/1-TwoSum.py", ScriptedFailure::Conflict);
    let engine = engine_with(&store, memory_state());

    let outcome = engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    assert!(matches!(
        outcome,
        SyncOutcome::Queued {
            reason: QueueReason::Failed(_),
            pending: 1
        }
    ));
    assert_eq!(store.puts_to("easy/1-TwoSum.py").len(), 2);
}

#[tokio::test]
async fn test_server_error_queues_and_notifies() {
    let store = Arc::new(MockContentStore::new());
    store.fail_next("easy/1-TwoSum.py", ScriptedFailure::Server);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = engine_with(&store, memory_state()).with_notifier(notifier.clone());

    let outcome = engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    assert!(!outcome.is_synced());
    // Server errors are not retried.
    assert_eq!(store.puts_to("easy/1-TwoSum.py").len(), 1);
    assert_eq!(engine.state().pending().await.unwrap(), vec![two_sum()]);
    assert_eq!(
        notifier.events(),
        vec![
            Notified::Pending(1),
            Notified::Failed {
                file: "1-TwoSum.py".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_success_records_last_sync() {
    let store = Arc::new(MockContentStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = engine_with(&store, memory_state()).with_notifier(notifier.clone());

    engine.sync(&two_sum(), Some(&make_creds())).await.unwrap();

    let last = engine.state().last_sync().await.unwrap().unwrap();
    assert_eq!(last.file, "1-TwoSum.py");
    assert_eq!(
        notifier.events(),
        vec![Notified::Synced {
            file: "1-TwoSum.py".to_string(),
            updated: false
        }]
    );
}

#[tokio::test]
async fn test_drain_keeps_order_of_failures() {
    let store = Arc::new(MockContentStore::new());
    let engine = engine_with(&store, memory_state());
    let first = make_record("1", "TwoSum", Difficulty::Easy, "py");
    let second = make_record("15", "3Sum", Difficulty::Medium, "py");
    let third = make_record("42", "TrappingRainWater", Difficulty::Hard, "py");
    for record in [&first, &second, &third] {
        engine.sync(record, None).await.unwrap();
    }

    store.fail_next(&first.remote_path(), ScriptedFailure::Server);
    store.fail_next(&third.remote_path(), ScriptedFailure::Server);
    let report = engine.drain_pending(&make_creds()).await.unwrap();

    assert_eq!(report.synced, 1);
    assert_eq!(report.requeued, 2);
    assert_eq!(report.pending, 2);
    assert_eq!(engine.state().pending().await.unwrap(), vec![first, third]);
    assert!(store.has_file(&second.remote_path()));
}

#[tokio::test]
async fn test_queue_survives_on_disk_while_draining() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let open_state = || LocalState::new(Arc::new(JsonFileStore::open(path.clone())));

    let store = Arc::new(MockContentStore::with_delay(Duration::from_millis(100)));
    let engine = Arc::new(engine_with(&store, open_state()));
    let first = make_record("1", "TwoSum", Difficulty::Easy, "py");
    let second = make_record("15", "3Sum", Difficulty::Medium, "py");
    for record in [&first, &second] {
        engine.sync(record, None).await.unwrap();
    }

    let drain = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.drain_pending(&make_creds()).await })
    };
    wait_for(|| {
        let store = Arc::clone(&store);
        async move { !store.puts().is_empty() }
    })
    .await;

    // A fresh reader of the same file sees nothing lost mid-drain.
    assert_eq!(
        open_state().pending().await.unwrap(),
        vec![first.clone(), second.clone()]
    );

    let report = drain.await.unwrap().unwrap();
    assert_eq!(report.synced, 2);
    assert_eq!(report.pending, 0);
    assert!(open_state().pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_drain_empty_queue_makes_no_requests() {
    let store = Arc::new(MockContentStore::new());
    let engine = engine_with(&store, memory_state());

    let report = engine.drain_pending(&make_creds()).await.unwrap();

    assert_eq!(report.synced, 0);
    assert_eq!(store.request_count(), 0);
}

#[tokio::test]
async fn test_drain_with_stored_credentials_needs_both() {
    let store = Arc::new(MockContentStore::new());
    let state = memory_state();
    state.set_token("ghp_test", None).await.unwrap();
    let engine = engine_with(&store, state);

    assert!(engine.drain_with_stored_credentials().await.unwrap().is_none());
}

#[tokio::test]
async fn test_offline_directory_check_is_not_fatal() {
    let store = Arc::new(MockContentStore::new());
    store.set_offline(true);
    let engine = engine_with(&store, memory_state());

    assert_eq!(engine.ensure_directories(&make_creds()).await, 0);
    assert_eq!(store.lookups(), vec!["easy", "medium", "hard"]);
}

#[tokio::test]
async fn test_saving_repository_drains_queue() {
    let store = Arc::new(MockContentStore::new());
    let state = memory_state();
    state.set_token("ghp_test", Some("octocat")).await.unwrap();
    let engine = Arc::new(engine_with(&store, state.clone()));
    engine.sync(&two_sum(), None).await.unwrap();

    let watcher = engine.watch_credentials();
    state.set_repo(&make_creds().repo).await.unwrap();

    wait_for(|| {
        let store = Arc::clone(&store);
        async move { store.has_file("easy/1-TwoSum.py") }
    })
    .await;
    wait_for(|| {
        let state = state.clone();
        async move { state.pending_count().await.unwrap() == 0 }
    })
    .await;
    assert!(store.has_file("easy/README.md"));
    watcher.abort();
}

#[tokio::test]
async fn test_same_path_writes_are_serialized() {
    let store = Arc::new(MockContentStore::with_delay(Duration::from_millis(20)));
    let engine = Arc::new(engine_with(&store, connected_state().await));
    let creds = make_creds();

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let engine = Arc::clone(&engine);
        let creds = creds.clone();
        tasks.push(tokio::spawn(async move {
            engine.sync(&two_sum(), Some(&creds)).await.unwrap()
        }));
    }
    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap());
    }

    assert!(outcomes.iter().all(SyncOutcome::is_synced));
    assert!(outcomes.iter().any(|o| matches!(o, SyncOutcome::Created { .. })));
    assert!(outcomes.iter().any(|o| matches!(o, SyncOutcome::Updated { .. })));
    let puts = store.puts_to("easy/1-TwoSum.py");
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].request.sha, None);
    assert!(puts[1].request.sha.is_some());
    assert_eq!(store.max_in_flight(), 1);
}
