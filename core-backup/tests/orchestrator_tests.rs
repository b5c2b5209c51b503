//! Orchestrator integration tests: event streams, naming, bundling,
//! catalog registration, and fail-fast batches.

mod common;

use common::{collect_events, installed_app, Harness};
use core_backup::BackupError;
use core_catalog::ArchiveKind;
use core_runtime::events::BackupEvent;
use host_traits::documents::DocumentHandle;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn single_app_run_completes_with_progress() {
    let harness = Harness::new().await;
    let app = installed_app(&harness.sources_dir, "com.notes", "Notes", 0).await;
    let orchestrator = harness.orchestrator();

    let rx = orchestrator
        .run(vec![app], CancellationToken::new())
        .await
        .unwrap();
    let events = collect_events(rx).await;

    assert_eq!(events[0], BackupEvent::Started { total_apps: 1 });
    assert_eq!(
        events[1],
        BackupEvent::Progress {
            package: "com.notes".to_string(),
            parts_completed: 1
        }
    );
    let BackupEvent::Completed { package, handle } = &events[2] else {
        panic!("expected Completed, got {:?}", events[2]);
    };
    assert_eq!(package, "com.notes");
    assert!(handle.ends_with("Notes-1.0.apk"));
    assert_eq!(events.len(), 3);

    // The produced archive is registered already enriched.
    let record = harness
        .catalog
        .get(&DocumentHandle::new(handle.clone()))
        .await
        .unwrap();
    assert!(record.loaded);
    assert_eq!(record.package_name.as_deref(), Some("com.notes"));
    assert_eq!(record.app_name.as_deref(), Some("Notes"));
}

#[tokio::test]
async fn split_app_is_bundled_with_per_part_progress() {
    let harness = Harness::new().await;
    let app = installed_app(&harness.sources_dir, "com.game", "Game", 2).await;
    let orchestrator = harness.orchestrator();

    let rx = orchestrator
        .run(vec![app], CancellationToken::new())
        .await
        .unwrap();
    let events = collect_events(rx).await;

    let progress: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            BackupEvent::Progress {
                parts_completed, ..
            } => Some(*parts_completed),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![1, 2, 3], "primary plus two splits");

    assert_eq!(harness.backup_dir_names().await, vec!["Game-1.0.apks"]);
    let handle = harness
        .store
        .handle_for(&harness.backup_path().join("Game-1.0.apks"));
    let record = harness.catalog.get(&handle).await.unwrap();
    assert_eq!(record.kind(), Some(ArchiveKind::Bundle));
}

#[tokio::test]
async fn bundling_disabled_copies_only_the_primary() {
    let harness = Harness::new().await;
    harness.settings.set_bundle_splits(false).await;
    let app = installed_app(&harness.sources_dir, "com.game", "Game", 2).await;
    let orchestrator = harness.orchestrator();

    let rx = orchestrator
        .run(vec![app], CancellationToken::new())
        .await
        .unwrap();
    let events = collect_events(rx).await;

    assert!(matches!(events.last(), Some(BackupEvent::Completed { .. })));
    assert_eq!(harness.backup_dir_names().await, vec!["Game-1.0.apk"]);
}

#[tokio::test]
async fn batch_run_emits_batch_completed() {
    let harness = Harness::new().await;
    let a = installed_app(&harness.sources_dir, "com.a", "Alpha", 0).await;
    let b = installed_app(&harness.sources_dir, "com.b", "Beta", 0).await;
    let orchestrator = harness.orchestrator();

    let rx = orchestrator
        .run(vec![a, b], CancellationToken::new())
        .await
        .unwrap();
    let events = collect_events(rx).await;

    assert_eq!(events.first(), Some(&BackupEvent::Started { total_apps: 2 }));
    assert_eq!(events.last(), Some(&BackupEvent::BatchCompleted { count: 2 }));
    assert_eq!(
        harness.backup_dir_names().await,
        vec!["Alpha-1.0.apk", "Beta-1.0.apk"]
    );
    assert_eq!(harness.catalog.len().await, 2);
}

#[tokio::test]
async fn empty_selection_emits_empty() {
    let harness = Harness::new().await;
    let orchestrator = harness.orchestrator();

    let rx = orchestrator
        .run(Vec::new(), CancellationToken::new())
        .await
        .unwrap();
    let events = collect_events(rx).await;

    assert_eq!(events, vec![BackupEvent::Empty]);
    assert!(harness.backup_dir_names().await.is_empty());
}

#[tokio::test]
async fn batch_fails_fast_on_the_first_error() {
    let harness = Harness::new().await;
    let broken = installed_app(&harness.sources_dir, "com.broken", "Broken", 0).await;
    let good = installed_app(&harness.sources_dir, "com.good", "Good", 0).await;
    tokio::fs::remove_file(&broken.primary_source).await.unwrap();

    let orchestrator = harness.orchestrator();
    let rx = orchestrator
        .run(vec![broken, good], CancellationToken::new())
        .await
        .unwrap();
    let events = collect_events(rx).await;

    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        BackupEvent::Failed { package, .. } if package == "com.broken"
    ));
    assert!(
        harness.backup_dir_names().await.is_empty(),
        "later apps are not attempted"
    );
}

#[tokio::test]
async fn colliding_names_get_a_counter() {
    let harness = Harness::new().await;
    harness.seed_archive("Notes-1.0.apk", "preexisting").await;
    let app = installed_app(&harness.sources_dir, "com.notes", "Notes", 0).await;
    let orchestrator = harness.orchestrator();

    let rx = orchestrator
        .run(vec![app], CancellationToken::new())
        .await
        .unwrap();
    let events = collect_events(rx).await;

    assert!(matches!(events.last(), Some(BackupEvent::Completed { .. })));
    assert_eq!(
        harness.backup_dir_names().await,
        vec!["Notes-1.0 (1).apk", "Notes-1.0.apk"]
    );
}

#[tokio::test]
async fn run_without_directory_is_rejected() {
    let harness = Harness::new().await;
    harness.settings.set_backup_directory(None).await;
    let app = installed_app(&harness.sources_dir, "com.notes", "Notes", 0).await;
    let orchestrator = harness.orchestrator();

    let result = orchestrator.run(vec![app], CancellationToken::new()).await;
    assert!(matches!(result, Err(BackupError::NotConfigured(_))));
}

#[tokio::test]
async fn cancelled_run_fails_before_writing() {
    let harness = Harness::new().await;
    let app = installed_app(&harness.sources_dir, "com.notes", "Notes", 0).await;
    let orchestrator = harness.orchestrator();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let rx = orchestrator.run(vec![app], cancel).await.unwrap();
    let events = collect_events(rx).await;

    assert!(matches!(
        events.last(),
        Some(BackupEvent::Failed { message, .. }) if message.contains("cancelled")
    ));
    assert!(harness.backup_dir_names().await.is_empty());
}
