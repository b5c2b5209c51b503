//! Auto-backup trigger integration tests: tracking checks, worker
//! lifecycle, completion-token release, and notifications.

mod common;

use common::{installed_app, Harness};
use core_backup::{AutoBackupTrigger, CompletionToken, PackageUpdated};
use host_desktop::{RecordingNotifier, StaticAppRegistry};
use host_traits::apps::{AppRegistry, InstalledApp};
use host_traits::notify::{NotificationAction, NotificationIds, Notifier};
use host_traits::settings::BackupSettings;
use std::sync::Arc;

mockall::mock! {
    pub Registry {}

    #[async_trait::async_trait]
    impl AppRegistry for Registry {
        async fn get(&self, package_name: &str) -> host_traits::error::Result<Option<InstalledApp>>;
        async fn filter_installed(
            &self,
            package_names: &[String],
        ) -> host_traits::error::Result<Vec<String>>;
    }
}

fn trigger_for(
    harness: &Harness,
    registry: Arc<dyn AppRegistry>,
    notifier: Arc<RecordingNotifier>,
) -> AutoBackupTrigger {
    AutoBackupTrigger::new(
        harness.orchestrator(),
        registry,
        Arc::clone(&harness.settings) as Arc<dyn BackupSettings>,
        notifier as Arc<dyn Notifier>,
        Arc::new(NotificationIds::default()),
    )
}

async fn dispatch(trigger: &AutoBackupTrigger, package: &str) {
    let (token, released) = CompletionToken::new();
    let worker = trigger.on_package_updated(
        PackageUpdated {
            package_name: package.to_string(),
        },
        token,
    );
    released.await.expect("completion token must fire");
    worker.await.unwrap();
}

#[tokio::test]
async fn tracked_update_backs_up_and_notifies() {
    let harness = Harness::new().await;
    harness.settings.set_auto_backup_enabled(true).await;
    harness.settings.track_package("com.notes").await;

    let registry = Arc::new(StaticAppRegistry::new());
    registry
        .insert(installed_app(&harness.sources_dir, "com.notes", "Notes", 0).await)
        .await;
    let notifier = Arc::new(RecordingNotifier::new());
    let trigger = trigger_for(&harness, registry, Arc::clone(&notifier));

    dispatch(&trigger, "com.notes").await;

    assert_eq!(harness.backup_dir_names().await, vec!["Notes-1.0.apk"]);

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Backup complete");
    assert!(sent[0].body.contains("Notes"));
    assert!(matches!(sent[0].actions[0], NotificationAction::Share { .. }));
    assert!(matches!(sent[0].actions[1], NotificationAction::Delete { .. }));
}

#[tokio::test]
async fn untracked_package_never_reaches_the_registry() {
    let harness = Harness::new().await;
    harness.settings.set_auto_backup_enabled(true).await;
    harness.settings.track_package("com.other").await;

    // No expectations: any registry call fails the test.
    let registry = Arc::new(MockRegistry::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let trigger = trigger_for(&harness, registry, Arc::clone(&notifier));

    dispatch(&trigger, "com.notes").await;

    assert!(harness.backup_dir_names().await.is_empty());
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn disabled_feature_short_circuits() {
    let harness = Harness::new().await;
    harness.settings.set_auto_backup_enabled(false).await;
    harness.settings.track_package("com.notes").await;

    let registry = Arc::new(MockRegistry::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let trigger = trigger_for(&harness, registry, Arc::clone(&notifier));

    dispatch(&trigger, "com.notes").await;

    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn uninstalled_app_notifies_failure() {
    let harness = Harness::new().await;
    harness.settings.set_auto_backup_enabled(true).await;
    harness.settings.track_package("com.gone").await;

    let registry = Arc::new(StaticAppRegistry::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let trigger = trigger_for(&harness, registry, Arc::clone(&notifier));

    dispatch(&trigger, "com.gone").await;

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Backup failed");
    assert!(sent[0].body.contains("no longer installed"));
    assert!(sent[0].actions.is_empty());
}

#[tokio::test]
async fn failed_backup_notifies_failure() {
    let harness = Harness::new().await;
    harness.settings.set_auto_backup_enabled(true).await;
    harness.settings.track_package("com.notes").await;

    let app = installed_app(&harness.sources_dir, "com.notes", "Notes", 0).await;
    tokio::fs::remove_file(&app.primary_source).await.unwrap();
    let registry = Arc::new(StaticAppRegistry::new());
    registry.insert(app).await;
    let notifier = Arc::new(RecordingNotifier::new());
    let trigger = trigger_for(&harness, registry, Arc::clone(&notifier));

    dispatch(&trigger, "com.notes").await;

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Backup failed");
    assert!(harness.backup_dir_names().await.is_empty());
}

#[tokio::test]
async fn concurrent_notifications_get_distinct_ids() {
    let harness = Harness::new().await;
    harness.settings.set_auto_backup_enabled(true).await;
    harness.settings.track_package("com.a").await;
    harness.settings.track_package("com.b").await;

    let registry = Arc::new(StaticAppRegistry::new());
    registry
        .insert(installed_app(&harness.sources_dir, "com.a", "Alpha", 0).await)
        .await;
    registry
        .insert(installed_app(&harness.sources_dir, "com.b", "Beta", 0).await)
        .await;
    let notifier = Arc::new(RecordingNotifier::new());
    let trigger = trigger_for(&harness, registry, Arc::clone(&notifier));

    dispatch(&trigger, "com.a").await;
    dispatch(&trigger, "com.b").await;

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0].id, sent[1].id);
}
