//! Automatic Backup Trigger
//!
//! Reacts to host package-update events. The host's dispatch thread hands
//! over a [`PackageUpdated`] event plus a [`CompletionToken`]; the trigger
//! spawns a worker and returns immediately, and the token is released when
//! the worker finishes, so hosts with bounded dispatch windows (broadcast
//! receivers) can defer their completion until the backup is done.
//!
//! A worker runs: enabled check, tracked check, directory check, then a
//! single-app orchestrator run. Untracked packages and disabled settings end
//! the worker silently; an actual backup always ends in a completion
//! notification, success or failure.

use std::sync::Arc;

use core_runtime::events::BackupEvent;
use host_traits::apps::{AppRegistry, InstalledApp};
use host_traits::documents::DocumentHandle;
use host_traits::notify::{
    NotificationAction, NotificationDescriptor, NotificationIds, Notifier,
};
use host_traits::settings::BackupSettings;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;
use crate::orchestrator::BackupOrchestrator;

/// One package-update event as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUpdated {
    pub package_name: String,
}

/// Deferred-completion handle for the host's dispatch mechanism.
///
/// Fires exactly once: explicitly through [`release`](Self::release), or on
/// drop as a backstop so a panicking worker can never leave the host's
/// dispatch pending forever.
pub struct CompletionToken {
    signal: Option<oneshot::Sender<()>>,
}

impl CompletionToken {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { signal: Some(tx) }, rx)
    }

    pub fn release(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(tx) = self.signal.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        self.fire();
    }
}

#[derive(Clone)]
pub struct AutoBackupTrigger {
    orchestrator: BackupOrchestrator,
    registry: Arc<dyn AppRegistry>,
    settings: Arc<dyn BackupSettings>,
    notifier: Arc<dyn Notifier>,
    ids: Arc<NotificationIds>,
}

impl AutoBackupTrigger {
    pub fn new(
        orchestrator: BackupOrchestrator,
        registry: Arc<dyn AppRegistry>,
        settings: Arc<dyn BackupSettings>,
        notifier: Arc<dyn Notifier>,
        ids: Arc<NotificationIds>,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            settings,
            notifier,
            ids,
        }
    }

    /// Handle one package-update event. Returns the worker's join handle;
    /// `token` is released when the worker finishes, whatever the outcome.
    pub fn on_package_updated(
        &self,
        event: PackageUpdated,
        token: CompletionToken,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let token = token;
            if let Err(e) = this.handle(&event).await {
                warn!(package = %event.package_name, error = %e, "auto-backup worker failed");
            }
            token.release();
        })
    }

    async fn handle(&self, event: &PackageUpdated) -> Result<()> {
        if !self.settings.auto_backup_enabled().await? {
            debug!("auto-backup disabled");
            return Ok(());
        }
        let tracked = self.settings.auto_backup_packages().await?;
        if !tracked.contains(&event.package_name) {
            debug!(package = %event.package_name, "package not tracked for auto-backup");
            return Ok(());
        }
        if self.settings.backup_directory().await?.is_none() {
            debug!("auto-backup skipped, no backup directory configured");
            return Ok(());
        }

        let Some(app) = self.registry.get(&event.package_name).await? else {
            // Tracked but gone: the user asked for this backup, tell them
            // why it cannot happen.
            self.notify_failure(&event.package_name, "application is no longer installed")
                .await;
            return Ok(());
        };

        let display_name = app.display_name.clone();
        match self.run_single(app).await {
            Ok(handle) => self.notify_success(&display_name, handle).await,
            Err(message) => self.notify_failure(&display_name, &message).await,
        }
        Ok(())
    }

    /// Run the orchestrator over exactly one app and wait for its terminal
    /// event. The error side is the display message for the notification.
    async fn run_single(&self, app: InstalledApp) -> std::result::Result<DocumentHandle, String> {
        let mut events = self
            .orchestrator
            .run(vec![app], CancellationToken::new())
            .await
            .map_err(|e| e.to_string())?;

        let mut produced = None;
        while let Some(event) = events.recv().await {
            match event {
                BackupEvent::Completed { handle, .. } => {
                    produced = Some(DocumentHandle::new(handle));
                }
                BackupEvent::Failed { message, .. } => return Err(message),
                _ => {}
            }
        }
        produced.ok_or_else(|| "backup run produced no archive".to_string())
    }

    async fn notify_success(&self, display_name: &str, handle: DocumentHandle) {
        let descriptor = NotificationDescriptor {
            id: self.ids.allocate(),
            title: "Backup complete".to_string(),
            body: format!("{display_name} was backed up"),
            actions: vec![
                NotificationAction::Share {
                    handle: handle.clone(),
                },
                NotificationAction::Delete { handle },
            ],
        };
        if let Err(e) = self.notifier.notify(descriptor).await {
            warn!(error = %e, "failed to raise success notification");
        }
    }

    async fn notify_failure(&self, display_name: &str, message: &str) {
        let descriptor = NotificationDescriptor {
            id: self.ids.allocate(),
            title: "Backup failed".to_string(),
            body: format!("{display_name}: {message}"),
            actions: vec![],
        };
        if let Err(e) = self.notifier.notify(descriptor).await {
            warn!(error = %e, "failed to raise failure notification");
        }
    }
}
