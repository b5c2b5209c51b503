//! # Event Bus System
//!
//! Event-driven communication between engine modules using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event types**: strongly-typed enum hierarchies per domain
//!   (backup runs, catalog changes, synchronization passes)
//! - **EventBus**: central broadcast channel for publishing events
//! - **Subscriptions**: any number of subscribers listen independently
//!
//! Events are lightweight, serializable payloads: handles and package names
//! travel as strings so subscribers on the UI side can consume them without
//! importing the platform seam types.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
//!
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Catalog(CatalogEvent::RecordUpserted {
//!     handle: "content://tree/backups/a.apk".to_string(),
//! }))
//! .ok();
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` produces two receive errors: `Lagged(n)` when a
//! slow subscriber missed `n` events (non-fatal, keep receiving) and
//! `Closed` when all senders are gone (shutdown signal).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall behind by more than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Backup run events (manual orchestrator and auto-backup trigger)
    Backup(BackupEvent),
    /// Catalog store change events
    Catalog(CatalogEvent),
    /// Synchronization pass events
    Sync(SyncRunEvent),
}

impl CoreEvent {
    /// Human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Backup(e) => e.description(),
            CoreEvent::Catalog(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
        }
    }

    /// Severity level for log forwarding.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Backup(BackupEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncRunEvent::Cancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Backup(BackupEvent::Completed { .. })
            | CoreEvent::Backup(BackupEvent::BatchCompleted { .. })
            | CoreEvent::Sync(SyncRunEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Backup Events
// ============================================================================

/// Events emitted during one backup run.
///
/// A run over a non-empty app list emits one `Started`, then monotonically
/// increasing `Progress`, then exactly one terminal event — unless a
/// `Failed` truncates the stream (runs are fail-fast across the batch).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BackupEvent {
    /// Run accepted; `total_apps` archives will be attempted.
    Started { total_apps: u64 },
    /// One more part of the current app's archive finished.
    Progress {
        package: String,
        parts_completed: u64,
    },
    /// The current app's archive failed; no further apps are processed.
    Failed { package: String, message: String },
    /// Terminal event for a single-app run.
    Completed { package: String, handle: String },
    /// Terminal event for a multi-app run.
    BatchCompleted { count: u64 },
    /// The run was asked to back up an empty selection.
    Empty,
}

impl BackupEvent {
    fn description(&self) -> &str {
        match self {
            BackupEvent::Started { .. } => "Backup run started",
            BackupEvent::Progress { .. } => "Backup in progress",
            BackupEvent::Failed { .. } => "Backup failed",
            BackupEvent::Completed { .. } => "Backup completed",
            BackupEvent::BatchCompleted { .. } => "Backup batch completed",
            BackupEvent::Empty => "Nothing selected for backup",
        }
    }

    /// Whether this event ends the stream it was emitted on.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BackupEvent::Failed { .. }
                | BackupEvent::Completed { .. }
                | BackupEvent::BatchCompleted { .. }
                | BackupEvent::Empty
        )
    }
}

// ============================================================================
// Catalog Events
// ============================================================================

/// Events emitted by the archive catalog store on every committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// A record was inserted or replaced by handle.
    RecordUpserted { handle: String },
    /// A record was removed.
    RecordRemoved { handle: String },
    /// A reconciliation batch (inserts + removals) was committed atomically.
    BatchApplied { added: u64, removed: u64 },
    /// A record's enrichment was reset for an explicit reload.
    RefreshRequested { handle: String },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::RecordUpserted { .. } => "Catalog record upserted",
            CatalogEvent::RecordRemoved { .. } => "Catalog record removed",
            CatalogEvent::BatchApplied { .. } => "Catalog batch applied",
            CatalogEvent::RefreshRequested { .. } => "Catalog record refresh requested",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Events emitted by the synchronizer around each reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncRunEvent {
    Started { run_id: String },
    /// Pass finished; counts describe catalog mutations and metadata loads.
    Completed {
        run_id: String,
        added: u64,
        removed: u64,
        loaded: u64,
    },
    /// Pass was cancelled between records.
    Cancelled { run_id: String, loaded: u64 },
}

impl SyncRunEvent {
    fn description(&self) -> &str {
        match self {
            SyncRunEvent::Started { .. } => "Sync pass started",
            SyncRunEvent::Completed { .. } => "Sync pass completed",
            SyncRunEvent::Cancelled { .. } => "Sync pass cancelled",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cheap to clone via `Arc`; fully `Send + Sync`.
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are none. A bus without subscribers is not a fault:
    /// emitters call `.ok()` on the result.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        tracing::trace!(event = ?event, "emitting core event");
        self.sender.send(event)
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_reaches_all_subscribers() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let event = CoreEvent::Backup(BackupEvent::Started { total_apps: 3 });
        let delivered = bus.emit(event.clone()).unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn emit_without_subscribers_errors() {
        let bus = EventBus::new(8);
        assert!(bus.emit(CoreEvent::Backup(BackupEvent::Empty)).is_err());
    }

    #[test]
    fn terminal_events() {
        assert!(BackupEvent::Empty.is_terminal());
        assert!(BackupEvent::BatchCompleted { count: 2 }.is_terminal());
        assert!(!BackupEvent::Started { total_apps: 2 }.is_terminal());
        assert!(!BackupEvent::Progress {
            package: "com.foo".into(),
            parts_completed: 1
        }
        .is_terminal());
    }

    #[test]
    fn severity_mapping() {
        let failed = CoreEvent::Backup(BackupEvent::Failed {
            package: "com.foo".into(),
            message: "disk full".into(),
        });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let started = CoreEvent::Backup(BackupEvent::Started { total_apps: 1 });
        assert_eq!(started.severity(), EventSeverity::Debug);
    }
}
