//! Notification Surface
//!
//! Completion notifications raised by the automatic backup path. Channel
//! setup, icons and tap routing belong to the host; the engine only supplies
//! descriptors and correlates follow-up actions to the produced archive.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::documents::DocumentHandle;
use crate::error::Result;

/// Follow-up action attached to a success notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    /// Share the produced archive.
    Share { handle: DocumentHandle },
    /// Delete the produced archive.
    Delete { handle: DocumentHandle },
}

/// Transient descriptor for one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDescriptor {
    /// Host notification id; later `cancel` calls use it.
    pub id: u32,
    pub title: String,
    pub body: String,
    /// Empty on failure notifications.
    pub actions: Vec<NotificationAction>,
}

/// Allocator for notification ids.
///
/// Every completion notification uses a freshly allocated id so concurrent
/// notifications never collide or overwrite each other.
#[derive(Debug)]
pub struct NotificationIds {
    next: AtomicU32,
}

impl NotificationIds {
    pub fn new(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    pub fn allocate(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for NotificationIds {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Host notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Create or update the notification with `descriptor.id`.
    async fn notify(&self, descriptor: NotificationDescriptor) -> Result<()>;

    /// Cancel a previously raised notification; unknown ids are a no-op.
    async fn cancel(&self, id: u32) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_fresh_and_monotonic() {
        let ids = NotificationIds::default();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        assert!(a < b && b < c);
    }
}
