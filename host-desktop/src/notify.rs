//! Notification sink that records instead of displaying.

use async_trait::async_trait;
use host_traits::error::Result;
use host_traits::notify::{NotificationDescriptor, Notifier};
use tokio::sync::Mutex;
use tracing::info;

/// Records every descriptor it is handed; tests assert on
/// [`sent`](Self::sent).
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationDescriptor>>,
    cancelled: Mutex<Vec<u32>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<NotificationDescriptor> {
        self.sent.lock().await.clone()
    }

    pub async fn cancelled(&self) -> Vec<u32> {
        self.cancelled.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, descriptor: NotificationDescriptor) -> Result<()> {
        info!(id = descriptor.id, title = %descriptor.title, "notification raised");
        self.sent.lock().await.push(descriptor);
        Ok(())
    }

    async fn cancel(&self, id: u32) -> Result<()> {
        self.cancelled.lock().await.push(id);
        Ok(())
    }
}
