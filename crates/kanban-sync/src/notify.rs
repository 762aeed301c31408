use kanban_core::Notification;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Fans sync notifications out to subscribers and mirrors them to the log.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn info(&self, action: &str, message: impl Into<String>) {
        let notification = Notification::info(action, message);
        tracing::info!("{}", notification);
        self.publish(notification);
    }

    pub fn error(&self, action: &str, message: impl Into<String>) {
        let notification = Notification::error(action, message);
        tracing::error!("{}", notification);
        self.publish(notification);
    }

    fn publish(&self, notification: Notification) {
        // no subscribers is fine
        let _ = self.tx.send(notification);
    }
}
