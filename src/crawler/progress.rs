//! Fire-and-forget progress messages from a running crawl.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Sink for human-readable progress messages.
///
/// Sending never blocks the crawl; messages are dropped once the receiver
/// is gone. Every message is also logged.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    tx: Option<UnboundedSender<String>>,
}

impl Progress {
    /// Create a sink and the receiver that drains it.
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that only logs.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Report an ordinary status update.
    pub fn emit(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message.trim_start());
        self.send(message);
    }

    /// Report a recoverable problem.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message.trim_start());
        self.send(message);
    }

    fn send(&self, message: String) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_arrive_in_order() {
        let (progress, mut rx) = Progress::channel();
        progress.emit("one");
        progress.warn("two");

        assert_eq!(rx.try_recv().unwrap(), "one");
        assert_eq!(rx.try_recv().unwrap(), "two");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (progress, rx) = Progress::channel();
        drop(rx);
        progress.emit("nobody listening");
        Progress::silent().emit("also fine");
    }
}
