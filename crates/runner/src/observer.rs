//! Progress observer channel.
//!
//! After each executed test the runner pushes a `ProgressUpdate`; a
//! consumer (a streaming web response, a CLI spinner) renders it however
//! it wishes. This is a push notification, not a pull API.

use crucible_core::TestStatus;

/// One notification per executed test.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub sequence_name: String,
    pub completed: usize,
    pub total: usize,
    pub last_outcome: TestStatus,
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: ProgressUpdate);
}

/// Discards all updates.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_progress(&self, _update: ProgressUpdate) {}
}

/// Logs each update at info level.
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&self, update: ProgressUpdate) {
        log::info!(
            "{}: {}/{} ({})",
            update.sequence_name,
            update.completed,
            update.total,
            update.last_outcome
        );
    }
}

/// Forwards updates into an unbounded channel. Send failures mean the
/// consumer went away, which is not the runner's problem to handle.
pub struct ChannelObserver {
    sender: tokio::sync::mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelObserver {
    pub fn new() -> (ChannelObserver, tokio::sync::mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (ChannelObserver { sender }, receiver)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, update: ProgressUpdate) {
        let _ = self.sender.send(update);
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_observer_forwards_updates() {
        let (observer, mut receiver) = ChannelObserver::new();
        observer.on_progress(ProgressUpdate {
            sequence_name: "capability".to_string(),
            completed: 1,
            total: 3,
            last_outcome: TestStatus::Pass,
        });
        let update = receiver.try_recv().unwrap();
        assert_eq!(update.completed, 1);
        assert_eq!(update.total, 3);
    }
}
