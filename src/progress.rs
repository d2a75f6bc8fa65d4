//! Progress and completion notifications for document decoding.
//!
//! The decoder reports to an injected [`ProgressObserver`]; hosts that want a
//! message stream use [`ChannelObserver`], which forwards every notification
//! as a [`ProcessingUpdate`] over a tokio channel.

use tokio::sync::mpsc;

/// Progress of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Document being processed.
    pub file_name: String,
    /// 0 right after the document opened, then the 1-based page being rendered.
    pub page_index: usize,
    /// Number of pages that will be processed (after the page cap).
    pub total_pages: usize,
}

/// Messages delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingUpdate {
    /// A document opened or a page started rendering.
    Progress(ProgressEvent),
    /// A document finished, successfully or not. Sent exactly once per document.
    Complete {
        /// Document that finished.
        file_name: String,
    },
}

/// Receives side-channel notifications from the decoder.
pub trait ProgressObserver {
    /// A document opened or a page started rendering.
    fn on_progress(&self, event: ProgressEvent);

    /// A document finished.
    fn on_complete(&self, file_name: &str);
}

/// Discards all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _event: ProgressEvent) {}

    fn on_complete(&self, _file_name: &str) {}
}

/// Forwards notifications over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProcessingUpdate>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProcessingUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, update: ProcessingUpdate) {
        // A host that stopped listening does not affect decoding.
        if self.tx.send(update).is_err() {
            tracing::debug!("Progress receiver dropped");
        }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, event: ProgressEvent) {
        self.send(ProcessingUpdate::Progress(event));
    }

    fn on_complete(&self, file_name: &str) {
        self.send(ProcessingUpdate::Complete { file_name: file_name.to_string() });
    }
}
