//! Work queue feeding batch workers.
//!
//! Uses a std::sync::mpsc channel. The CLI enqueues every screenshot up front,
//! drops the sender, and workers drain the receiver until it closes.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};

/// One screenshot waiting for extraction.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Position in the original request (0-based)
    pub index: usize,
    pub image_path: PathBuf,
    /// Player to look for in this screenshot
    pub username: String,
}

impl BatchItem {
    pub fn new(index: usize, image_path: PathBuf, username: impl Into<String>) -> Self {
        Self {
            index,
            image_path,
            username: username.into(),
        }
    }
}

/// Creates a new work queue.
///
/// The channel is unbounded; items queue up if extraction is slower than
/// enqueueing.
pub fn create_work_queue() -> (Sender<BatchItem>, Receiver<BatchItem>) {
    channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_queue_send_receive() {
        let (sender, receiver) = create_work_queue();

        let item = BatchItem::new(0, PathBuf::from("shots/game1.png"), "AUSWEN");
        sender.send(item).expect("Failed to send");

        let received = receiver.recv().expect("Failed to receive");
        assert_eq!(received.index, 0);
        assert_eq!(received.username, "AUSWEN");
        assert_eq!(received.image_path, PathBuf::from("shots/game1.png"));
    }

    #[test]
    fn test_channel_closes_when_sender_dropped() {
        let (sender, receiver) = create_work_queue();

        sender
            .send(BatchItem::new(0, PathBuf::from("a.png"), "AUSWEN"))
            .unwrap();
        drop(sender);

        assert!(receiver.recv().is_ok());
        assert!(receiver.recv().is_err());
    }
}
