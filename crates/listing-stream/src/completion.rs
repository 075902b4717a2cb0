//! One-shot signal raised by the stream simulator once it will not produce
//! any more records.

use std::sync::Arc;
use tokio::sync::watch;

/// Progress of the record producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamStatus {
    /// Records may still arrive.
    Streaming,
    /// Every record of the dataset has been pushed onto the channel.
    Exhausted,
    /// The producer gave up and no further records will arrive.
    Failed,
}

impl StreamStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, StreamStatus::Streaming)
    }
}

/// Shared handle to the completion signal.
///
/// Every clone refers to the same signal.  The signal moves out of
/// [`StreamStatus::Streaming`] at most once; later attempts are ignored.
#[derive(Clone, Debug)]
pub struct Completion {
    sender: Arc<watch::Sender<StreamStatus>>,
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl Completion {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(StreamStatus::Streaming);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn status(&self) -> StreamStatus {
        *self.sender.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_finished()
    }

    /// Marks the stream as exhausted.
    pub fn finish(&self) -> bool {
        self.set(StreamStatus::Exhausted)
    }

    /// Marks the stream as failed.
    pub fn fail(&self) -> bool {
        self.set(StreamStatus::Failed)
    }

    /// Returns `false` if the signal had already been raised.
    fn set(&self, status: StreamStatus) -> bool {
        self.sender.send_if_modified(|current| {
            if current.is_finished() {
                false
            } else {
                *current = status;
                true
            }
        })
    }

    /// Waits until the signal is raised and returns the final status.
    pub async fn finished(&self) -> StreamStatus {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let status = match receiver.wait_for(|status| status.is_finished()).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        };
        status
    }
}

#[cfg(test)]
mod test {
    use super::{Completion, StreamStatus};
    use std::time::Duration;

    #[test]
    fn raised_once() {
        let completion = Completion::new();
        assert_eq!(completion.status(), StreamStatus::Streaming);
        assert!(completion.finish());
        assert!(!completion.fail());
        assert!(!completion.finish());
        assert_eq!(completion.status(), StreamStatus::Exhausted);
    }

    #[tokio::test]
    async fn wakes_waiters() {
        let completion = Completion::new();
        let waiter = tokio::spawn({
            let completion = completion.clone();
            async move { completion.finished().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        completion.fail();
        assert_eq!(waiter.await.unwrap(), StreamStatus::Failed);
    }

    #[tokio::test]
    async fn already_raised() {
        let completion = Completion::new();
        completion.finish();
        assert_eq!(completion.finished().await, StreamStatus::Exhausted);
    }
}
