//! Coalescing of rapid input changes.
//!
//! Search boxes push every keystroke; the listing should only reload once
//! typing pauses. [`Debouncer::next`] waits for a value and then keeps
//! replacing it with newer ones until the input has been quiet for the
//! configured delay.

use std::time::Duration;

use tokio::sync::mpsc;

/// Quiet period before a search term is applied.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Sending half, handed to whatever produces input.
#[derive(Debug)]
pub struct DebounceSender<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for DebounceSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> DebounceSender<T> {
    /// Queue a value. Returns `false` once the debouncer has been dropped.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Releases only the last value of each burst.
#[derive(Debug)]
pub struct Debouncer<T> {
    rx: mpsc::UnboundedReceiver<T>,
    delay: Duration,
}

impl<T> Debouncer<T> {
    /// Create a debouncer and the sender that feeds it.
    #[must_use]
    pub fn new(delay: Duration) -> (DebounceSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DebounceSender { tx }, Self { rx, delay })
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the next settled value.
    ///
    /// Returns `None` once every sender is dropped and nothing is pending.
    pub async fn next(&mut self) -> Option<T> {
        let mut latest = self.rx.recv().await?;
        loop {
            match tokio::time::timeout(self.delay, self.rx.recv()).await {
                Ok(Some(value)) => latest = value,
                Ok(None) | Err(_) => return Some(latest),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_releases_last_value() {
        let (tx, mut debouncer) = Debouncer::new(Duration::from_millis(20));
        for term in ["b", "br", "bra", "brass"] {
            assert!(tx.push(term.to_string()));
        }
        assert_eq!(debouncer.next().await.as_deref(), Some("brass"));
    }

    #[tokio::test]
    async fn test_separate_bursts() {
        let (tx, mut debouncer) = Debouncer::new(Duration::from_millis(20));
        let producer = tokio::spawn(async move {
            tx.push(1);
            tx.push(2);
            tokio::time::sleep(Duration::from_millis(200)).await;
            tx.push(3);
        });

        assert_eq!(debouncer.next().await, Some(2));
        assert_eq!(debouncer.next().await, Some(3));
        assert!(producer.await.is_ok());
        assert_eq!(debouncer.next().await, None);
    }

    #[tokio::test]
    async fn test_closed_sender_flushes_pending() {
        let (tx, mut debouncer) = Debouncer::new(DEFAULT_DEBOUNCE);
        tx.push("diya");
        drop(tx);
        assert_eq!(debouncer.next().await, Some("diya"));
        assert_eq!(debouncer.next().await, None);
    }
}
