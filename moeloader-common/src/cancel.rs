//! Cooperative cancellation shared by every network-suspending operation.
//!
//! A [`CancelSource`] is kept by whoever owns the operation, and any number of [`CancelToken`]s
//! are handed to the futures doing the work. Tokens are cheap to clone and can be awaited.
use tokio::sync::watch;

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancelSource {
    sender: watch::Sender<bool>,
}

/// Observer side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    // `None` is a token without a source, which never fires.
    receiver: Option<watch::Receiver<bool>>,
}

impl CancelSource {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Creates a new token bound to this source.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            receiver: Some(self.sender.subscribe()),
        }
    }

    /// Signals every token. Calling this more than once is a no-op.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token that never fires, for callers that have nothing to cancel.
    #[must_use]
    pub const fn never() -> Self {
        Self { receiver: None }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.receiver.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Completes once the owning [`CancelSource`] fires.
    ///
    /// If the source is dropped without firing, this pends forever.
    pub async fn cancelled(&self) {
        let Some(mut receiver) = self.receiver.clone() else {
            return std::future::pending().await;
        };
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{CancelSource, CancelToken};

    #[tokio::test]
    async fn token_fires_after_cancel() {
        let source = CancelSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());

        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });

        source.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("token did not fire")
            .unwrap();
        assert!(token.is_cancelled());
        assert!(source.is_cancelled());
    }

    #[tokio::test]
    async fn never_token_stays_pending() {
        let token = CancelToken::never();
        let res = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn dropped_source_does_not_fire() {
        let source = CancelSource::new();
        let token = source.token();
        drop(source);
        let res = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(res.is_err());
        assert!(!token.is_cancelled());
    }
}
