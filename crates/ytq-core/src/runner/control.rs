//! Stop requests for the running job.
//!
//! The controller keeps the [`StopHandle`]; the runner task owns the matching
//! [`StopSignal`] and starts termination when it fires.

use tokio::sync::oneshot;

pub fn stop_pair() -> (StopHandle, StopSignal) {
    let (tx, rx) = oneshot::channel();
    (StopHandle { tx: Some(tx) }, StopSignal { rx })
}

#[derive(Debug)]
pub struct StopHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl StopHandle {
    /// Requests a stop. Returns false if one was already requested.
    pub fn request(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // The runner may already be gone; that is not an error.
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn is_requested(&self) -> bool {
        self.tx.is_none()
    }
}

/// Resolves when a stop is requested or the handle is dropped.
#[derive(Debug)]
pub struct StopSignal {
    pub(super) rx: oneshot::Receiver<()>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_fires_once() {
        let (mut handle, signal) = stop_pair();
        assert!(!handle.is_requested());
        assert!(handle.request());
        assert!(handle.is_requested());
        assert!(!handle.request());
        assert!(signal.rx.await.is_ok());
    }

    #[tokio::test]
    async fn dropped_handle_releases_signal() {
        let (handle, signal) = stop_pair();
        drop(handle);
        assert!(signal.rx.await.is_err());
    }
}
