use tokio::sync::watch;

/// Cancels every [`CancelToken`] created alongside it.
#[derive(Debug)]
pub struct CancelHandle {
  tx: watch::Sender<bool>,
}

/// Signal threaded into a load so its fetch can be abandoned.
#[derive(Debug, Clone)]
pub struct CancelToken {
  rx: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
  let (tx, rx) = watch::channel(false);
  (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
  pub fn cancel(&self) {
    self.tx.send_replace(true);
  }
}

impl CancelToken {
  /// A token that is never cancelled.
  #[cfg(test)]
  pub fn never() -> Self {
    let (_, rx) = watch::channel(false);
    Self { rx }
  }

  pub fn is_cancelled(&self) -> bool {
    *self.rx.borrow()
  }

  /// Resolves once cancelled. Never resolves if the handle was dropped
  /// without cancelling.
  pub async fn cancelled(&self) {
    let mut rx = self.rx.clone();
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
      std::future::pending::<()>().await;
    }
  }
}
