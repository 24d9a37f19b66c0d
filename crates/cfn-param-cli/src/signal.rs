use std::time::Duration;

use tokio::sync::watch;
use tracing::warn;

/// Spawn the cancellation source for a run: Ctrl-C, or `timeout` elapsing
/// when one is given. The returned receiver flips to `true` once either fires.
pub fn cancellation(timeout: Option<Duration>) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => warn!("interrupted, no longer waiting for the stack update"),
                Err(e) => {
                    warn!("cannot listen for Ctrl-C: {e}");
                    deadline(timeout).await;
                    warn!("timed out waiting for the stack update");
                }
            },
            _ = deadline(timeout) => warn!("timed out waiting for the stack update"),
        }
        let _ = tx.send(true);
    });
    rx
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeout_flips_the_flag() {
        let mut rx = cancellation(Some(Duration::from_secs(90)));
        assert!(!*rx.borrow());
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
