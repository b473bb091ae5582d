//! Shutdown coordination for the embedded server, programmatic or Ctrl+C driven
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio::sync::watch;

/// Shared shutdown flag for the server task and whoever controls it
#[derive(Clone)]
pub struct ServerRuntime {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle_ctrl_c: Arc<AtomicBool>,
}

impl ServerRuntime {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            shutdown_rx,
            handle_ctrl_c: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Also stop on Ctrl+C (CLI use; embedded servers leave signals to the host)
    pub fn with_ctrl_c(self) -> Self {
        self.handle_ctrl_c.store(true, Ordering::Relaxed);
        self
    }

    /// Receiver to hand to background tasks
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Future for axum's `with_graceful_shutdown()`
    pub fn create_shutdown_future(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let shutdown_tx = self.shutdown_tx.clone();
        let handle_ctrl_c = self.handle_ctrl_c.load(Ordering::Relaxed);

        async move {
            let programmatic = async {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            };

            if handle_ctrl_c {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        log::info!("Shutdown signal (Ctrl+C) received");
                        let _ = shutdown_tx.send(true);
                    }
                    _ = programmatic => {
                        log::debug!("Shutdown requested");
                    }
                }
            } else {
                programmatic.await;
                log::debug!("Shutdown requested");
            }
        }
    }
}

impl Default for ServerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep, timeout};

    #[tokio::test]
    async fn test_programmatic_shutdown() {
        let runtime = ServerRuntime::new();
        let mut rx = runtime.shutdown_signal();

        let rt_clone = runtime.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            rt_clone.trigger_shutdown();
        });

        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(runtime.is_shutdown());
    }

    #[tokio::test]
    async fn test_shutdown_future_resolves_after_trigger() {
        let runtime = ServerRuntime::new();
        let future = runtime.create_shutdown_future();
        runtime.trigger_shutdown();
        timeout(Duration::from_secs(1), future).await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_before_future_is_not_lost() {
        let runtime = ServerRuntime::new();
        runtime.trigger_shutdown();
        let future = runtime.create_shutdown_future();
        timeout(Duration::from_secs(1), future).await.unwrap();
    }
}
