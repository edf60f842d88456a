//! Status shown in the top banner: wall clock and network connectivity.
//!
//! Connectivity is probed on a tokio task and published through a
//! `watch` channel; the UI only ever reads the latest value.

use chrono::{DateTime, TimeZone};
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// `HH:MM` for the banner clock
pub fn clock_text<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%H:%M").to_string()
}

/// Whether `addr` is a routable local address
pub fn is_connected_addr(addr: IpAddr) -> bool {
    !addr.is_loopback() && !addr.is_unspecified()
}

/// Asks the OS which local address it would route `target` from. Connecting a
/// UDP socket sends nothing; it only selects a route.
pub async fn probe_network(target: &str) -> bool {
    let probe = async {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(target).await?;
        socket.local_addr()
    };

    match probe.await {
        Ok(local) => is_connected_addr(local.ip()),
        Err(e) => {
            debug!("Network probe towards {} failed: {}", target, e);
            false
        }
    }
}

/// Background task publishing connectivity every poll interval
#[derive(Debug)]
pub struct NetworkMonitor {
    receiver: watch::Receiver<bool>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    /// Probes towards `target` every `poll`. Must be called from inside a
    /// tokio runtime.
    pub fn spawn(poll: Duration, target: String) -> Self {
        Self::spawn_with(poll, move || {
            let target = target.clone();
            async move { probe_network(&target).await }
        })
    }

    pub fn spawn_with<F, Fut>(poll: Duration, probe: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(false);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        info!("Starting network monitor with interval: {:?}", poll);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let connected = probe().await;
                sender.send_if_modified(|current| {
                    if *current == connected {
                        return false;
                    }
                    info!(
                        "Network {}",
                        if connected { "connected" } else { "disconnected" }
                    );
                    *current = connected;
                    true
                });
            }
            debug!("Network monitor stopped");
        });

        Self {
            receiver,
            cancel,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.receiver.clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Cancels the task and waits for it to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            debug!("Network monitor task ended abnormally: {}", e);
        }
    }
}
