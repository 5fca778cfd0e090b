//! Acceptor and process lifecycle: bind, spawn workers, accept loop,
//! graceful shutdown on `SIGINT`/`SIGTERM`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};

use crate::blacklist::Blacklist;
use crate::cache::ProxyCache;
use crate::config::ProxyConfig;
use crate::queue;
use crate::worker::{self, SharedState};

/// Runs the proxy to completion: binds the listener, spawns the worker
/// pool, accepts connections until a shutdown signal arrives, then drains
/// and joins every worker before returning.
///
/// Bind/listen failure is the one process-fatal condition this function
/// surfaces to the caller (§7); everything else is handled internally.
pub async fn run(config: ProxyConfig, blacklist: Blacklist) -> std::io::Result<()> {
    let cache = ProxyCache::new(config.cache_size_bytes, config.element_size_bytes);
    let blacklist = Arc::new(blacklist);
    let running = Arc::new(AtomicBool::new(true));

    let (sender, receiver) = queue::channel(config.max_clients);
    let receiver = Arc::new(receiver);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(
        port = config.port,
        threads = config.threads,
        cache_mb = config.cache_size_bytes / (1024 * 1024),
        "proxy server listening"
    );

    let mut workers = Vec::with_capacity(config.threads);
    for _ in 0..config.threads {
        let state = SharedState {
            cache: cache.clone(),
            blacklist: blacklist.clone(),
            running: running.clone(),
        };
        let receiver = receiver.clone();
        workers.push(tokio::spawn(worker::run(receiver, state)));
    }

    accept_loop(listener, sender, &running).await;

    tracing::info!("shutting down: draining worker pool");
    for worker in workers {
        let _ = worker.await;
    }
    tracing::info!("server shut down cleanly");

    Ok(())
}

async fn accept_loop(
    listener: TcpListener,
    sender: queue::TaskSender,
    running: &Arc<AtomicBool>,
) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, initiating graceful shutdown");
                break;
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, initiating graceful shutdown");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        if sender.enqueue(stream).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                }
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    sender.close();
}
