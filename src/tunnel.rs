//! CONNECT tunnel: opaque bidirectional relay between client and origin.
//!
//! The reference C server relays with a single thread blocked in
//! `select(2)` over both file descriptors. `tokio::select!` over both
//! sockets' read halves is the direct async analog: one task, readiness
//! multiplexed, no inspection of the bytes in either direction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::parser::ParsedRequest;

const DEFAULT_HTTPS_PORT: u16 = 443;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(60);
const RELAY_BUF_SIZE: usize = 8192;

const ESTABLISHED: &[u8] = b"HTTP/1.1 200 Connection established\r\n\r\n";

/// Services a parsed `CONNECT` request: connects to the origin, replies
/// 200, then relays bytes verbatim until either side closes, an
/// unrecoverable I/O error occurs, or `running` flips to `false`.
pub async fn serve_connect(client: &mut TcpStream, req: &ParsedRequest, running: &Arc<AtomicBool>) {
    let port = req.port.unwrap_or(DEFAULT_HTTPS_PORT);

    let origin = match timeout(CONNECT_TIMEOUT, TcpStream::connect((req.host.as_str(), port))).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::error!(host = %req.host, port, error = %e, "failed to connect to origin for CONNECT");
            return;
        }
        Err(_) => {
            tracing::error!(host = %req.host, port, "timed out connecting to origin for CONNECT");
            return;
        }
    };

    if let Err(e) = client.write_all(ESTABLISHED).await {
        tracing::error!(error = %e, "failed to send 200 Connection established");
        return;
    }

    tracing::info!(host = %req.host, port, "tunnel established");
    relay(client, origin, running).await;
    tracing::info!(host = %req.host, port, "tunnel closed");
}

async fn relay(client: &mut TcpStream, mut origin: TcpStream, running: &Arc<AtomicBool>) {
    let (mut client_read, mut client_write) = client.split();
    let (mut origin_read, mut origin_write) = origin.split();

    let mut client_buf = [0u8; RELAY_BUF_SIZE];
    let mut origin_buf = [0u8; RELAY_BUF_SIZE];

    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            result = client_read.read(&mut client_buf) => {
                match result {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if origin_write.write_all(&client_buf[..n]).await.is_err() {
                            break;
                        }
                    }
                }
            }
            result = origin_read.read(&mut origin_buf) => {
                match result {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if client_write.write_all(&origin_buf[..n]).await.is_err() {
                            break;
                        }
                    }
                }
            }
            _ = tokio::time::sleep(LIVENESS_TIMEOUT) => {
                // Pure liveness probe: loop back around to re-check `running`.
                continue;
            }
        }
    }
}
