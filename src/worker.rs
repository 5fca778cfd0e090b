//! Worker pool: a fixed set of tasks draining the task queue.
//!
//! Each worker owns no per-request state; the cache, blacklist, config, and
//! running flag are handed in as cloned handles at spawn time (the
//! "pass explicit context" alternative to process-global state that §9
//! prefers for implementations whose idiom discourages globals).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::blacklist::Blacklist;
use crate::cache::ProxyCache;
use crate::fetch::serve_get;
use crate::parser::{parse_request, ParseError};
use crate::queue::TaskReceiver;
use crate::tunnel::serve_connect;

const MAX_REQUEST_LINE: usize = 8192;
const FORBIDDEN: &[u8] = b"HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n";

/// Shared, read-mostly state every worker needs to service a connection.
#[derive(Clone)]
pub struct SharedState {
    pub cache: ProxyCache,
    pub blacklist: Arc<Blacklist>,
    pub running: Arc<AtomicBool>,
}

/// Runs one worker's service loop: dequeue, handle, close, repeat; exits
/// once the queue reports shutdown.
pub async fn run(receiver: Arc<TaskReceiver>, state: SharedState) {
    while let Some(mut stream) = receiver.dequeue().await {
        handle_client(&mut stream, &state).await;
        // `stream` drops here, closing the socket.
    }
}

async fn handle_client(stream: &mut TcpStream, state: &SharedState) {
    let mut buffer = [0u8; MAX_REQUEST_LINE];
    let n = match read_request_line(stream, &mut buffer).await {
        Some(n) => n,
        None => return,
    };

    let req = match parse_request(&buffer[..n]) {
        Ok(req) => req,
        Err(ParseError::Malformed) => {
            tracing::error!("malformed request, closing connection");
            return;
        }
        Err(ParseError::Unsupported) => {
            tracing::error!("unsupported method, closing connection");
            return;
        }
    };

    if state.blacklist.is_blacklisted(&req.host) {
        tracing::warn!(host = %req.host, "blocked blacklisted host");
        use tokio::io::AsyncWriteExt;
        let _ = stream.write_all(FORBIDDEN).await;
        return;
    }

    if req.method == "CONNECT" {
        serve_connect(stream, &req, &state.running).await;
    } else {
        serve_get(stream, &state.cache, &req).await;
    }
}

/// Reads until a full request line (through the trailing CRLF) has arrived
/// or the buffer fills, whichever comes first. The parser only needs the
/// first line; remaining header bytes in the buffer are ignored.
async fn read_request_line(stream: &mut TcpStream, buffer: &mut [u8]) -> Option<usize> {
    use tokio::io::AsyncReadExt;
    let mut total = 0;
    loop {
        if total >= buffer.len() {
            return Some(total);
        }
        match stream.read(&mut buffer[total..]).await {
            Ok(0) => return if total == 0 { None } else { Some(total) },
            Ok(n) => {
                total += n;
                if buffer[..total].contains(&b'\n') {
                    return Some(total);
                }
            }
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use std::sync::atomic::AtomicBool;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn state() -> SharedState {
        SharedState {
            cache: ProxyCache::new(1_000_000, 500_000),
            blacklist: Arc::new(Blacklist::new(vec!["ads.example".to_string()])),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    #[tokio::test]
    async fn blacklisted_host_gets_403_and_no_origin_contact() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = state();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            handle_client(&mut sock, &state).await;
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET http://ads.example.com/x HTTP/1.0\r\n\r\n")
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        let mut resp = Vec::new();
        client.read_to_end(&mut resp).await.unwrap();
        server.await.unwrap();

        assert_eq!(resp, FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_request_closes_without_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = state();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            handle_client(&mut sock, &state).await;
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"GARBAGE\r\n\r\n").await.unwrap();
        client.shutdown().await.unwrap();

        let mut resp = Vec::new();
        client.read_to_end(&mut resp).await.unwrap();
        server.await.unwrap();

        assert!(resp.is_empty());
    }

    #[tokio::test]
    async fn worker_exits_when_queue_closes() {
        let (tx, rx) = queue::channel(1);
        let rx = Arc::new(rx);
        drop(tx);
        // Should return promptly, not hang, once the queue is closed+drained.
        run(rx, state()).await;
    }

    #[tokio::test]
    async fn worker_dispatches_queued_connection_and_loops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = queue::channel(4);
        let rx = Arc::new(rx);
        let worker_state = state();

        let worker = tokio::spawn(run(rx, worker_state));

        let mut client = TcpStream::connect(addr).await.unwrap();
        let (accepted, _) = listener.accept().await.unwrap();
        tx.enqueue(accepted).await.unwrap();

        client
            .write_all(b"GET http://ads.example.com/x HTTP/1.0\r\n\r\n")
            .await
            .unwrap();
        let mut resp = vec![0u8; FORBIDDEN.len()];
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(resp, FORBIDDEN);

        drop(tx);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn empty_connection_is_dropped_without_panicking() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = state();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            handle_client(&mut sock, &state).await;
        });

        let client = TcpStream::connect(addr).await.unwrap();
        drop(client);
        server.await.unwrap();
    }
}
