//! HTTP fetch path: cache lookup, or resolve + fetch + stream + cache-fill.
//!
//! Grounded in `handle_http_request` from the reference C server and in the
//! reference crate's `handle_client`: request headers are never forwarded,
//! only a synthesized `GET <path> <version>` with `Host` and
//! `Connection: close`, and the response is cached opaquely.

use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::cache::{cache_key, ProxyCache};
use crate::parser::{format_origin_request, ParsedRequest};

const DEFAULT_HTTP_PORT: u16 = 80;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Services a parsed `GET` request against `client`, consulting and
/// populating `cache` as described in §4.5. All per-connection failures are
/// logged and absorbed here; nothing propagates to the caller.
pub async fn serve_get(client: &mut TcpStream, cache: &ProxyCache, req: &ParsedRequest) {
    if req.host.is_empty() || !req.path.starts_with('/') {
        tracing::error!(host = %req.host, path = %req.path, "incomplete GET request, cannot form cache key");
        return;
    }

    let key = cache_key(&req.host, &req.path);

    if let Some(cached) = cache.get(key).await {
        if let Err(e) = client.write_all(&cached).await {
            tracing::debug!(error = %e, "failed writing cached response to client");
        }
        return;
    }

    let port = req.port.unwrap_or(DEFAULT_HTTP_PORT);
    let origin = match timeout(CONNECT_TIMEOUT, TcpStream::connect((req.host.as_str(), port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::error!(host = %req.host, port, error = %e, "failed to connect to origin");
            return;
        }
        Err(_) => {
            tracing::error!(host = %req.host, port, "timed out connecting to origin");
            return;
        }
    };

    let (mut origin_read, mut origin_write) = origin.into_split();

    let request_line = format_origin_request(req);
    if let Err(e) = origin_write.write_all(request_line.as_bytes()).await {
        tracing::error!(host = %req.host, error = %e, "failed to forward request to origin");
        return;
    }

    stream_and_cache(client, &mut origin_read, key, cache).await;
}

/// Reads the origin's response to EOF, forwarding each chunk to the client
/// immediately and accumulating it (up to `element_size_max`) for caching.
/// A response that exceeds the cap is still forwarded in full but never
/// cached — never caching truncated bytes is the safety property §9 asks
/// implementers to preserve.
async fn stream_and_cache(
    client: &mut TcpStream,
    origin_read: &mut (impl tokio::io::AsyncRead + Unpin),
    key: u64,
    cache: &ProxyCache,
) {
    let element_max = cache.element_size_max();
    let mut accumulated = BytesMut::with_capacity(8192);
    let mut total = 0usize;
    let mut within_cap = true;
    let mut chunk = [0u8; 8192];

    loop {
        let read = timeout(IO_TIMEOUT, origin_read.read(&mut chunk)).await;
        let n = match read {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "error reading from origin");
                break;
            }
            Err(_) => {
                tracing::error!("timed out reading from origin");
                break;
            }
        };

        total += n;
        if let Err(e) = client.write_all(&chunk[..n]).await {
            tracing::debug!(error = %e, "failed forwarding response to client");
            return;
        }

        if within_cap {
            if total > element_max {
                within_cap = false;
                accumulated.clear();
            } else {
                accumulated.extend_from_slice(&chunk[..n]);
            }
        }
    }

    if total > 0 && within_cap {
        cache.put(key, Bytes::from(accumulated)).await;
    }
}
