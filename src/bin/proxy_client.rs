//! One-shot diagnostic client: connects through the proxy and fetches a URL.
//!
//! Grounded in `test_client.c`'s usage contract
//! (`<proxy_host> <proxy_port> <url>`), reimplemented as a small async
//! binary rather than a second library surface — it shares no state with
//! the proxy itself and exists purely for manual smoke-testing.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("usage: {} <proxy_host> <proxy_port> <url>", args[0]);
        std::process::exit(1);
    }

    let proxy_host = &args[1];
    let proxy_port = &args[2];
    let url = &args[3];

    let proxy_addr = format!("{proxy_host}:{proxy_port}");
    let mut stream = match TcpStream::connect(&proxy_addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("error: could not connect to proxy {proxy_addr}: {e}");
            std::process::exit(1);
        }
    };

    let is_https = url.starts_with("https://");
    let request = if is_https {
        let authority = url.trim_start_matches("https://");
        let host = authority.split('/').next().unwrap_or(authority);
        let target = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:443")
        };
        format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n\r\n")
    } else {
        format!("GET {url} HTTP/1.0\r\n\r\n")
    };

    if let Err(e) = stream.write_all(request.as_bytes()).await {
        eprintln!("error: failed to send request: {e}");
        std::process::exit(1);
    }

    let mut response = Vec::new();
    if let Err(e) = stream.read_to_end(&mut response).await {
        eprintln!("error: failed to read response: {e}");
        std::process::exit(1);
    }

    print!("{}", String::from_utf8_lossy(&response));
}
