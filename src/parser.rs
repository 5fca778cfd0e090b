//! Proxy-form request line parsing.
//!
//! Unlike a normal HTTP server, a forward proxy receives request lines whose
//! target is either an absolute URI (`GET http://host/path HTTP/1.0`) or an
//! authority (`CONNECT host:port HTTP/1.1`). `httparse` expects the former
//! server-side grammar (`GET /path HTTP/1.1` plus a `Host:` header), so the
//! proxy-form grammar is parsed by hand here, following the original C
//! parser's token-splitting approach.

use std::fmt;

/// A proxy-form request, parsed from the first CRLF-terminated line of a
/// client connection. Header and body bytes are not inspected by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: String,
    pub version: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer than three tokens on the request line, or an empty host/port.
    Malformed,
    /// A method other than `GET` or `CONNECT`.
    Unsupported,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Malformed => write!(f, "malformed request line"),
            ParseError::Unsupported => write!(f, "unsupported method"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses the first line of `data` into a [`ParsedRequest`].
///
/// Only `GET` (absolute-URI form) and `CONNECT` (authority form) are
/// recognized; every other method is [`ParseError::Unsupported`].
pub fn parse_request(data: &[u8]) -> Result<ParsedRequest, ParseError> {
    let first_line = first_line(data);
    let line = std::str::from_utf8(first_line).map_err(|_| ParseError::Malformed)?;

    let mut tokens = line.split_whitespace();
    let method = tokens.next().ok_or(ParseError::Malformed)?;
    let uri = tokens.next().ok_or(ParseError::Malformed)?;
    let version = tokens.next().ok_or(ParseError::Malformed)?;

    match method {
        "CONNECT" => parse_connect(uri, version),
        "GET" => parse_get(uri, version),
        _ => Err(ParseError::Unsupported),
    }
}

fn first_line(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(idx) => &data[..idx],
        None => data,
    }
}

fn parse_connect(uri: &str, version: &str) -> Result<ParsedRequest, ParseError> {
    let colon = uri.rfind(':').ok_or(ParseError::Malformed)?;
    let (host, port_str) = (&uri[..colon], &uri[colon + 1..]);
    if host.is_empty() || port_str.is_empty() {
        return Err(ParseError::Malformed);
    }
    let port = port_str.parse::<u16>().map_err(|_| ParseError::Malformed)?;

    Ok(ParsedRequest {
        method: "CONNECT".to_string(),
        version: version.to_string(),
        host: host.to_string(),
        port: Some(port),
        path: String::new(),
    })
}

fn parse_get(uri: &str, version: &str) -> Result<ParsedRequest, ParseError> {
    let rest = match uri.find("://") {
        Some(idx) => &uri[idx + 3..],
        None => uri,
    };

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.find(':') {
        Some(idx) => {
            let host = &authority[..idx];
            let port = authority[idx + 1..]
                .parse::<u16>()
                .map_err(|_| ParseError::Malformed)?;
            (host, Some(port))
        }
        None => (authority, None),
    };

    if host.is_empty() {
        return Err(ParseError::Malformed);
    }

    Ok(ParsedRequest {
        method: "GET".to_string(),
        version: version.to_string(),
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

/// Reconstructs the simplified origin request line + headers forwarded
/// for a `GET`, per the proxy's fixed "drop all client headers" contract.
pub fn format_origin_request(req: &ParsedRequest) -> String {
    format!(
        "GET {} {}\r\nHost: {}\r\nConnection: close\r\n\r\n",
        req.path, req.version, req.host
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_uri_get() {
        let req = parse_request(b"GET http://example.com/a HTTP/1.0\r\nHost: example.com\r\n\r\n")
            .unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.host, "example.com");
        assert_eq!(req.port, None);
        assert_eq!(req.path, "/a");
        assert_eq!(req.version, "HTTP/1.0");
    }

    #[test]
    fn origin_request_round_trip() {
        let req = parse_request(b"GET http://example.com/a HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(
            format_origin_request(&req),
            "GET /a HTTP/1.0\r\nHost: example.com\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn parses_get_without_scheme() {
        let req = parse_request(b"GET example.com/a HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(req.host, "example.com");
        assert_eq!(req.path, "/a");
    }

    #[test]
    fn parses_get_with_no_path() {
        let req = parse_request(b"GET http://example.com HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(req.path, "/");
    }

    #[test]
    fn parses_get_with_explicit_port() {
        let req = parse_request(b"GET http://example.com:8080/a HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(req.host, "example.com");
        assert_eq!(req.port, Some(8080));
    }

    #[test]
    fn parses_connect() {
        let req = parse_request(b"CONNECT example.com:443 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.method, "CONNECT");
        assert_eq!(req.host, "example.com");
        assert_eq!(req.port, Some(443));
    }

    #[test]
    fn rejects_connect_without_port() {
        assert_eq!(
            parse_request(b"CONNECT example.com HTTP/1.1\r\n\r\n"),
            Err(ParseError::Malformed)
        );
    }

    #[test]
    fn rejects_unsupported_method() {
        assert_eq!(
            parse_request(b"POST / HTTP/1.1\r\n\r\n"),
            Err(ParseError::Unsupported)
        );
    }

    #[test]
    fn rejects_too_few_tokens() {
        assert_eq!(parse_request(b"GET /\r\n\r\n"), Err(ParseError::Malformed));
        assert_eq!(parse_request(b""), Err(ParseError::Malformed));
    }

    #[test]
    fn rejects_empty_host_get() {
        assert_eq!(
            parse_request(b"GET http:///a HTTP/1.0\r\n\r\n"),
            Err(ParseError::Malformed)
        );
    }
}
