//! Property-based tests for the cache key hash and the request parser.

use cacheproxy::{cache_key, parse_request};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_cache_key_deterministic(
        host in "[a-z]{3,10}\\.(com|org|net)",
        path in "/[a-z0-9/]{1,50}"
    ) {
        let key1 = cache_key(&host, &path);
        let key2 = cache_key(&host, &path);
        prop_assert_eq!(key1, key2);
    }
}

proptest! {
    #[test]
    fn prop_cache_key_sensitive_to_host(
        host1 in "[a-z]{3,10}\\.(com|org|net)",
        host2 in "[a-z]{3,10}\\.(com|org|net)",
        path in "/[a-z0-9/]{1,50}"
    ) {
        prop_assume!(host1 != host2);
        let key1 = cache_key(&host1, &path);
        let key2 = cache_key(&host2, &path);
        prop_assert_ne!(key1, key2);
    }
}

proptest! {
    #[test]
    fn prop_cache_key_sensitive_to_path(
        host in "[a-z]{3,10}\\.(com|org|net)",
        path1 in "/[a-z0-9/]{1,50}",
        path2 in "/[a-z0-9/]{1,50}"
    ) {
        prop_assume!(path1 != path2);
        let key1 = cache_key(&host, &path1);
        let key2 = cache_key(&host, &path2);
        prop_assert_ne!(key1, key2);
    }
}

proptest! {
    #[test]
    fn prop_absolute_uri_get_always_parses_host_and_path(
        host in "[a-z]{3,10}\\.(com|org|net)",
        path in "/[a-z0-9/]{1,20}"
    ) {
        let line = format!("GET http://{host}{path} HTTP/1.1\r\nHost: {host}\r\n\r\n");
        let parsed = parse_request(line.as_bytes()).expect("well-formed absolute-URI GET must parse");
        prop_assert_eq!(parsed.host, host);
        prop_assert_eq!(parsed.path, path);
        prop_assert_eq!(parsed.method, "GET");
    }
}

proptest! {
    #[test]
    fn prop_connect_always_parses_host_and_port(
        host in "[a-z]{3,10}\\.(com|org|net)",
        port in 1u16..=65535u16
    ) {
        let line = format!("CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n\r\n");
        let parsed = parse_request(line.as_bytes()).expect("well-formed CONNECT must parse");
        prop_assert_eq!(parsed.method, "CONNECT");
        prop_assert_eq!(parsed.host, host);
        prop_assert_eq!(parsed.port, Some(port));
    }
}
