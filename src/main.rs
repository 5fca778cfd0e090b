//! Binary entry point: load configuration and the blacklist, open the log
//! sink, and run the proxy until a shutdown signal arrives.

use cacheproxy::{config::ProxyConfig, server, Blacklist};

const CONFIG_PATH: &str = "proxy.conf";
const BLACKLIST_PATH: &str = "blacklist.txt";
const LOG_PATH: &str = "proxy.log";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = cacheproxy::logging::init(LOG_PATH) {
        eprintln!("fatal: failed to open log file '{LOG_PATH}': {e}");
        std::process::exit(1);
    }

    let config = ProxyConfig::load(CONFIG_PATH);
    let blacklist = Blacklist::load(BLACKLIST_PATH);

    if let Err(e) = server::run(config, blacklist).await {
        tracing::error!(error = %e, "fatal: failed to start server");
        std::process::exit(1);
    }
}
