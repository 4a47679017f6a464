//! Fail-soft proxy lookup.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

/// Response shape of the proxy list API.
#[derive(Debug, Deserialize)]
struct ProxyEntry {
    ip: String,
    port: u16,
}

fn proxy_url(ip: &str, port: u16) -> String {
    format!("http://{ip}:{port}")
}

/// Fetch a proxy address from `api_url`.
///
/// Any failure (network, status, parse) yields `None`; downloads proceed
/// without a proxy in that case.
pub async fn fetch_proxy(api_url: &str) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .ok()?;

    let response = match client.get(api_url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "Proxy lookup failed, proceeding without proxy");
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(status = %response.status(), "Proxy API returned an error status");
        return None;
    }

    match response.json::<ProxyEntry>().await {
        Ok(entry) => {
            let proxy = proxy_url(&entry.ip, entry.port);
            debug!(proxy = %proxy, "Using proxy for download");
            Some(proxy)
        }
        Err(e) => {
            warn!(error = %e, "Proxy API response was not parseable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_url_format() {
        assert_eq!(proxy_url("10.0.0.1", 8080), "http://10.0.0.1:8080");
    }

    #[test]
    fn test_proxy_entry_parsing() {
        let entry: ProxyEntry =
            serde_json::from_str(r#"{"ip": "10.0.0.1", "port": 3128}"#).unwrap();
        assert_eq!(entry.ip, "10.0.0.1");
        assert_eq!(entry.port, 3128);
    }
}
