//! Periodic self-ping
//!
//! Free hosting tiers suspend idle services; pinging a public URL on an
//! interval keeps the instance warm.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::KeepAliveConfig;

/// Extra wait after a failed ping
const ERROR_BACKOFF: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Spawn the ping loop. Returns `None` when no URL is configured.
pub fn spawn(config: KeepAliveConfig) -> Option<JoinHandle<()>> {
    let url = config.url?;
    let interval = Duration::from_secs(config.interval_secs.max(1));

    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build keep-alive client: {}", e);
            return None;
        }
    };

    tracing::info!(url = %url, interval_secs = interval.as_secs(), "Keep-alive enabled");

    Some(tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            match ping(&client, &url).await {
                Ok(status) if is_healthy(status) => tracing::info!(status, "Keep-alive ping"),
                Ok(status) => tracing::warn!(status, "Keep-alive ping returned unexpected status"),
                Err(e) => {
                    tracing::warn!(error = %e, "Keep-alive ping failed");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }))
}

fn is_healthy(status: u16) -> bool {
    status == 200
}

async fn ping(client: &reqwest::Client, url: &str) -> Result<u16, reqwest::Error> {
    let response = client.get(url).send().await?;
    Ok(response.status().as_u16())
}
