//! HTTP health checks against a running llama-server.

use std::time::Duration;

use anyhow::{Result, anyhow};
use reqwest::Client;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_PERIOD: Duration = Duration::from_millis(500);

fn client() -> Result<Client> {
    Ok(Client::builder().timeout(PROBE_TIMEOUT).build()?)
}

/// Single probe of `<base_url>/health`. Any non-2xx or network error is
/// reported as unhealthy.
pub async fn check_http_health(base_url: &str) -> Result<bool> {
    let url = format!("{base_url}/health");
    match client()?.get(&url).send().await {
        Ok(response) => Ok(response.status().is_success()),
        Err(e) => {
            debug!(url = %url, error = %e, "Health probe failed");
            Ok(false)
        }
    }
}

/// Poll `<base_url>/health` until it answers 2xx or `timeout` elapses.
pub async fn wait_for_http_health(base_url: &str, timeout: Duration) -> Result<()> {
    let url = format!("{base_url}/health");
    info!("Waiting for llama-server to be ready at {url}");

    let client = client()?;
    let deadline = Instant::now() + timeout;

    loop {
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("llama-server is ready at {base_url}");
                return Ok(());
            }
            // 503 while the model is still loading
            Ok(response) => debug!(status = %response.status(), "Server not ready yet"),
            Err(e) => debug!(error = %e, "Health check failed, retrying"),
        }

        if Instant::now() >= deadline {
            return Err(anyhow!(
                "llama-server failed to become healthy within {}s at {base_url}",
                timeout.as_secs()
            ));
        }
        sleep(POLL_PERIOD).await;
    }
}
