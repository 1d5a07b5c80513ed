use anyhow::{anyhow, Error};
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use slog::{debug, info, Logger};
use std::time::Duration;

use crate::{Cli, Observation};

#[derive(Debug, Deserialize)]
struct StoredObservations {
    stored: u64,
}

pub fn observations_url(server_url: &str) -> String {
    format!("{}/weather/observations", server_url.trim_end_matches('/'))
}

/// Posts `observations` to the fee server, returns how many it stored.
pub async fn send_observations(
    cli: &Cli,
    logger: &Logger,
    observations: &[Observation],
) -> Result<u64, Error> {
    if observations.is_empty() {
        info!(logger, "no observations to send");
        return Ok(0);
    }

    let url = observations_url(&cli.server_url());
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
    let client = ClientBuilder::new(Client::builder().user_agent(cli.user_agent()).build()?)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

    debug!(logger, "sending {} observations to {}", observations.len(), url);
    let response = client
        .post(&url)
        .json(observations)
        .timeout(Duration::from_secs(20))
        .send()
        .await
        .map_err(|e| anyhow!("error sending observations: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("server rejected observations: {} {}", status, body));
    }

    let stored: StoredObservations = response
        .json()
        .await
        .map_err(|e| anyhow!("error reading server response: {}", e))?;
    info!(logger, "server stored {} observations", stored.stored);
    Ok(stored.stored)
}
