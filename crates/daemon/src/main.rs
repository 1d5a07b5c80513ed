use slog::{debug, error, info, Logger};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::{signal, time::sleep};
use weather_daemon::{
    get_config_info, send_observations, setup_logger, wait_until_next_run, Cli,
    ObservationService, XmlFetcher,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info();
    let logger = setup_logger(&cli);

    // rejects an ingest minute outside 0..=59
    wait_until_next_run(OffsetDateTime::now_utc(), cli.ingest_minute())?;

    info!(logger, "Weather daemon starting...");
    info!(logger, "  Server URL: {}", cli.server_url());
    info!(logger, "  Source URL: {}", cli.source_url());
    info!(logger, "  Stations: {}", cli.stations().join(", "));
    info!(logger, "  Runs at minute {} of every hour (UTC)", cli.ingest_minute());

    tokio::select! {
        _ = process_weather_data_hourly(cli, logger.clone()) => {},
        _ = signal::ctrl_c() => info!(logger, "shutting down"),
    }
    Ok(())
}

async fn process_weather_data_hourly(cli: Cli, logger: Logger) {
    let fetcher = Arc::new(XmlFetcher::new(logger.clone(), cli.user_agent()));
    let observation_service = ObservationService::new(logger.clone(), fetcher);

    loop {
        let wait = match wait_until_next_run(OffsetDateTime::now_utc(), cli.ingest_minute()) {
            Ok(wait) => wait,
            Err(err) => {
                error!(logger, "cannot schedule next run: {}", err);
                return;
            }
        };
        debug!(logger, "next run in {} seconds", wait.as_secs());
        sleep(wait).await;

        match process_data(&cli, &logger, &observation_service).await {
            Ok(stored) => info!(logger, "Finished processing data, {} observations stored", stored),
            Err(err) => error!(&logger, "Error processing data: {}", err),
        }
    }
}

async fn process_data(
    cli: &Cli,
    logger: &Logger,
    observation_service: &ObservationService,
) -> Result<u64, anyhow::Error> {
    let observations = observation_service
        .get_observations(&cli.source_url(), &cli.stations())
        .await?;
    debug!(logger, "observations count: {}", observations.len());

    send_observations(cli, logger, &observations).await
}
