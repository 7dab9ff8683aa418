// src/main.rs
use anyhow::{Context, Result};
use dotenvy::dotenv;
use machina::config::{AppConfig, Mode};
use machina::connectors::api::ApiClient;
use machina::connectors::traits::Trader;
use machina::core::budget::FixedBudget;
use machina::core::engine::Strategy;
use machina::pullers::{ApiPuller, FilePuller, PullerKind};
use machina::strategies::MovingAverageRule;
use machina::telemetry;
use machina::traders::{ApiTrader, BacktestTrader, TraderKind};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = AppConfig::new().context("loading configuration")?;
    let _guard = telemetry::init(&config.log)?;
    config.validate()?;

    let s = &config.strategy;
    info!(
        mode = ?config.mode,
        symbol = %s.symbol,
        interval = %s.interval,
        fast = s.window_fast,
        slow = s.window_slow,
        "machina : starting"
    );

    let (puller, trader) = build(&config).await?;
    let rule = MovingAverageRule::new(s.window_fast, s.window_slow, s.window_warming as usize);
    let mut strategy = Strategy::new(rule);

    let (stop_tx, stop) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("machina : ctrl-c received, shutting down");
                let _ = stop_tx.send(());
            }
            Err(e) => {
                // without a signal handler we rely on the tasks ending on their own
                error!(error = %e, "machina : unable to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
    });

    match strategy.run(stop, puller, trader).await {
        Ok(trader) => {
            let profit = trader.profit().await;
            info!(profit, "machina : profit to date");
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "machina : strategy failed");
            Err(e)
        }
    }
}

async fn build(config: &AppConfig) -> Result<(PullerKind, TraderKind)> {
    let pair = config.trading_pair();
    let s = &config.strategy;
    let budget = Box::new(FixedBudget::new(s.base, s.alt, s.lot));

    let client = if config.mode.uses_api() {
        let mut client = ApiClient::new(
            &config.api.endpoint,
            &config.api.username,
            &config.api.password,
            config.request_timeout(),
        )?;
        client
            .authenticate()
            .await
            .context("unable to authenticate against the api")?;
        Some(Arc::new(client))
    } else {
        None
    };

    let file_puller = || -> Result<PullerKind> {
        let path = config
            .puller
            .replay_file
            .clone()
            .context("puller.replay_file is not set")?;
        Ok(PullerKind::File(FilePuller::new(path, pair.clone())))
    };

    Ok(match (config.mode, client) {
        (Mode::Live, Some(client)) => (
            PullerKind::Api(ApiPuller::new(
                client.clone(),
                pair.clone(),
                config.poll_interval()?,
                config.fetch_timeout()?,
            )),
            TraderKind::Api(ApiTrader::new(client, budget)),
        ),
        (Mode::Replay, Some(client)) => (file_puller()?, TraderKind::Api(ApiTrader::new(client, budget))),
        (Mode::Backtest, _) => (
            file_puller()?,
            TraderKind::Backtest(BacktestTrader::new(budget, config.idle_timeout())),
        ),
        (mode, None) => anyhow::bail!("{mode:?} mode needs an api client"),
    })
}
