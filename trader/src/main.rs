use anyhow::Result;
use engine::controller::Controller;
use engine::data::{CandleAggregator, CandleStore, InMemoryStore, SignalStore};
use engine::exchange::ExchangeClient;
use engine::ingest::run_ingestion;
use migration::{Migrator, MigratorTrait};
use shared::{get_db_connection, Config, SeaOrmStore};
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod bitflyer;

use bitflyer::BitflyerClient;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = env!("GIT_HASH"), "Starting trader...");

    let config = Config::from_env()?;
    let trading = config.trading();
    info!(
        product_code = %trading.product_code,
        trade_duration = %trading.trade_duration,
        back_test = trading.back_test,
        "configuration loaded"
    );

    let (candles, signals): (Arc<dyn CandleStore>, Arc<dyn SignalStore>) = if trading.back_test {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), store)
    } else {
        let db = get_db_connection(&config.database_url).await?;
        Migrator::up(&db, None).await?;
        info!("Connected to database, migrations applied");
        let store = Arc::new(SeaOrmStore::new(db));
        (store.clone(), store)
    };

    let exchange: Arc<dyn ExchangeClient> =
        Arc::new(BitflyerClient::new(&config.bitflyer_api_key, &config.bitflyer_api_secret));

    let controller = Arc::new(Controller::new(trading.clone(), exchange.clone(), candles.clone(), signals));
    controller.bootstrap().await?;
    info!(params = ?controller.current_params(), "controller ready");

    let ticks = exchange.stream_ticks(&trading.product_code).await?;
    let ingestion = tokio::spawn(run_ingestion(
        ticks,
        CandleAggregator::new(candles.clone()),
        controller.clone(),
    ));

    let app = api::router(api::AppState { controller, candles });
    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    tokio::select! {
        served = axum::serve(listener, app).into_future() => served?,
        _ = ingestion => info!("tick ingestion stopped"),
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}
