//! Pelada Back binary entrypoint wiring the REST layer to the selected match store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pelada_back::{
    config::AppConfig,
    dao::match_store::memory::MemoryMatchStore,
    routes,
    state::{AppState, SharedState},
};
#[cfg(any(feature = "mongo-store", feature = "couch-store"))]
use pelada_back::{
    dao::{match_store::MatchStore, storage::StorageError},
    services::storage_supervisor,
};

const STORE_ENV: &str = "PELADA_STORE";

/// Storage backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Memory,
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
}

impl StoreKind {
    fn from_env() -> anyhow::Result<Self> {
        match env::var(STORE_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::parse(value.trim()),
            _ => Ok(Self::default()),
        }
    }

    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            #[cfg(feature = "mongo-store")]
            "mongo" | "mongodb" => Ok(Self::Mongo),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Ok(Self::Couch),
            other => bail!("unsupported {STORE_ENV} value `{other}` for this build"),
        }
    }
}

impl Default for StoreKind {
    fn default() -> Self {
        #[cfg(feature = "mongo-store")]
        return Self::Mongo;
        #[cfg(all(not(feature = "mongo-store"), feature = "couch-store"))]
        return Self::Couch;
        #[cfg(not(any(feature = "mongo-store", feature = "couch-store")))]
        return Self::Memory;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store_kind = StoreKind::from_env()?;
    let app_state = AppState::new(config);

    info!(store = ?store_kind, "selecting match store");
    match store_kind {
        StoreKind::Memory => {
            app_state
                .set_match_store(Arc::new(MemoryMatchStore::new()))
                .await;
        }
        #[cfg(feature = "mongo-store")]
        StoreKind::Mongo => {
            tokio::spawn(storage_supervisor::run(app_state.clone(), connect_mongo));
        }
        #[cfg(feature = "couch-store")]
        StoreKind::Couch => {
            tokio::spawn(storage_supervisor::run(app_state.clone(), connect_couch));
        }
    }

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo() -> Result<Arc<dyn MatchStore>, StorageError> {
    use pelada_back::dao::match_store::mongodb::{MongoConfig, MongoMatchStore};

    let config = MongoConfig::from_env().await?;
    let store = MongoMatchStore::connect(config).await?;
    Ok(Arc::new(store))
}

#[cfg(feature = "couch-store")]
async fn connect_couch() -> Result<Arc<dyn MatchStore>, StorageError> {
    use pelada_back::dao::match_store::couchdb::{CouchConfig, CouchMatchStore};

    let config = CouchConfig::from_env()?;
    let store = CouchMatchStore::connect(config).await?;
    Ok(Arc::new(store))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
