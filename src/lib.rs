pub mod api;
pub mod auth;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

use std::sync::Arc;

use auth::{CredentialHasher, TokenService};

pub use api::routes;
pub use model::*;
pub use store::{MemoryStore, PostgresStore, Store};

/// State shared by every handler: the connection-pool handle plus the
/// authentication collaborators.
pub struct App<S: Store> {
    pub store: S,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: TokenService,
}

impl<S: Store> App<S> {
    pub fn new(store: S, hasher: Arc<dyn CredentialHasher>, tokens: TokenService) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }
}

/// Builds the router for a store, ready to be served.
pub fn app_router<S: Store>(app: App<S>) -> axum::Router {
    api::routes::create_router::<S>().with_state(Arc::new(app))
}

/// Loads configuration, opens the configured backend and serves until the
/// listener fails.
pub async fn run_server() -> anyhow::Result<()> {
    use log::{info, warn};

    let config = config::AppConfig::load()?;
    let hasher: Arc<dyn CredentialHasher> = Arc::new(auth::Argon2Hasher::default());
    let tokens = TokenService::new(&config.auth.secret, config.auth.token_ttl_minutes);
    let load_seed = std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true";

    if config.database.in_memory {
        info!("Using the in-memory store");
        let store = MemoryStore::new();
        if load_seed {
            seed::load_seed_data(&store, hasher.as_ref()).await?;
        }
        return serve(App::new(store, hasher, tokens), &config).await;
    }

    if config.auth.uses_default_secret() {
        warn!("Signing tokens with the default secret; set ECOGRAM__AUTH__SECRET");
    }

    info!("Connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let store = PostgresStore::new(&database_url, config.max_connections()).await?;

    info!("Running database migrations...");
    store.migrate().await?;

    if load_seed {
        info!("Loading seed data...");
        seed::load_seed_data(&store, hasher.as_ref()).await?;
    }

    serve(App::new(store, hasher, tokens), &config).await
}

async fn serve<S: Store>(app: App<S>, config: &config::AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("ecogram listening on http://{}", bind_address);

    axum::serve(listener, app_router(app)).await?;

    Ok(())
}
