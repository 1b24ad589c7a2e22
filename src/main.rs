use recruitment_pass::{
    config::{get_config, init_config, LogFormat},
    database::{memory::InMemoryStore, pool::create_pool, postgres::PgStore, store::PassStore},
    routes, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config()?;
    init_tracing(config.log_format);

    let store: Arc<dyn PassStore> = if config.database_url.is_some() {
        let pool = create_pool(config).await?;
        let store = PgStore::new(pool);
        store.migrate().await?;
        info!("Using Postgres store");
        Arc::new(store)
    } else {
        tracing::warn!("DATABASE_URL is not set; state lives in memory and is lost on restart");
        Arc::new(InMemoryStore::new())
    };

    let app_state = AppState::new(store, &config.jwt_secret, config.pass_activity_limit);

    let app = routes::router(app_state)
        .layer(tower_http::timeout::TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
