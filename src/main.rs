use std::sync::Arc;
use std::time::Duration;

use tango_backend::config::Config;
use tango_backend::logging::{self, LogSettings};
use tango_backend::services::notion::{NotionClient, NotionConfig, PageSource};
use tango_backend::services::vocab::VocabFetcher;
use tango_backend::state::AppState;

const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&LogSettings::from_env(&config.log_level));

    let source = NotionClient::from_config(NotionConfig::from_env())
        .map(|client| Arc::new(client) as Arc<dyn PageSource>);
    if source.is_none() {
        tracing::warn!("notion source unavailable, serving fallback vocabulary");
    }
    let fetcher = VocabFetcher::from_env(source);

    let store = tango_backend::open_store(&config);
    let addr = config.bind_addr();
    let state = AppState::new(config, fetcher, store);
    let sessions = state.sessions().clone();
    let sweeper = (!state.config().session_idle.is_zero())
        .then(|| sessions.spawn_idle_sweeper(SESSION_SWEEP_EVERY));
    let app = tango_backend::create_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "bind listener failed");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "tango-backend listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!(active = sessions.len(), "HTTP server stopped, dropping sessions");
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    sessions.shutdown();
    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
