use anyhow::Context;
use batepapo::{app, clock::SystemClock, config::Config, db, logging, sweep::Sweeper, AppState};
use tokio::{net::TcpListener, signal, sync::watch};

fn main() -> anyhow::Result<()> {
    // must be read while still single-threaded
    let clock = SystemClock::local();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?
        .block_on(serve(clock))
}

async fn serve(clock: SystemClock) -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env()?;

    let db_pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;
    db::migrate(&db_pool).await.context("creating tables")?;

    let app_state = AppState::new(db_pool, clock);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = Sweeper::new(app_state.db_pool.clone(), app_state.clock.clone(), config.sweep.clone())
        .spawn(shutdown_rx);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    tracing::info!(
        address = %config.bind_address,
        sweep_interval = ?config.sweep.interval,
        inactivity_window = ?config.sweep.inactivity_window,
        "listening"
    );

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    sweeper.await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
