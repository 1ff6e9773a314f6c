use std::{env, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::lib::{
    api::types::EndpointServer,
    config::types::Config,
    metadata::provider::HttpMetadataProvider,
    observer::{
        observer::TaskObserver,
        types::TracingSink,
        watcher::{EndpointsWatcher, LogNotify},
    },
};

mod lib {
    pub mod api;
    pub mod config;
    pub mod metadata;
    pub mod observer;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config);
    debug!("Configuration: {:?}", config);

    config.validate().context("invalid configuration")?;

    let provider =
        HttpMetadataProvider::from_env(config.endpoint.as_deref(), config.request_timeout())
            .context("failed to set up task metadata provider")?;
    info!(url = %provider.task_url(), "watching task metadata");

    let port_labels = config.candidate_port_labels();
    if port_labels.is_empty() {
        warn!("no port labels configured, endpoints will advertise host addresses only");
    }

    let observer = TaskObserver::new(Arc::new(provider), port_labels, Arc::new(TracingSink));
    let watcher = Arc::new(EndpointsWatcher::new(
        Arc::new(observer),
        config.refresh_interval(),
    ));
    let log_subscription = watcher.subscribe(Arc::new(LogNotify)).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut server_task = match config.listen {
        Some(address) => {
            let server = EndpointServer::new(watcher.clone(), address);
            let listener = server
                .bind()
                .await
                .with_context(|| format!("failed to bind listing API on {}", address))?;
            Some(tokio::spawn(
                server.start_server(listener, shutdown_rx.clone()),
            ))
        }
        None => None,
    };

    let watcher_task = tokio::spawn({
        let watcher = watcher.clone();
        let shutdown = shutdown_rx.clone();
        async move { watcher.run(shutdown).await }
    });

    let server_exit = async {
        match server_task.as_mut() {
            Some(handle) => Some(handle.await),
            None => std::future::pending().await,
        }
    };
    let server_exited = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            info!("shutting down");
            None
        }
        exited = server_exit => exited,
    };
    // Receivers may already be gone if a task exited early.
    let _ = shutdown_tx.send(true);

    watcher_task.await.context("watcher task panicked")?;
    watcher.unsubscribe(log_subscription).await;

    match (server_exited, server_task) {
        (Some(exited), _) => {
            exited
                .context("listing server task panicked")?
                .context("listing server failed")?;
            anyhow::bail!("listing server stopped unexpectedly");
        }
        (None, Some(server_task)) => {
            server_task
                .await
                .context("listing server task panicked")?
                .context("listing server failed")?;
        }
        (None, None) => {}
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let level = config.level().unwrap_or_else(|| {
        eprintln!(
            "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
            config.log_level
        );
        Level::INFO
    });

    let mut filter = EnvFilter::from_default_env();
    if env::var("RUST_LOG").is_err() {
        for directive in [
            format!("task_observer={}", level),
            "hyper=warn".to_string(),
            "reqwest=warn".to_string(),
        ] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
