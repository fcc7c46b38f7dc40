// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use clap::Parser;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client};
use kube_adguard_ingress::{
    adguard::AdGuardClient,
    aggregator::IngressAggregator,
    config::Config,
    constants::{TOKIO_THREAD_NAME, TOKIO_WORKER_THREADS},
    metrics::serve_metrics,
    notifier::ChangeNotifier,
    reconciler::{run_reconcile_loop, Context},
    static_records::StaticFile,
    watcher::{preload_ingresses, run_ingress_watcher},
};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Parse before the runtime exists so `--help` and usage errors stay cheap
    let config = Config::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name(TOKIO_THREAD_NAME)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

/// Initialize logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT=json` for JSON output.
/// Text format: timestamp file:line LEVEL message
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

/// Cancel `cancel` on SIGTERM or SIGINT.
fn spawn_shutdown_listener(cancel: CancellationToken) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            () = cancel.cancelled() => return,
        }
        cancel.cancel();
    });

    Ok(())
}

async fn async_main(config: Config) -> Result<()> {
    init_logging();

    info!("Starting Ingress to AdGuard reflector");
    debug!(config = ?config, "Configuration loaded");

    let kube_config = config.kube_config().await?;
    let client = Client::try_from(kube_config).context("failed to create Kubernetes client")?;
    debug!("Kubernetes client initialized successfully");

    let rewrites = Arc::new(
        AdGuardClient::new(&config.adguard_config()).context("failed to create AdGuard client")?,
    );
    info!(url = %rewrites.base_url(), "AdGuard client created");

    let statics = Arc::new(StaticFile::new(config.static_path.clone(), config.static_ttl));
    let aggregator = Arc::new(IngressAggregator::new(Arc::new(ChangeNotifier::new())));

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone())?;

    let api: Api<Ingress> = Api::all(client);

    info!("Preloading initial cluster state");
    let seed = tokio::select! {
        () = cancel.cancelled() => {
            info!("Shutdown requested during preload");
            return Ok(());
        }
        result = preload_ingresses(&api, &aggregator, config.timeout) => {
            result.context("preload failed")?
        }
    };
    info!("Preload complete");

    let ctx = Context {
        store: rewrites,
        statics,
        aggregator: aggregator.clone(),
        throttle: config.throttle,
    };

    let sync_interval = config.sync_interval;
    let metrics_bind_address = config.metrics_bind_address;

    // Whichever side stops first takes the others down with it
    let watch = {
        let cancel = cancel.clone();
        async move {
            let result =
                run_ingress_watcher(api, aggregator, seed, sync_interval, cancel.clone())
                    .await;
            if let Err(e) = &result {
                error!(error = %e, "CRITICAL: Ingress watcher exited unexpectedly");
            }
            cancel.cancel();
            result
        }
    };

    let reconcile = {
        let cancel = cancel.clone();
        async move {
            run_reconcile_loop(ctx, cancel.clone()).await;
            cancel.cancel();
        }
    };

    let metrics = {
        let cancel = cancel.clone();
        async move {
            let Some(addr) = metrics_bind_address else {
                return Ok(());
            };
            let result = serve_metrics(addr, cancel.clone()).await;
            if let Err(e) = &result {
                error!(error = %e, "CRITICAL: Metrics server exited unexpectedly");
            }
            cancel.cancel();
            result
        }
    };

    info!("Ready");
    let (watch_result, (), metrics_result) = tokio::join!(watch, reconcile, metrics);

    watch_result.context("Ingress watcher failed")?;
    metrics_result.context("metrics server failed")?;

    info!("Shutdown complete");
    Ok(())
}
