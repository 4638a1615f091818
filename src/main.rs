// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use clap::Parser;
use mysql_operator::{
    config::{self, OperatorConfig},
    constants::{TOKIO_WORKER_THREADS, WEBHOOK_SERVER_BIND_ADDRESS, WEBHOOK_SERVER_PORT},
    webhook::{webhook_router, WebhookState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Time allowed for in-flight admission requests after a shutdown signal
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Admission webhook for the MySQL operator resources
#[derive(Parser, Debug)]
#[command(name = "mysql-operator-webhook", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "WEBHOOK_BIND_ADDRESS", default_value = WEBHOOK_SERVER_BIND_ADDRESS)]
    bind_address: String,

    /// Port to listen on
    #[arg(long, env = "WEBHOOK_PORT", default_value_t = WEBHOOK_SERVER_PORT)]
    port: u16,

    /// PEM certificate chain presented to the API server
    #[arg(long, env = "WEBHOOK_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key for --tls-cert
    #[arg(long, env = "WEBHOOK_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Operator configuration file (falls back to MYSQL_OPERATOR_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("invalid bind address '{}'", self.bind_address))
    }
}

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("mysql-operator-webhook")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    init_logging();

    info!("Starting MySQL operator admission webhook");
    debug!(?args, "Parsed command line");

    let operator_config = OperatorConfig::load(args.config.as_deref())?;
    config::install_global(operator_config.clone())?;
    info!(
        supported_versions = ?operator_config.supported_versions,
        default_version = %operator_config.default_version,
        build_version = operator_config.build_version().unwrap_or("unset"),
        "Operator configuration loaded"
    );

    let addr = args.socket_addr()?;
    let router = webhook_router(Arc::new(WebhookState::new(operator_config)));

    match (&args.tls_cert, &args.tls_key) {
        (Some(cert), Some(key)) => {
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
                .await
                .with_context(|| {
                    format!(
                        "failed to load TLS material from {} and {}",
                        cert.display(),
                        key.display()
                    )
                })?;

            let handle = axum_server::Handle::new();
            tokio::spawn(shutdown_on_signal(handle.clone()));

            info!(%addr, "Serving admission webhook over HTTPS");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        (None, None) => {
            warn!(%addr, "No TLS material given; serving plain HTTP, which the API server will not call");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        _ => bail!("--tls-cert and --tls-key must be given together"),
    }

    info!("Admission webhook stopped");
    Ok(())
}

fn init_logging() {
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Example: RUST_LOG=debug cargo run
    //
    // Respects RUST_LOG_FORMAT environment variable for output format
    // Example: RUST_LOG_FORMAT=json cargo run
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

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

async fn shutdown_on_signal(handle: axum_server::Handle) {
    shutdown_signal().await;
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}
