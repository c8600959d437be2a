// src/main.rs
use anyhow::{Context, Result};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use lb_chatops::{
    config,
    directive::DirectiveParser,
    metrics::MetricsRegistry,
    provision::{BalancerStore, Provisioner},
    selection::{CursorRegistry, SelectionEngine},
    server::{RequestHandler, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lb_chatops=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    // Initialize metrics
    let metrics_registry = MetricsRegistry::new()?;
    let metrics = metrics_registry.collector();

    // Core components: cursor registry, store, engine, provisioner, parser
    let cursors = Arc::new(CursorRegistry::new());
    let store = Arc::new(BalancerStore::new());
    let engine = Arc::new(SelectionEngine::new(cursors.clone(), Some(metrics.clone())));
    let provisioner = Arc::new(Provisioner::new(
        store,
        cursors,
        config.provisioning.clone(),
        Some(metrics.clone()),
    ));
    let parser = Arc::new(DirectiveParser::new());

    // Start metrics server if enabled
    if config.metrics.enabled {
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone())?;
    }

    // Management API
    let handler = RequestHandler::new(parser, provisioner, engine, Some(metrics));
    let addr = config.listen_addr()?;

    let api = ServerBuilder::new(addr).with_handler(handler).serve();

    tokio::select! {
        result = api => result.context("management API server failed")?,
        _ = shutdown_signal() => {}
    }

    Ok(())
}

fn start_metrics_server(
    addr: SocketAddr,
    registry: MetricsRegistry,
    path: String,
) -> Result<()> {
    let registry = Arc::new(registry);
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    if req.uri().path() == path.as_str() {
                        let metrics = registry.gather();
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(StatusCode::OK)
                                .header("Content-Type", "text/plain; version=0.0.4")
                                .body(Body::from(metrics))
                                .unwrap(),
                        )
                    } else {
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(StatusCode::NOT_FOUND)
                                .body(Body::from("Not Found"))
                                .unwrap(),
                        )
                    }
                }
            }))
        }
    });

    let server = Server::bind(&addr).serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
