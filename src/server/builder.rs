// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::listener::bind_tcp;
use anyhow::Result;
use hyper::{server::conn::Http, Body, Request, Response};
use std::net::SocketAddr;
use tower::Service;

/// Implemented by handlers that want to know which peer opened the
/// connection; the builder binds the address before serving it.
pub trait PeerBound {
    fn bind_peer(self, peer: SocketAddr) -> Self;
}

/// Builder pattern so `main.rs` can inject its management handler.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + PeerBound + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + PeerBound + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            handler: None,
        }
    }

    /// Inject the request handler (usually wraps the provisioner and the
    /// selection engine).
    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Consume the builder, boot the TCP listener, spawn Hyper tasks.
    pub async fn serve(self) -> Result<()> {
        let handler = self.handler.expect("handler must be set via with_handler()");

        // Bind the TCP socket (plain or TLS can be swapped later).
        let listener = bind_tcp(self.addr).await?;
        tracing::info!("management API listening on {}", self.addr);

        loop {
            let (stream, peer) = listener.accept().await?;
            let svc = handler.clone().bind_peer(peer);

            // One Tokio task per connection.
            tokio::spawn(async move {
                let http = Http::new();
                if let Err(err) = http.serve_connection(stream, svc).await {
                    tracing::warn!(%peer, %err, "connection error");
                }
            });
        }
    }
}
