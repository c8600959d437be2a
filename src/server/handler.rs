// src/server/handler.rs
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::{body, header, Body, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tower::Service;

use crate::balancer::{Algorithm, BalancerView, InstanceView};
use crate::directive::DirectiveParser;
use crate::metrics::MetricsCollector;
use crate::provision::{ProvisionError, Provisioner};
use crate::selection::SelectionEngine;
use crate::server::builder::PeerBound;

/// Management API over the provisioner and the selection engine.
///
/// `POST /directives` takes free-form operator/chat text; everything under
/// `/balancers` is plain CRUD plus a `/route` endpoint that reports which
/// instance would receive the caller's next request. No traffic is proxied.
#[derive(Clone)]
pub struct RequestHandler {
    parser: Arc<DirectiveParser>,
    provisioner: Arc<Provisioner>,
    engine: Arc<SelectionEngine>,
    metrics: Option<Arc<MetricsCollector>>,
    peer: Option<SocketAddr>,
}

#[derive(Debug, Deserialize)]
struct AddInstanceRequest {
    url: String,
    name: Option<String>,
    weight: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AlgorithmRequest {
    algorithm: String,
}

#[derive(Debug, Serialize)]
struct RouteResponse {
    balancer: String,
    algorithm: String,
    client: String,
    instance: InstanceView,
}

impl RequestHandler {
    pub fn new(
        parser: Arc<DirectiveParser>,
        provisioner: Arc<Provisioner>,
        engine: Arc<SelectionEngine>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            parser,
            provisioner,
            engine,
            metrics,
            peer: None,
        }
    }

    async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let (parts, req_body) = req.into_parts();
        let path = parts.uri.path().to_string();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match (parts.method.as_str(), segments.as_slice()) {
            ("POST", ["directives"]) => self.create_from_directive(req_body).await,
            ("GET", ["balancers"]) => self.list_balancers(),
            ("GET", ["balancers", name]) => self.show_balancer(name),
            ("DELETE", ["balancers", name]) => self.delete_balancer(name),
            ("GET", ["balancers", name, "route"]) => self.route_request(name, parts.uri.query()),
            ("POST", ["balancers", name, "instances"]) => self.add_instance(name, req_body).await,
            ("DELETE", ["balancers", name, "instances", instance]) => {
                self.remove_instance(name, instance)
            }
            ("PUT", ["balancers", name, "algorithm"]) => {
                self.change_algorithm(name, req_body).await
            }
            _ => error_response(StatusCode::NOT_FOUND, "not found"),
        }
    }

    async fn create_from_directive(&self, req_body: Body) -> Response<Body> {
        let bytes = match body::to_bytes(req_body).await {
            Ok(bytes) => bytes,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        };
        let text = String::from_utf8_lossy(&bytes);

        let directive = self.parser.parse(&text);
        if let Some(metrics) = &self.metrics {
            metrics.record_directive();
        }

        match self.provisioner.apply(directive) {
            Ok(balancer) => json_response(StatusCode::CREATED, &balancer.view()),
            Err(err) => provision_error_response(&err),
        }
    }

    fn list_balancers(&self) -> Response<Body> {
        let views: Vec<BalancerView> = self.provisioner.list().iter().map(|b| b.view()).collect();
        json_response(StatusCode::OK, &views)
    }

    fn show_balancer(&self, name: &str) -> Response<Body> {
        match self.provisioner.get(name) {
            Some(balancer) => json_response(StatusCode::OK, &balancer.view()),
            None => error_response(StatusCode::NOT_FOUND, "load balancer not found"),
        }
    }

    fn delete_balancer(&self, name: &str) -> Response<Body> {
        match self.provisioner.delete(name) {
            Ok(()) => no_content(),
            Err(err) => provision_error_response(&err),
        }
    }

    fn route_request(&self, name: &str, query: Option<&str>) -> Response<Body> {
        let Some(balancer) = self.provisioner.get(name) else {
            return error_response(StatusCode::NOT_FOUND, "load balancer not found");
        };

        // A `?client=` override wins; otherwise the peer IP stands in for the
        // client address.
        let client_addr = query
            .and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(key, _)| key == "client")
                    .map(|(_, value)| value.into_owned())
            })
            .or_else(|| self.peer.map(|peer| peer.ip().to_string()))
            .unwrap_or_default();

        match self.engine.pick_instance(&balancer, &client_addr) {
            Some(instance) => json_response(
                StatusCode::OK,
                &RouteResponse {
                    balancer: balancer.name.clone(),
                    algorithm: balancer.algorithm().as_str().to_string(),
                    client: client_addr,
                    instance: instance.snapshot(),
                },
            ),
            None => error_response(StatusCode::SERVICE_UNAVAILABLE, "no available backend"),
        }
    }

    async fn add_instance(&self, name: &str, req_body: Body) -> Response<Body> {
        let request: AddInstanceRequest = match read_json(req_body).await {
            Ok(request) => request,
            Err(response) => return response,
        };

        match self
            .provisioner
            .add_instance(name, request.url, request.name, request.weight)
        {
            Ok(instance) => json_response(StatusCode::CREATED, &instance.snapshot()),
            Err(err) => provision_error_response(&err),
        }
    }

    fn remove_instance(&self, name: &str, instance: &str) -> Response<Body> {
        match self.provisioner.remove_instance(name, instance) {
            Ok(()) => no_content(),
            Err(err) => provision_error_response(&err),
        }
    }

    async fn change_algorithm(&self, name: &str, req_body: Body) -> Response<Body> {
        let request: AlgorithmRequest = match read_json(req_body).await {
            Ok(request) => request,
            Err(response) => return response,
        };

        match self
            .provisioner
            .set_algorithm(name, Algorithm::from(request.algorithm))
        {
            Ok(()) => no_content(),
            Err(err) => provision_error_response(&err),
        }
    }
}

impl PeerBound for RequestHandler {
    fn bind_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(req_body: Body) -> Result<T, Response<Body>> {
    let bytes = body::to_bytes(req_body)
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e.to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &format!("invalid body: {e}")))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(buffer) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(buffer))
            .unwrap(),
        Err(e) => {
            tracing::error!(%e, "failed to encode response");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "encoding failure")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn no_content() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::empty())
        .unwrap()
}

// Status mapping mirrors the error contract: validation rejections are 422,
// name collisions 409, lookups 404.
fn provision_error_response(err: &ProvisionError) -> Response<Body> {
    let status = match err {
        ProvisionError::MissingName
        | ProvisionError::NoInstances(_)
        | ProvisionError::InvalidInstanceUrl { .. }
        | ProvisionError::TooManyInstances { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ProvisionError::AlreadyExists(_) => StatusCode::CONFLICT,
        ProvisionError::NotFound(_) | ProvisionError::InstanceNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
    };
    error_response(status, &err.to_string())
}
