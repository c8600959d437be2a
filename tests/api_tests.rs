// tests/api_tests.rs
use std::sync::Arc;

use hyper::{body, Body, Request, StatusCode};
use tower::ServiceExt;

use lb_chatops::config::ProvisioningConfig;
use lb_chatops::directive::DirectiveParser;
use lb_chatops::provision::{BalancerStore, Provisioner};
use lb_chatops::selection::{CursorRegistry, SelectionEngine};
use lb_chatops::server::RequestHandler;

fn handler() -> RequestHandler {
    let cursors = Arc::new(CursorRegistry::new());
    let store = Arc::new(BalancerStore::new());
    let engine = Arc::new(SelectionEngine::new(cursors.clone(), None));
    let provisioner = Arc::new(Provisioner::new(
        store,
        cursors,
        ProvisioningConfig::default(),
        None,
    ));
    RequestHandler::new(Arc::new(DirectiveParser::new()), provisioner, engine, None)
}

const DEMO_TEXT: &str = "loadbalcer name :demo\n\
                         algo:roundrobin\n\
                         instacen count:2\n\
                         url:http://localhost:8080/chat";

async fn create_demo(handler: &RequestHandler) {
    let req = Request::builder()
        .method("POST")
        .uri("/directives")
        .body(Body::from(DEMO_TEXT))
        .unwrap();
    let res = handler.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

async fn json_body(res: hyper::Response<Body>) -> serde_json::Value {
    let bytes = body::to_bytes(res.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn directive_intake_creates_a_balancer() {
    let handler = handler();

    let req = Request::builder()
        .method("POST")
        .uri("/directives")
        .body(Body::from(DEMO_TEXT))
        .unwrap();
    let res = handler.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let json = json_body(res).await;
    assert_eq!(json["name"], "demo");
    assert_eq!(json["algorithm"], "round_robin");
    assert_eq!(json["instances"].as_array().unwrap().len(), 2);
    assert_eq!(json["instances"][0]["name"], "instance1");
}

#[tokio::test]
async fn unusable_directive_text_is_rejected() {
    let handler = handler();

    let req = Request::builder()
        .method("POST")
        .uri("/directives")
        .body(Body::from("hello, anyone around?"))
        .unwrap();
    let res = handler.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn listing_and_lookup_round_trip() {
    let handler = handler();
    create_demo(&handler).await;

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balancers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await.as_array().unwrap().len(), 1);

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balancers/demo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balancers/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn route_endpoint_rotates_round_robin() {
    let handler = handler();
    create_demo(&handler).await;

    let mut picked = Vec::new();
    for _ in 0..3 {
        let res = handler
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/balancers/demo/route?client=10.1.2.3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["client"], "10.1.2.3");
        picked.push(json["instance"]["name"].as_str().unwrap().to_string());
    }

    assert_eq!(picked, ["instance1", "instance2", "instance1"]);
}

#[tokio::test]
async fn route_without_instances_is_service_unavailable() {
    let handler = handler();
    create_demo(&handler).await;

    for instance in ["instance1", "instance2"] {
        let res = handler
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/balancers/demo/instances/{instance}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balancers/demo/route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn instance_and_algorithm_mutations() {
    let handler = handler();
    create_demo(&handler).await;

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/balancers/demo/instances")
                .body(Body::from(r#"{"url": "http://localhost:8081"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(json_body(res).await["name"], "instance3");

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/balancers/demo/algorithm")
                .body(Body::from(r#"{"algorithm": "least_conn"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balancers/demo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(res).await["algorithm"], "least_conn");
}

#[tokio::test]
async fn delete_removes_the_balancer() {
    let handler = handler();
    create_demo(&handler).await;

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/balancers/demo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = handler
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balancers/demo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
