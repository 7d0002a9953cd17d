mod common;

use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;
use common::{Harness, add_auth, from_peer, get, read_json};
use gateway::gateway::client_key::ClientKeySource;
use labgate_authz::Role;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn burst_exhaustion_returns_429_until_refill() {
    let harness = Harness::with_limits(2.0, 5, ClientKeySource::PeerAddress);
    let app = harness.router(Vec::new());

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(from_peer(get("/api/health"), "192.0.2.10:4000"))
            .await
            .expect("health");
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app
        .clone()
        .oneshot(from_peer(get("/api/health"), "192.0.2.10:4000"))
        .await
        .expect("limited");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get(RETRY_AFTER).map(|v| v.as_bytes()),
        Some(&b"1"[..])
    );
    let body = read_json(response).await;
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");

    harness.clock.advance(Duration::from_secs(1));
    let mut admitted = 0;
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(from_peer(get("/api/health"), "192.0.2.10:4001"))
            .await
            .expect("after refill");
        if response.status() == StatusCode::OK {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 2);
}

#[tokio::test]
async fn clients_are_limited_independently() {
    let harness = Harness::with_limits(1.0, 1, ClientKeySource::PeerAddress);
    let app = harness.router(Vec::new());

    let first = app
        .clone()
        .oneshot(from_peer(get("/api/health"), "192.0.2.1:1"))
        .await
        .expect("first");
    assert_eq!(first.status(), StatusCode::OK);
    let second = app
        .clone()
        .oneshot(from_peer(get("/api/health"), "192.0.2.2:1"))
        .await
        .expect("second");
    assert_eq!(second.status(), StatusCode::OK);
    let repeat = app
        .oneshot(from_peer(get("/api/health"), "192.0.2.1:1"))
        .await
        .expect("repeat");
    assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn rate_limit_runs_before_authentication() {
    let harness = Harness::with_limits(1.0, 1, ClientKeySource::PeerAddress);
    let app = harness.router(Vec::new());

    let first = app
        .clone()
        .oneshot(from_peer(get("/api/v1/permissions/me"), "192.0.2.5:1"))
        .await
        .expect("first");
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let token = harness.access_token("a-1", Role::Admin);
    let second = app
        .oneshot(from_peer(
            add_auth(get("/api/v1/permissions/me"), &token),
            "192.0.2.5:1",
        ))
        .await
        .expect("second");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn forwarded_for_keys_on_client_behind_proxy() {
    let harness = Harness::with_limits(1.0, 1, ClientKeySource::ForwardedFor);
    let app = harness.router(Vec::new());

    for client in ["203.0.113.1", "203.0.113.2"] {
        let mut request = from_peer(get("/api/health"), "10.0.0.1:443");
        request
            .headers_mut()
            .insert("x-forwarded-for", client.parse().expect("header"));
        let response = app.clone().oneshot(request).await.expect("call");
        assert_eq!(response.status(), StatusCode::OK, "{client}");
    }
    assert_eq!(harness.state.limiter.tracked_keys(), 2);
}

#[tokio::test]
async fn requests_without_peer_share_unknown_bucket() {
    let harness = Harness::with_limits(1.0, 1, ClientKeySource::PeerAddress);
    let app = harness.router(Vec::new());

    let first = app.clone().oneshot(get("/api/health")).await.expect("first");
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.oneshot(get("/api/health")).await.expect("second");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
