#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use gateway::app::{AppState, RouteGroup, build_router};
use gateway::gateway::client_key::ClientKeySource;
use gateway::gateway::cors::CorsSettings;
use labgate_authz::{
    ManualClock, RateLimitSettings, RateLimiter, Role, SessionTokenCodec, SubjectId, TokenKind,
    TokenPair, TokenSettings,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub const T0: u64 = 1_700_000_000;

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(1_000.0, 1_000, ClientKeySource::PeerAddress)
    }

    pub fn with_limits(rate: f64, burst: u32, client_keys: ClientKeySource) -> Self {
        Self::build(rate, burst, client_keys, CorsSettings::default())
    }

    pub fn with_cors_origins(origins: &[&str]) -> Self {
        let cors = CorsSettings {
            allowed_origins: origins.iter().map(|origin| origin.to_string()).collect(),
            ..CorsSettings::default()
        };
        Self::build(1_000.0, 1_000, ClientKeySource::PeerAddress, cors)
    }

    fn build(rate: f64, burst: u32, client_keys: ClientKeySource, cors: CorsSettings) -> Self {
        let clock = Arc::new(ManualClock::at_unix_seconds(T0));
        let mut settings = TokenSettings::new("integration-secret", "labgate-test");
        settings.access_ttl = Duration::from_secs(60);
        settings.refresh_ttl = Duration::from_secs(3600);
        let tokens = SessionTokenCodec::new(settings, clock.clone()).expect("codec");
        let limiter = RateLimiter::new(
            RateLimitSettings {
                rate_per_second: rate,
                burst,
                sweep_interval: Duration::from_secs(600),
            },
            clock.clone(),
        )
        .expect("limiter");
        Self {
            clock,
            state: AppState {
                tokens: Arc::new(tokens),
                limiter: Arc::new(limiter),
                client_keys,
                cors,
            },
        }
    }

    pub fn router(&self, groups: Vec<RouteGroup>) -> Router {
        build_router(self.state.clone(), groups)
    }

    pub fn login(&self, subject: &str, role: Role) -> TokenPair {
        self.state
            .tokens
            .issue_pair(&SubjectId::new(subject), &format!("{subject}@lab.test"), role)
            .expect("login")
    }

    pub fn access_token(&self, subject: &str, role: Role) -> String {
        self.state
            .tokens
            .issue(
                &SubjectId::new(subject),
                &format!("{subject}@lab.test"),
                role,
                TokenKind::Access,
            )
            .expect("issue")
            .token
    }
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn add_auth(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {token}").parse().expect("header"),
    );
    request
}

pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().expect("peer addr");
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}
