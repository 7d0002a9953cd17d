//! How the rate limiter names a client.
//!
//! Behind a reverse proxy every connection comes from the proxy, so keying
//! on the peer address collapses all clients into one bucket. Deployments
//! behind a trusted proxy select [`ClientKeySource::ForwardedFor`]; direct
//! deployments keep the default so clients cannot pick their own key.
use axum::extract::{ConnectInfo, Request};
use serde::Deserialize;
use std::net::SocketAddr;

pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKeySource {
    /// IP of the TCP peer.
    #[default]
    PeerAddress,
    /// First hop of `X-Forwarded-For`, then `X-Real-IP`, then the peer IP.
    ForwardedFor,
}

impl ClientKeySource {
    pub fn key_for(&self, request: &Request) -> String {
        match self {
            ClientKeySource::PeerAddress => peer_ip(request),
            ClientKeySource::ForwardedFor => forwarded_ip(request).unwrap_or_else(|| peer_ip(request)),
        }
    }
}

impl std::str::FromStr for ClientKeySource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "peer_address" => Ok(ClientKeySource::PeerAddress),
            "forwarded_for" => Ok(ClientKeySource::ForwardedFor),
            other => Err(format!(
                "unknown client key source {other:?}, expected peer_address or forwarded_for"
            )),
        }
    }
}

fn peer_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(request: &Request) -> Option<String> {
    let headers = request.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };
    forwarded.or_else(real_ip).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(peer: Option<&str>, headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/health");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(Body::empty()).expect("request");
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().expect("addr");
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        request
    }

    #[test]
    fn peer_address_ignores_forwarding_headers() {
        let req = request(Some("10.1.2.3:5555"), &[("x-forwarded-for", "1.1.1.1")]);
        assert_eq!(ClientKeySource::PeerAddress.key_for(&req), "10.1.2.3");
    }

    #[test]
    fn peer_address_ignores_port() {
        let a = request(Some("10.1.2.3:1000"), &[]);
        let b = request(Some("10.1.2.3:2000"), &[]);
        assert_eq!(
            ClientKeySource::PeerAddress.key_for(&a),
            ClientKeySource::PeerAddress.key_for(&b)
        );
    }

    #[test]
    fn forwarded_for_uses_first_hop() {
        let req = request(
            Some("10.0.0.1:80"),
            &[("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")],
        );
        assert_eq!(ClientKeySource::ForwardedFor.key_for(&req), "203.0.113.7");
    }

    #[test]
    fn forwarded_for_falls_back() {
        let real = request(Some("10.0.0.1:80"), &[("x-real-ip", "198.51.100.2")]);
        assert_eq!(ClientKeySource::ForwardedFor.key_for(&real), "198.51.100.2");

        let bare = request(Some("10.0.0.1:80"), &[("x-forwarded-for", " ")]);
        assert_eq!(ClientKeySource::ForwardedFor.key_for(&bare), "10.0.0.1");
    }

    #[test]
    fn missing_connect_info_is_unknown() {
        assert_eq!(
            ClientKeySource::PeerAddress.key_for(&request(None, &[])),
            UNKNOWN_CLIENT
        );
    }

    #[test]
    fn parses_config_names() {
        assert_eq!(
            "forwarded_for".parse::<ClientKeySource>(),
            Ok(ClientKeySource::ForwardedFor)
        );
        assert!("ip".parse::<ClientKeySource>().is_err());
    }
}
