mod common;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get as get_route};
use common::{Harness, add_auth, get, read_json};
use gateway::app::RouteGroup;
use gateway::gateway::guard::RouteGuard;
use gateway::gateway::principal::Principal;
use labgate_authz::{Permission, Role};
use std::time::Duration;
use tower::ServiceExt;

async fn whoami(principal: Principal) -> String {
    format!("{}:{}", principal.subject_id, principal.role)
}

fn business_groups() -> Vec<RouteGroup> {
    vec![
        RouteGroup::new(
            RouteGuard::any_permission(&[Permission::UserDelete]),
            Router::new().route("/api/v1/users/:user_id", delete(whoami)),
        ),
        RouteGroup::new(
            RouteGuard::any_permission(&[Permission::UserUpdate]).or_owner("user_id"),
            Router::new().route("/api/v1/users/:user_id/profile", get_route(whoami)),
        ),
        RouteGroup::new(
            RouteGuard::roles(&[Role::Doctor, Role::Analyst]),
            Router::new().route("/api/v1/lab/queue", get_route(whoami)),
        ),
        RouteGroup::new(
            RouteGuard::all_permissions(&[Permission::BatchCreate, Permission::SampleUpdate]),
            Router::new().route("/api/v1/batches/assemble", get_route(whoami)),
        ),
    ]
}

fn delete_user(token: &str) -> axum::http::Request<axum::body::Body> {
    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri("/api/v1/users/u-2")
        .body(axum::body::Body::empty())
        .expect("request");
    add_auth(request, token)
}

#[tokio::test]
async fn viewer_cannot_delete_users_but_admin_can() {
    let harness = Harness::new();
    let app = harness.router(business_groups());

    let viewer = harness.access_token("v-1", Role::Viewer);
    let response = app.clone().oneshot(delete_user(&viewer)).await.expect("viewer");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(body["message"], "Insufficient permissions");

    let admin = harness.access_token("a-1", Role::Admin);
    let response = app.oneshot(delete_user(&admin)).await.expect("admin");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_header_is_unauthorized_before_token_parsing() {
    let harness = Harness::new();
    let app = harness.router(business_groups());

    let response = app.clone().oneshot(get("/api/v1/lab/queue")).await.expect("call");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Missing authorization header");

    let mut request = get("/api/v1/lab/queue");
    request
        .headers_mut()
        .insert("authorization", "Token abc".parse().expect("header"));
    let response = app.clone().oneshot(request).await.expect("call");
    let body = read_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Invalid authorization header format");

    let response = app
        .oneshot(add_auth(get("/api/v1/lab/queue"), ""))
        .await
        .expect("call");
    let body = read_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn expired_and_invalid_tokens_are_distinguished() {
    let harness = Harness::new();
    let app = harness.router(business_groups());
    let token = harness.access_token("d-1", Role::Doctor);

    let response = app
        .clone()
        .oneshot(add_auth(get("/api/v1/lab/queue"), &format!("{token}x")))
        .await
        .expect("tampered");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["code"], "INVALID_TOKEN");

    harness.clock.advance(Duration::from_secs(61));
    let response = app
        .oneshot(add_auth(get("/api/v1/lab/queue"), &token))
        .await
        .expect("expired");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "TOKEN_EXPIRED");
    assert_eq!(body["message"], "Token has expired");
}

#[tokio::test]
async fn refresh_token_cannot_call_protected_routes() {
    let harness = Harness::new();
    let app = harness.router(business_groups());
    let pair = harness.login("d-1", Role::Doctor);

    let response = app
        .oneshot(add_auth(get("/api/v1/lab/queue"), &pair.refresh.token))
        .await
        .expect("call");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn role_groups_do_not_admit_admin_implicitly() {
    let harness = Harness::new();
    let app = harness.router(business_groups());

    let admin = harness.access_token("a-1", Role::Admin);
    let response = app
        .clone()
        .oneshot(add_auth(get("/api/v1/lab/queue"), &admin))
        .await
        .expect("admin");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let analyst = harness.access_token("an-1", Role::Analyst);
    let response = app
        .oneshot(add_auth(get("/api/v1/lab/queue"), &analyst))
        .await
        .expect("analyst");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn all_permissions_group_needs_every_permission() {
    let harness = Harness::new();
    let app = harness.router(business_groups());

    let analyst = harness.access_token("an-1", Role::Analyst);
    let response = app
        .clone()
        .oneshot(add_auth(get("/api/v1/batches/assemble"), &analyst))
        .await
        .expect("analyst");
    assert_eq!(response.status(), StatusCode::OK);

    let doctor = harness.access_token("d-1", Role::Doctor);
    let response = app
        .oneshot(add_auth(get("/api/v1/batches/assemble"), &doctor))
        .await
        .expect("doctor");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owners_reach_their_own_profile_only() {
    let harness = Harness::new();
    let app = harness.router(business_groups());
    let viewer = harness.access_token("u-7", Role::Viewer);

    let response = app
        .clone()
        .oneshot(add_auth(get("/api/v1/users/u-7/profile"), &viewer))
        .await
        .expect("own");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(add_auth(get("/api/v1/users/u-8/profile"), &viewer))
        .await
        .expect("other");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn identity_comes_from_token_not_headers() {
    let harness = Harness::new();
    let app = harness.router(business_groups());
    let viewer = harness.access_token("u-7", Role::Viewer);

    let mut request = add_auth(get("/api/v1/users/u-9/profile"), &viewer);
    request
        .headers_mut()
        .insert("x-user-id", "u-9".parse().expect("header"));
    request
        .headers_mut()
        .insert("x-user-role", "ADMIN".parse().expect("header"));
    let response = app.oneshot(request).await.expect("call");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn handlers_see_the_token_principal() {
    let harness = Harness::new();
    let app = harness.router(business_groups());
    let doctor = harness.access_token("d-3", Role::Doctor);

    let response = app
        .oneshot(add_auth(get("/api/v1/lab/queue"), &doctor))
        .await
        .expect("call");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&bytes[..], b"d-3:DOCTOR");
}
