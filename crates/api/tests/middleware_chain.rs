//! The authentication layer in isolation, in front of a handler that reports
//! the principal it sees.

use axum::{Extension, Json, Router, middleware::Next, response::Response, routing::get};
use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{Value, json};

use novelly_api::context::PrincipalContext;
use novelly_api::middleware::{AuthState, authenticate};
use novelly_auth::{Principal, Role, TokenCodec};

const SECRET: &str = "middleware-chain-secret-long-enough-for-hs256";

async fn whoami(principal: Option<Extension<PrincipalContext>>) -> Json<Value> {
    Json(match principal {
        Some(Extension(p)) => json!({
            "subject": p.subject(),
            "roles": p.principal().role_names(),
        }),
        None => json!({ "subject": null }),
    })
}

async fn spawn(layers: usize) -> (String, tokio::task::JoinHandle<()>) {
    let state = AuthState {
        tokens: TokenCodec::new(SECRET).unwrap(),
    };

    let mut app = Router::new().route("/whoami", get(whoami));
    for _ in 0..layers {
        app = app.layer(axum::middleware::from_fn_with_state(state.clone(), authenticate));
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base_url, handle)
}

/// Establishes a principal before authentication runs.
async fn preset_principal(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    req.extensions_mut()
        .insert(PrincipalContext::new(Principal::new("established", Role::Admin)));
    next.run(req).await
}

fn token(subject: &str, role: Role) -> String {
    TokenCodec::new(SECRET)
        .unwrap()
        .mint(&Principal::new(subject, role), Duration::minutes(5))
        .unwrap()
}

#[tokio::test]
async fn stacked_authentication_yields_the_same_principal() {
    let (once_url, once) = spawn(1).await;
    let (twice_url, twice) = spawn(2).await;
    let client = reqwest::Client::new();
    let token = token("alice", Role::Creator);

    let mut bodies = Vec::new();
    for base in [&once_url, &twice_url] {
        let res = client
            .get(format!("{base}/whoami"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        bodies.push(res.json::<Value>().await.unwrap());
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0]["subject"], "alice");
    assert_eq!(bodies[0]["roles"], json!(["CREATOR"]));

    once.abort();
    twice.abort();
}

#[tokio::test]
async fn an_established_principal_is_never_replaced() {
    let state = AuthState {
        tokens: TokenCodec::new(SECRET).unwrap(),
    };
    let app = Router::new()
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(state, authenticate))
        .layer(axum::middleware::from_fn(preset_principal));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let res = reqwest::Client::new()
        .get(format!("{base}/whoami"))
        .bearer_auth(token("alice", Role::User))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["subject"], "established");
    assert_eq!(body["roles"], json!(["ADMIN"]));

    handle.abort();
}

#[tokio::test]
async fn bad_tokens_leave_the_request_anonymous() {
    let (base, handle) = spawn(1).await;
    let client = reqwest::Client::new();

    for header in ["Bearer garbage", "Bearer a.b.c", "Basic dXNlcjpwYXNz"] {
        let res = client
            .get(format!("{base}/whoami"))
            .header("authorization", header)
            .send()
            .await
            .unwrap();
        // Authentication never rejects; the handler still runs.
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert!(body["subject"].is_null());
    }

    handle.abort();
}
