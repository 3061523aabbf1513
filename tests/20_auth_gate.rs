mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use reqwest::{Client, Method, StatusCode};
use uuid::Uuid;

use notecode_api::auth::{encode_claims, Claims};

/// Every protected route, as (method, path) pairs. The gate must reject
/// unauthenticated requests on all of them before any handler or database
/// access runs, so these tests pass with no database configured.
fn protected_routes() -> Vec<(Method, String)> {
    let id = Uuid::new_v4();
    vec![
        (Method::GET, "/api/test".to_string()),
        (Method::POST, "/api/files".to_string()),
        (Method::GET, format!("/api/files/user/{}", Uuid::new_v4())),
        (Method::GET, format!("/api/files/{}", id)),
        (Method::PATCH, format!("/api/files/{}", id)),
        (Method::PATCH, format!("/api/files/{}/code", id)),
        (Method::PATCH, format!("/api/files/{}/algo", id)),
        (Method::DELETE, format!("/api/files/{}", id)),
    ]
}

fn claims_expiring_in(seconds: i64) -> Claims {
    let now = Utc::now();
    Claims {
        sub: Uuid::new_v4(),
        exp: (now + Duration::seconds(seconds)).timestamp(),
        iat: now.timestamp(),
    }
}

async fn assert_unauthorized(
    client: &Client,
    base_url: &str,
    auth_header: Option<&str>,
) -> Result<()> {
    for (method, path) in protected_routes() {
        let mut req = client.request(method.clone(), format!("{}{}", base_url, path));
        if let Some(value) = auth_header {
            req = req.header("authorization", value);
        }

        let res = req.send().await?;
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} with auth {:?}",
            method,
            path,
            auth_header
        );

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["error"], "Not authorized to access this route");
    }
    Ok(())
}

#[tokio::test]
async fn missing_token_is_rejected_on_every_protected_route() -> Result<()> {
    let server = common::ensure_server().await?;
    assert_unauthorized(&Client::new(), &server.base_url, None).await
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    assert_unauthorized(&Client::new(), &server.base_url, Some("Basic dXNlcjpwdw==")).await
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    assert_unauthorized(&Client::new(), &server.base_url, Some("Bearer not-a-jwt")).await
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = encode_claims(&claims_expiring_in(3600), "some-other-secret")?;
    assert_unauthorized(
        &Client::new(),
        &server.base_url,
        Some(&format!("Bearer {}", token)),
    )
    .await
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    // Past the default 60s decoding leeway
    let token = encode_claims(&claims_expiring_in(-120), common::JWT_SECRET)?;
    assert_unauthorized(
        &Client::new(),
        &server.base_url,
        Some(&format!("Bearer {}", token)),
    )
    .await
}
