use super::common::*;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn signup_returns_token_usable_on_me() {
    let fixture = Fixture::new();
    let router = fixture.market.router();

    let (status, body) = send(
        router.clone(),
        json_request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "Ada@Example.com",
                "name": "Ada Obi",
                "role": "customer"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().expect("token").to_string();

    let (status, body) = send(
        router,
        json_request("GET", "/api/v1/users/me", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["agent_profile"].is_null());
}

#[tokio::test]
async fn signup_validation_errors_name_the_field() {
    let fixture = Fixture::new();

    let (status, body) = send(
        fixture.market.router(),
        json_request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "nobody", "name": "Ada" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn me_requires_a_bearer_token() {
    let fixture = Fixture::new();

    let (status, _) = send(
        fixture.market.router(),
        json_request("GET", "/api/v1/users/me", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        fixture.market.router(),
        json_request("GET", "/api/v1/users/me", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verification_route_is_staff_only() {
    let fixture = Fixture::new();
    let agent = fixture.pending_agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");
    let staff = fixture.staff();
    let uri = format!("/api/v1/agents/{}/verification", agent.user_id);

    let (status, _) = send(
        fixture.market.router(),
        json_request(
            "POST",
            &uri,
            Some(&fixture.token(&customer)),
            Some(json!({ "verified": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        fixture.market.router(),
        json_request(
            "POST",
            &uri,
            Some(&fixture.token(&staff)),
            Some(json!({ "verified": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);
}

#[tokio::test]
async fn agent_directory_and_contact_are_public() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");

    let (status, body) = send(
        fixture.market.router(),
        json_request("GET", "/api/v1/agents?page=abc", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["items"][0]["name"], "Tunde Bello");

    let (status, body) = send(
        fixture.market.router(),
        json_request(
            "POST",
            &format!("/api/v1/agents/{}/contact", agent.user_id),
            None,
            Some(json!({
                "name": "Ngozi",
                "email": "ngozi@example.com",
                "message": "Hello"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], true);
}

#[tokio::test]
async fn customer_dashboard_rejects_agents() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");

    let (status, _) = send(
        fixture.market.router(),
        json_request(
            "GET",
            "/api/v1/dashboard/customer",
            Some(&fixture.token(&agent)),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
