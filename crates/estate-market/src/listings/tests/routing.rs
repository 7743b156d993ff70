use super::common::*;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn agents_create_listings_over_http() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");

    let (status, body) = send(
        fixture.market.router(),
        json_request(
            "POST",
            "/api/v1/properties",
            Some(&fixture.token(&agent)),
            Some(json!({
                "title": "Garden flat",
                "property_type": "apartment",
                "price": 1500000,
                "location": "Yaba, Lagos",
                "bedrooms": 2
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "garden-flat");

    let (status, body) = send(
        fixture.market.router(),
        json_request("GET", "/api/v1/properties/slug/garden-flat", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["property"]["title"], "Garden flat");
    assert_eq!(body["is_favorited"], false);
}

#[tokio::test]
async fn pending_agents_are_forbidden_to_list() {
    let fixture = Fixture::new();
    let pending = fixture.pending_agent("Kemi Ade");

    let (status, _) = send(
        fixture.market.router(),
        json_request(
            "POST",
            "/api/v1/properties",
            Some(&fixture.token(&pending)),
            Some(json!({
                "title": "Garden flat",
                "property_type": "apartment",
                "price": 1500000,
                "location": "Yaba"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_limit_maps_to_payment_required() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    for n in 0..5 {
        fixture.property(&agent, &format!("Unit {n}"));
    }

    let (status, body) = send(
        fixture.market.router(),
        json_request(
            "POST",
            "/api/v1/properties",
            Some(&fixture.token(&agent)),
            Some(json!({
                "title": "One more",
                "property_type": "house",
                "price": 100,
                "location": "Ikeja"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("Please upgrade"));
}

#[tokio::test]
async fn search_pages_are_clamped() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    fixture.property(&agent, "Garden flat");

    let (status, body) = send(
        fixture.market.router(),
        json_request("GET", "/api/v1/properties?location=lekki&page=9", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_items"], 1);

    let (status, body) = send(
        fixture.market.router(),
        json_request("GET", "/api/v1/properties/buy", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 0);
}

#[tokio::test]
async fn unknown_type_and_slug_are_not_found() {
    let fixture = Fixture::new();

    for uri in [
        "/api/v1/properties/type/castle",
        "/api/v1/properties/slug/nowhere",
    ] {
        let (status, _) = send(
            fixture.market.router(),
            json_request("GET", uri, None, None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn favorite_toggle_and_count_round_trip() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");
    let property = fixture.property(&agent, "Garden flat");
    let token = fixture.token(&customer);

    let (status, body) = send(
        fixture.market.router(),
        json_request(
            "POST",
            "/api/v1/favorites/toggle",
            Some(&token),
            Some(json!({ "property_id": property.id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "added");

    let (_, body) = send(
        fixture.market.router(),
        json_request("GET", "/api/v1/favorites/count", Some(&token), None),
    )
    .await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn repeat_alert_subscription_returns_ok() {
    let fixture = Fixture::new();
    let customer = fixture.customer("Ada Obi");
    let token = fixture.token(&customer);
    let payload = json!({ "location": "Lekki" });

    let (first, _) = send(
        fixture.market.router(),
        json_request("POST", "/api/v1/alerts", Some(&token), Some(payload.clone())),
    )
    .await;
    let (second, body) = send(
        fixture.market.router(),
        json_request("POST", "/api/v1/alerts", Some(&token), Some(payload)),
    )
    .await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["created"], false);
}

#[tokio::test]
async fn deleting_a_listing_returns_no_content() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let property = fixture.property(&agent, "Garden flat");

    let (status, body) = send(
        fixture.market.router(),
        json_request(
            "DELETE",
            &format!("/api/v1/properties/{}", property.id),
            Some(&fixture.token(&agent)),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}
