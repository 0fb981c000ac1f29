mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use cresta_api::ApiConfig;
use cresta_core::{CITY_MENU_PROMPT, FALLBACK_HELP, WELCOME_MESSAGE};
use serde_json::json;
use tower::ServiceExt;

use common::{app, chat, get_json, post_json, seeded_app, seeded_warehouse};

#[tokio::test]
async fn health_reports_capabilities() {
    let app = seeded_app().await;

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["capabilities"]["warehouse"], true);
    assert_eq!(body["capabilities"]["narrative"], false);
}

#[tokio::test]
async fn welcome_is_static() {
    let app = seeded_app().await;

    let (status, body) = get_json(&app, "/api/welcome").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], WELCOME_MESSAGE);
}

#[tokio::test]
async fn chat_requires_a_message() {
    let app = seeded_app().await;

    let (status, body) = post_json(&app, "/api/chat", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Message is required" }));

    let (status, _) = chat(&app, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_rejects_other_methods() {
    let app = seeded_app().await;

    let response = app
        .oneshot(Request::builder().uri("/api/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn properties_in_city_are_numbered() {
    let app = seeded_app().await;

    let (status, body) = chat(&app, "Show me properties in New York").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        "Here are 2 premium commercial properties in New York.\n\n\
         1. Chrysler Building - New York, NY\n\n\
         2. Empire State Building - New York, NY"
    );
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert!(body.get("showCityPopup").is_none());
}

#[tokio::test]
async fn properties_without_city_open_the_city_menu() {
    let app = seeded_app().await;

    let (status, body) = chat(&app, "Show me properties").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], CITY_MENU_PROMPT);
    assert_eq!(body["showCityPopup"], true);
    assert_eq!(body["count"], 0);
    assert_eq!(
        body["suggestions"],
        json!(["Baltimore", "Chicago", "Dallas", "New York", "San Francisco"])
    );
}

#[tokio::test]
async fn city_list_orders_by_property_count() {
    let app = seeded_app().await;

    let (status, body) = chat(&app, "What cities are available?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        "Here are all the cities available in our commercial real estate database:\n\n\
         1. New York, NY (2 properties)\n\n\
         2. Baltimore, MD (1 property)\n\n\
         3. Chicago, IL (1 property)\n\n\
         4. Dallas, TX (1 property)\n\n\
         5. San Francisco, CA (1 property)"
    );
}

#[tokio::test]
async fn class_listing_names_properties() {
    let app = seeded_app().await;

    let (_, body) = chat(&app, "Show me Class A properties").await;
    assert_eq!(
        body["response"],
        "Here's our premium collection of Class A commercial properties:\n\n\
         1. Chrysler Building\n\n2. Empire State Building\n\n3. Willis Tower"
    );

    let (_, body) = chat(&app, "class c").await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn single_field_answers() {
    let app = seeded_app().await;

    let (_, body) = chat(&app, "How many floors does Harbor Point Tower have?").await;
    assert_eq!(
        body["response"],
        "Harbor Point Tower is an impressive 20-story high-rise, offering commanding views and substantial vertical presence in the market."
    );

    let (_, body) = chat(&app, "When was the Chrysler Building renovated?").await;
    assert_eq!(
        body["response"],
        "Chrysler Building has not been renovated or renovation year is not available."
    );

    let (_, body) = chat(&app, "Who is the landlord of the Willis Tower?").await;
    assert_eq!(
        body["response"],
        "The current landlord of Willis Tower is Blackstone."
    );
}

#[tokio::test]
async fn unknown_building_apologises() {
    let app = seeded_app().await;

    let (status, body) = chat(&app, "Tell me about the Acme Tower").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        "I couldn't find any information about Acme Tower in our current portfolio."
    );
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn leases_and_rent() {
    let app = seeded_app().await;

    let (_, body) = chat(&app, "leases at the Willis Tower").await;
    assert_eq!(body["response"], "Here are the most recent leases at Willis Tower:");
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["TENANT NAME"], "Hyatt");

    let (_, body) = chat(&app, "what is the average rent in new york").await;
    assert_eq!(
        body["response"],
        "The average rent in New York, NY is $80.00 per sq ft, based on 1 lease."
    );

    let (_, body) = chat(&app, "what is the average rent in chicago").await;
    assert_eq!(
        body["response"],
        "The average rent across our portfolio is $58.83 per sq ft, based on 3 leases."
    );

    let (_, body) = chat(&app, "What is the average rent?").await;
    assert_eq!(
        body["response"],
        "The average rent across our portfolio is $58.83 per sq ft, based on 3 leases."
    );
}

#[tokio::test]
async fn unmatched_message_gets_help_text() {
    let app = seeded_app().await;

    let (status, body) = chat(&app, "hello there").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], FALLBACK_HELP);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn warehouse_failure_maps_to_500() {
    let warehouse = seeded_warehouse().await;
    warehouse.pool().close().await;
    let app = app(&ApiConfig::default(), warehouse);

    let (status, body) = chat(&app, "Show me properties in New York").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "query_failed");
    assert!(body["response"].as_str().is_some_and(|text| !text.is_empty()));

    let (status, _) = chat(&app, "hello there").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn browse_routes() {
    let app = seeded_app().await;

    let (status, body) = get_json(&app, "/api/properties").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(6));

    let (_, body) = get_json(&app, "/api/leases").await;
    assert_eq!(body[0]["TENANT_NAME"], "Hyatt");

    let (_, body) = get_json(&app, "/api/cities").await;
    assert_eq!(body[0]["CITY"], "New York");
    assert_eq!(body[0]["PROPERTY_COUNT"], 2);

    let (_, body) = get_json(&app, "/api/columns").await;
    assert_eq!(body["columns"][0], "PROPERTY_ID");

    let (status, body) = get_json(&app, "/api/tables").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"], json!(["LEASE", "PROPERTY"]));
}

#[tokio::test]
async fn resolve_is_a_dry_run() {
    let warehouse = seeded_warehouse().await;
    warehouse.pool().close().await;
    let app = app(&ApiConfig::default(), warehouse);

    let (status, body) = post_json(
        &app,
        "/api/resolve",
        json!({ "message": "Show me properties in New York" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "city_property_list");
    assert_eq!(body["filters"]["city"], "new york");
    assert_eq!(body["query"]["params"], json!(["%new york%"]));
}

#[tokio::test]
async fn api_key_guards_private_routes() {
    let config = ApiConfig {
        api_key: Some("secret".to_string()),
        ..ApiConfig::default()
    };
    let app = app(&config, seeded_warehouse().await);

    let (status, _) = chat(&app, "What cities are available?").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .header("x-api-key", "secret")
        .body(Body::from(json!({ "message": "What cities are available?" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn rejections_still_carry_cors_headers() {
    let config = ApiConfig {
        api_key: Some("secret".to_string()),
        rate_limit_max: 1,
        ..ApiConfig::default()
    };
    let app = app(&config, seeded_warehouse().await);
    let browser_request = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(browser_request("/api/cities")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let response = app.clone().oneshot(browser_request("/api/welcome")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let config = ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 2,
        ..ApiConfig::default()
    };
    let app = app(&config, seeded_warehouse().await);

    for _ in 0..2 {
        let (status, _) = get_json(&app, "/api/welcome").await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/welcome").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let other_client = Request::builder()
        .uri("/api/welcome")
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(other_client).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = seeded_app().await;

    let response = app
        .oneshot(Request::builder().uri("/api/welcome").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}
