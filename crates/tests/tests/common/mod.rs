#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use cresta_api::{build_app_with, ApiConfig};
use cresta_narrator::Narrator;
use cresta_storage::{LeaseRecord, PropertyRecord, SqliteWarehouse};
use serde_json::Value;
use tower::ServiceExt;

#[allow(clippy::too_many_arguments)]
fn property(
    id: i64,
    name: &str,
    city: &str,
    state: &str,
    class: &str,
    floors: i64,
    year_built: i64,
    year_renovated: Option<i64>,
    landlord: &str,
) -> PropertyRecord {
    PropertyRecord {
        property_id: id,
        building_name: name.to_string(),
        address: None,
        city: Some(city.to_string()),
        state: Some(state.to_string()),
        building_class: Some(class.to_string()),
        property_type: Some("Office".to_string()),
        property_sub_type: Some("Office Tower".to_string()),
        building_size: Some(1_250_000),
        number_of_floors: Some(floors),
        year_built: Some(year_built),
        year_renovated,
        current_landlord: Some(landlord.to_string()),
    }
}

pub fn properties() -> Vec<PropertyRecord> {
    vec![
        property(1, "Empire State Building", "New York", "NY", "A", 102, 1931, Some(2019), "Empire State Realty Trust"),
        property(2, "Chrysler Building", "New York", "NY", "A", 77, 1930, Some(1900), "RFR Holding"),
        property(3, "Willis Tower", "Chicago", "IL", "A", 108, 1973, Some(2020), "Blackstone"),
        property(4, "One Market Plaza", "San Francisco", "CA", "B", 43, 1976, None, "Paramount Group"),
        property(5, "Main Street Center", "Dallas", "TX", "C", 12, 1984, None, "Lincoln Property"),
        property(6, "Harbor Point Tower", "Baltimore", "MD", "B", 20, 2018, None, "Beatty Development"),
    ]
}

pub fn leases() -> Vec<LeaseRecord> {
    vec![
        LeaseRecord {
            lease_id: 100,
            property_id: 3,
            tenant_name: Some("United Airlines".to_string()),
            execution_date: Some("2023-04-01".to_string()),
            leased_sf: Some(40_000),
            rent_psf: Some(50.0),
            lease_term_months: Some(120),
        },
        LeaseRecord {
            lease_id: 101,
            property_id: 3,
            tenant_name: Some("Hyatt".to_string()),
            execution_date: Some("2024-01-15".to_string()),
            leased_sf: Some(12_000),
            rent_psf: Some(46.5),
            lease_term_months: Some(84),
        },
        LeaseRecord {
            lease_id: 102,
            property_id: 1,
            tenant_name: Some("LinkedIn".to_string()),
            execution_date: Some("2022-09-30".to_string()),
            leased_sf: Some(25_000),
            rent_psf: Some(80.0),
            lease_term_months: Some(60),
        },
    ]
}

pub async fn seeded_warehouse() -> SqliteWarehouse {
    let warehouse = SqliteWarehouse::memory()
        .await
        .expect("memory warehouse should open");
    warehouse
        .import_properties(&properties())
        .await
        .expect("properties import");
    warehouse.import_leases(&leases()).await.expect("leases import");
    warehouse
}

pub fn app(config: &ApiConfig, warehouse: SqliteWarehouse) -> Router {
    build_app_with(config, warehouse, Narrator::Disabled)
}

pub async fn seeded_app() -> Router {
    app(&ApiConfig::default(), seeded_warehouse().await)
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

pub async fn chat(app: &Router, message: &str) -> (StatusCode, Value) {
    post_json(app, "/api/chat", serde_json::json!({ "message": message })).await
}
