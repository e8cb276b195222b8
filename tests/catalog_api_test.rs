mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{build_app, send, ADMIN_EMAIL};

fn service_payload(code: &str, category: &str, active: bool) -> serde_json::Value {
    json!({
        "code": code,
        "name": format!("{} service", code),
        "category": category,
        "price": 999,
        "active": active,
    })
}

#[tokio::test]
async fn catalog_management_requires_the_admin_gate() {
    let test = build_app(1000);

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/admin/services",
        None,
        Some(service_payload("VISA_TOURIST", "visa", true)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn service_crud_round_trip() {
    let test = build_app(1000);
    let token = test.auth.issue_token(ADMIN_EMAIL).unwrap();

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/admin/services",
        Some(&token),
        Some(service_payload("VISA_TOURIST", "visa", true)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["code"], "VISA_TOURIST");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Duplicate code is a conflict.
    let (status, body) = send(
        &test.app,
        "POST",
        "/api/admin/services",
        Some(&token),
        Some(service_payload("VISA_TOURIST", "visa", true)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SERVICE_CODE_EXISTS");

    let (status, body) = send(
        &test.app,
        "PUT",
        &format!("/api/admin/services/{}", id),
        Some(&token),
        Some(json!({
            "code": "VISA_TOURIST",
            "name": "Tourist Visa SOP",
            "category": "visa",
            "price": 1499,
            "active": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Tourist Visa SOP");
    assert_eq!(body["data"]["active"], false);

    let (status, body) = send(&test.app, "GET", "/api/admin/services", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &test.app,
        "DELETE",
        &format!("/api/admin/services/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &test.app,
        "DELETE",
        &format!("/api/admin/services/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SERVICE_NOT_FOUND");
}

#[tokio::test]
async fn invalid_service_payloads_are_rejected() {
    let test = build_app(1000);
    let token = test.auth.issue_token(ADMIN_EMAIL).unwrap();

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/admin/services",
        Some(&token),
        Some(service_payload("VISA_TOURIST", "invoices", true)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/admin/services",
        Some(&token),
        Some(json!({
            "code": "VISA_TOURIST",
            "name": "Tourist Visa SOP",
            "category": "visa",
            "price": -1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn settings_crud_round_trip() {
    let test = build_app(1000);
    let token = test.auth.issue_token(ADMIN_EMAIL).unwrap();

    let (status, body) = send(
        &test.app,
        "PUT",
        "/api/admin/settings/payment.upiId",
        Some(&token),
        Some(json!({ "value": "ops@upi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "ops@upi");

    // Upsert replaces in place.
    let (status, _) = send(
        &test.app,
        "PUT",
        "/api/admin/settings/payment.upiId",
        Some(&token),
        Some(json!({ "value": "pay@upi", "description": "UPI collection VPA" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&test.app, "GET", "/api/admin/settings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["value"], "pay@upi");

    let (status, _) = send(
        &test.app,
        "DELETE",
        "/api/admin/settings/payment.upiId",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &test.app,
        "DELETE",
        "/api/admin/settings/payment.upiId",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SETTING_NOT_FOUND");
}

#[tokio::test]
async fn public_config_reflects_catalog_and_settings() {
    let test = build_app(1000);
    let token = test.auth.issue_token(ADMIN_EMAIL).unwrap();

    send(
        &test.app,
        "POST",
        "/api/admin/services",
        Some(&token),
        Some(service_payload("VISA_TOURIST", "visa", true)),
    )
    .await;
    send(
        &test.app,
        "POST",
        "/api/admin/services",
        Some(&token),
        Some(service_payload("VISA_WORK", "visa", false)),
    )
    .await;
    send(
        &test.app,
        "POST",
        "/api/admin/services",
        Some(&token),
        Some(service_payload("SOP_REVIEW", "documents", true)),
    )
    .await;
    send(
        &test.app,
        "PUT",
        "/api/admin/settings/payment.upiId",
        Some(&token),
        Some(json!({ "value": "pay@upi" })),
    )
    .await;
    send(
        &test.app,
        "PUT",
        "/api/admin/settings/contact.supportEmail",
        Some(&token),
        Some(json!({ "value": "help@example.com" })),
    )
    .await;

    // No credential needed on the public read.
    let (status, body) = send(&test.app, "GET", "/api/config", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let categories = body["data"]["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    let visa = categories
        .iter()
        .find(|c| c["key"] == "visa")
        .unwrap();
    let codes: Vec<_> = visa["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["VISA_TOURIST"]);

    assert_eq!(body["data"]["payment"]["upiId"], "pay@upi");
    assert!(body["data"]["payment"].get("upiQrImage").is_none());
    assert_eq!(body["data"]["contact"]["supportEmail"], "help@example.com");
}
