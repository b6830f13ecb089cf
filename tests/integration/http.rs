//! HTTP API end to end through the router.

use axum::http::StatusCode;
use serde_json::json;

use streamcredit::config::AppConfig;

use crate::fixtures::{app, benford_records, get, post, uniform_records};

fn custom_config() -> AppConfig {
    AppConfig::parse(
        r#"
        [server]
        api_prefix = "/api/v2"
        cors_origins = ["*"]

        [credit]
        max_credit_limit = 25000.0
        "#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_evaluate_healthy_merchant() {
    let cfg = AppConfig::default();
    let records = benford_records(12, 100, 20.0);
    let body = json!({ "transactions": records });

    let (status, json) = post(app(&cfg), "/api/v1/credit/evaluate", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["decision"], "Approved");
    assert_eq!(json["score"], 750);
    assert_eq!(json["credit_limit"], 10000.0);
    assert_eq!(json["risk_level"], "Low");
    assert_eq!(json["total_transactions"], 1200);
    assert_eq!(json["fraud_check"]["is_fraud"], false);
}

#[tokio::test]
async fn test_evaluate_tolerates_malformed_records() {
    let cfg = AppConfig::default();
    let mut records = serde_json::to_value(benford_records(12, 100, 20.0)).unwrap();
    let list = records.as_array_mut().unwrap();
    list.push(json!({ "date": "not a date", "amount": "abc" }));
    list.push(json!({ "amount": "125.50" }));
    list.push(json!({}));

    let (status, json) = post(app(&cfg), "/api/v1/credit/evaluate", &json!({ "transactions": records })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_transactions"], 1203);
    assert_eq!(json["decision"], "Approved");
}

#[tokio::test]
async fn test_evaluate_skips_mistyped_fields() {
    let cfg = AppConfig::default();
    let mut records = serde_json::to_value(benford_records(12, 100, 20.0)).unwrap();
    let list = records.as_array_mut().unwrap();
    list.push(json!({ "order_id": 12345, "amount": true, "date": 20250101, "product_count": "3" }));
    list.push(json!({ "customer_id": { "id": 7 }, "amount": [1, 2], "date": null }));
    list.push(json!({ "order_id": "ORD_1", "amount": 250.0, "date": false }));
    list.push(json!("not a record"));
    list.push(json!(null));

    let (status, json) = post(app(&cfg), "/api/v1/credit/evaluate", &json!({ "transactions": records })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_transactions"], 1205);
    assert_eq!(json["decision"], "Approved");
    assert_eq!(json["score"], 750);
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let cfg = AppConfig::default();
    let (status, json) = post(
        app(&cfg),
        "/api/v1/credit/evaluate",
        &json!({ "transactions": "none" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_evaluate_uniform_merchant_is_fraud() {
    let cfg = AppConfig::default();
    let body = json!({ "transactions": uniform_records(600, 100.0, 1000.0) });

    let (status, json) = post(app(&cfg), "/api/v1/credit/evaluate", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["score"], 0);
    assert_eq!(json["decision"], "Rejected");
    assert_eq!(json["reasons"][0], "Fraud detected");
    assert_eq!(json["fraud_check"]["severity"], "critical");
}

#[tokio::test]
async fn test_custom_prefix_and_policy() {
    let cfg = custom_config();
    let (status, _) = get(app(&cfg), "/api/v1/risk/benford-expected").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json!({ "transactions": benford_records(12, 100, 20.0) });
    let (status, json) = post(app(&cfg), "/api/v2/credit/evaluate", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["credit_limit"], 25000.0);
}

#[tokio::test]
async fn test_analyze_full_response_shape() {
    let cfg = AppConfig::default();
    let amounts: Vec<f64> = (0..900).map(|i| 100.0 + i as f64).collect();
    let (status, json) = post(
        app(&cfg),
        "/api/v1/risk/analyze-transactions",
        &json!({ "transactions": amounts, "significance_level": 0.01 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_fraud"], true);
    assert_eq!(json["severity"], "critical");
    assert_eq!(json["significance_level"], 0.01);
    assert_eq!(json["fraud_probability"], 100.0);
    assert_eq!(json["digit_1_analysis"]["observed_percentage"], 11.11);
    assert_eq!(json["digit_1_analysis"]["is_within_threshold"], false);
    assert_eq!(json["red_flags"]["chi_square_violation"], true);
    assert!(json["interpretation"].as_str().unwrap().starts_with("CRITICAL"));

    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 9);
    assert_eq!(details[0]["digit"], 1);
    assert_eq!(details[0]["observed_count"], 100);
}

#[tokio::test]
async fn test_analyze_rejects_all_invalid_amounts() {
    let cfg = AppConfig::default();
    let (status, json) = post(
        app(&cfg),
        "/api/v1/risk/analyze-transactions",
        &json!({ "transactions": [0.0, -12.5, -3.0] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_quick_check_empty_is_neutral() {
    let cfg = AppConfig::default();
    let (status, json) = post(app(&cfg), "/api/v1/risk/quick-fraud-check", &json!([])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_fraud"], false);
    assert_eq!(json["confidence"], 0.0);
    assert_eq!(json["total_analyzed"], 0);
    assert_eq!(json["interpretation"], "No transactions provided");
}

#[tokio::test]
async fn test_demo_scenarios() {
    let cfg = AppConfig::default();

    let (status, json) = get(app(&cfg), "/api/v1/credit/demo/healthy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scenario"], "healthy");
    assert!(json["total_orders"].as_u64().unwrap() >= 12 * 50);
    assert!(json["monthly_avg_revenue"].as_f64().unwrap() > 5000.0);

    let (status, json) = get(app(&cfg), "/api/v1/credit/demo/Suspicious").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["score"], 0);

    let (status, json) = get(app(&cfg), "/api/v1/credit/demo/offshore").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("offshore"));
}

#[test]
fn test_health_blocking() {
    let cfg = AppConfig::default();
    let (status, json) = tokio_test::block_on(get(app(&cfg), "/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}
