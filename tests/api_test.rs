mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use balance_manager::handlers::router;
use common::{funded, test_coordinator};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health() {
    let (coordinator, _store) = test_coordinator();

    let (status, body) = get(router(coordinator), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_increment_creates_balance() {
    let (coordinator, _store) = test_coordinator();
    let app = router(coordinator);

    let (status, body) = post_json(
        app.clone(),
        "/balance/inc",
        json!({ "user_id": 1, "money": "100" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_id": 1, "money": "100" }));

    let (status, body) = get(app, "/balance?user_id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["money"], "100");
}

#[tokio::test]
async fn test_money_accepts_json_number() {
    let (coordinator, _store) = test_coordinator();

    let (status, body) = post_json(
        router(coordinator),
        "/balance/inc",
        json!({ "user_id": 1, "money": 25 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["money"], "25");
}

#[tokio::test]
async fn test_get_balance_of_unknown_user_is_404() {
    let (coordinator, _store) = test_coordinator();

    let (status, body) = get(router(coordinator), "/balance?user_id=7").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "user_not_found");
}

#[tokio::test]
async fn test_decrement_over_balance_is_422() {
    let (coordinator, _store) = funded(&[(1, dec!(10))]).await;

    let (status, body) = post_json(
        router(coordinator),
        "/balance/dec",
        json!({ "user_id": 1, "money": "11" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "insufficient_funds");
}

#[tokio::test]
async fn test_non_positive_amount_is_400() {
    let (coordinator, _store) = funded(&[(1, dec!(10))]).await;

    let (status, body) = post_json(
        router(coordinator),
        "/balance/dec",
        json!({ "user_id": 1, "money": "-5" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_amount");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (coordinator, _store) = test_coordinator();

    let (status, body) = post_json(
        router(coordinator),
        "/balance/inc",
        json!({ "user_id": 1 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_missing_query_parameter_is_400() {
    let (coordinator, _store) = test_coordinator();

    let (status, body) = get(router(coordinator), "/balance").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_transfer_returns_both_balances() {
    let (coordinator, _store) = funded(&[(1, dec!(100)), (2, dec!(5))]).await;

    let (status, body) = post_json(
        router(coordinator),
        "/balance/transfer",
        json!({ "from_id": 1, "to_id": 2, "money": "40" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "from": { "user_id": 1, "money": "60" },
            "to": { "user_id": 2, "money": "45" }
        })
    );
}

#[tokio::test]
async fn test_transfer_to_self_is_400() {
    let (coordinator, _store) = funded(&[(1, dec!(100))]).await;

    let (status, body) = post_json(
        router(coordinator),
        "/balance/transfer",
        json!({ "from_id": 1, "to_id": 1, "money": "1" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "self_transfer");
}

#[tokio::test]
async fn test_list_balances() {
    let (coordinator, _store) = funded(&[(2, dec!(20)), (1, dec!(10))]).await;

    let (status, body) = get(router(coordinator), "/balances").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "user_id": 1, "money": "10" },
            { "user_id": 2, "money": "20" }
        ])
    );
}

#[tokio::test]
async fn test_reserve_release_and_report_flow() {
    let (coordinator, _store) = funded(&[(1, dec!(100))]).await;
    let app = router(coordinator);
    let order = json!({ "user_id": 1, "service_id": 5, "order_id": 9, "money": "30" });

    let (status, body) = post_json(app.clone(), "/reserve/inc", order.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "user_id": 1,
            "service_id": 5,
            "order_id": 9,
            "money": "30",
            "user_balance": { "user_id": 1, "money": "70" }
        })
    );

    let (status, body) = get(app.clone(), "/reserve?user_id=1&service_id=5&order_id=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["money"], "30");

    let (status, body) = post_json(app.clone(), "/reserve/dec", order).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["money"], "0");
    assert_eq!(body["report"]["money"], "30");
    assert_eq!(body["report"]["order_id"], 9);

    let (status, body) = get(app.clone(), "/report?user_id=1").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["service_id"], 5);
    assert_eq!(entries[0]["money"], "30");

    let (_, body) = get(app, "/balance?user_id=1").await;
    assert_eq!(body["money"], "70");
}

#[tokio::test]
async fn test_unknown_reservation_is_404() {
    let (coordinator, _store) = funded(&[(1, dec!(100))]).await;
    let app = router(coordinator);

    let (status, body) = get(app.clone(), "/reserve?user_id=1&service_id=1&order_id=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "reservation_not_found");

    let (status, _) = post_json(
        app,
        "/reserve/dec",
        json!({ "user_id": 1, "service_id": 1, "order_id": 1, "money": "1" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_of_unknown_user_is_empty() {
    let (coordinator, _store) = test_coordinator();

    let (status, body) = get(router(coordinator), "/report?user_id=99").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_storage_failure_is_500_without_details() {
    let (coordinator, store) = funded(&[(1, dec!(100))]).await;
    let app = router(coordinator);
    let order = json!({ "user_id": 1, "service_id": 2, "order_id": 3, "money": "10" });

    post_json(app.clone(), "/reserve/inc", order.clone()).await;
    store.fail_report_inserts(true);

    let (status, body) = post_json(app, "/reserve/dec", order).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "storage_error");
    assert_eq!(body["error"]["message"], "An internal error occurred");
}
