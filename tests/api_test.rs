use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use marketplace_core::adapters::MemoryStore;
use marketplace_core::domain::Role;
use marketplace_core::{create_app, startup};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test_secret_key";

struct TestApp {
    app: Router,
    store: MemoryStore,
}

async fn setup_test_app() -> TestApp {
    let store = MemoryStore::new();
    let hash = bcrypt::hash("secret", 4).unwrap();
    store.insert_user("Seller", &hash, Role::Seller).await;
    store.insert_user("Buyer", &hash, Role::Buyer).await;
    store.insert_user("Rival", &hash, Role::Seller).await;

    let app = create_app(startup::in_memory(store.clone(), SECRET));
    TestApp { app, store }
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/v1/auth/login",
                None,
                Some(json!({ "Username": username, "Password": "secret" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["Data"]["Token"].as_str().unwrap().to_string()
    }

    async fn add_product(&self, token: &str, name: &str, price: i64) {
        let (status, _) = self
            .call(
                Method::POST,
                "/v1/product",
                Some(token),
                Some(json!({ "Name": name, "Description": "test", "Price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_login_returns_token_pair() {
    let app = setup_test_app().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "Username": "Buyer", "Password": "secret" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Code"], 200);
    assert_eq!(body["Status"], "Success");
    assert!(body["Data"]["Token"].is_string());
    assert!(body["Data"]["RefreshToken"].is_string());
    assert!(body["Error"].is_null());
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let app = setup_test_app().await;

    let (wrong_status, wrong_body) = app
        .call(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "Username": "Buyer", "Password": "wrongpassword" })),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .call(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "Username": "Nobody", "Password": "secret" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["Status"], "Failed");
    assert_eq!(wrong_body["Error"], "invalid username or password");
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = setup_test_app().await;

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["Code"], 400);
    assert_eq!(body["Status"], "Failed");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = setup_test_app().await;

    let (status, body) = app.call(Method::GET, "/v1/product", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["Status"], "Failed");

    let (status, _) = app
        .call(Method::GET, "/v1/transaction", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gates() {
    let app = setup_test_app().await;
    let buyer = app.login("Buyer").await;
    let seller = app.login("Seller").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/product",
            Some(&buyer),
            Some(json!({ "Name": "Widget", "Description": "", "Price": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["Error"], "seller role required");

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction",
            Some(&seller),
            Some(json!({ "SellerID": 3, "Items": [1] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(Method::GET, "/v1/transaction/history", Some(&seller), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction/accept",
            Some(&buyer),
            Some(json!({ "TransactionID": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_seller_catalog_and_buyer_browsing() {
    let app = setup_test_app().await;
    let seller = app.login("Seller").await;
    let buyer = app.login("Buyer").await;

    app.add_product(&seller, "Keyboard", 50_000).await;
    app.add_product(&seller, "Mouse", 70_000).await;

    let (status, body) = app.call(Method::GET, "/v1/product", Some(&seller), None).await;
    assert_eq!(status, StatusCode::OK);
    let products = body["Data"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["Name"], "Keyboard");
    assert_eq!(products[0]["SellerID"], 1);

    let (status, body) = app
        .call(Method::GET, "/v1/product/list?seller=1", Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .call(Method::GET, "/v1/product/list?seller=3", Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["Data"].as_array().unwrap().is_empty());

    let (status, _) = app
        .call(Method::GET, "/v1/product/list?seller=abc", Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_product_is_rejected() {
    let app = setup_test_app().await;
    let seller = app.login("Seller").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/product",
            Some(&seller),
            Some(json!({ "Name": "Broken", "Description": "", "Price": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Status"], "Failed");

    let (_, body) = app.call(Method::GET, "/v1/product", Some(&seller), None).await;
    assert!(body["Data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_prices_must_fit_two_decimal_places() {
    let app = setup_test_app().await;
    let seller = app.login("Seller").await;

    for price in [json!(50000.505), json!(10_000_000_000_000_000_i64)] {
        let (status, body) = app
            .call(
                Method::POST,
                "/v1/product",
                Some(&seller),
                Some(json!({ "Name": "Lamp", "Description": "", "Price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["Error"].as_str().unwrap().starts_with("Price: "));
    }

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/product",
            Some(&seller),
            Some(json!({ "Name": "Lamp", "Description": "", "Price": 50000.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call(Method::GET, "/v1/product", Some(&seller), None).await;
    let products = body["Data"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["Price"], "50000.50");
}

#[tokio::test]
async fn test_order_lifecycle_with_coupons() {
    let app = setup_test_app().await;
    let seller = app.login("Seller").await;
    let buyer = app.login("Buyer").await;

    app.add_product(&seller, "Keyboard", 50_000).await;
    app.add_product(&seller, "Mouse", 70_000).await;
    app.add_product(&seller, "Monitor", 200_000).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/transaction",
            Some(&buyer),
            Some(json!({ "SellerID": 1, "Items": [1, 2, 3] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"]["coupons"], 5);

    let (status, body) = app.call(Method::GET, "/v1/transaction", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    let transactions = body["Data"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["Status"], "Pending");
    assert_eq!(transactions[0]["Coupons"], 0);
    assert_eq!(transactions[0]["Items"].as_array().unwrap().len(), 3);
    assert_eq!(transactions[0]["Seller"]["Username"], "Seller");
    assert!(transactions[0]["Seller"].get("Password").is_none());

    let (status, body) = app
        .call(Method::GET, "/v1/transaction/history", Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["Data"]["transactions"].as_array().unwrap().is_empty());
    assert_eq!(body["Data"]["coupons"], 0);

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction/accept",
            Some(&seller),
            Some(json!({ "TransactionID": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(Method::GET, "/v1/transaction/history", Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["Data"]["transactions"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["Status"], "Open");
    assert_eq!(history[0]["Transaction"]["Status"], "Accepted");
    assert_eq!(history[0]["Transaction"]["Coupons"], 4);
    assert_eq!(body["Data"]["coupons"], 4);

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction/accept",
            Some(&seller),
            Some(json!({ "TransactionID": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app
        .call(Method::GET, "/v1/transaction/history", Some(&buyer), None)
        .await;
    assert_eq!(body["Data"]["coupons"], 4);

    app.store
        .set_transaction_created_at(1, Utc::now() - Duration::hours(4))
        .await
        .unwrap();
    let (_, body) = app
        .call(Method::GET, "/v1/transaction/history", Some(&buyer), None)
        .await;
    assert_eq!(body["Data"]["transactions"][0]["Status"], "Closed");
}

#[tokio::test]
async fn test_cross_seller_items_roll_back_the_order() {
    let app = setup_test_app().await;
    let seller = app.login("Seller").await;
    let rival = app.login("Rival").await;
    let buyer = app.login("Buyer").await;

    app.add_product(&seller, "Keyboard", 10).await;
    app.add_product(&rival, "Lamp", 10).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/transaction",
            Some(&buyer),
            Some(json!({ "SellerID": 1, "Items": [1, 2] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["Error"], "product not found");

    let (_, body) = app.call(Method::GET, "/v1/transaction", Some(&buyer), None).await;
    assert!(body["Data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_validation_errors() {
    let app = setup_test_app().await;
    let buyer = app.login("Buyer").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction",
            Some(&buyer),
            Some(json!({ "SellerID": 1, "Items": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction",
            Some(&buyer),
            Some(json!({ "Items": [1] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::POST,
            "/v1/transaction",
            Some(&buyer),
            Some(json!({ "SellerID": 42, "Items": [1] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["Error"], "user not found");
}

#[tokio::test]
async fn test_accepting_another_sellers_order_is_not_found() {
    let app = setup_test_app().await;
    let seller = app.login("Seller").await;
    let rival = app.login("Rival").await;
    let buyer = app.login("Buyer").await;

    app.add_product(&seller, "Keyboard", 10).await;
    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction",
            Some(&buyer),
            Some(json!({ "SellerID": 1, "Items": [1] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction/accept",
            Some(&rival),
            Some(json!({ "TransactionID": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::POST,
            "/v1/transaction/accept",
            Some(&seller),
            Some(json!({ "TransactionID": 99 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.call(Method::GET, "/v1/transaction", Some(&rival), None).await;
    assert!(body["Data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = setup_test_app().await;

    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["dependencies"]["storage"]["status"], "healthy");

    let (status, body) = app
        .call(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/transaction/history"].is_object());
}
