//! Integration tests for the HTTP services.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::Services;
use api::config::{Config, ServiceKind};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::seed;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{DecrementMode, InMemoryOrderRepository, OrderRepository};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");
            api::routes::metrics::describe();
            handle
        })
        .clone()
}

fn orders() -> Arc<dyn OrderRepository> {
    Arc::new(InMemoryOrderRepository::new())
}

fn app_for(config: &Config) -> Router {
    let routes = api::build_services(config, Services::seeded(config.decrement_mode), orders())
        .expect("failed to build services");
    api::create_app(config.service, routes, get_metrics_handle())
}

fn setup() -> Router {
    app_for(&Config::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn form_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn cart(pairs: &[(&str, u32)]) -> Value {
    let lines: serde_json::Map<String, Value> = pairs
        .iter()
        .map(|(id, qty)| (id.to_string(), json!({ "product_id": id, "quantity": qty })))
        .collect();
    Value::Object(lines)
}

async fn login(app: &Router, prefix: &str, user: &str) -> String {
    let (status, json) = send(
        app,
        form_request(
            "POST",
            &format!("{prefix}/login"),
            None,
            &format!("user={user}&pass={}", seed::DEMO_PASSWORD),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    json["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "standalone");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let token = login(&app, "/auth", "alex").await;
    let (status, _) = send(
        &app,
        json_request("POST", "/price/calculate", Some(&token), cart(&[("0002", 1)])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = app.oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("prices_calculated_total"));
}

#[tokio::test]
async fn test_login_and_info() {
    let app = setup();

    let token = login(&app, "/auth", "alex").await;
    let (status, json) = send(&app, get("/auth/info", Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "alex");
    assert_eq!(json["name"], "Alex Smith");
    assert_eq!(json["role"], "User");
}

#[tokio::test]
async fn test_login_rejections() {
    let app = setup();

    let (status, json) = send(&app, form_request("POST", "/auth/login", None, "user=alex")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("pass field missing"));

    let (status, _) = send(
        &app,
        form_request("POST", "/auth/login", None, "user=alex&pass=wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/auth/info", Some("unknown-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inventory_requires_token() {
    let app = setup();

    let (status, json) = send(&app, get("/inventory", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].is_string());

    let token = login(&app, "/auth", "alex").await;
    let (status, json) = send(&app, get("/inventory", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["0001"]["quantity"], 5);
    assert_eq!(json["0001"]["low_stock_threshold"], 2);
}

#[tokio::test]
async fn test_checked_decrement_refuses_oversell() {
    let app = setup();
    let token = login(&app, "/auth", "alex").await;

    let (status, _) = send(
        &app,
        json_request("POST", "/inventory/decrement", Some(&token), cart(&[("0001", 6)])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/inventory/decrement",
            Some(&token),
            cart(&[("0001", 2), ("0404", 1)]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["0001"]["quantity"], 3);
}

#[tokio::test]
async fn test_unchecked_decrement_goes_negative() {
    let config = Config {
        decrement_mode: DecrementMode::Unchecked,
        ..Config::default()
    };
    let app = app_for(&config);
    let token = login(&app, "/auth", "alex").await;

    let (status, json) = send(
        &app,
        json_request("POST", "/inventory/decrement", Some(&token), cart(&[("0001", 6)])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["0001"]["quantity"], -1);
}

#[tokio::test]
async fn test_calculate_price() {
    let app = setup();
    let token = login(&app, "/auth", "alex").await;

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/price/calculate",
            Some(&token),
            cart(&[("0001", 1), ("0002", 3)]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"]["cents"], 4550 + 3 * 545);
    assert_eq!(json["discount"]["cents"], 910 + 545);
    assert_eq!(json["discount_reasons"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        json_request("POST", "/price/calculate", Some(&token), cart(&[("0404", 1)])),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_price_requires_manager() {
    let app = setup();
    let user = login(&app, "/auth", "alex").await;
    let manager = login(&app, "/auth", "antero").await;

    let (status, _) = send(
        &app,
        form_request("PUT", "/price/manager/set-price/0001", Some(&user), "price=40"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = send(
        &app,
        form_request("PUT", "/price/manager/set-price/0001", Some(&manager), "price=40.25"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"]["cents"], 4025);

    let (_, json) = send(&app, get("/price", Some(&user))).await;
    assert_eq!(json["0001"]["price"]["cents"], 4025);
}

#[tokio::test]
async fn test_set_price_rejections() {
    let app = setup();
    let manager = login(&app, "/auth", "antero").await;
    let uri = "/price/manager/set-price/0001";

    let (status, _) = send(&app, form_request("PUT", uri, Some(&manager), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, form_request("PUT", uri, Some(&manager), "price=cheap")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, form_request("PUT", uri, Some(&manager), "price=-1")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        form_request("PUT", "/price/manager/set-price/0404", Some(&manager), "price=1"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_cart_bodies() {
    let app = setup();
    let token = login(&app, "/auth", "alex").await;
    let manager = login(&app, "/auth", "antero").await;
    let mislabeled = json!({ "0001": { "product_id": "0002", "quantity": 1 } });

    let (status, json) = send(
        &app,
        json_request("POST", "/price/calculate", Some(&token), mislabeled.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("key 0001 names product 0002")
    );

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/order/new",
            Some(&token),
            json!({ "cart": mislabeled, "customer_id": "000002" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["order"].is_null());

    let too_many = json!({ "0002": { "product_id": "0002", "quantity": 4_294_967_296u64 } });
    let (status, _) = send(
        &app,
        json_request("POST", "/inventory/decrement", Some(&token), too_many),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stock) = send(&app, get("/inventory", Some(&token))).await;
    assert_eq!(stock["0001"]["quantity"], 5);
    assert_eq!(stock["0002"]["quantity"], 50);

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/price/calculate",
            Some(&token),
            cart(&[("0002", u32::MAX), ("0003", u32::MAX)]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["discount"]["cents"], 545 * (2 * u64::from(u32::MAX) / 3));

    let uri = "/price/manager/set-price/0001";
    let (status, _) = send(&app, form_request("PUT", uri, Some(&manager), "price=1e300")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, form_request("PUT", uri, Some(&manager), "price=1000000000")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = send(
        &app,
        json_request("POST", "/price/calculate", Some(&token), cart(&[("0001", u32::MAX)])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validation failed: cart total is too large to price");
}

#[tokio::test]
async fn test_loyalty_points_and_update() {
    let app = setup();
    let token = login(&app, "/auth", "alex").await;

    let (status, json) = send(&app, get("/loyalty/points/000002", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["customer"]["points"], 1000);
    assert_eq!(json["redemption_rate"], 100);

    let (status, _) = send(&app, get("/loyalty/points/999999", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/loyalty/update-points",
            Some(&token),
            json!({ "customer_id": "000002", "cart": cart(&[("0001", 2)]), "redeem_points": 500 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["points_before"], 1000);
    assert_eq!(json["points_after"], 682);
    assert_eq!(json["redemption_value"]["cents"], 500);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/loyalty/update-points",
            Some(&token),
            json!({ "customer_id": "000002", "cart": {}, "redeem_points": 5000 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_buy_and_fetch_order() {
    let app = setup();
    let token = login(&app, "/auth", "alex").await;

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/order/new",
            Some(&token),
            json!({
                "cart": cart(&[("0002", 2)]),
                "customer_id": "000002",
                "delivery_address": "12 Harbour Road"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["message"], "order processed successfully");
    assert_eq!(json["warnings"], json!([]));
    assert!(json.get("errors").is_none());
    assert_eq!(json["order"]["status"], "Processed");
    assert_eq!(json["order"]["total"]["cents"], 2 * 545 + 500);

    let id = json["order"]["id"].as_str().unwrap().to_string();
    let (status, order) = send(&app, get(&format!("/order/orders/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["id"], id.as_str());
    assert_eq!(order["delivery_address"], "12 Harbour Road");

    let (_, stock) = send(&app, get("/inventory", Some(&token))).await;
    assert_eq!(stock["0002"]["quantity"], 48);
}

#[tokio::test]
async fn test_buy_envelopes_on_failure() {
    let app = setup();
    let token = login(&app, "/auth", "alex").await;
    let body = json!({ "cart": cart(&[("0002", 1), ("0404", 1)]), "customer_id": "000002" });

    let (status, json) = send(&app, json_request("POST", "/order/new", None, body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["order"].is_null());
    assert_eq!(json["errors"], json!(["missing bearer token"]));

    let (status, json) = send(&app, json_request("POST", "/order/new", Some(&token), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "unable to fulfill order");
    assert_eq!(json["errors"], json!(["product with ID: 0404 not found"]));

    let (status, json) = send(
        &app,
        json_request("POST", "/order/new", Some(&token), json!({ "cart": cart(&[("0002", 1)]) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"], json!(["customer_id is required"]));

    let request = Request::builder()
        .method("POST")
        .uri("/order/new")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_lookup_errors() {
    let app = setup();
    let token = login(&app, "/auth", "alex").await;

    let (status, _) = send(&app, get("/order/orders/not-a-uuid", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        get(
            "/order/orders/00000000-0000-0000-0000-000000000000",
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        get("/order/orders/00000000-0000-0000-0000-000000000000", None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn serve_kind(kind: ServiceKind, base: &Config) -> String {
    let config = Config {
        service: kind,
        ..base.clone()
    };
    serve(app_for(&config)).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_split_deployment_over_http() {
    let mut config = Config {
        upstream_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    config.auth_url = serve_kind(ServiceKind::Auth, &config).await;
    config.inventory_url = serve_kind(ServiceKind::Inventory, &config).await;
    config.price_url = serve_kind(ServiceKind::Price, &config).await;
    config.loyalty_url = serve_kind(ServiceKind::Loyalty, &config).await;

    let order_app = app_for(&Config {
        service: ServiceKind::Order,
        ..config.clone()
    });

    let (status, json) = send(&order_app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service"], "order");

    let http = reqwest::Client::new();
    let login: Value = http
        .post(format!("{}/login", config.auth_url))
        .form(&[("user", "alex"), ("pass", seed::DEMO_PASSWORD)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    let (status, json) = send(
        &order_app,
        json_request(
            "POST",
            "/new",
            Some(&token),
            json!({ "cart": cart(&[("0001", 1)]), "customer_id": "000002", "redeem_points": 500 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["order"]["discount"]["cents"], 910 + 500);

    let stock: Value = http
        .get(&config.inventory_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stock["0001"]["quantity"], 4);

    let forbidden = http
        .put(format!("{}/manager/set-price/0001", config.price_url))
        .bearer_auth(&token)
        .form(&[("price", "1.00")])
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let (status, json) = send(
        &order_app,
        json_request(
            "POST",
            "/new",
            Some("not-a-token"),
            json!({ "cart": cart(&[("0001", 1)]), "customer_id": "000002" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{json}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_loyalty_without_price_server_is_unavailable() {
    let mut config = Config {
        upstream_timeout: Duration::from_millis(500),
        upstream_retries: 0,
        price_url: "http://127.0.0.1:9".to_string(),
        ..Config::default()
    };
    config.auth_url = serve_kind(ServiceKind::Auth, &config).await;
    let loyalty = app_for(&Config {
        service: ServiceKind::Loyalty,
        ..config.clone()
    });

    let login: Value = reqwest::Client::new()
        .post(format!("{}/login", config.auth_url))
        .form(&[("user", "alex"), ("pass", seed::DEMO_PASSWORD)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap();

    let (status, json) = send(
        &loyalty,
        json_request(
            "POST",
            "/update-points",
            Some(token),
            json!({ "customer_id": "000002", "cart": cart(&[("0001", 1)]) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{json}");
}
