use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use parcel_core::domain::idn::Idn;
use parcel_core::{ApplicationError, RequestContext};
use parcel_customer::rpc_server::{self, RpcServerHandle};
use parcel_customer::{CustomerDirectory, CustomerRpcServer};
use parcel_db::{
    connect_with_settings, migrations, DbPool, SqlCustomerRepository, SqlShipmentRepository,
};
use parcel_shipment::{http, CustomerGateway, RpcCustomerClient, ShipmentWorkflow};
use serde_json::Value;
use tower::ServiceExt;

struct Harness {
    _dir: tempfile::TempDir,
    pool: DbPool,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("parcel.db").display());
        let pool = connect_with_settings(&url, 4, 5).await.expect("pool");
        migrations::run_pending(&pool).await.expect("migrations");
        Self { _dir: dir, pool }
    }

    async fn customer_service(&self, port: u16) -> RpcServerHandle {
        let directory =
            CustomerDirectory::new(Arc::new(SqlCustomerRepository::new(self.pool.clone())));
        let server = CustomerRpcServer::new(directory, Duration::from_secs(5));
        rpc_server::spawn("127.0.0.1", port, server).await.expect("customer service should bind")
    }

    fn shipment_api(&self, customer_address: String) -> Router {
        let workflow = ShipmentWorkflow::new(
            Arc::new(RpcCustomerClient::new(customer_address, Duration::from_secs(2))),
            Arc::new(SqlShipmentRepository::new(self.pool.clone())),
        );
        http::router(workflow, Duration::from_secs(5))
    }

    async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("count rows")
    }
}

fn free_port() -> u16 {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    probe.local_addr().expect("probe address").port()
}

fn create(body: &str) -> Request<Body> {
    Request::post("/api/v1/shipments")
        .header("content-type", "application/json")
        .header("x-request-id", "flow-test")
        .body(Body::from(body.to_owned()))
        .expect("request")
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn shipment_is_created_against_a_live_customer_service() {
    let harness = Harness::new().await;
    let customers = harness.customer_service(0).await;
    let api = harness.shipment_api(customers.local_addr().to_string());

    let body =
        r#"{"route":"  ALMATY->ASTANA  ","price":120000,"customer":{"idn":" 990101123456 "}}"#;
    let first = api.clone().oneshot(create(body)).await.expect("response");
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(first.headers()["x-request-id"], "flow-test");
    let first = json(first).await;

    let second = json(api.clone().oneshot(create(body)).await.expect("response")).await;
    assert_ne!(first["id"], second["id"]);
    assert_eq!(first["customerId"], second["customerId"]);

    let id = first["id"].as_str().expect("id");
    let request =
        Request::get(format!("/api/v1/shipments/{id}")).body(Body::empty()).expect("request");
    let fetched = api.oneshot(request).await.expect("response");
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched = json(fetched).await;
    assert_eq!(fetched["route"], "ALMATY->ASTANA");
    assert_eq!(fetched["price"], serde_json::json!(120000));
    assert_eq!(fetched["status"], "CREATED");
    assert_eq!(fetched["customerId"], first["customerId"]);

    assert_eq!(harness.count("customers").await, 1);
    assert_eq!(harness.count("shipments").await, 2);

    customers.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn unavailable_customer_service_stores_nothing() {
    let harness = Harness::new().await;
    let api = harness.shipment_api(format!("127.0.0.1:{}", free_port()));

    let response = api
        .oneshot(create(r#"{"route":"A-B","price":1,"customer":{"idn":"990101123456"}}"#))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(response).await["error"], "customer service unavailable");
    assert_eq!(harness.count("customers").await, 0);
    assert_eq!(harness.count("shipments").await, 0);
}

#[tokio::test]
async fn client_connects_once_the_customer_service_comes_up() {
    let harness = Harness::new().await;
    let port = free_port();
    let client = RpcCustomerClient::new(format!("127.0.0.1:{port}"), Duration::from_secs(2));
    let idn = Idn::parse("990101123456").expect("idn");
    let context = RequestContext::new("late-start");

    let early = client.upsert_by_idn(&context, &idn).await;
    assert!(matches!(early, Err(ApplicationError::UpstreamUnavailable(_))));

    let customers = harness.customer_service(port).await;

    assert_eq!(client.get_by_idn(&context, &idn).await.expect("lookup"), None);
    let created = client.upsert_by_idn(&context, &idn).await.expect("upsert after start");
    let found = client.get_by_idn(&context, &idn).await.expect("lookup").expect("present");
    assert_eq!(created, found);

    customers.shutdown(Duration::from_secs(1)).await;
}
