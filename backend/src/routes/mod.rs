//! Route definitions for Farm GAP Records

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use shared::{
    Collection, Fertilizer, FertilizerUse, Field, Group, Harvest, Pesticide, PesticideUse, Seed,
    Shipment, Training, Visitor, WorkLog, Worker,
};

use crate::{handlers, middleware::auth_middleware, services::CsvSchema, AppState};

/// Create API routes
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - master data
        .nest(&path(Collection::Fields), record_routes::<Field>(state))
        .nest(&path(Collection::Seeds), record_routes::<Seed>(state))
        .nest(&path(Collection::Fertilizers), record_routes::<Fertilizer>(state))
        .nest(&path(Collection::Pesticides), record_routes::<Pesticide>(state))
        // Protected routes - field activity
        .nest(&path(Collection::PesticideUses), record_routes::<PesticideUse>(state))
        .nest(&path(Collection::FertilizerUses), record_routes::<FertilizerUse>(state))
        .nest(&path(Collection::WorkLogs), record_routes::<WorkLog>(state))
        .nest(&path(Collection::Harvests), record_routes::<Harvest>(state))
        .nest(&path(Collection::Shipments), record_routes::<Shipment>(state))
        // Protected routes - people and compliance
        .nest(&path(Collection::Workers), record_routes::<Worker>(state))
        .nest(&path(Collection::Groups), record_routes::<Group>(state))
        .nest(&path(Collection::Trainings), record_routes::<Training>(state))
        .nest(&path(Collection::Visitors), record_routes::<Visitor>(state))
        // Protected routes - traceability and reports
        .nest("/traceability", traceability_routes(state))
        .nest("/reports", report_routes(state))
}

fn path(collection: Collection) -> String {
    format!("/{}", collection)
}

/// CRUD plus CSV transfer for one collection (protected)
fn record_routes<T: CsvSchema>(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_records::<T>).post(handlers::create_record::<T>),
        )
        .route("/export", get(handlers::export_records::<T>))
        .route("/import", post(handlers::import_records::<T>))
        .route(
            "/:id",
            get(handlers::get_record::<T>)
                .put(handlers::update_record::<T>)
                .delete(handlers::delete_record::<T>),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Lot chain routes (protected)
fn traceability_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_lot_chains))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Report routes (protected)
fn report_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/analytics", get(handlers::get_analytics))
        .route("/monthly", get(handlers::get_monthly_trend))
        .route("/usage", get(handlers::get_usage))
        .route("/disposal", get(handlers::get_disposal))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::middleware::auth::Claims;
    use crate::services::CancelToken;
    use crate::store::MemoryRecordStore;
    use crate::{create_app, AppState};

    fn state() -> AppState {
        AppState {
            store: Arc::new(MemoryRecordStore::new()),
            config: Arc::new(Config::for_tests()),
            shutdown: CancelToken::never(),
        }
    }

    fn bearer(owner: &str) -> String {
        let claims = Claims {
            sub: owner.to_string(),
            org: None,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        format!("Bearer {}", token)
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn json_request(method: &str, uri: &str, owner: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(owner))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str, owner: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = create_app(state());
        let request = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["store"], "connected");
    }

    #[tokio::test]
    async fn test_records_require_token() {
        let app = create_app(state());
        let request = Request::builder()
            .uri("/api/v1/harvests")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_create_list_and_trace_harvest() {
        let app = create_app(state());

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/harvests",
                "alice",
                json!({
                    "fieldName": "A",
                    "cropName": "Tomato",
                    "harvestDate": "2024-06-01",
                    "quantity": "80",
                    "disposalAmount": "20",
                    "lotNumber": "L-001"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(created["ownerId"], "alice");

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/shipments",
                "alice",
                json!({
                    "destination": "Tokyo Market",
                    "shipmentDate": "2024-06-02",
                    "cropName": "Tomato",
                    "fieldName": "A",
                    "quantity": "80"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Other owners see nothing
        let (_, body) = send(&app, get_request("/api/v1/harvests", "bob")).await;
        let listed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.as_array().map(Vec::len), Some(0));

        let (status, body) = send(
            &app,
            get_request(
                "/api/v1/traceability?start=2024-06-01&end=2024-06-30&destination=tokyo",
                "alice",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let chains: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(chains["L-001"]["shipments"].as_array().map(Vec::len), Some(1));
        assert_eq!(chains["L-001"]["timeline"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_invalid_record_is_bad_request() {
        let app = create_app(state());
        let (status, body) = send(
            &app,
            json_request("POST", "/api/v1/visitors", "alice", json!({ "visitorName": " " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["field"], "visitorName");
    }

    #[tokio::test]
    async fn test_csv_import_reports_row_errors() {
        let app = create_app(state());
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/visitors/import")
            .header(header::AUTHORIZATION, bearer("alice"))
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from("訪問日,会社名\n2024-06-01,ACME\n"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let summary: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(summary["imported"], 0);
        assert_eq!(summary["errors"], json!(["2行目: 訪問者名は必須です"]));
    }

    #[tokio::test]
    async fn test_reports_require_range() {
        let app = create_app(state());
        let (status, _) = send(&app, get_request("/api/v1/reports/analytics", "alice")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            get_request("/api/v1/reports/monthly?start=2024-03-01&end=2024-01-01", "alice"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
