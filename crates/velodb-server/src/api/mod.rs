mod bikes;

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use velodb_core::AppConfig;

use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_store_error(error: &velodb_store::StoreError) -> ApiError {
    tracing::error!(error = %error, "snapshot store query failed");
    ApiError::new("internal_error", "snapshot store query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/bikes", get(bikes::list_bikes))
        .route("/api/compare", get(bikes::compare))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id))
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use std::path::Path;
    use tower::ServiceExt;
    use velodb_core::{Environment, ProductRecord};

    fn test_config(data_dir: &Path) -> AppConfig {
        AppConfig {
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("test bind addr"),
            log_level: "info".to_string(),
            sites_path: data_dir.join("sites.yaml"),
            data_dir: data_dir.to_path_buf(),
            scraper_request_timeout_secs: 5,
            scraper_user_agent: "velodb-test/0.1".to_string(),
            scraper_max_retries: 1,
            scraper_retry_delay_secs: 0,
            scraper_page_delay_secs: 0,
            scraper_product_delay_secs: 0,
            scraper_max_listing_pages: 10,
            crawl_on_start: false,
            crawl_schedule: "0 0 0 * * *".to_string(),
        }
    }

    fn record(product_id: &str, price: Option<&str>) -> ProductRecord {
        ProductRecord {
            website: "Engwe US".to_string(),
            product_id: product_id.to_string(),
            language: "en-US".to_string(),
            url: format!("https://engwe-bikes.example.com/products/{product_id}"),
            crawl_date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            name: Some(format!("Bike {product_id}")),
            price: price.map(|p| p.parse().unwrap()),
            description: None,
            battery: Some("48V 15Ah".to_string()),
            motor_type: None,
            max_speed: None,
            range: None,
            weight: None,
            max_load: None,
            images: vec!["https://cdn.example.com/a.jpg".to_string()],
        }
    }

    fn app_with_fixtures(data_dir: &Path) -> Router {
        velodb_store::write_snapshot(
            data_dir,
            "engwe_us",
            &[
                record("city-750", Some("1299.00")),
                record("trail-1000", None),
            ],
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
        .expect("write fixture snapshot");

        build_app(AppState {
            config: Arc::new(test_config(data_dir)),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(AppState {
            config: Arc::new(test_config(dir.path())),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"].as_str(), Some("ok"));
    }

    #[tokio::test]
    async fn list_bikes_returns_bare_array_with_null_for_absent_price() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_fixtures(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/bikes")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let rows = json.as_array().expect("bare JSON array");
        assert_eq!(rows.len(), 2);

        let city = rows
            .iter()
            .find(|r| r["id"] == "engwe_us_city-750_en-US")
            .expect("city-750 row");
        assert_eq!(city["website_key"].as_str(), Some("engwe_us"));
        assert_eq!(city["price"].as_str(), Some("1299.00"));

        let trail = rows
            .iter()
            .find(|r| r["id"] == "engwe_us_trail-1000_en-US")
            .expect("trail-1000 row");
        assert!(trail["price"].is_null(), "absent price serializes as null");
        assert!(trail["description"].is_null());
    }

    #[tokio::test]
    async fn list_bikes_with_empty_store_returns_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(AppState {
            config: Arc::new(test_config(dir.path())),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/bikes")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn compare_returns_only_requested_ids_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_fixtures(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/compare?bike_ids=engwe_us_trail-1000_en-US&bike_ids=engwe_us_nope_en-US&bike_ids=engwe_us_city-750_en-US")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let rows = json.as_array().expect("bare JSON array");
        assert_eq!(rows.len(), 2, "unknown ids are omitted");
        assert_eq!(rows[0]["id"], "engwe_us_trail-1000_en-US");
        assert_eq!(rows[1]["id"], "engwe_us_city-750_en-US");
    }

    #[tokio::test]
    async fn compare_without_parameters_returns_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_fixtures(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/compare")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn responses_carry_a_request_id_header() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(AppState {
            config: Arc::new(test_config(dir.path())),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("x-request-id", "req-test-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-test-42")
        );
    }

    #[test]
    fn api_error_unknown_code_maps_to_internal_error() {
        let response = ApiError::new("internal_error", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
