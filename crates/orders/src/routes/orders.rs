//! Order API handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use bazaar_core::{CustomerSnapshot, OrderAccepted, OrderItem, OrderNumber, OrderSaved, OrderStatus};

use crate::db::OrderRepository;
use crate::db::orders::{Document, format_timestamp};
use crate::error::{AppError, Result};
use crate::state::AppState;

const SAVED_MESSAGE: &str = "Confirmed order saved";

/// An order pushed by a storefront.
///
/// Every field but the number is optional so partial pushes merge over the
/// stored record, but fields that are present must have the right shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    #[serde(default)]
    pub order_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl OrderSubmission {
    /// Trimmed order number; the trimmed form is also what gets stored.
    fn order_number(&mut self) -> Result<OrderNumber> {
        let number = self.order_number.trim().to_owned();
        if number.is_empty() {
            return Err(AppError::BadRequest("Order number is required".to_string()));
        }
        self.order_number.clone_from(&number);
        Ok(OrderNumber::new(number))
    }

    /// The fields this submission carries, as a JSON object.
    fn into_document(self) -> Result<Document> {
        match serde_json::to_value(self) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(AppError::Internal("order did not encode as an object".to_string())),
            Err(e) => Err(AppError::Internal(format!("order encoding failed: {e}"))),
        }
    }
}

/// `POST /api/orders` - record an order in any status.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OrderSubmission>, JsonRejection>,
) -> Result<Json<OrderAccepted>> {
    let Json(mut submission) = payload?;
    let order_number = submission.order_number()?;
    let document = submission.into_document()?;

    let stored = OrderRepository::new(state.pool())
        .upsert(&order_number, document, Utc::now())
        .await?;

    tracing::info!(order_number = %order_number, status = %stored.status, "Order recorded");

    Ok(Json(OrderAccepted {
        success: true,
        order_number,
    }))
}

/// `POST /api/save-order` - record a confirmed order.
///
/// Stamps the server-side `confirmedAt`.
#[instrument(skip(state, payload))]
pub async fn save_confirmed(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OrderSubmission>, JsonRejection>,
) -> Result<Json<OrderSaved>> {
    let Json(mut submission) = payload?;
    if submission.status != Some(OrderStatus::Confirmed) {
        return Err(AppError::BadRequest(
            "Only confirmed orders can be saved".to_string(),
        ));
    }
    let order_number = submission.order_number()?;

    let now = Utc::now();
    let mut document = submission.into_document()?;
    document.insert(
        "confirmedAt".to_owned(),
        Value::String(format_timestamp(now)),
    );

    OrderRepository::new(state.pool())
        .upsert(&order_number, document, now)
        .await?;

    tracing::info!(order_number = %order_number, "Confirmed order saved");

    Ok(Json(OrderSaved {
        success: true,
        message: SAVED_MESSAGE.to_string(),
        order_number,
    }))
}

/// `GET /api/orders/{orderNumber}`.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<Value>> {
    let order_number = OrderNumber::new(order_number);
    let stored = OrderRepository::new(state.pool())
        .get(&order_number)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(Json(Value::Object(stored.document)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::config::OrdersConfig;
    use crate::db::{create_pool, migrate};

    async fn test_app() -> (Router, AppState) {
        let config = OrdersConfig::for_tests();
        let pool = create_pool(&config.database_url).await.unwrap();
        migrate(&pool).await.unwrap();
        let state = AppState::new(config, pool);
        (crate::app(state.clone()), state)
    }

    fn post(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn order(number: &str, status: &str) -> Value {
        json!({
            "orderNumber": number,
            "date": "2025-03-01T10:00:00.000Z",
            "items": [{"id": "P1", "title": "Tea", "price": "100", "qty": 2}],
            "total": "200.00",
            "customer": {
                "name": "Asha",
                "email": "asha@example.in",
                "mobile": "+919876543210",
                "street": "1 Park St",
                "city": "Kolkata",
                "state": "WB",
                "postalCode": "700016",
                "country": "India"
            },
            "status": status
        })
    }

    #[tokio::test]
    async fn test_create_accepts_pending_order() {
        let (app, state) = test_app().await;
        let (status, body) = send(&app, post("/api/orders", &order("ORD-1", "pending"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "orderNumber": "ORD-1"}));
        assert_eq!(OrderRepository::new(state.pool()).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_order_number() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, post("/api/orders", &order("  ", "pending"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Order number is required");
    }

    #[tokio::test]
    async fn test_save_order_rejects_pending() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, post("/api/save-order", &order("ORD-2", "pending"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only confirmed orders can be saved");
    }

    #[tokio::test]
    async fn test_save_order_requires_number() {
        let (app, _) = test_app().await;
        let mut confirmed = order("ORD-3", "confirmed");
        confirmed.as_object_mut().unwrap().remove("orderNumber");
        let (status, body) = send(&app, post("/api/save-order", &confirmed)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Order number is required");
    }

    #[tokio::test]
    async fn test_save_order_twice_keeps_one_merged_record() {
        let (app, state) = test_app().await;

        let (status, body) = send(&app, post("/api/save-order", &order("ORD-4", "confirmed"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["orderNumber"], "ORD-4");

        let mut again = order("ORD-4", "confirmed");
        again["paidAt"] = json!("2025-03-01T10:05:00.000Z");
        let (status, _) = send(&app, post("/api/save-order", &again)).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(OrderRepository::new(state.pool()).count().await.unwrap(), 1);

        let request = Request::builder()
            .uri("/api/orders/ORD-4")
            .body(Body::empty())
            .unwrap();
        let (status, stored) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["status"], "confirmed");
        assert_eq!(stored["paidAt"], "2025-03-01T10:05:00.000Z");
        assert!(stored["confirmedAt"].is_string());
        assert!(stored["updatedAt"].is_string());
        assert_eq!(stored["customer"]["city"], "Kolkata");
    }

    #[tokio::test]
    async fn test_late_pending_push_does_not_downgrade() {
        let (app, _) = test_app().await;
        send(&app, post("/api/save-order", &order("ORD-5", "confirmed"))).await;
        let (status, _) = send(&app, post("/api/orders", &order("ORD-5", "pending"))).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/api/orders/ORD-5")
            .body(Body::empty())
            .unwrap();
        let (_, stored) = send(&app, request).await;
        assert_eq!(stored["status"], "confirmed");
    }

    #[tokio::test]
    async fn test_order_number_stored_trimmed() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, post("/api/orders", &order("  ORD-7 ", "pending"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orderNumber"], "ORD-7");

        let request = Request::builder()
            .uri("/api/orders/ORD-7")
            .body(Body::empty())
            .unwrap();
        let (status, stored) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["orderNumber"], "ORD-7");
    }

    #[tokio::test]
    async fn test_unknown_order_is_404() {
        let (app, _) = test_app().await;
        let request = Request::builder()
            .uri("/api/orders/ORD-MISSING")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Order not found"}));
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (app, _) = test_app().await;
        let mut bad = order("ORD-6", "pending");
        bad["items"] = json!("not a list");
        let (status, body) = send(&app, post("/api/orders", &bad)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
