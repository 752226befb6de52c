//! Bodies exchanged with the remote order store.

use serde::{Deserialize, Serialize};

use super::id::OrderNumber;

/// Error response: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAccepted {
    pub success: bool,
    pub order_number: OrderNumber,
}

/// Response of `POST /api/save-order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSaved {
    pub success: bool,
    pub message: String,
    pub order_number: OrderNumber,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shapes() {
        let accepted = OrderAccepted {
            success: true,
            order_number: OrderNumber::new("ORD-1"),
        };
        assert_eq!(
            serde_json::to_string(&accepted).unwrap(),
            r#"{"success":true,"orderNumber":"ORD-1"}"#
        );
        assert_eq!(
            serde_json::to_string(&ErrorBody::new("Order not found")).unwrap(),
            r#"{"error":"Order not found"}"#
        );
    }
}
