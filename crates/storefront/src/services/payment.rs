//! UPI payment requests.
//!
//! A single `upi://pay` link settles an order. On a phone the link is opened
//! directly; elsewhere it is shown as a code to scan. Which one is used is the
//! host's decision, made through [`DeliveryChannelSelector`].

use rust_decimal::Decimal;
use thiserror::Error;

use bazaar_core::{CurrencyCode, Order, OrderNumber, round_money};

use crate::config::PayeeConfig;

const UPI_SCHEME: &str = "upi://pay";

/// What the payment app is asked to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub payee_vpa: String,
    pub payee_name: String,
    pub amount: Decimal,
    pub order_number: OrderNumber,
    pub currency: CurrencyCode,
}

impl PaymentRequest {
    /// Request payment of `order`'s total to `payee`.
    #[must_use]
    pub fn for_order(order: &Order, payee: &PayeeConfig) -> Self {
        Self {
            payee_vpa: payee.vpa.clone(),
            payee_name: payee.name.clone(),
            amount: round_money(order.total),
            order_number: order.order_number.clone(),
            currency: payee.currency,
        }
    }

    /// Transaction note shown in the payment app.
    #[must_use]
    pub fn note(&self) -> String {
        format!("Order {}", self.order_number)
    }

    /// The `upi://pay` link, with every parameter percent-encoded.
    #[must_use]
    pub fn uri(&self) -> String {
        format!(
            "{UPI_SCHEME}?pa={}&pn={}&am={}&tn={}&cu={}",
            urlencoding::encode(&self.payee_vpa),
            urlencoding::encode(&self.payee_name),
            round_money(self.amount),
            urlencoding::encode(&self.note()),
            self.currency.code(),
        )
    }
}

/// How the payment link reaches the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentChannel {
    /// Open the link in a payment app on this device.
    DeepLink,
    /// Show a code to scan with another device.
    ScannableCode,
}

/// Chooses the payment channel for the current device.
pub trait DeliveryChannelSelector: Send + Sync {
    fn select(&self) -> PaymentChannel;
}

/// Always picks the same channel.
#[derive(Debug, Clone, Copy)]
pub struct FixedChannel(pub PaymentChannel);

impl DeliveryChannelSelector for FixedChannel {
    fn select(&self) -> PaymentChannel {
        self.0
    }
}

#[derive(Debug, Error)]
#[error("could not render payment code: {0}")]
pub struct RenderError(pub String);

/// Turns a payment link into something scannable.
pub trait CodeRenderer: Send + Sync {
    /// Render `payload` for display.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the payload cannot be encoded.
    fn render(&self, payload: &str) -> Result<String, RenderError>;
}

/// Shows the link itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkRenderer;

impl CodeRenderer for LinkRenderer {
    fn render(&self, payload: &str) -> Result<String, RenderError> {
        Ok(payload.to_owned())
    }
}

/// The payment link prepared for the chosen channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentArtifact {
    DeepLink { uri: String },
    ScannableCode { uri: String, rendered: String },
}

impl PaymentArtifact {
    /// Prepare `request` for `channel`. A renderer failure falls back to the
    /// plain link.
    #[must_use]
    pub fn build(
        channel: PaymentChannel,
        request: &PaymentRequest,
        renderer: &dyn CodeRenderer,
    ) -> Self {
        let uri = request.uri();
        match channel {
            PaymentChannel::DeepLink => Self::DeepLink { uri },
            PaymentChannel::ScannableCode => {
                let rendered = renderer.render(&uri).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Falling back to plain payment link");
                    uri.clone()
                });
                Self::ScannableCode { uri, rendered }
            }
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::DeepLink { uri } | Self::ScannableCode { uri, .. } => uri,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn request(amount: &str) -> PaymentRequest {
        PaymentRequest {
            payee_vpa: "shop@okaxis".to_owned(),
            payee_name: "Corner Shop".to_owned(),
            amount: Decimal::from_str(amount).unwrap(),
            order_number: OrderNumber::new("ORD-1700000000000-ABC123XYZ"),
            currency: CurrencyCode::INR,
        }
    }

    struct BrokenRenderer;

    impl CodeRenderer for BrokenRenderer {
        fn render(&self, _payload: &str) -> Result<String, RenderError> {
            Err(RenderError("payload too long".to_owned()))
        }
    }

    #[test]
    fn test_uri_format() {
        assert_eq!(
            request("200").uri(),
            "upi://pay?pa=shop%40okaxis&pn=Corner%20Shop&am=200.00\
             &tn=Order%20ORD-1700000000000-ABC123XYZ&cu=INR"
        );
    }

    #[test]
    fn test_amount_rounds_to_paise() {
        assert!(request("99.999").uri().contains("&am=100.00&"));
        assert!(request("0.5").uri().contains("&am=0.50&"));
    }

    #[test]
    fn test_artifact_per_channel() {
        let req = request("10");
        let link = PaymentArtifact::build(PaymentChannel::DeepLink, &req, &LinkRenderer);
        assert_eq!(link, PaymentArtifact::DeepLink { uri: req.uri() });

        let code = PaymentArtifact::build(PaymentChannel::ScannableCode, &req, &BrokenRenderer);
        assert_eq!(
            code,
            PaymentArtifact::ScannableCode {
                uri: req.uri(),
                rendered: req.uri(),
            }
        );
        assert_eq!(code.uri(), link.uri());
    }

    #[test]
    fn test_fixed_selector() {
        assert_eq!(
            FixedChannel(PaymentChannel::ScannableCode).select(),
            PaymentChannel::ScannableCode
        );
    }
}
