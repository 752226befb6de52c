//! Terminal QR codes for desktop payment.

use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;

use bazaar_storefront::services::payment::{CodeRenderer, RenderError};

/// Draws the payment link as a QR code in half-height block characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalQr;

impl CodeRenderer for TerminalQr {
    fn render(&self, payload: &str) -> Result<String, RenderError> {
        let code = QrCode::new(payload.as_bytes()).map_err(|e| RenderError(e.to_string()))?;
        // Light modules print dark so the code scans on dark terminals.
        Ok(code
            .render::<Dense1x2>()
            .dark_color(Dense1x2::Light)
            .light_color(Dense1x2::Dark)
            .quiet_zone(true)
            .build())
    }
}
