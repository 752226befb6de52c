//! One-time code delivery channels.

use std::sync::Mutex;

use thiserror::Error;

/// A code could not be delivered.
#[derive(Debug, Error)]
#[error("code delivery to {destination} failed: {reason}")]
pub struct DeliveryError {
    pub destination: String,
    pub reason: String,
}

/// Sends a one-time code to a mobile number.
pub trait DeliveryChannel: Send + Sync {
    /// Deliver `code` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` if the message could not be sent.
    fn deliver(&self, destination: &str, code: &str) -> Result<(), DeliveryError>;
}

/// Demo channel: nothing is sent. The code is logged and kept so the host can
/// show it to the user.
#[derive(Debug, Default)]
pub struct DemoDelivery {
    last: Mutex<Option<(String, String)>>,
}

impl DemoDelivery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently delivered code.
    #[must_use]
    pub fn last_code(&self) -> Option<String> {
        self.last_delivery().map(|(_, code)| code)
    }

    /// Destination and code of the most recent delivery.
    #[must_use]
    pub fn last_delivery(&self) -> Option<(String, String)> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl DeliveryChannel for DemoDelivery {
    fn deliver(&self, destination: &str, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(destination = %destination, code = %code, "Demo code delivery");

        let mut last = self.last.lock().map_err(|_| DeliveryError {
            destination: destination.to_owned(),
            reason: "demo channel lock poisoned".to_owned(),
        })?;
        *last = Some((destination.to_owned(), code.to_owned()));
        Ok(())
    }
}
