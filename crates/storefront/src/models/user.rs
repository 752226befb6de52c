//! The signed-in user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AddressFields, Email};

/// The user signed in on this device.
///
/// There is at most one per device. It is created when a verified mobile
/// completes its profile and merged on later updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub name: String,
    pub email: Email,
    /// Full number including country code, as verified.
    pub mobile: String,
    /// Last delivery address used at checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressFields>,
    /// Set on first sign-in and kept across profile updates.
    pub created_at: DateTime<Utc>,
}
