//! Pending one-time code.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Wrong guesses tolerated before the code is destroyed.
pub const MAX_FAILED_ATTEMPTS: u32 = 3;

/// The code most recently issued on this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOtp {
    /// Six decimal digits.
    pub otp: String,
    /// Destination the code was issued for.
    pub mobile: String,
    /// Issuance time, stored as unix milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Failed verification attempts so far.
    pub attempts: u32,
}

impl PendingOtp {
    #[must_use]
    pub fn new(otp: String, mobile: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            otp,
            mobile,
            timestamp: issued_at,
            attempts: 0,
        }
    }

    /// Whether more than the TTL has elapsed since issuance.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp > Duration::minutes(OTP_TTL_MINUTES)
    }

    /// Attempts left before the code is destroyed.
    #[must_use]
    pub const fn remaining_attempts(&self) -> u32 {
        MAX_FAILED_ATTEMPTS.saturating_sub(self.attempts)
    }
}
