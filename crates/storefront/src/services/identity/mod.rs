//! Identity service.
//!
//! Sign-in is a one-time code sent to a mobile number. A verified number then
//! completes a profile (name and email), which becomes the device's
//! [`AuthUser`]. There is no server-side session; the profile lives in the
//! local store until sign-out.
//!
//! Verification order: destination, then expiry, then the code itself. A code
//! for another number does not count as a failed attempt, and an expired
//! record is left in place until a new code replaces it.

mod delivery;
mod error;

pub use delivery::{DeliveryChannel, DeliveryError, DemoDelivery};
pub use error::{OtpError, ProfileError};

use std::sync::Arc;

use rand::Rng;
use tracing::instrument;

use bazaar_core::{AddressFields, Email};

use crate::clock::Clock;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::otp::MAX_FAILED_ATTEMPTS;
use crate::models::{AuthUser, PendingOtp};
use crate::store::{LocalStore, LocalStoreExt, StoreError, StoreKey};

/// Proof that a mobile number passed verification.
///
/// Not `Clone`: completing a profile consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifiedMobile(String);

impl VerifiedMobile {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fields to merge into the signed-in user. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub mobile: Option<String>,
    pub address: Option<AddressFields>,
}

/// Code-based sign-in and the local user profile.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // =========================================================================
    // One-time codes
    // =========================================================================

    /// Issue a fresh six digit code for `mobile` and deliver it.
    ///
    /// Any previously pending code is replaced. If delivery fails the new
    /// record is removed again.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::Delivery` if the channel fails, or
    /// `OtpError::Store` if the record cannot be written.
    #[instrument(skip(self, channel))]
    pub fn request_code(&self, mobile: &str, channel: &dyn DeliveryChannel) -> Result<(), OtpError> {
        let code = rand::rng().random_range(100_000..1_000_000_u32).to_string();
        let pending = PendingOtp::new(code, mobile.to_owned(), self.clock.now());
        self.store.save(StoreKey::PendingOtp, &pending)?;

        if let Err(e) = channel.deliver(mobile, &pending.otp) {
            tracing::warn!(error = %e, "Code delivery failed");
            self.store.remove(StoreKey::PendingOtp)?;
            return Err(e.into());
        }
        Ok(())
    }

    /// Check `code` against the pending record for `mobile`.
    ///
    /// # Errors
    ///
    /// - `NoPendingCode` if nothing is pending
    /// - `MobileMismatch` if the code was issued for another number
    /// - `Expired` if the code is older than ten minutes
    /// - `Mismatch` for a wrong code with attempts left
    /// - `Exhausted` when the wrong code used up the last attempt
    #[instrument(skip(self, code))]
    pub fn verify_code(&self, mobile: &str, code: &str) -> Result<VerifiedMobile, OtpError> {
        let Some(mut pending) = self.store.load::<PendingOtp>(StoreKey::PendingOtp)? else {
            return Err(OtpError::NoPendingCode);
        };

        if pending.mobile != mobile {
            return Err(OtpError::MobileMismatch);
        }
        if pending.is_expired(self.clock.now()) {
            return Err(OtpError::Expired);
        }

        if pending.otp != code.trim() {
            pending.attempts += 1;
            if pending.attempts > MAX_FAILED_ATTEMPTS {
                self.store.remove(StoreKey::PendingOtp)?;
                tracing::warn!("Code destroyed after repeated failures");
                return Err(OtpError::Exhausted);
            }
            self.store.save(StoreKey::PendingOtp, &pending)?;
            return Err(OtpError::Mismatch {
                remaining_attempts: pending.remaining_attempts(),
            });
        }

        self.store.remove(StoreKey::PendingOtp)?;
        Ok(VerifiedMobile(pending.mobile))
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Sign in `verified` with a name and email.
    ///
    /// An existing profile on the device is merged: its creation time and
    /// saved address are kept.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::MissingName` or `ProfileError::InvalidEmail` for
    /// bad input.
    #[instrument(skip(self, verified), fields(mobile = %verified.as_str()))]
    pub fn complete_profile(
        &self,
        verified: VerifiedMobile,
        name: &str,
        email: &str,
    ) -> Result<AuthUser, ProfileError> {
        let name = required_name(name)?;
        let email = Email::parse(email)?;

        let existing = self.current_user()?;
        let user = AuthUser {
            name,
            email,
            mobile: verified.0,
            address: existing.as_ref().and_then(|u| u.address.clone()),
            created_at: existing.map_or_else(|| self.clock.now(), |u| u.created_at),
        };
        self.store.save(StoreKey::AuthUser, &user)?;

        set_sentry_user(&user.mobile, Some(user.email.as_str()));
        tracing::info!("Signed in");
        Ok(user)
    }

    /// Merge `update` into the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotSignedIn` if there is no user, or
    /// `ProfileError::MissingName` if the update blanks the name.
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<AuthUser, ProfileError> {
        let mut user = self.current_user()?.ok_or(ProfileError::NotSignedIn)?;

        if let Some(name) = update.name {
            user.name = required_name(&name)?;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(mobile) = update.mobile.filter(|m| !m.trim().is_empty()) {
            user.mobile = mobile;
        }
        if let Some(address) = update.address {
            user.address = Some(address);
        }

        self.store.save(StoreKey::AuthUser, &user)?;
        Ok(user)
    }

    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the stored profile cannot be read.
    pub fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        self.store.load(StoreKey::AuthUser)
    }

    /// Forget the signed-in user. Cart, orders and addresses stay.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the profile cannot be removed.
    pub fn sign_out(&self) -> Result<(), StoreError> {
        self.store.remove(StoreKey::AuthUser)?;
        clear_sentry_user();
        tracing::info!("Signed out");
        Ok(())
    }
}

fn required_name(name: &str) -> Result<String, ProfileError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProfileError::MissingName);
    }
    Ok(name.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    const MOBILE: &str = "+919876543210";

    struct Fixture {
        identity: IdentityService,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        channel: DemoDelivery,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        ));
        Fixture {
            identity: IdentityService::new(store.clone(), clock.clone()),
            store,
            clock,
            channel: DemoDelivery::new(),
        }
    }

    impl Fixture {
        fn issue(&self) -> String {
            self.identity.request_code(MOBILE, &self.channel).unwrap();
            self.channel.last_code().unwrap()
        }

        fn pending(&self) -> Option<PendingOtp> {
            self.store.load(StoreKey::PendingOtp).unwrap()
        }
    }

    fn wrong(code: &str) -> String {
        let bad = if code == "999999" { "100000" } else { "999999" };
        bad.to_owned()
    }

    struct FailingDelivery;

    impl DeliveryChannel for FailingDelivery {
        fn deliver(&self, destination: &str, _code: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError {
                destination: destination.to_owned(),
                reason: "gateway down".to_owned(),
            })
        }
    }

    #[test]
    fn test_request_issues_six_digits() {
        let f = fixture();
        let code = f.issue();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let pending = f.pending().unwrap();
        assert_eq!(pending.otp, code);
        assert_eq!(pending.attempts, 0);
    }

    #[test]
    fn test_failed_delivery_leaves_no_record() {
        let f = fixture();
        let err = f.identity.request_code(MOBILE, &FailingDelivery).unwrap_err();
        assert!(matches!(err, OtpError::Delivery(_)));
        assert!(f.pending().is_none());
    }

    #[test]
    fn test_correct_code_verifies_once() {
        let f = fixture();
        let code = f.issue();

        let verified = f.identity.verify_code(MOBILE, &code).unwrap();
        assert_eq!(verified.as_str(), MOBILE);
        assert!(f.pending().is_none());

        assert!(matches!(
            f.identity.verify_code(MOBILE, &code),
            Err(OtpError::NoPendingCode)
        ));
    }

    #[test]
    fn test_expired_code_fails_and_is_kept() {
        let f = fixture();
        let code = f.issue();
        f.clock.advance(Duration::minutes(10) + Duration::seconds(1));

        assert!(matches!(f.identity.verify_code(MOBILE, &code), Err(OtpError::Expired)));
        assert!(f.pending().is_some());
    }

    #[test]
    fn test_other_mobile_does_not_count_as_attempt() {
        let f = fixture();
        let code = f.issue();

        assert!(matches!(
            f.identity.verify_code("+911111111111", &code),
            Err(OtpError::MobileMismatch)
        ));
        assert_eq!(f.pending().unwrap().attempts, 0);
    }

    #[test]
    fn test_four_wrong_codes_destroy_record() {
        let f = fixture();
        let code = f.issue();
        let bad = wrong(&code);

        for remaining in [2, 1, 0] {
            match f.identity.verify_code(MOBILE, &bad) {
                Err(OtpError::Mismatch { remaining_attempts }) => {
                    assert_eq!(remaining_attempts, remaining);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(matches!(f.identity.verify_code(MOBILE, &bad), Err(OtpError::Exhausted)));
        assert!(f.pending().is_none());
        assert!(matches!(
            f.identity.verify_code(MOBILE, &code),
            Err(OtpError::NoPendingCode)
        ));
    }

    #[test]
    fn test_new_request_replaces_pending_code() {
        let f = fixture();
        let first = f.issue();
        let _ = f.identity.verify_code(MOBILE, &wrong(&first));
        let second = f.issue();

        let pending = f.pending().unwrap();
        assert_eq!(pending.otp, second);
        assert_eq!(pending.attempts, 0);
    }

    #[test]
    fn test_complete_profile_then_update_keeps_created_at() {
        let f = fixture();
        let code = f.issue();
        let verified = f.identity.verify_code(MOBILE, &code).unwrap();

        let user = f
            .identity
            .complete_profile(verified, " Asha ", "asha@example.in")
            .unwrap();
        assert_eq!(user.name, "Asha");
        assert_eq!(user.mobile, MOBILE);
        let created_at = user.created_at;

        f.clock.advance(Duration::days(1));
        let updated = f
            .identity
            .update_profile(ProfileUpdate {
                name: Some("Asha Rao".to_owned()),
                ..ProfileUpdate::default()
            })
            .unwrap();
        assert_eq!(updated.name, "Asha Rao");
        assert_eq!(updated.email.as_str(), "asha@example.in");
        assert_eq!(updated.created_at, created_at);

        // Signing in again on the same device keeps the original creation time.
        let code = f.issue();
        let verified = f.identity.verify_code(MOBILE, &code).unwrap();
        let again = f
            .identity
            .complete_profile(verified, "Asha", "asha@example.in")
            .unwrap();
        assert_eq!(again.created_at, created_at);
    }

    #[test]
    fn test_profile_validation() {
        let f = fixture();
        let code = f.issue();
        let verified = f.identity.verify_code(MOBILE, &code).unwrap();
        assert!(matches!(
            f.identity.complete_profile(verified, "  ", "asha@example.in"),
            Err(ProfileError::MissingName)
        ));

        assert!(matches!(
            f.identity.update_profile(ProfileUpdate::default()),
            Err(ProfileError::NotSignedIn)
        ));
    }

    #[test]
    fn test_sign_out() {
        let f = fixture();
        let code = f.issue();
        let verified = f.identity.verify_code(MOBILE, &code).unwrap();
        f.identity
            .complete_profile(verified, "Asha", "asha@example.in")
            .unwrap();

        f.identity.sign_out().unwrap();
        assert!(f.identity.current_user().unwrap().is_none());
    }
}
