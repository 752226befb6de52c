//! Sign-in and profile commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar otp request -m 9876543210
//! bazaar otp verify -m 9876543210 --code 123456 --name "Asha Rao" --email asha@example.in
//! bazaar profile
//! bazaar logout
//! ```
//!
//! Codes go through the demo channel, so the code is printed here instead of
//! being sent anywhere.

use bazaar_core::MobileNumber;
use bazaar_storefront::Storefront;
use bazaar_storefront::services::identity::{DemoDelivery, OtpError};

use super::{CliError, Result};

fn parse_mobile(country_code: &str, mobile: &str) -> Result<MobileNumber> {
    MobileNumber::parse(country_code, mobile)
        .map_err(|e| CliError::Input(format!("Please enter a valid mobile number: {e}")))
}

/// Issue a code for a mobile number.
pub fn request_code(storefront: &Storefront, country_code: &str, mobile: &str) -> Result<()> {
    let mobile = parse_mobile(country_code, mobile)?;
    let channel = DemoDelivery::new();
    storefront.identity().request_code(&mobile.full(), &channel)?;

    println!("Code sent to {mobile}");
    if let Some(code) = channel.last_code() {
        println!("Demo code: {code} (valid for 10 minutes)");
    }
    Ok(())
}

/// Verify a code and sign in with a name and email.
pub fn verify_code(
    storefront: &Storefront,
    country_code: &str,
    mobile: &str,
    code: &str,
    name: &str,
    email: &str,
) -> Result<()> {
    let mobile = parse_mobile(country_code, mobile)?;
    let verified = match storefront.identity().verify_code(&mobile.full(), code) {
        Ok(verified) => verified,
        Err(OtpError::Mismatch { remaining_attempts }) => {
            return Err(CliError::Input(format!(
                "Incorrect code, {remaining_attempts} attempts left"
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let user = storefront.identity().complete_profile(verified, name, email)?;
    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

/// Show the signed-in user.
pub fn show_profile(storefront: &Storefront) -> Result<()> {
    match storefront.identity().current_user()? {
        Some(user) => {
            println!("{}", user.name);
            println!("  Email:  {}", user.email);
            println!("  Mobile: {}", user.mobile);
            if let Some(address) = &user.address {
                println!("  Address: {}", address.one_line());
            }
            println!("  Member since {}", user.created_at.format("%Y-%m-%d"));
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

pub fn sign_out(storefront: &Storefront) -> Result<()> {
    storefront.identity().sign_out()?;
    println!("Signed out");
    Ok(())
}
