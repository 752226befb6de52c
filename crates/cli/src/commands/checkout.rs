//! Checkout and payment commands.
//!
//! # Usage
//!
//! ```bash
//! # Pay to a saved address, showing the payment link as a code to scan
//! bazaar checkout --address <id>
//!
//! # Pay to a new address from a phone
//! bazaar checkout --street "1 Park St" --city Kolkata --state WB \
//!     --postal-code 700016 --device mobile
//! ```

use std::sync::Arc;

use clap::ValueEnum;

use bazaar_core::{AddressId, OrderNumber};
use bazaar_storefront::Storefront;
use bazaar_storefront::services::checkout::{
    AddressChoice, CheckoutError, CheckoutRequest, CheckoutService, ContactDetails, PaymentPrompt,
    PromptOrigin,
};
use bazaar_storefront::services::orders::{ConfirmOutcome, OrderError};
use bazaar_storefront::services::payment::{
    FixedChannel, PaymentArtifact, PaymentChannel,
};

use crate::qr::TerminalQr;

use super::addresses::AddressArgs;
use super::{CliError, Result, confirm, money};

/// The kind of device paying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Device {
    /// Open the payment app directly
    Mobile,
    /// Show a code to scan with a phone
    Desktop,
}

impl Device {
    const fn channel(self) -> PaymentChannel {
        match self {
            Self::Mobile => PaymentChannel::DeepLink,
            Self::Desktop => PaymentChannel::ScannableCode,
        }
    }
}

/// Contact overrides; the signed-in profile fills the rest.
#[derive(Debug, Clone, Default)]
pub struct ContactArgs {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

/// Place an order for the cart and walk through payment.
pub async fn place(
    storefront: &Storefront,
    saved_address: Option<String>,
    address: AddressArgs,
    contact: ContactArgs,
    device: Device,
    assume_paid: bool,
) -> Result<()> {
    let user = storefront
        .identity()
        .current_user()?
        .ok_or_else(|| CliError::Input("Sign in first: bazaar otp request".to_string()))?;

    let address = match saved_address {
        Some(id) => AddressChoice::Saved(
            id.parse::<AddressId>()
                .map_err(|e| CliError::Input(format!("Invalid address id: {e}")))?,
        ),
        None if address.is_given() => AddressChoice::New(address.into_new_address()?),
        None => match storefront.addresses().default_address()? {
            Some(default) => AddressChoice::Saved(default.id),
            None => {
                return Err(CliError::Input(
                    "Give --address or the address fields".to_string(),
                ));
            }
        },
    };

    let mut details = ContactDetails::from_user(&user);
    if let Some(name) = contact.name {
        details.name = name;
    }
    if let Some(email) = contact.email {
        details.email = email;
    }
    if let Some(mobile) = contact.mobile {
        details.mobile = mobile;
    }

    let catalog = storefront.catalog().fetch_or_empty().await;
    let checkout = storefront.checkout(
        Arc::new(FixedChannel(device.channel())),
        Arc::new(TerminalQr),
    );
    let prompt = checkout.place_order(
        CheckoutRequest {
            address,
            contact: details,
        },
        catalog.as_ref(),
    )?;

    pay(storefront, &checkout, &prompt, assume_paid)
}

/// Reopen payment for a pending order.
pub fn resume(
    storefront: &Storefront,
    order_number: &str,
    device: Device,
    assume_paid: bool,
) -> Result<()> {
    let checkout = storefront.checkout(
        Arc::new(FixedChannel(device.channel())),
        Arc::new(TerminalQr),
    );
    let prompt = checkout
        .resume_payment(&OrderNumber::new(order_number))
        .map_err(|e| match e {
            CheckoutError::Order(OrderError::OrderNotFound(_) | OrderError::AlreadySettled(_)) => {
                CliError::Input("Order not found or already completed".to_string())
            }
            other => other.into(),
        })?;

    pay(storefront, &checkout, &prompt, assume_paid)
}

fn pay(
    storefront: &Storefront,
    checkout: &CheckoutService,
    prompt: &PaymentPrompt,
    assume_paid: bool,
) -> Result<()> {
    let currency = storefront.config().payee.currency;
    println!("Order {}", prompt.order.order_number);
    println!(
        "Amount: {} ({} items)",
        money(prompt.order.total, currency),
        prompt.order.unit_count()
    );

    match &prompt.artifact {
        PaymentArtifact::DeepLink { uri } => {
            println!("Open this link in your UPI app:");
            println!("  {uri}");
        }
        PaymentArtifact::ScannableCode { uri, rendered } => {
            println!("Scan with any UPI app:");
            println!("{rendered}");
            if rendered != uri {
                println!("Or open: {uri}");
            }
        }
    }

    if !assume_paid && !confirm("Have you completed the payment?")? {
        println!(
            "Order saved as pending. Resume with: bazaar orders resume {}",
            prompt.order.order_number
        );
        return Ok(());
    }

    match checkout.complete_payment(prompt)? {
        ConfirmOutcome::Confirmed(order) => {
            println!("Order confirmed! Order # {}", order.order_number);
            if prompt.origin == PromptOrigin::NewOrder {
                println!("Cart cleared");
            }
        }
        ConfirmOutcome::AlreadyConfirmed(order) => {
            println!("Order {} was already confirmed", order.order_number);
        }
    }
    Ok(())
}
