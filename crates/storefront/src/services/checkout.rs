//! Checkout orchestration.
//!
//! Ties the signed-in user, the address book, the cart and the order lifecycle
//! together and produces a [`PaymentPrompt`]. All validation happens before
//! anything is written: a rejected checkout leaves no address, order or profile
//! change behind.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use bazaar_core::{AddressFields, AddressId, CustomerSnapshot, Email, EmailError, Order, OrderNumber};

use crate::error::add_breadcrumb;
use crate::models::AuthUser;
use crate::services::addresses::{AddressBook, AddressError, NewAddress};
use crate::services::cart::{CartError, CartService};
use crate::services::catalog::CatalogLookup;
use crate::services::identity::{IdentityService, ProfileError, ProfileUpdate};
use crate::services::orders::{ConfirmOutcome, OrderError, OrderManager};
use crate::services::payment::{
    CodeRenderer, DeliveryChannelSelector, PaymentArtifact, PaymentRequest,
};
use crate::store::StoreError;

/// A field of the checkout form is missing or malformed.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("mobile number is required")]
    MissingMobile,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("missing address fields: {}", .0.join(", "))]
    MissingAddressFields(Vec<&'static str>),
}

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("sign in to check out")]
    SignInRequired,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("saved address not found: {0}")]
    AddressNotFound(AddressId),

    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Address(AddressError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<AddressError> for CheckoutError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::MissingFields(fields) => ValidationError::MissingAddressFields(fields).into(),
            AddressError::NotFound(id) => Self::AddressNotFound(id),
            other => Self::Address(other),
        }
    }
}

/// Where the order is delivered.
#[derive(Debug, Clone)]
pub enum AddressChoice {
    Saved(AddressId),
    /// Saved to the address book once checkout succeeds.
    New(NewAddress),
}

/// Contact details as entered on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

impl ContactDetails {
    /// Prefill from the signed-in user.
    #[must_use]
    pub fn from_user(user: &AuthUser) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            mobile: user.mobile.clone(),
        }
    }

    fn validate(&self) -> Result<(String, Email, String), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let email = Email::parse(&self.email)?;
        let mobile = self.mobile.trim();
        if mobile.is_empty() {
            return Err(ValidationError::MissingMobile);
        }
        Ok((name.to_owned(), email, mobile.to_owned()))
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub address: AddressChoice,
    pub contact: ContactDetails,
}

/// Why a payment prompt was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOrigin {
    /// Just placed from the cart.
    NewOrder,
    /// Reopened for an earlier pending order.
    Resumed,
}

/// Everything the host needs to ask for payment.
#[derive(Debug, Clone)]
pub struct PaymentPrompt {
    pub order: Order,
    pub request: PaymentRequest,
    pub artifact: PaymentArtifact,
    pub origin: PromptOrigin,
}

/// Checkout flow.
#[derive(Clone)]
pub struct CheckoutService {
    identity: IdentityService,
    cart: CartService,
    addresses: AddressBook,
    orders: OrderManager,
    selector: Arc<dyn DeliveryChannelSelector>,
    renderer: Arc<dyn CodeRenderer>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        identity: IdentityService,
        cart: CartService,
        addresses: AddressBook,
        orders: OrderManager,
        selector: Arc<dyn DeliveryChannelSelector>,
        renderer: Arc<dyn CodeRenderer>,
    ) -> Self {
        Self {
            identity,
            cart,
            addresses,
            orders,
            selector,
            renderer,
        }
    }

    /// Place an order for the cart and prepare its payment.
    ///
    /// # Errors
    ///
    /// - `SignInRequired` if nobody is signed in
    /// - `AddressNotFound` for an unknown saved address
    /// - `Validation` for missing or malformed form fields
    /// - `EmptyCart` if no cart line resolves to a product
    #[instrument(skip_all)]
    pub fn place_order(
        &self,
        request: CheckoutRequest,
        catalog: &dyn CatalogLookup,
    ) -> Result<PaymentPrompt, CheckoutError> {
        self.identity
            .current_user()?
            .ok_or(CheckoutError::SignInRequired)?;

        let fields = match &request.address {
            AddressChoice::Saved(id) => self.addresses.get(*id)?.fields,
            AddressChoice::New(address) => {
                address.validate()?;
                address.fields.clone()
            }
        };
        let (name, email, mobile) = request.contact.validate()?;

        let cart = self.cart.cart()?;
        if !cart.lines().iter().any(|line| catalog.find(&line.id).is_some()) {
            return Err(CheckoutError::EmptyCart);
        }

        let customer = CustomerSnapshot {
            name: name.clone(),
            email: email.clone(),
            mobile: mobile.clone(),
            address: fields.clone(),
        };
        let order = self.orders.create_order(&cart, catalog, customer)?;

        // Only saved once the order exists.
        if let AddressChoice::New(address) = request.address {
            self.addresses.add(address)?;
        }
        self.remember_details(name, email, mobile, fields)?;

        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_number", order.order_number.as_str())]),
        );
        Ok(self.prompt(order, PromptOrigin::NewOrder))
    }

    /// Reopen payment for a pending order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Order` if the order is unknown or confirmed.
    #[instrument(skip(self))]
    pub fn resume_payment(&self, order_number: &OrderNumber) -> Result<PaymentPrompt, CheckoutError> {
        let (order, _) = self.orders.resume(order_number)?;
        Ok(self.prompt(order, PromptOrigin::Resumed))
    }

    /// The customer says they paid.
    ///
    /// Confirms the order. The cart is cleared only when the prompt came from
    /// placing a new order and this call confirmed it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Order` if the order is unknown.
    #[instrument(skip(self, prompt), fields(order_number = %prompt.order.order_number))]
    pub fn complete_payment(&self, prompt: &PaymentPrompt) -> Result<ConfirmOutcome, CheckoutError> {
        let outcome = self.orders.confirm(&prompt.order.order_number)?;
        if prompt.origin == PromptOrigin::NewOrder && matches!(outcome, ConfirmOutcome::Confirmed(_)) {
            self.cart.clear()?;
        }
        Ok(outcome)
    }

    fn prompt(&self, order: Order, origin: PromptOrigin) -> PaymentPrompt {
        let request = self.orders.payment_request(&order);
        let artifact = PaymentArtifact::build(self.selector.select(), &request, self.renderer.as_ref());
        PaymentPrompt {
            order,
            request,
            artifact,
            origin,
        }
    }

    fn remember_details(
        &self,
        name: String,
        email: Email,
        mobile: String,
        address: AddressFields,
    ) -> Result<(), CheckoutError> {
        self.identity.update_profile(ProfileUpdate {
            name: Some(name),
            email: Some(email),
            mobile: Some(mobile),
            address: Some(address),
        })?;
        Ok(())
    }
}
