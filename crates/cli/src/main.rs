//! Bazaar CLI - terminal storefront and order store tools.
//!
//! # Usage
//!
//! ```bash
//! # Prepare the order store database
//! bazaar migrate
//!
//! # Sign in
//! bazaar otp request -m 9876543210
//! bazaar otp verify -m 9876543210 --code 123456 --name "Asha Rao" --email asha@example.in
//!
//! # Shop
//! bazaar products
//! bazaar cart add SKU-1 --qty 2
//! bazaar checkout --street "1 Park St" --city Kolkata --state WB --postal-code 700016
//!
//! # Orders
//! bazaar orders list
//! bazaar orders resume ORD-1740823200000-ABC123XYZ
//! ```
//!
//! # Commands
//!
//! - `migrate` - Apply order store migrations
//! - `otp`, `profile`, `logout` - Sign-in and profile
//! - `products`, `cart`, `wishlist` - Browsing and the cart
//! - `address` - Saved delivery addresses
//! - `checkout` - Place an order and pay
//! - `orders` - Order history, resuming payment, resync

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazaar_storefront::Storefront;

mod commands;
mod qr;

use commands::CliError;
use commands::addresses::AddressArgs;
use commands::checkout::{ContactArgs, Device};

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply order store database migrations
    Migrate,
    /// Sign in with a one-time code
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
    /// Show the signed-in user
    Profile,
    /// Sign out of this device
    Logout,
    /// List catalog products
    Products {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Manage saved addresses
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Place an order for the cart and pay
    Checkout {
        /// Id of a saved address
        #[arg(long = "address", conflicts_with = "street")]
        saved_address: Option<String>,

        #[command(flatten)]
        new_address: AddressArgs,

        /// Contact name (defaults to the profile)
        #[arg(long)]
        name: Option<String>,

        /// Contact email (defaults to the profile)
        #[arg(long)]
        email: Option<String>,

        /// Contact mobile (defaults to the profile)
        #[arg(long)]
        mobile: Option<String>,

        #[arg(long, value_enum, default_value_t = Device::Desktop)]
        device: Device,

        /// Confirm payment without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum OtpAction {
    /// Send a code to a mobile number
    Request {
        /// Ten digit mobile number
        #[arg(short, long)]
        mobile: String,

        #[arg(long, default_value = "+91")]
        country_code: String,
    },
    /// Verify a code and complete the profile
    Verify {
        #[arg(short, long)]
        mobile: String,

        #[arg(long, default_value = "+91")]
        country_code: String,

        #[arg(long)]
        code: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product
    Add {
        id: String,
        #[arg(short, long, default_value_t = 1)]
        qty: u32,
    },
    /// Set a product's quantity (0 removes it)
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove a product
    Remove { id: String },
    /// Show the cart
    Show,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Add or remove a product
    Toggle { id: String },
    /// Show the wishlist
    Show,
}

#[derive(Subcommand)]
enum AddressAction {
    /// Save an address
    Add {
        #[command(flatten)]
        address: AddressArgs,
    },
    /// List saved addresses
    List,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one order
    Show { order_number: String },
    /// Pay for a pending order
    Resume {
        order_number: String,
        #[arg(long, value_enum, default_value_t = Device::Desktop)]
        device: Device,
        #[arg(short, long)]
        yes: bool,
    },
    /// Push every order to the order store again
    Sync,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if let CliError::Storefront(err) = &e {
            err.report();
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Migrate = cli.command {
        commands::migrate::orders().await?;
        return Ok(());
    }

    let storefront = commands::open_storefront()?;
    let result = dispatch(&storefront, cli.command).await;

    // Background order pushes must finish before the process exits.
    storefront.gateway().drain().await;
    result
}

async fn dispatch(storefront: &Storefront, command: Commands) -> Result<(), CliError> {
    use commands::{account, addresses, checkout, orders, shop};

    match command {
        Commands::Migrate => Ok(commands::migrate::orders().await?),
        Commands::Otp { action } => match action {
            OtpAction::Request {
                mobile,
                country_code,
            } => account::request_code(storefront, &country_code, &mobile),
            OtpAction::Verify {
                mobile,
                country_code,
                code,
                name,
                email,
            } => account::verify_code(storefront, &country_code, &mobile, &code, &name, &email),
        },
        Commands::Profile => account::show_profile(storefront),
        Commands::Logout => account::sign_out(storefront),
        Commands::Products { category } => shop::products(storefront, category.as_deref()).await,
        Commands::Cart { action } => match action {
            CartAction::Add { id, qty } => shop::cart_add(storefront, &id, qty),
            CartAction::Set { id, qty } => shop::cart_set(storefront, &id, qty),
            CartAction::Remove { id } => shop::cart_remove(storefront, &id),
            CartAction::Show => shop::cart_show(storefront).await,
            CartAction::Clear => shop::cart_clear(storefront),
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Toggle { id } => shop::wishlist_toggle(storefront, &id),
            WishlistAction::Show => shop::wishlist_show(storefront).await,
        },
        Commands::Address { action } => match action {
            AddressAction::Add { address } => addresses::add(storefront, address),
            AddressAction::List => addresses::list(storefront),
        },
        Commands::Checkout {
            saved_address,
            new_address,
            name,
            email,
            mobile,
            device,
            yes,
        } => {
            let contact = ContactArgs {
                name,
                email,
                mobile,
            };
            checkout::place(storefront, saved_address, new_address, contact, device, yes).await
        }
        Commands::Orders { action } => match action {
            OrdersAction::List { limit } => orders::list(storefront, limit),
            OrdersAction::Show { order_number } => orders::show(storefront, &order_number),
            OrdersAction::Resume {
                order_number,
                device,
                yes,
            } => checkout::resume(storefront, &order_number, device, yes),
            OrdersAction::Sync => orders::sync(storefront).await,
        },
    }
}
