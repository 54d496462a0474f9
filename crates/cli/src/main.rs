//! Auric CLI - drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two of a product to the cart, then inspect it
//! auric cart add ring-solitaire --variant gold-6 --price 1299.00 --quantity 2
//! auric cart show
//!
//! # Apply the coupon and reprice
//! auric cart coupon-apply AURIC10
//!
//! # Sign in; the guest cart folds into the account cart
//! auric auth login -e shopper@example.com -p <password>
//!
//! # Save an item for later, then move it into the cart
//! auric wishlist add pendant-orbit --price 459.00
//! auric wishlist move pendant-orbit
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and edit the shopping cart
//! - `wishlist` - Inspect and edit the wishlist
//! - `auth` - Sign in, sign out, and inspect the account
//! - `sync` - Re-attempt merges that did not complete at sign-in

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use auric_storefront::config::StorefrontConfig;
use auric_storefront::Shopfront;

mod commands;

#[derive(Parser)]
#[command(name = "auric")]
#[command(author, version, about = "Auric storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Inspect and edit the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Sign in, sign out, and inspect the account
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Re-attempt merges that did not complete at sign-in
    Sync,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its totals
    Show,
    /// Add an item, or increase its quantity if already present
    Add {
        /// Product ID
        product: String,

        /// Variant ID
        #[arg(short, long)]
        variant: Option<String>,

        /// Display name (defaults to the product ID)
        #[arg(short, long)]
        name: Option<String>,

        /// Unit price, e.g. 129.99
        #[arg(short, long)]
        price: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Set an item's quantity
    Update {
        /// Product ID
        product: String,

        /// Variant ID
        #[arg(short, long)]
        variant: Option<String>,

        /// New quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove an item
    Remove {
        /// Product ID
        product: String,

        /// Variant ID
        #[arg(short, long)]
        variant: Option<String>,
    },
    /// Remove every item
    Clear,
    /// Apply a coupon code
    CouponApply {
        /// The code to apply
        code: String,
    },
    /// Drop the applied coupon
    CouponClear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the saved items
    Show,
    /// Save an item for later
    Add {
        /// Product ID
        product: String,

        /// Variant ID
        #[arg(short, long)]
        variant: Option<String>,

        /// Display name (defaults to the product ID)
        #[arg(short, long)]
        name: Option<String>,

        /// Display price, e.g. 129.99
        #[arg(short, long)]
        price: String,

        /// Note to keep with the item
        #[arg(long)]
        note: Option<String>,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a saved item
    Remove {
        /// Product ID
        product: String,

        /// Variant ID
        #[arg(short, long)]
        variant: Option<String>,
    },
    /// Remove every saved item
    Clear,
    /// Move a saved item into the cart
    Move {
        /// Product ID
        product: String,

        /// Variant ID
        #[arg(short, long)]
        variant: Option<String>,

        /// Quantity to add to the cart
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Register a new account and sign in
    Register {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (min 8 characters)
        #[arg(short, long)]
        password: String,

        /// First name
        #[arg(long)]
        first_name: Option<String>,

        /// Last name
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Sign in with email and password
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in customer
    Whoami,
    /// Send a one-time code to a phone number
    PhoneRequest {
        /// Phone number, e.g. +14155550123
        number: String,
    },
    /// Redeem a received one-time code
    PhoneConfirm {
        /// The phone number the code was sent to
        number: String,

        /// The received code
        code: String,
    },
    /// Send a sign-in link to an email address
    EmailLinkRequest {
        /// Email address
        email: String,
    },
    /// Redeem a received sign-in link
    EmailLinkConfirm {
        /// The full link from the email
        link: String,

        /// Email address, if redeeming on a device without the pending record
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Print the Google sign-in URL
    GoogleUrl {
        /// OAuth redirect URI
        #[arg(short, long)]
        redirect_uri: String,
    },
    /// Exchange a Google ID token for a session
    GoogleLogin {
        /// The ID token from the OAuth callback
        id_token: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let shop = Shopfront::from_config(&config)?;

    // Pick up the session from a previous run so operations route to
    // the account stores.
    if let Some(outcome) = shop.restore_session().await? {
        tracing::debug!(customer_id = %outcome.session.customer_id, "Session restored");
    }

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&shop).await?,
            CartAction::Add {
                product,
                variant,
                name,
                price,
                quantity,
                image,
            } => {
                commands::cart::add(
                    &shop,
                    config.currency,
                    &product,
                    variant,
                    name,
                    &price,
                    quantity,
                    image,
                )
                .await?;
            }
            CartAction::Update {
                product,
                variant,
                quantity,
            } => commands::cart::update(&shop, &product, variant, quantity).await?,
            CartAction::Remove { product, variant } => {
                commands::cart::remove(&shop, &product, variant).await?;
            }
            CartAction::Clear => commands::cart::clear(&shop).await?,
            CartAction::CouponApply { code } => commands::cart::apply_coupon(&shop, &code).await?,
            CartAction::CouponClear => commands::cart::clear_coupon(&shop).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&shop).await?,
            WishlistAction::Add {
                product,
                variant,
                name,
                price,
                note,
                image,
            } => {
                commands::wishlist::add(
                    &shop,
                    config.currency,
                    &product,
                    variant,
                    name,
                    &price,
                    note,
                    image,
                )
                .await?;
            }
            WishlistAction::Remove { product, variant } => {
                commands::wishlist::remove(&shop, &product, variant).await?;
            }
            WishlistAction::Clear => commands::wishlist::clear(&shop).await?,
            WishlistAction::Move {
                product,
                variant,
                quantity,
            } => commands::wishlist::move_to_cart(&shop, &product, variant, quantity).await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Register {
                email,
                password,
                first_name,
                last_name,
            } => commands::auth::register(&shop, &email, &password, first_name, last_name).await?,
            AuthAction::Login { email, password } => {
                commands::auth::login(&shop, &email, &password).await?;
            }
            AuthAction::Logout => commands::auth::logout(&shop).await?,
            AuthAction::Whoami => commands::auth::whoami(&shop).await?,
            AuthAction::PhoneRequest { number } => {
                commands::auth::request_phone_code(&shop, &number).await?;
            }
            AuthAction::PhoneConfirm { number, code } => {
                commands::auth::confirm_phone_code(&shop, &number, &code).await?;
            }
            AuthAction::EmailLinkRequest { email } => {
                commands::auth::request_email_link(&shop, &email).await?;
            }
            AuthAction::EmailLinkConfirm { link, address } => {
                commands::auth::confirm_email_link(&shop, &link, address.as_deref()).await?;
            }
            AuthAction::GoogleUrl { redirect_uri } => {
                commands::auth::google_url(&config, &redirect_uri)?;
            }
            AuthAction::GoogleLogin { id_token } => {
                commands::auth::google_login(&shop, &id_token).await?;
            }
        },
        Commands::Sync => {
            shop.retry_merges().await?;
            tracing::info!("All pending merges completed");
        }
    }
    Ok(())
}
