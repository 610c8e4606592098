//! PetMarket CLI - Lightweight pet-marketplace client
//!
//! A terminal client for browsing adverts, messaging sellers, and reading
//! the knowledge hub.

mod api;
mod auth;
mod config;
mod conversations;
mod models;
mod store;
mod tui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use models::AdvertQuery;

#[derive(Parser)]
#[command(name = "petmarket-cli")]
#[command(about = "Lightweight CLI client for the PetMarket pet marketplace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password (or Google)
    Login {
        /// Force interactive login even if a session exists
        #[arg(short, long)]
        force: bool,

        /// Sign in with Google instead of email/password
        #[arg(long)]
        google: bool,

        /// Create a new account
        #[arg(long)]
        register: bool,
    },

    /// Log out and clear stored credentials
    Logout,

    /// Show current authentication status
    Status,

    /// Show current user info (verify auth works)
    Whoami,

    /// Browse adverts
    Adverts {
        /// Filter by category: pets or accessories
        #[arg(short, long)]
        category: Option<String>,

        /// Filter by species (dog, cat, ...)
        #[arg(short, long)]
        species: Option<String>,

        /// Minimum price in pence
        #[arg(long)]
        min_price: Option<u64>,

        /// Maximum price in pence
        #[arg(long)]
        max_price: Option<u64>,

        /// Filter by location substring
        #[arg(short, long)]
        location: Option<String>,

        /// Sort order: newest, price-asc, price-desc
        #[arg(long, default_value = "newest")]
        sort: String,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Adverts per page
        #[arg(long, default_value = "10")]
        per_page: usize,
    },

    /// Show one advert in full
    Advert {
        /// Advert ID (from `adverts` output)
        id: String,
    },

    /// Post a new advert
    Post {
        /// Advert title
        #[arg(long)]
        title: String,

        /// Category: pets or accessories
        #[arg(long)]
        category: String,

        /// Price in pence
        #[arg(long)]
        price: u64,

        /// Species (for pet listings)
        #[arg(long)]
        species: Option<String>,

        /// Breed (for pet listings)
        #[arg(long)]
        breed: Option<String>,

        /// Location shown on the listing
        #[arg(long)]
        location: Option<String>,

        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },

    /// Manage the saved-adverts list
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// List conversations derived from your message feed
    Conversations,

    /// Read one conversation's thread
    Read {
        /// Counterpart user ID
        counterpart_id: String,

        /// Advert ID the conversation is about
        advert_id: String,

        /// Acknowledge unread messages after reading
        #[arg(long)]
        mark_read: bool,
    },

    /// Send a message about an advert
    Send {
        /// Advert ID the message is about
        #[arg(short, long)]
        advert: String,

        /// Recipient user ID
        #[arg(short, long)]
        to: String,

        /// Message content
        message: String,
    },

    /// Start a conversation with an advert's seller
    Contact {
        /// Advert ID
        advert_id: String,
    },

    /// List knowledge-hub articles
    Articles {
        /// Maximum number of articles to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Read one knowledge-hub article
    Article {
        /// Article ID (from `articles` output)
        id: String,
    },

    /// Launch the terminal messaging view
    Tui,
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved adverts
    List,
    /// Save an advert
    Add { advert_id: String },
    /// Remove a saved advert
    Remove { advert_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Login {
            force,
            google,
            register,
        } => {
            if google {
                auth::google::login_google().await?;
            } else if register {
                auth::register().await?;
            } else {
                auth::login(force).await?;
            }
        }
        Commands::Logout => {
            auth::logout().await?;
        }
        Commands::Status => {
            auth::status().await?;
        }
        Commands::Whoami => {
            api::whoami().await?;
        }
        Commands::Adverts {
            category,
            species,
            min_price,
            max_price,
            location,
            sort,
            page,
            per_page,
        } => {
            let query = AdvertQuery {
                category: category.as_deref().map(api::adverts::parse_category).transpose()?,
                species,
                min_price_pence: min_price,
                max_price_pence: max_price,
                location,
                sort: api::adverts::parse_sort(&sort)?,
                page,
                per_page,
            };
            api::browse_adverts(query).await?;
        }
        Commands::Advert { id } => {
            api::show_advert(&id).await?;
        }
        Commands::Post {
            title,
            category,
            price,
            species,
            breed,
            location,
            description,
        } => {
            let new = api::NewAdvert {
                title,
                category: api::adverts::parse_category(&category)?,
                species,
                breed,
                price_pence: price,
                location,
                description,
            };
            api::post_advert(new).await?;
        }
        Commands::Saved { action } => {
            run_saved(action)?;
        }
        Commands::Conversations => {
            api::list_conversations().await?;
        }
        Commands::Read {
            counterpart_id,
            advert_id,
            mark_read,
        } => {
            api::read_conversation(&counterpart_id, &advert_id, mark_read).await?;
        }
        Commands::Send {
            advert,
            to,
            message,
        } => {
            tracing::info!("Sending message...");
            api::send_message(&advert, &to, &message).await?;
        }
        Commands::Contact { advert_id } => {
            api::contact_seller(&advert_id).await?;
        }
        Commands::Articles { limit } => {
            api::list_articles(limit).await?;
        }
        Commands::Article { id } => {
            api::read_article(&id).await?;
        }
        Commands::Tui => {
            tui::run().await?;
        }
    }

    Ok(())
}

fn run_saved(action: SavedAction) -> Result<()> {
    let mut saved = store::SavedItems::load()?;
    match action {
        SavedAction::List => {
            if saved.is_empty() {
                println!("No saved adverts.");
            } else {
                for id in saved.ids() {
                    println!("{}", id);
                }
            }
        }
        SavedAction::Add { advert_id } => {
            if saved.add(&advert_id) {
                saved.save()?;
                println!("Saved {}.", advert_id);
            } else {
                println!("{} is already saved.", advert_id);
            }
        }
        SavedAction::Remove { advert_id } => {
            if saved.remove(&advert_id) {
                saved.save()?;
                println!("Removed {}.", advert_id);
            } else {
                println!("{} was not saved.", advert_id);
            }
        }
    }
    Ok(())
}
