//! Remove scraped postings from the database.
//!
//! Deletes every posting, or only one member's with `--owner`.

use anyhow::{Context, Result};
use clap::Parser;
use server_core::common::MemberId;
use server_core::domains::postings::models::Posting;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clean_postings")]
#[command(about = "Delete scraped postings")]
struct Cli {
    /// Only delete postings owned by this member
    #[arg(long)]
    owner: Option<MemberId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let deleted = match cli.owner {
        Some(owner) => Posting::delete_for_owner(owner, &pool).await?,
        None => Posting::delete_all(&pool).await?,
    };

    tracing::info!(deleted, owner = ?cli.owner, "postings deleted");
    Ok(())
}
