//! SQLite document store for chats.
//!
//! This crate holds two collections: chat documents (one per conversation,
//! with its ordered history) and user chat indexes (one per user, listing
//! the chats they started). Documents are stored as JSON in SQLite via SQLx.
//!
//! Writes across the two collections are sequential and not transactional:
//! a chat is always written before the index entry that points at it, and a
//! chat whose index write failed is left in place.
//!
//! # Example
//!
//! ```no_run
//! use database::{chat, user_chats, validation, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:chat.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Start a chat and index it for the user
//!     let text = "What is the tallest mountain on Mars?";
//!     let chat = chat::create_chat(db.pool(), "user_123", text).await?;
//!     user_chats::add_chat_for_user(
//!         db.pool(),
//!         "user_123",
//!         &chat.id,
//!         &validation::make_title(text),
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod error;
pub mod models;
pub mod user_chats;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{Chat, ChatEntry, HistoryEntry, Part, Role, UserChats};
pub use user_chats::IndexWrite;
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    pub const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/chat.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
