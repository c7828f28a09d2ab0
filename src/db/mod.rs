use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::time::Duration;

pub mod courier_store;
pub mod order_store;
pub mod zone_store;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str) -> Result<DbPool> {
    // Create the database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
    }

    // Create connection pool
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    // Run migrations
    setup_database(&pool).await?;

    Ok(pool)
}

/// Set up the database schema
pub async fn setup_database(pool: &DbPool) -> Result<()> {
    // Create orders table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tracking_id TEXT NOT NULL UNIQUE,
            order_id TEXT NOT NULL,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            location TEXT NOT NULL,
            status TEXT NOT NULL,
            carrier TEXT NOT NULL,
            real_tracking_id TEXT,
            estimated_delivery TEXT NOT NULL,
            progress INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create tracking_events table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracking_events (
            id TEXT PRIMARY KEY NOT NULL,
            tracking_id TEXT NOT NULL,
            event_status TEXT NOT NULL,
            location TEXT NOT NULL,
            description TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            FOREIGN KEY (tracking_id) REFERENCES orders(tracking_id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create zones table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zones (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            zone_type TEXT NOT NULL,
            countries TEXT NOT NULL,
            states TEXT NOT NULL,
            cities TEXT NOT NULL,
            delivery_min INTEGER NOT NULL,
            delivery_max INTEGER NOT NULL,
            processing_days INTEGER NOT NULL,
            delivery_cost REAL NOT NULL,
            is_active INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create couriers table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS couriers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            url_pattern TEXT NOT NULL,
            tracking_format TEXT NOT NULL,
            settings TEXT NOT NULL,
            is_active INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Seed the stock couriers if the table is empty
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM couriers")
        .fetch_one(pool)
        .await?;

    if count.0 == 0 {
        courier_store::seed_default_couriers(pool).await?;
    }

    Ok(())
}
