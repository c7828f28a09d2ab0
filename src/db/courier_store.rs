use serde_json::json;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::courier::{Courier, CourierRow, NewCourier},
    services::courier_registry::DEFAULT_PATTERNS,
};

/// Stock carrier definitions seeded on first start: slug, display
/// name, tracking URL template and home country. Detection regexes
/// come from the registry's default pattern list.
const DEFAULT_COURIERS: [(&str, &str, &str, &str); 8] = [
    (
        "ups",
        "UPS",
        "https://www.ups.com/track?tracknum={tracking_id}",
        "US",
    ),
    (
        "fedex",
        "FedEx",
        "https://www.fedex.com/fedextrack/?trknbr={tracking_id}",
        "US",
    ),
    (
        "dhl",
        "DHL",
        "https://www.dhl.com/en/express/tracking.html?AWB={tracking_id}",
        "DE",
    ),
    (
        "usps",
        "USPS",
        "https://tools.usps.com/go/TrackConfirmAction?tLabels={tracking_id}",
        "US",
    ),
    (
        "canada-post",
        "Canada Post",
        "https://www.canadapost-postescanada.ca/track-reperage/en#/search?searchFor={tracking_id}",
        "CA",
    ),
    (
        "royal-mail",
        "Royal Mail",
        "https://www.royalmail.com/track-your-item#/tracking-results/{tracking_id}",
        "GB",
    ),
    (
        "dpd",
        "DPD",
        "https://tracking.dpd.de/status/en_US/parcel/{tracking_id}",
        "DE",
    ),
    (
        "hermes",
        "Hermes",
        "https://www.myhermes.de/empfangen/sendungsverfolgung/#{tracking_id}",
        "DE",
    ),
];

/// Insert the stock couriers. Called once, when the table is empty.
pub async fn seed_default_couriers(pool: &DbPool) -> anyhow::Result<()> {
    for (slug, name, url_pattern, country) in DEFAULT_COURIERS {
        let tracking_format = DEFAULT_PATTERNS
            .iter()
            .find(|p| p.slug == slug)
            .map(|p| p.regex.as_str())
            .unwrap_or("^$");
        let settings = json!({
            "country": country,
            "display_name": name,
            "type": "carrier",
        });

        sqlx::query(
            r#"
            INSERT INTO couriers (slug, name, url_pattern, tracking_format, settings, is_active)
            VALUES (?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(slug)
        .bind(name)
        .bind(url_pattern)
        .bind(tracking_format)
        .bind(settings.to_string())
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded {} stock couriers", DEFAULT_COURIERS.len());
    Ok(())
}

/// Courier store for database operations
#[derive(Clone)]
pub struct CourierStore {
    pool: DbPool,
}

impl CourierStore {
    /// Create a new CourierStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get all couriers in id order
    pub async fn get_all_couriers(&self) -> Result<Vec<Courier>> {
        let rows = sqlx::query_as::<_, CourierRow>("SELECT * FROM couriers ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        rows.into_iter()
            .map(|row| Courier::from_row(row).map_err(AppError::Json))
            .collect()
    }

    /// Get the active couriers in id order
    pub async fn get_active_couriers(&self) -> Result<Vec<Courier>> {
        let rows = sqlx::query_as::<_, CourierRow>(
            "SELECT * FROM couriers WHERE is_active = 1 ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        rows.into_iter()
            .map(|row| Courier::from_row(row).map_err(AppError::Json))
            .collect()
    }

    /// Get a courier by slug
    pub async fn get_courier_by_slug(&self, slug: &str) -> Result<Courier> {
        let row = sqlx::query_as::<_, CourierRow>("SELECT * FROM couriers WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::CourierNotFound)?;

        Courier::from_row(row).map_err(AppError::Json)
    }

    /// Create a new courier; the slug must be unused
    pub async fn create_courier(&self, courier: NewCourier) -> Result<Courier> {
        let mut errors = courier.validate();

        let existing = sqlx::query_as::<_, CourierRow>("SELECT * FROM couriers WHERE slug = ?")
            .bind(&courier.slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if existing.is_some() {
            errors.push(format!("courier slug '{}' is already in use", courier.slug));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let settings = serde_json::to_string(&courier.settings).map_err(AppError::Json)?;
        sqlx::query(
            r#"
            INSERT INTO couriers (slug, name, url_pattern, tracking_format, settings, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&courier.slug)
        .bind(&courier.name)
        .bind(&courier.url_pattern)
        .bind(&courier.tracking_format)
        .bind(settings)
        .bind(courier.is_active)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.get_courier_by_slug(&courier.slug).await
    }

    /// Update an existing courier by slug
    pub async fn update_courier(&self, slug: &str, courier: NewCourier) -> Result<Courier> {
        // The path slug identifies the row; the body slug must agree.
        self.get_courier_by_slug(slug).await?;

        let mut errors = courier.validate();
        if courier.slug != slug {
            errors.push("slug cannot be changed".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let settings = serde_json::to_string(&courier.settings).map_err(AppError::Json)?;
        sqlx::query(
            r#"
            UPDATE couriers
            SET name = ?, url_pattern = ?, tracking_format = ?, settings = ?, is_active = ?
            WHERE slug = ?
            "#,
        )
        .bind(&courier.name)
        .bind(&courier.url_pattern)
        .bind(&courier.tracking_format)
        .bind(settings)
        .bind(courier.is_active)
        .bind(slug)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.get_courier_by_slug(slug).await
    }

    /// Delete a courier by slug
    pub async fn delete_courier(&self, slug: &str) -> Result<()> {
        self.get_courier_by_slug(slug).await?;

        sqlx::query("DELETE FROM couriers WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
