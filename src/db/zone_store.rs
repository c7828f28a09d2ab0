use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::zone::{
        DeliveryDays, ImportReport, InstallReport, NewZone, Zone, ZoneRecord, ZoneRow, ZoneType,
    },
};

/// The five canonical regional zones installed by default.
fn default_zones() -> Vec<ZoneRecord> {
    let zone = |name: &str, countries: &[&str], min: i64, max: i64, cost: f64| ZoneRecord {
        name: name.to_string(),
        zone_type: ZoneType::Country,
        countries: countries.iter().map(|c| c.to_string()).collect(),
        states: Vec::new(),
        cities: Vec::new(),
        delivery_days: DeliveryDays { min, max },
        processing_days: 1,
        delivery_cost: cost,
        is_active: true,
    };

    vec![
        zone("North America", &["US", "CA", "MX"], 2, 3, 5.99),
        zone(
            "Europe",
            &[
                "GB", "DE", "FR", "IT", "ES", "NL", "BE", "AT", "CH", "SE", "NO", "DK", "FI",
                "IE", "PT", "PL",
            ],
            3,
            5,
            9.99,
        ),
        zone(
            "Asia Pacific",
            &[
                "CN", "JP", "KR", "IN", "AU", "NZ", "SG", "MY", "TH", "VN", "PH", "ID",
            ],
            5,
            7,
            14.99,
        ),
        zone(
            "Latin America",
            &["BR", "AR", "CL", "CO", "PE", "EC", "UY", "VE"],
            6,
            8,
            12.99,
        ),
        zone(
            "Middle East & Africa",
            &["AE", "SA", "IL", "TR", "EG", "ZA", "NG", "KE", "MA"],
            7,
            10,
            16.99,
        ),
    ]
}

/// Zone store for database operations. All listings are ordered by
/// ascending id; the resolver's first-match policy depends on that
/// order being stable and visible.
#[derive(Clone)]
pub struct ZoneStore {
    pool: DbPool,
}

impl ZoneStore {
    /// Create a new ZoneStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get all zones in id order
    pub async fn get_all_zones(&self) -> Result<Vec<Zone>> {
        let rows = sqlx::query_as::<_, ZoneRow>("SELECT * FROM zones ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        rows.into_iter()
            .map(|row| Zone::from_row(row).map_err(AppError::Json))
            .collect()
    }

    /// Get the active zones in id order
    pub async fn get_active_zones(&self) -> Result<Vec<Zone>> {
        let rows =
            sqlx::query_as::<_, ZoneRow>("SELECT * FROM zones WHERE is_active = 1 ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        rows.into_iter()
            .map(|row| Zone::from_row(row).map_err(AppError::Json))
            .collect()
    }

    /// Get a zone by ID
    pub async fn get_zone_by_id(&self, id: i64) -> Result<Zone> {
        let row = sqlx::query_as::<_, ZoneRow>("SELECT * FROM zones WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::ZoneNotFound)?;

        Zone::from_row(row).map_err(AppError::Json)
    }

    async fn get_zone_by_name(&self, name: &str) -> Result<Option<Zone>> {
        let row = sqlx::query_as::<_, ZoneRow>("SELECT * FROM zones WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        row.map(|r| Zone::from_row(r).map_err(AppError::Json))
            .transpose()
    }

    /// Create a new zone
    pub async fn create_zone(&self, zone: NewZone) -> Result<Zone> {
        let mut errors = zone.validate();
        if errors.is_empty() && self.get_zone_by_name(&zone.name).await?.is_some() {
            errors.push(format!("zone name '{}' is already in use", zone.name));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let id = insert_zone(&mut tx, &zone).await?;
        tx.commit().await.map_err(AppError::Database)?;

        self.get_zone_by_id(id).await
    }

    /// Update an existing zone
    pub async fn update_zone(&self, id: i64, zone: NewZone) -> Result<Zone> {
        self.get_zone_by_id(id).await?;

        let mut errors = zone.validate();
        if let Some(other) = self.get_zone_by_name(&zone.name).await? {
            if other.id != id {
                errors.push(format!("zone name '{}' is already in use", zone.name));
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        update_zone_row(&mut tx, id, &zone).await?;
        tx.commit().await.map_err(AppError::Database)?;

        self.get_zone_by_id(id).await
    }

    /// Delete a zone by ID
    pub async fn delete_zone(&self, id: i64) -> Result<()> {
        self.get_zone_by_id(id).await?;

        sqlx::query("DELETE FROM zones WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Install the five canonical default zones. Idempotent: a zone
    /// already present by name is skipped, never overwritten.
    pub async fn install_default_zones(&self) -> Result<InstallReport> {
        let mut report = InstallReport {
            installed: 0,
            skipped: 0,
        };

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        for record in default_zones() {
            let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM zones WHERE name = ?")
                .bind(&record.name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::Database)?;

            if existing.is_some() {
                report.skipped += 1;
            } else {
                insert_zone(&mut tx, &record.into()).await?;
                report.installed += 1;
            }
        }
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            installed = report.installed,
            skipped = report.skipped,
            "Installed default zones"
        );
        Ok(report)
    }

    /// Export all zones, minus internal ids
    pub async fn export_zones(&self) -> Result<Vec<ZoneRecord>> {
        let zones = self.get_all_zones().await?;
        Ok(zones.into_iter().map(ZoneRecord::from).collect())
    }

    /// Import zones, upserting by name. Runs in one transaction so a
    /// crash mid-loop cannot leave half an import behind; individual
    /// bad records are reported, not fatal.
    pub async fn import_zones(&self, records: Vec<serde_json::Value>) -> Result<ImportReport> {
        let mut report = ImportReport {
            imported: 0,
            skipped: 0,
            errors: Vec::new(),
        };

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        for (index, value) in records.into_iter().enumerate() {
            let record: ZoneRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    report.errors.push(format!("record {}: {}", index + 1, e));
                    continue;
                }
            };

            let zone = NewZone::from(record);
            let validation = zone.validate();
            if !validation.is_empty() {
                report
                    .errors
                    .push(format!("record {}: {}", index + 1, validation.join("; ")));
                continue;
            }

            let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM zones WHERE name = ?")
                .bind(&zone.name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::Database)?;

            match existing {
                Some((id,)) => {
                    update_zone_row(&mut tx, id, &zone).await?;
                    report.skipped += 1;
                }
                None => {
                    insert_zone(&mut tx, &zone).await?;
                    report.imported += 1;
                }
            }
        }
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            errors = report.errors.len(),
            "Imported zones"
        );
        Ok(report)
    }
}

async fn insert_zone(tx: &mut Transaction<'_, Sqlite>, zone: &NewZone) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO zones (name, zone_type, countries, states, cities,
                           delivery_min, delivery_max, processing_days,
                           delivery_cost, is_active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&zone.name)
    .bind(zone.zone_type.as_str())
    .bind(serde_json::to_string(&zone.countries).map_err(AppError::Json)?)
    .bind(serde_json::to_string(&zone.states).map_err(AppError::Json)?)
    .bind(serde_json::to_string(&zone.cities).map_err(AppError::Json)?)
    .bind(zone.delivery_days.min)
    .bind(zone.delivery_days.max)
    .bind(zone.processing_days)
    .bind(zone.delivery_cost)
    .bind(zone.is_active)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(result.last_insert_rowid())
}

async fn update_zone_row(tx: &mut Transaction<'_, Sqlite>, id: i64, zone: &NewZone) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE zones
        SET name = ?, zone_type = ?, countries = ?, states = ?, cities = ?,
            delivery_min = ?, delivery_max = ?, processing_days = ?,
            delivery_cost = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&zone.name)
    .bind(zone.zone_type.as_str())
    .bind(serde_json::to_string(&zone.countries).map_err(AppError::Json)?)
    .bind(serde_json::to_string(&zone.states).map_err(AppError::Json)?)
    .bind(serde_json::to_string(&zone.cities).map_err(AppError::Json)?)
    .bind(zone.delivery_days.min)
    .bind(zone.delivery_days.max)
    .bind(zone.processing_days)
    .bind(zone.delivery_cost)
    .bind(zone.is_active)
    .bind(id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(())
}
