use chrono::{Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use sqlx::{Sqlite, Transaction};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::{
        order::{NewOrder, Order, OrderStatus},
        tracking_event::TrackingEvent,
    },
    services::tracking_engine,
};

/// Order store for database operations. Every multi-step mutation
/// (create with its synthesized history, status change with its
/// skipped-stage events, delete with its event cascade) runs inside
/// one transaction.
#[derive(Clone)]
pub struct OrderStore {
    pool: DbPool,
}

impl OrderStore {
    /// Create a new OrderStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get all orders, newest first
    pub async fn get_all_orders(&self) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(orders)
    }

    /// Get an order by tracking ID
    pub async fn get_order_by_tracking_id(&self, tracking_id: &str) -> Result<Order> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE tracking_id = ?")
            .bind(tracking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::OrderNotFound)?;

        Ok(order)
    }

    /// Get an order's tracking events, oldest first
    pub async fn get_events(&self, tracking_id: &str) -> Result<Vec<TrackingEvent>> {
        let events = sqlx::query_as::<_, TrackingEvent>(
            "SELECT * FROM tracking_events WHERE tracking_id = ? ORDER BY timestamp ASC",
        )
        .bind(tracking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(events)
    }

    /// Create an order with a freshly generated tracking id and its
    /// synthesized event history
    pub async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let errors = order.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let status = OrderStatus::parse(order.status.as_deref().unwrap_or("processing"));
        let tracking_id = self.unused_tracking_id().await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query(
            r#"
            INSERT INTO orders (tracking_id, order_id, customer_name, customer_email,
                                location, status, carrier, real_tracking_id,
                                estimated_delivery, progress, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tracking_id)
        .bind(&order.order_id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.location)
        .bind(status.as_str())
        .bind(order.carrier.as_deref().unwrap_or("standard"))
        .bind(&order.real_tracking_id)
        .bind(tracking_engine::estimated_delivery(status, 3))
        .bind(i64::from(status.progress()))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        for event in tracking_engine::generate_events(&tracking_id, status, now) {
            insert_event(&mut tx, &event).await?;
        }
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(%tracking_id, status = status.as_str(), "Created order");
        self.get_order_by_tracking_id(&tracking_id).await
    }

    /// Set an order's status. A forward jump along the pipeline
    /// synthesizes one event per skipped stage, slotted after the
    /// order's existing history; a move into failed/returned appends a
    /// single event.
    pub async fn update_status(&self, tracking_id: &str, new_status: &str) -> Result<Order> {
        let order = self.get_order_by_tracking_id(tracking_id).await?;
        let old = order.order_status();
        let new = OrderStatus::parse(new_status);
        // The processing fallback is for metadata lookups only; a
        // status write must name a real status.
        if new.as_str() != new_status {
            return Err(AppError::Validation(vec![format!(
                "unknown status '{new_status}'"
            )]));
        }
        if new == old {
            return Ok(order);
        }

        let events = self.get_events(tracking_id).await?;
        let last_activity = events
            .last()
            .map(|e| e.timestamp)
            .unwrap_or(order.updated_at);

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        for event in
            tracking_engine::generate_events_between(tracking_id, old, new, last_activity, now)
        {
            insert_event(&mut tx, &event).await?;
        }
        update_order_status(&mut tx, tracking_id, new, now).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            %tracking_id,
            from = old.as_str(),
            to = new.as_str(),
            "Updated order status"
        );
        self.get_order_by_tracking_id(tracking_id).await
    }

    /// Advance an order by at most one pipeline stage if enough time
    /// has passed since its newest event. No effect on delivered,
    /// failed or returned orders, or inside the update interval.
    pub async fn auto_update_status(
        &self,
        tracking_id: &str,
        interval_hours: i64,
    ) -> Result<Order> {
        let order = self.get_order_by_tracking_id(tracking_id).await?;
        let status = order.order_status();
        if status.is_terminal() {
            return Ok(order);
        }

        let events = self.get_events(tracking_id).await?;
        let last_activity = events
            .last()
            .map(|e| e.timestamp)
            .unwrap_or(order.updated_at);

        let now = Utc::now();
        if now - last_activity < Duration::hours(interval_hours) {
            return Ok(order);
        }

        // Non-terminal statuses always have a next stage.
        let Some(next) = status.next() else {
            return Ok(order);
        };

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        for event in
            tracking_engine::generate_events_between(tracking_id, status, next, last_activity, now)
        {
            insert_event(&mut tx, &event).await?;
        }
        update_order_status(&mut tx, tracking_id, next, now).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(%tracking_id, to = next.as_str(), "Auto-advanced order status");
        self.get_order_by_tracking_id(tracking_id).await
    }

    /// Delete an order and its tracking events
    pub async fn delete_order(&self, tracking_id: &str) -> Result<()> {
        self.get_order_by_tracking_id(tracking_id).await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM tracking_events WHERE tracking_id = ?")
            .bind(tracking_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        sqlx::query("DELETE FROM orders WHERE tracking_id = ?")
            .bind(tracking_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(%tracking_id, "Deleted order");
        Ok(())
    }

    /// Generate a tracking id not yet present in the orders table
    async fn unused_tracking_id(&self) -> Result<String> {
        loop {
            let candidate = generate_tracking_id();
            let existing: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM orders WHERE tracking_id = ?")
                    .bind(&candidate)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(AppError::Database)?;
            if existing.is_none() {
                return Ok(candidate);
            }
        }
    }
}

/// "DT" plus ten random uppercase alphanumerics
fn generate_tracking_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("DT{suffix}")
}

async fn insert_event(tx: &mut Transaction<'_, Sqlite>, event: &TrackingEvent) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tracking_events (id, tracking_id, event_status, location,
                                     description, timestamp, latitude, longitude)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.id)
    .bind(&event.tracking_id)
    .bind(&event.event_status)
    .bind(&event.location)
    .bind(&event.description)
    .bind(event.timestamp)
    .bind(event.latitude)
    .bind(event.longitude)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(())
}

async fn update_order_status(
    tx: &mut Transaction<'_, Sqlite>,
    tracking_id: &str,
    status: OrderStatus,
    now: chrono::DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET status = ?, progress = ?, estimated_delivery = ?, updated_at = ?
        WHERE tracking_id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(i64::from(status.progress()))
    .bind(tracking_engine::estimated_delivery(status, 3))
    .bind(now)
    .bind(tracking_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(())
}
