use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use tracing::{debug, error, info};

use crate::{
    clients::{NotificationStore, RecipientResolver},
    models::{
        notification::{
            AdminNotification, CreateAdminNotification, CreateNotification, Notification,
        },
        recipient::Recipient,
    },
};

pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        info!("Connecting to PostgreSQL database");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

        info!("PostgreSQL connection established");

        Ok(Self { pool })
    }

    fn recipient_from_row(row: &sqlx::postgres::PgRow) -> Result<Recipient, Error> {
        Ok(Recipient {
            id: row.try_get("id")?,
            device_token: row.try_get("device_token")?,
            active: row.try_get("active")?,
        })
    }

    fn notification_from_row(row: &sqlx::postgres::PgRow) -> Result<Notification, Error> {
        Ok(Notification {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            kind: row.try_get("kind")?,
            user_id: row.try_get("user_id")?,
            demand: row.try_get("demand")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn admin_notification_from_row(row: &sqlx::postgres::PgRow) -> Result<AdminNotification, Error> {
        Ok(AdminNotification {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            kind: row.try_get("kind")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl RecipientResolver for DatabaseClient {
    async fn list_active_recipients_with_token(&self) -> Result<Vec<Recipient>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, device_token, active
            FROM users
            WHERE active = TRUE
              AND device_token IS NOT NULL
              AND device_token <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to list active recipients: {}", e))?;

        let recipients = rows
            .iter()
            .map(Self::recipient_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = recipients.len(), "Resolved active recipients with tokens");

        Ok(recipients)
    }
}

#[async_trait]
impl NotificationStore for DatabaseClient {
    async fn find_recipient_by_id(&self, id: &str) -> Result<Option<Recipient>, Error> {
        let row = sqlx::query("SELECT id, device_token, active FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to look up recipient: {}", e))?;

        row.as_ref().map(Self::recipient_from_row).transpose()
    }

    async fn clear_device_token(&self, id: &str) -> Result<(), Error> {
        sqlx::query("UPDATE users SET device_token = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %id, "Failed to clear device token");
                anyhow!("Failed to clear device token: {}", e)
            })?;

        debug!(user_id = %id, "Cleared stale device token");

        Ok(())
    }

    async fn create_notification(&self, record: CreateNotification) -> Result<Notification, Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO notifications (title, description, kind, user_id, demand)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, kind, user_id, demand, is_read, created_at
            "#,
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.kind)
        .bind(&record.user_id)
        .bind(&record.demand)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %record.user_id, "Failed to persist notification");
            anyhow!("Failed to persist notification: {}", e)
        })?;

        Self::notification_from_row(&row)
    }

    async fn create_admin_notification(
        &self,
        record: CreateAdminNotification,
    ) -> Result<AdminNotification, Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO admin_notifications (title, description, kind)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, kind, is_read, created_at
            "#,
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to persist admin notification: {}", e))?;

        Self::admin_notification_from_row(&row)
    }

    async fn list_admin_notifications(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<Vec<AdminNotification>, Error> {
        let page = page.max(1);
        let offset = (page - 1) * limit;

        let rows = sqlx::query(
            r#"
            SELECT id, title, description, kind, is_read, created_at
            FROM admin_notifications
            ORDER BY created_at DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to list admin notifications: {}", e))?;

        rows.iter()
            .map(Self::admin_notification_from_row)
            .collect()
    }

    async fn count_admin_notifications(&self) -> Result<u64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM admin_notifications")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to count admin notifications: {}", e))?;

        let count: i64 = row.try_get("count")?;
        Ok(count as u64)
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!("Database health check failed: {}", e))?;

        Ok(())
    }
}
