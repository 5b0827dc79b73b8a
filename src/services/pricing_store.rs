//! Price band store synchronization.
//!
//! Owns the in-memory snapshot of the admin-configured price band table and
//! keeps it consistent with the `site_config` document in Postgres. Change
//! fan-out between instances rides a Redis pub/sub channel: every save
//! publishes a notification, every listener reloads the whole document and
//! swaps its snapshot atomically. The calculator only ever takes the
//! synchronous snapshot; it never waits on the network.

use anyhow::{Context, Result};
use backoff::ExponentialBackoff;
use futures::StreamExt;
use parking_lot::RwLock;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::catalog::PricingTable;

/// Key of the pricing document in `site_config`.
const DOCUMENT_KEY: &str = "pricing";

/// Pub/sub channel announcing pricing document changes.
const CHANGE_CHANNEL: &str = "botcraft:pricing:changed";

/// In-process view of the price band store.
///
/// The snapshot is replaced wholesale (`Arc` swap under the lock), never
/// mutated field by field, so readers always observe a complete table.
#[derive(Clone)]
pub struct PricingStore {
    db: PgPool,
    redis: redis::Client,
    publisher: ConnectionManager,
    snapshot: Arc<RwLock<Arc<PricingTable>>>,
}

impl PricingStore {
    /// Connect to Redis and start from the hard-coded default table. Call
    /// [`bootstrap`](Self::bootstrap) afterwards to load the stored document.
    pub async fn connect(db: PgPool, redis_url: &str) -> Result<Self> {
        let redis = redis::Client::open(redis_url).context("Failed to create Redis client")?;
        let publisher = ConnectionManager::new(redis.clone())
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            db,
            redis,
            publisher,
            snapshot: Arc::new(RwLock::new(Arc::new(PricingTable::defaults()))),
        })
    }

    /// First-load bootstrap: read the stored document, or seed the defaults
    /// if no document exists yet. On failure the caller logs the error and
    /// the store keeps serving the default table.
    pub async fn bootstrap(&self) -> Result<()> {
        match self.load().await? {
            Some(table) => {
                self.install(table);
                info!("Pricing table loaded from store");
            }
            None => {
                let defaults = PricingTable::defaults();
                let value = serde_json::to_value(&defaults)
                    .context("Failed to serialize default pricing table")?;
                sqlx::query(
                    r#"
                    INSERT INTO site_config (key, value)
                    VALUES ($1, $2)
                    ON CONFLICT (key) DO NOTHING
                    "#,
                )
                .bind(DOCUMENT_KEY)
                .bind(&value)
                .execute(&self.db)
                .await
                .context("Failed to seed default pricing table")?;
                self.install(defaults);
                info!("Pricing table seeded with defaults");
            }
        }
        Ok(())
    }

    /// Current table snapshot. Synchronous and cheap; the returned `Arc`
    /// stays valid even if a newer table is swapped in while it is held.
    pub fn snapshot(&self) -> Arc<PricingTable> {
        self.snapshot.read().clone()
    }

    /// Persist a full replacement table and broadcast the change.
    ///
    /// The local snapshot is updated optimistically; the pub/sub echo then
    /// converges every other instance (and this one, harmlessly) on the
    /// same value. Callers validate the table before handing it over.
    pub async fn save(&self, table: PricingTable) -> Result<()> {
        let value =
            serde_json::to_value(&table).context("Failed to serialize pricing table")?;

        sqlx::query(
            r#"
            INSERT INTO site_config (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = NOW()
            "#,
        )
        .bind(DOCUMENT_KEY)
        .bind(&value)
        .execute(&self.db)
        .await
        .context("Failed to save pricing table")?;

        self.install(table);

        let mut conn = self.publisher.clone();
        if let Err(e) = conn
            .publish::<_, _, ()>(CHANGE_CHANNEL, "updated")
            .await
        {
            // Other instances will still converge on their next reconnect
            // reload; this instance already holds the new table.
            warn!(error = %e, "Failed to publish pricing change notification");
        }

        info!("Pricing table saved and broadcast");
        Ok(())
    }

    /// Long-lived change listener. Subscribes to the change channel,
    /// reloading and swapping the snapshot on every notification, and
    /// reconnects with exponential backoff if Redis drops. Never returns
    /// under normal operation; abort the task on shutdown.
    pub async fn run_listener(self) {
        loop {
            let mut pubsub = self.subscribe_with_backoff().await;

            // A change may have landed while we were disconnected.
            if let Err(e) = self.reload().await {
                warn!(error = %e, "Failed to refresh pricing table after (re)subscribe");
            }

            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                debug!(channel = msg.get_channel_name(), "Pricing change notification");
                match self.reload().await {
                    Ok(()) => info!("Pricing table refreshed from store"),
                    Err(e) => {
                        // Keep the last known-good snapshot; stale pricing
                        // beats no pricing.
                        warn!(error = %e, "Failed to reload pricing table, keeping current snapshot");
                    }
                }
            }
            drop(stream);

            warn!("Pricing change subscription closed, reconnecting");
        }
    }

    /// Redis connectivity probe for the health endpoint.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.publisher.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed")?;
        Ok(())
    }

    fn install(&self, table: PricingTable) {
        *self.snapshot.write() = Arc::new(table);
    }

    async fn load(&self) -> Result<Option<PricingTable>> {
        let row: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT value FROM site_config WHERE key = $1")
                .bind(DOCUMENT_KEY)
                .fetch_optional(&self.db)
                .await
                .context("Failed to read pricing document")?;

        match row {
            Some(value) => Ok(Some(Self::parse_document(value)?)),
            None => Ok(None),
        }
    }

    /// Deserialize and validate a stored pricing document. A document that
    /// parses but fails validation (e.g. an inverted band written by an
    /// out-of-band tool) is rejected here so callers keep their last
    /// known-good snapshot instead of ever serving it.
    fn parse_document(value: serde_json::Value) -> Result<PricingTable> {
        let table: PricingTable = serde_json::from_value(value)
            .context("Stored pricing document has an unexpected shape")?;
        table
            .validate()
            .context("Stored pricing document failed validation")?;
        Ok(table)
    }

    async fn reload(&self) -> Result<()> {
        match self.load().await? {
            Some(table) => {
                self.install(table);
                Ok(())
            }
            None => {
                // Document deleted out from under us; keep serving the
                // current snapshot.
                warn!("Pricing document missing on reload, keeping current snapshot");
                Ok(())
            }
        }
    }

    async fn subscribe_with_backoff(&self) -> redis::aio::PubSub {
        let policy = ExponentialBackoff {
            max_elapsed_time: None,
            ..Default::default()
        };

        let subscribe = || async {
            let mut pubsub = self
                .redis
                .get_async_pubsub()
                .await
                .map_err(|e| backoff::Error::transient(anyhow::Error::from(e)))?;
            pubsub
                .subscribe(CHANGE_CHANNEL)
                .await
                .map_err(|e| backoff::Error::transient(anyhow::Error::from(e)))?;
            Ok::<_, backoff::Error<anyhow::Error>>(pubsub)
        };

        match backoff::future::retry_notify(policy, subscribe, |e, wait| {
            error!(error = %e, wait = ?wait, "Pricing change subscription failed, retrying");
        })
        .await
        {
            Ok(pubsub) => {
                info!(channel = CHANGE_CHANNEL, "Subscribed to pricing changes");
                pubsub
            }
            // Unreachable with no elapsed-time cap, but the retry API
            // requires handling it.
            Err(e) => {
                error!(error = %e, "Pricing change subscription permanently failed");
                std::future::pending().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_document_accepts_stored_defaults() {
        let value = serde_json::to_value(PricingTable::defaults()).unwrap();
        let table = PricingStore::parse_document(value).unwrap();
        assert_eq!(table, PricingTable::defaults());
    }

    #[test]
    fn parse_document_rejects_inverted_band() {
        let value = json!({"bots": {"discord": {"min": 70.0, "max": 25.0}}});
        assert!(PricingStore::parse_document(value).is_err());
    }

    #[test]
    fn parse_document_rejects_malformed_shape() {
        let value = json!({"bots": {"discord": {"min": "cheap"}}});
        assert!(PricingStore::parse_document(value).is_err());
    }
}
