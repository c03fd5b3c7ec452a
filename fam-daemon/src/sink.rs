//! Event delivery.
//!
//! The sink boundary is the only outbound network surface. Delivery is
//! deliberately fire-and-forget: a failed batch is logged and dropped, and
//! the polling loop carries on. Callers needing durability should interpose
//! a queue ahead of the sink.

use std::sync::{Arc, Mutex};

use fam_core::Event;

/// Delivery error types.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("delivery failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend rejected batch with status {status}")]
    Rejected { status: reqwest::StatusCode },
}

/// Destination for accumulated event batches.
#[allow(async_fn_in_trait)]
pub trait EventSink {
    /// Deliver one batch. An empty batch is a no-op.
    async fn submit(&self, batch: &[Event]) -> Result<(), SinkError>;
}

/// New Relic Insights event API sink.
pub struct InsightsSink {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl InsightsSink {
    /// Create a sink for the given account.
    pub fn new(account_id: &str, api_key: &str) -> Self {
        let url = format!(
            "https://insights-collector.newrelic.com/v1/accounts/{account_id}/events"
        );
        Self::with_url(url, api_key)
    }

    /// Create a sink posting to an explicit URL (used by tests).
    pub fn with_url(url: impl Into<String>, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.to_string(),
        }
    }
}

impl EventSink for InsightsSink {
    async fn submit(&self, batch: &[Event]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(&self.url)
            .header("Api-Key", &self.api_key)
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected { status });
        }

        log::info!("batch of {} events delivered", batch.len());
        for event in batch {
            log::debug!(
                "event sent: {}",
                serde_json::to_string(event).unwrap_or_else(|_| "<unserializable>".to_string())
            );
        }
        Ok(())
    }
}

/// In-memory sink that records every batch. Used by dry-run passes and
/// tests; never fails.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<Vec<Event>>>>,
}

impl MemorySink {
    /// Create an empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every batch submitted so far, in order.
    pub fn batches(&self) -> Vec<Vec<Event>> {
        self.batches.lock().expect("sink poisoned").clone()
    }

    /// Every event submitted so far, flattened.
    pub fn events(&self) -> Vec<Event> {
        self.batches().into_iter().flatten().collect()
    }
}

impl EventSink for MemorySink {
    async fn submit(&self, batch: &[Event]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.batches
            .lock()
            .expect("sink poisoned")
            .push(batch.to_vec());
        Ok(())
    }
}
