use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// One answered question, as written to the interaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub agent: String,
    pub question: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl InteractionRecord {
    pub fn new(agent: impl Into<String>, question: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            question: question.into(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Redis health status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisHealthStatus {
    pub connected: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Destination for interaction records. Failures are reported, never fatal
/// to the lookup that produced the record.
#[async_trait]
pub trait InteractionSink: Send + Sync {
    async fn record(&self, record: &InteractionRecord) -> Result<()>;
}

/// Discards everything; used when the interaction log is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl InteractionSink for NoopSink {
    async fn record(&self, _record: &InteractionRecord) -> Result<()> {
        Ok(())
    }
}

/// Keeps records in process; handy for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<InteractionRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<InteractionRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InteractionSink for MemorySink {
    async fn record(&self, record: &InteractionRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory sink poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

/// Capped redis list of interaction records, newest first
#[derive(Debug, Clone)]
pub struct RedisClient {
    client: Client,
    list_key: String,
    max_entries: usize,
}

impl RedisClient {
    pub async fn new(redis_url: &str, list_key: &str, max_entries: usize) -> Result<Self> {
        let client = Client::open(redis_url)?;

        // Test the connection
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("✅ Connected to redis interaction log at {}", redis_url);

        Ok(Self {
            client,
            list_key: list_key.to_string(),
            max_entries: max_entries.max(1),
        })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(PersistenceError::from)
    }

    /// Push one record and trim the list to `max_entries`
    pub async fn push_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.get_connection().await?;

        let _: () = redis::pipe()
            .atomic()
            .lpush(&self.list_key, payload)
            .ignore()
            .ltrim(&self.list_key, 0, self.max_entries as isize - 1)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!("📝 Logged interaction for agent {}", record.agent);
        Ok(())
    }

    /// Most recent `count` records, newest first
    pub async fn recent_interactions(&self, count: usize) -> Result<Vec<InteractionRecord>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection().await?;
        let raw: Vec<String> = conn.lrange(&self.list_key, 0, count as isize - 1).await?;

        raw.iter()
            .map(|json| serde_json::from_str(json).map_err(PersistenceError::from))
            .collect()
    }

    pub async fn interaction_count(&self) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        let len: u64 = conn.llen(&self.list_key).await?;
        Ok(len)
    }

    /// Test Redis connectivity and health
    pub async fn health_check(&self) -> RedisHealthStatus {
        let start = std::time::Instant::now();
        let result: Result<String> = async {
            let mut conn = self.get_connection().await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(pong)
        }
        .await;

        match result {
            Ok(_) => RedisHealthStatus {
                connected: true,
                latency_ms: start.elapsed().as_millis() as u64,
                error: None,
            },
            Err(e) => RedisHealthStatus {
                connected: false,
                latency_ms: start.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait]
impl InteractionSink for RedisClient {
    async fn record(&self, record: &InteractionRecord) -> Result<()> {
        self.push_interaction(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_rfc3339_timestamp() {
        let record = InteractionRecord::new("contract_lookup", "/price eth 0xabc", "⛔ Uh oh! CA not found.");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["agent"], "contract_lookup");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));

        let back: InteractionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.record(&InteractionRecord::new("a", "q1", "r1")).await.unwrap();
        sink.record(&InteractionRecord::new("a", "q2", "r2")).await.unwrap();

        let questions: Vec<String> = sink.records().into_iter().map(|r| r.question).collect();
        assert_eq!(questions, vec!["q1", "q2"]);
        assert!(NoopSink.record(&InteractionRecord::new("a", "q", "r")).await.is_ok());
    }

    #[tokio::test]
    async fn test_redis_interaction_log() {
        // This test requires a running Redis instance
        // Skip if REDIS_URL is not set
        let Ok(redis_url) = std::env::var("REDIS_URL") else {
            return;
        };

        let client = RedisClient::new(&redis_url, "test:lookup:interactions", 2).await.unwrap();
        for i in 0..3 {
            client
                .push_interaction(&InteractionRecord::new("test", format!("q{}", i), "r"))
                .await
                .unwrap();
        }

        let recent = client.recent_interactions(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question, "q2");
        assert!(client.health_check().await.connected);
    }
}
