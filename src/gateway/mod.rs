//! Remote gateway to the hosted relational data service.
//!
//! The stores talk to the service only through [`RemoteGateway`]: select,
//! upsert and delete on named tables, with rows exchanged as JSON objects.
//!
//! ## Implementations
//!
//! - [`HttpGateway`]: PostgREST over HTTP (`/rest/v1/<table>`)
//! - [`MemoryGateway`]: in-process tables, for tests and offline previews

mod http;
mod memory;
mod query;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use http::HttpGateway;
pub use memory::{GatewayOp, MemoryGateway};
pub use query::{Filter, FilterOp, Order, Query};

/// A row as exchanged with the remote service.
pub type Row = Value;

/// Typed query/mutation interface to the remote service.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Returns the rows of `table` matching `query`, in the requested order.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, GatewayError>;

    /// Inserts `rows`, replacing any existing row that matches on all of
    /// `conflict_keys`. Returns the stored rows.
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        conflict_keys: &[&str],
    ) -> Result<Vec<Row>, GatewayError>;

    /// Deletes every row of `table` matching all `filters`.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError>;
}

/// Selects rows and decodes them into `T`.
pub async fn select_as<T: DeserializeOwned>(
    gateway: &dyn RemoteGateway,
    table: &str,
    query: &Query,
) -> Result<Vec<T>, GatewayError> {
    let rows = gateway.select(table, query).await?;
    decode_rows(table, rows)
}

/// Upserts typed payloads and decodes the returned rows into `R`.
pub async fn upsert_as<P: Serialize, R: DeserializeOwned>(
    gateway: &dyn RemoteGateway,
    table: &str,
    payloads: &[P],
    conflict_keys: &[&str],
) -> Result<Vec<R>, GatewayError> {
    let rows = payloads
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| GatewayError::Decode(format!("{} payload: {}", table, e)))?;
    let stored = gateway.upsert(table, rows, conflict_keys).await?;
    decode_rows(table, stored)
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Result<Vec<T>, GatewayError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| GatewayError::Decode(format!("{} row: {}", table, e)))
        })
        .collect()
}

/// Errors that can occur talking to the remote service.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Remote access is not configured.
    #[error("Remote service not configured. Add remote url and anon_key to config.")]
    NotConfigured,

    /// The request never produced a response.
    #[error("Connection error: {0}")]
    Transport(String),

    /// The service answered with an error status.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A row did not match the expected shape.
    #[error("Failed to decode {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Pair {
        surah: u32,
        ayah: u32,
    }

    #[tokio::test]
    async fn test_select_as_decodes_rows() {
        let gateway = MemoryGateway::new();
        gateway.seed("pairs", vec![json!({"surah": 1, "ayah": 2})]);

        let rows: Vec<Pair> = select_as(&gateway, "pairs", &Query::new()).await.unwrap();
        assert_eq!(rows, vec![Pair { surah: 1, ayah: 2 }]);
    }

    #[tokio::test]
    async fn test_select_as_reports_bad_rows() {
        let gateway = MemoryGateway::new();
        gateway.seed("pairs", vec![json!({"surah": "one"})]);

        let result: Result<Vec<Pair>, _> = select_as(&gateway, "pairs", &Query::new()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
        assert!(err.to_string().contains("pairs row"));
    }

    #[tokio::test]
    async fn test_upsert_as_roundtrips_payload() {
        let gateway = MemoryGateway::new();
        let stored: Vec<Pair> = upsert_as(
            &gateway,
            "pairs",
            &[Pair { surah: 3, ayah: 4 }],
            &["surah", "ayah"],
        )
        .await
        .unwrap();
        assert_eq!(stored, vec![Pair { surah: 3, ayah: 4 }]);
    }
}
