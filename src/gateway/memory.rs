//! In-process gateway with the same filtering, ordering and conflict
//! semantics as the hosted service.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Filter, GatewayError, Query, RemoteGateway, Row};

/// Gateway operation kinds, for call counting and failure scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Select,
    Upsert,
    Delete,
}

#[derive(Debug)]
struct ScheduledFailure {
    op: GatewayOp,
    skip: usize,
    message: String,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    failures: Vec<ScheduledFailure>,
    calls: HashMap<GatewayOp, usize>,
}

/// Tables held in memory.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends rows to `table` without going through `upsert`.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Current contents of `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Number of calls made for `op`, including failed ones.
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Makes the next call of `op` fail with `message`.
    pub fn fail_next(&self, op: GatewayOp, message: impl Into<String>) {
        self.fail_after(op, 0, message);
    }

    /// Lets `skip` calls of `op` succeed, then fails the following one.
    pub fn fail_after(&self, op: GatewayOp, skip: usize, message: impl Into<String>) {
        self.lock().failures.push(ScheduledFailure {
            op,
            skip,
            message: message.into(),
        });
    }

    /// Records a call of `op` and returns the scheduled failure, if one is due.
    fn begin(inner: &mut Inner, op: GatewayOp) -> Result<(), GatewayError> {
        *inner.calls.entry(op).or_insert(0) += 1;

        let Some(index) = inner.failures.iter().position(|f| f.op == op) else {
            return Ok(());
        };
        if inner.failures[index].skip > 0 {
            inner.failures[index].skip -= 1;
            return Ok(());
        }
        let failure = inner.failures.remove(index);
        Err(GatewayError::Rejected {
            status: 500,
            message: failure.message,
        })
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, GatewayError> {
        let mut inner = self.lock();
        Self::begin(&mut inner, GatewayOp::Select)?;

        let mut rows: Vec<Row> = inner
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| query.compare(a, b));
        Ok(rows)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        conflict_keys: &[&str],
    ) -> Result<Vec<Row>, GatewayError> {
        let mut inner = self.lock();
        Self::begin(&mut inner, GatewayOp::Upsert)?;

        let stored_rows = inner.tables.entry(table.to_string()).or_default();
        let mut result = Vec::with_capacity(rows.len());

        for row in rows {
            let Value::Object(fields) = row else {
                return Err(GatewayError::Rejected {
                    status: 400,
                    message: format!("{} rows must be JSON objects", table),
                });
            };

            let existing = if conflict_keys.is_empty() {
                None
            } else {
                stored_rows.iter().position(|stored| {
                    conflict_keys
                        .iter()
                        .all(|key| fields.get(*key).is_some() && stored.get(*key) == fields.get(*key))
                })
            };

            let stored = match existing {
                Some(index) => {
                    let mut merged = stored_rows[index].as_object().cloned().unwrap_or_default();
                    merged.extend(fields);
                    stored_rows[index] = Value::Object(merged);
                    stored_rows[index].clone()
                }
                None => {
                    let mut fields: Map<String, Value> = fields;
                    fields
                        .entry("id")
                        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
                    let row = Value::Object(fields);
                    stored_rows.push(row.clone());
                    row
                }
            };
            result.push(stored);
        }

        Ok(result)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        Self::begin(&mut inner, GatewayOp::Delete)?;

        if filters.is_empty() {
            return Err(GatewayError::Rejected {
                status: 400,
                message: format!("DELETE on {} requires a filter", table),
            });
        }
        if let Some(rows) = inner.tables.get_mut(table) {
            rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        }
        Ok(())
    }
}
