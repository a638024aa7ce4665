//! Audit sink contract (spec §6.3).
//!
//! Mirrors `vestige-core`'s pattern of taking an external sink trait for
//! anything that is "write once, never read back by the core itself":
//! the core only needs to know an audit record was accepted and given an id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;

/// Context accompanying an audit log call (spec §6.3).
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub actor: Option<String>,
    pub session_id: Option<String>,
    pub at: Option<DateTime<Utc>>,
}

/// The external audit sink interface (spec §6.3: `log(tenant, action, data,
/// context) -> auditId`).
pub trait AuditSink: Send + Sync {
    fn log(
        &self,
        tenant_id: &str,
        action: &str,
        data: &HashMap<String, Value>,
        context: &AuditContext,
    ) -> Result<String>;
}

/// Accepts and discards every record, returning a fresh id each time.
///
/// Used when no audit backend is wired; callers that depend on the
/// returned id (e.g. self-audit reports referencing it) still get a
/// stable, unique value.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn log(
        &self,
        tenant_id: &str,
        action: &str,
        _data: &HashMap<String, Value>,
        _context: &AuditContext,
    ) -> Result<String> {
        let id = format!("audit_{}", uuid::Uuid::new_v4());
        tracing::debug!(tenant_id, action, audit_id = %id, "audit record discarded (no sink configured)");
        Ok(id)
    }
}
