// Audit trail for lock lifecycle events
// Keeps a bounded in-memory ring of recent lines and streams every line to a
// durable append-only store through a detached writer task

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Lock lifecycle event kinds recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    Queued,
    Granted,
    Released,
    TimedOut,
    Cancelled,
    ForceUnlocked,
    ClearedAll,
}

impl AuditEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEvent::Queued => "QUEUED",
            AuditEvent::Granted => "GRANTED",
            AuditEvent::Released => "RELEASED",
            AuditEvent::TimedOut => "TIMED_OUT",
            AuditEvent::Cancelled => "CANCELLED",
            AuditEvent::ForceUnlocked => "FORCE_UNLOCKED",
            AuditEvent::ClearedAll => "CLEARED_ALL",
        }
    }
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record, rendered to one human-readable line
#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
    pub resource: String,
    pub session: String,
}

impl AuditLogEntry {
    pub fn to_line(&self) -> String {
        format!(
            "{} [{}] resource={} session={}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event,
            self.resource,
            self.session
        )
    }
}

/// Durable destination for audit lines
pub trait AuditStore: Send + Sync {
    fn append(&self, line: &str) -> anyhow::Result<()>;
}

/// Append-only file store for audit lines
pub struct FileAuditStore {
    path: PathBuf,
}

impl FileAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AuditStore for FileAuditStore {
    fn append(&self, line: &str) -> anyhow::Result<()> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Audit sink for lock lifecycle events
///
/// `record` is synchronous and infallible: the ring buffer is updated under a
/// short mutex, and durable persistence happens on a detached task fed
/// through an unbounded channel. A slow or failing store can never block or
/// fail a lock operation.
pub struct AuditService {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
    durable: Option<mpsc::UnboundedSender<String>>,
}

impl AuditService {
    /// Ring-buffer-only audit sink (no durable store)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            durable: None,
        }
    }

    /// Audit sink with a detached writer draining into `store`
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_store(capacity: usize, store: Arc<dyn AuditStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = store.append(&line) {
                    debug!(error = %e, "Dropped audit line");
                }
            }
        });

        let mut service = Self::new(capacity);
        service.durable = Some(tx);
        service
    }

    /// Record an event; never blocks and never fails
    pub fn record(&self, event: AuditEvent, resource: &str, session: &str) {
        let entry = AuditLogEntry {
            timestamp: Utc::now(),
            event,
            resource: resource.to_string(),
            session: session.to_string(),
        };
        let line = entry.to_line();

        {
            let mut lines = self.lines.lock();
            if lines.len() == self.capacity {
                lines.pop_front();
            }
            lines.push_back(line.clone());
        }

        if let Some(tx) = &self.durable {
            let _ = tx.send(line);
        }
    }

    /// Most-recent-first audit lines, bounded by the ring capacity
    pub fn recent(&self) -> Vec<String> {
        self.lines.lock().iter().rev().cloned().collect()
    }
}
