// Resource-scoped reader/writer lock coordination
// Strict-FIFO wait queues with a write barrier, bounded waiting, and an
// audited lifecycle for every request

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, info};

use tranca_common::{DEFAULT_ACQUIRE_TIMEOUT_MS, LockMode, TrancaError};

use super::audit::{AuditEvent, AuditService};
use crate::model::{ActiveLock, PendingLock};

/// Session name stamped on administrative audit lines
const ADMIN_SESSION: &str = "admin";

/// Tuning knobs for the coordinator
#[derive(Debug, Clone)]
pub struct LockServiceConfig {
    /// How long an enqueued request may wait before failing with `LockTimeout`
    pub acquire_timeout: Duration,
}

impl Default for LockServiceConfig {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
        }
    }
}

type GrantSender = oneshot::Sender<Result<(), TrancaError>>;
type GrantReceiver = oneshot::Receiver<Result<(), TrancaError>>;

/// A not-yet-granted request parked in a resource's wait queue
///
/// Leaves the queue exactly once: on grant, cancellation, or timed-out
/// removal. The grant channel resolves the awaiting caller.
struct Waiter {
    id: u64,
    session: String,
    mode: LockMode,
    queued_at: DateTime<Utc>,
    grant: GrantSender,
}

/// The exclusive holder of a resource
struct WriterSlot {
    session: String,
    acquired_at: DateTime<Utc>,
}

/// Per-resource lock record: reader set, writer slot, FIFO wait queue
#[derive(Default)]
struct ResourceEntry {
    readers: HashMap<String, DateTime<Utc>>,
    writer: Option<WriterSlot>,
    queue: VecDeque<Waiter>,
}

impl ResourceEntry {
    fn is_idle(&self) -> bool {
        self.readers.is_empty() && self.writer.is_none() && self.queue.is_empty()
    }
}

/// Reader/writer lock coordinator over named resources
///
/// One instance is constructed at startup and shared behind `Arc` by every
/// caller; handlers receive it by injection, never through a global. Each
/// resource has an independent record, and the scheduler's whole
/// read-decide-mutate pass runs under that record's map guard, so it is one
/// atomic step relative to all other callers of the same resource. No guard
/// is ever held across an await point.
pub struct LockService {
    tables: DashMap<String, ResourceEntry>,
    audit: Arc<AuditService>,
    config: LockServiceConfig,
    next_request_id: AtomicU64,
}

impl LockService {
    pub fn new(audit: Arc<AuditService>) -> Self {
        Self::with_config(audit, LockServiceConfig::default())
    }

    pub fn with_config(audit: Arc<AuditService>, config: LockServiceConfig) -> Self {
        Self {
            tables: DashMap::new(),
            audit,
            config,
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Acquire a shared lock, suspending the caller until granted or timed out
    pub async fn acquire_read(&self, resource: &str, session: &str) -> Result<(), TrancaError> {
        self.acquire(resource, session, LockMode::Read).await
    }

    /// Acquire an exclusive lock, suspending the caller until granted or timed out
    pub async fn acquire_write(&self, resource: &str, session: &str) -> Result<(), TrancaError> {
        self.acquire(resource, session, LockMode::Write).await
    }

    async fn acquire(
        &self,
        resource: &str,
        session: &str,
        mode: LockMode,
    ) -> Result<(), TrancaError> {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = oneshot::channel();

        {
            let mut entry = self.tables.entry(resource.to_string()).or_default();
            entry.queue.push_back(Waiter {
                id,
                session: session.to_string(),
                mode,
                queued_at: Utc::now(),
                grant: tx,
            });
            self.audit.record(AuditEvent::Queued, resource, session);
            Self::promote(&mut entry, &self.audit, resource);
        }

        match tokio::time::timeout(self.config.acquire_timeout, &mut rx).await {
            Ok(Ok(outcome)) => outcome,
            // The sender is only ever dropped without resolution when the
            // whole service is torn down mid-request
            Ok(Err(_)) => Err(TrancaError::LockCancelled {
                resource: resource.to_string(),
                session: session.to_string(),
            }),
            Err(_) => self.expire(resource, session, mode, id, rx),
        }
    }

    /// Deadline elapsed: remove the waiter if it is still queued
    ///
    /// A grant or cancellation that raced the deadline has already resolved
    /// the channel under the entry guard and wins; the request leaves
    /// Pending exactly once either way.
    fn expire(
        &self,
        resource: &str,
        session: &str,
        mode: LockMode,
        id: u64,
        mut rx: GrantReceiver,
    ) -> Result<(), TrancaError> {
        let mut removed = false;
        if let Some(mut entry) = self.tables.get_mut(resource) {
            if let Some(pos) = entry.queue.iter().position(|w| w.id == id) {
                entry.queue.remove(pos);
                removed = true;
                self.audit.record(AuditEvent::TimedOut, resource, session);
                // A removed blocking write may unblock reads queued behind it
                Self::promote(&mut entry, &self.audit, resource);
            }
        }
        self.reap_if_idle(resource);

        if removed {
            debug!(resource = %resource, session = %session, mode = %mode, "Lock request timed out");
            return Err(TrancaError::LockTimeout {
                resource: resource.to_string(),
                mode,
                session: session.to_string(),
            });
        }

        match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(TrancaError::LockCancelled {
                resource: resource.to_string(),
                session: session.to_string(),
            }),
        }
    }

    /// Release whatever `session` holds or still has queued on `resource`
    ///
    /// Idempotent: releasing a session that holds nothing and queues nothing
    /// is a no-op. Queued requests owned by the session are rejected with
    /// `LockCancelled`, not silently dropped.
    pub fn release(&self, resource: &str, session: &str) {
        if let Some(mut entry) = self.tables.get_mut(resource) {
            if entry.readers.remove(session).is_some() {
                self.audit.record(AuditEvent::Released, resource, session);
                debug!(resource = %resource, session = %session, "Read lock released");
            } else if entry.writer.as_ref().is_some_and(|w| w.session == session) {
                entry.writer = None;
                self.audit.record(AuditEvent::Released, resource, session);
                debug!(resource = %resource, session = %session, "Write lock released");
            }
            Self::cancel_queued(&mut entry, &self.audit, resource, |w| w.session == session);
            Self::promote(&mut entry, &self.audit, resource);
        }
        self.reap_if_idle(resource);
    }

    /// Administrative override: clear all holders and reject all waiters
    ///
    /// Fails with `InvalidResource` when the resource id is empty.
    pub fn force_unlock(&self, resource: &str) -> Result<(), TrancaError> {
        if resource.trim().is_empty() {
            return Err(TrancaError::InvalidResource(
                "resource id must not be empty".to_string(),
            ));
        }
        self.force_unlock_entry(resource);
        Ok(())
    }

    fn force_unlock_entry(&self, resource: &str) {
        if let Some((_, mut entry)) = self.tables.remove(resource) {
            let holders = entry.readers.len() + usize::from(entry.writer.is_some());
            let waiting = entry.queue.len();
            Self::cancel_queued(&mut entry, &self.audit, resource, |_| true);
            self.audit
                .record(AuditEvent::ForceUnlocked, resource, ADMIN_SESSION);
            info!(resource = %resource, holders, waiting, "Force unlocked");
        } else {
            // Nothing held or queued; still acknowledged and audited
            self.audit
                .record(AuditEvent::ForceUnlocked, resource, ADMIN_SESSION);
        }
    }

    /// Apply a force-unlock to every resource currently tracked
    pub fn clear_all(&self) {
        let resources: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        for resource in &resources {
            self.force_unlock_entry(resource);
        }
        self.audit.record(AuditEvent::ClearedAll, "*", ADMIN_SESSION);
        info!(resources = resources.len(), "Cleared all locks");
    }

    /// Acquire a read lock under a synthesized session, release it after
    /// `hold`, and return the session id immediately
    pub fn simulate_read(service: &Arc<LockService>, resource: &str, hold: Duration) -> String {
        Self::simulate(service, resource, LockMode::Read, hold)
    }

    /// Acquire a write lock under a synthesized session, release it after
    /// `hold`, and return the session id immediately
    pub fn simulate_write(service: &Arc<LockService>, resource: &str, hold: Duration) -> String {
        Self::simulate(service, resource, LockMode::Write, hold)
    }

    fn simulate(
        service: &Arc<LockService>,
        resource: &str,
        mode: LockMode,
        hold: Duration,
    ) -> String {
        let session = format!("sim-{}", uuid::Uuid::new_v4());
        let service = Arc::clone(service);
        let resource = resource.to_string();
        let task_session = session.clone();

        // Acquisition follows the normal queueing and timeout rules; only
        // the release is automatic
        tokio::spawn(async move {
            let acquired = match mode {
                LockMode::Read => service.acquire_read(&resource, &task_session).await,
                LockMode::Write => service.acquire_write(&resource, &task_session).await,
            };
            match acquired {
                Ok(()) => {
                    tokio::time::sleep(hold).await;
                    service.release(&resource, &task_session);
                }
                Err(e) => {
                    debug!(resource = %resource, session = %task_session, error = %e, "Simulated lock not acquired");
                }
            }
        });

        session
    }

    /// Every held lock across all resources, ordered by hold start, then
    /// resource id, then session id
    pub fn active_locks(&self) -> Vec<ActiveLock> {
        let mut locks = Vec::new();
        for entry in self.tables.iter() {
            let resource = entry.key();
            for (session, held_since) in &entry.readers {
                locks.push(ActiveLock {
                    resource: resource.clone(),
                    session: session.clone(),
                    mode: LockMode::Read,
                    held_since: *held_since,
                });
            }
            if let Some(writer) = &entry.writer {
                locks.push(ActiveLock {
                    resource: resource.clone(),
                    session: writer.session.clone(),
                    mode: LockMode::Write,
                    held_since: writer.acquired_at,
                });
            }
        }
        locks.sort_by(|a, b| {
            a.held_since
                .cmp(&b.held_since)
                .then_with(|| a.resource.cmp(&b.resource))
                .then_with(|| a.session.cmp(&b.session))
        });
        locks
    }

    /// Every queued request across all resources, ordered by wait start
    pub fn pending_queue(&self) -> Vec<PendingLock> {
        let mut pending = Vec::new();
        for entry in self.tables.iter() {
            let resource = entry.key();
            for waiter in &entry.queue {
                pending.push(PendingLock {
                    resource: resource.clone(),
                    session: waiter.session.clone(),
                    mode: waiter.mode,
                    waiting_since: waiter.queued_at,
                });
            }
        }
        pending.sort_by(|a, b| {
            a.waiting_since
                .cmp(&b.waiting_since)
                .then_with(|| a.resource.cmp(&b.resource))
        });
        pending
    }

    /// Most-recent-first audit lines
    pub fn recent_log(&self) -> Vec<String> {
        self.audit.recent()
    }

    /// Scheduler pass: promote eligible requests at the head of the queue
    ///
    /// Runs under the resource's map guard after every enqueue, release,
    /// timeout, or force-unlock. Grants strictly in arrival order: a write
    /// at the head waits for the resource to be fully free and blocks
    /// everything behind it; a read at the head is granted together with
    /// every contiguous read up to the first queued write (the barrier).
    fn promote(entry: &mut ResourceEntry, audit: &AuditService, resource: &str) {
        if entry.writer.is_some() {
            return;
        }
        loop {
            let head_mode = match entry.queue.front() {
                None => return,
                Some(waiter) => waiter.mode,
            };
            match head_mode {
                LockMode::Write => {
                    if !entry.readers.is_empty() {
                        return;
                    }
                    if let Some(waiter) = entry.queue.pop_front() {
                        entry.writer = Some(WriterSlot {
                            session: waiter.session.clone(),
                            acquired_at: Utc::now(),
                        });
                        audit.record(AuditEvent::Granted, resource, &waiter.session);
                        debug!(resource = %resource, session = %waiter.session, "Write lock granted");
                        let _ = waiter.grant.send(Ok(()));
                    }
                    return;
                }
                LockMode::Read => {
                    if let Some(waiter) = entry.queue.pop_front() {
                        entry.readers.insert(waiter.session.clone(), Utc::now());
                        audit.record(AuditEvent::Granted, resource, &waiter.session);
                        debug!(resource = %resource, session = %waiter.session, "Read lock granted");
                        let _ = waiter.grant.send(Ok(()));
                    }
                }
            }
        }
    }

    /// Remove queued waiters matching `predicate`, rejecting each with
    /// `LockCancelled`
    fn cancel_queued(
        entry: &mut ResourceEntry,
        audit: &AuditService,
        resource: &str,
        predicate: impl Fn(&Waiter) -> bool,
    ) {
        let mut kept = VecDeque::with_capacity(entry.queue.len());
        for waiter in entry.queue.drain(..) {
            if predicate(&waiter) {
                audit.record(AuditEvent::Cancelled, resource, &waiter.session);
                let _ = waiter.grant.send(Err(TrancaError::LockCancelled {
                    resource: resource.to_string(),
                    session: waiter.session.clone(),
                }));
            } else {
                kept.push_back(waiter);
            }
        }
        entry.queue = kept;
    }

    /// Drop the table entry once the resource has no readers, no writer, and
    /// no waiters
    fn reap_if_idle(&self, resource: &str) {
        self.tables.remove_if(resource, |_, entry| entry.is_idle());
    }
}
