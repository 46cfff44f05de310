//! Batched statement execution inside one transaction.
//!
//! [`BatchInsert`] queues parameterised write statements and executes them in
//! groups, flushing when the queue reaches `max_statements` or when the oldest
//! queued statement is older than `max_wait`. Each flush group runs under a
//! savepoint: if any statement in the group fails, the group is rolled back as
//! a whole and the error is returned. The enclosing transaction is left to
//! the caller, who is expected to drop (roll back) it on error.
//!
//! Nothing is guaranteed to be executed until [`BatchInsert::done`] returns
//! `Ok`.

use crate::errors::{persistence, Result};
use rusqlite::types::Value;
use rusqlite::Transaction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vulnstore_core::errors::{ExError, ExErrorKind};

const SAVEPOINT: &str = "microbatch";

/// Caller-held switch that aborts in-flight batch work.
///
/// Checked before every queue and flush; once set, the batch returns
/// `Cancelled` and the caller's transaction rolls back when dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct Queued {
    sql: &'static str,
    params: Vec<Value>,
}

/// Statement batcher bound to one open transaction.
pub struct BatchInsert<'a, 'conn> {
    tx: &'a Transaction<'conn>,
    max_statements: usize,
    max_wait: Duration,
    queue: Vec<Queued>,
    oldest: Option<Instant>,
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
    executed: usize,
    flushes: usize,
}

impl<'a, 'conn> BatchInsert<'a, 'conn> {
    pub fn new(tx: &'a Transaction<'conn>, max_statements: usize, max_wait: Duration) -> Self {
        let max_statements = max_statements.max(1);
        Self {
            tx,
            max_statements,
            max_wait,
            queue: Vec::with_capacity(max_statements),
            oldest: None,
            deadline: None,
            cancel: None,
            executed: 0,
            flushes: 0,
        }
    }

    /// Fail with `Timeout` once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Queue one statement; may trigger a flush.
    pub fn queue<I>(&mut self, sql: &'static str, params: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.check_live("batch_queue")?;

        if self.queue.is_empty() {
            self.oldest = Some(Instant::now());
        }
        self.queue.push(Queued {
            sql,
            params: params.into_iter().collect(),
        });

        let stale = self
            .oldest
            .map(|t| t.elapsed() >= self.max_wait)
            .unwrap_or(false);
        if self.queue.len() >= self.max_statements || stale {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush whatever is still queued and report how many statements ran.
    pub fn done(mut self) -> Result<usize> {
        self.flush()?;
        Ok(self.executed)
    }

    /// Number of flush groups executed so far
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    fn flush(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        self.check_live("batch_flush")?;

        let pending = std::mem::take(&mut self.queue);
        self.oldest = None;

        self.tx
            .execute_batch(&format!("SAVEPOINT {}", SAVEPOINT))
            .map_err(|e| persistence("batch_flush", "Failed to open savepoint", e))?;

        if let Err(e) = self.execute_all(&pending) {
            // The group is abandoned as a unit; the statement error is returned.
            if let Err(rollback) = self.tx.execute_batch(&format!(
                "ROLLBACK TO {sp}; RELEASE {sp}",
                sp = SAVEPOINT
            )) {
                tracing::warn!(
                    error = %rollback,
                    "Failed to roll back abandoned batch group"
                );
            }
            return Err(e);
        }

        self.tx
            .execute_batch(&format!("RELEASE {}", SAVEPOINT))
            .map_err(|e| persistence("batch_flush", "Failed to release savepoint", e))?;

        self.executed += pending.len();
        self.flushes += 1;
        tracing::trace!(
            statements = pending.len(),
            total = self.executed,
            "Flushed statement batch"
        );
        Ok(())
    }

    fn execute_all(&self, pending: &[Queued]) -> Result<()> {
        for (i, q) in pending.iter().enumerate() {
            let mut stmt = self
                .tx
                .prepare_cached(q.sql)
                .map_err(|e| persistence("batch_flush", "Failed to prepare statement", e))?;
            stmt.execute(rusqlite::params_from_iter(q.params.iter()))
                .map_err(|e| {
                    persistence(
                        "batch_flush",
                        &format!("Statement {} of {} in batch failed", i + 1, pending.len()),
                        e,
                    )
                })?;
        }
        Ok(())
    }

    fn check_live(&self, op: &str) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(ExError::new(ExErrorKind::Cancelled)
                .with_op(op)
                .with_message("batch cancelled by caller"));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ExError::new(ExErrorKind::Timeout)
                .with_op(op)
                .with_message("batch deadline exceeded"));
        }
        Ok(())
    }
}
