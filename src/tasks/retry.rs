//! Invalidation Retry Task
//!
//! A dropped invalidation is the one failure that leaves the cache stale for
//! good, so failed steps are queued here and re-attempted with linear
//! backoff until they succeed or the attempt budget runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::aside::{InvalidationJob, Invalidator};
use crate::cache::StatsRecorder;
use crate::config::Config;

// == Retry Policy ==
/// Attempt budget and backoff for queued invalidations.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the inline one included
    pub max_attempts: u32,
    /// Delay before retry `n` is `backoff * n`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            backoff: config.retry_backoff(),
        }
    }

    /// Delay before the retry that follows `attempts` attempts. Saturates
    /// instead of overflowing on large configured backoffs.
    pub fn delay(&self, attempts: u32) -> Duration {
        self.backoff.saturating_mul(attempts)
    }
}

// == Retry Queue ==
/// Sending half of the retry queue, held by the orchestrator.
#[derive(Debug, Clone)]
pub struct RetryQueue {
    sender: mpsc::UnboundedSender<InvalidationJob>,
    stats: Arc<StatsRecorder>,
}

impl RetryQueue {
    /// Creates the queue and the receiver to hand to [`spawn_retry_task`].
    pub fn channel(stats: Arc<StatsRecorder>) -> (Self, mpsc::UnboundedReceiver<InvalidationJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, stats }, receiver)
    }

    /// Queues a partially applied invalidation.
    pub fn enqueue(&self, job: InvalidationJob) {
        let imei = job.imei.clone();
        match self.sender.send(job) {
            Ok(()) => {
                self.stats.retry_enqueued();
                debug!(imei = %imei, "invalidation queued for retry");
            }
            Err(_) => error!(imei = %imei, "retry task is gone, invalidation dropped"),
        }
    }
}

/// Spawns the task that drains the retry queue.
///
/// Each job is retried on its own child task so one slow backoff does not
/// hold up the others. The task ends once every [`RetryQueue`] is dropped
/// and the in-flight jobs finish; aborting it aborts the in-flight jobs too.
///
/// # Arguments
/// * `invalidator` - Applies the pending steps
/// * `receiver` - Receiving half from [`RetryQueue::channel`]
/// * `policy` - Attempt budget and backoff
///
/// # Example
/// ```ignore
/// let (queue, receiver) = RetryQueue::channel(stats.clone());
/// let retry_handle = spawn_retry_task(invalidator, receiver, RetryPolicy::from_config(&config));
/// // Later, during shutdown:
/// retry_handle.abort();
/// ```
pub fn spawn_retry_task(
    invalidator: Arc<Invalidator>,
    mut receiver: mpsc::UnboundedReceiver<InvalidationJob>,
    policy: RetryPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting invalidation retry task: max_attempts={}, backoff={}ms",
            policy.max_attempts,
            policy.backoff.as_millis()
        );

        let mut inflight = JoinSet::new();
        loop {
            tokio::select! {
                job = receiver.recv() => match job {
                    Some(job) => {
                        inflight.spawn(retry_job(invalidator.clone(), job, policy));
                    }
                    None => break,
                },
                Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
            }
        }

        while inflight.join_next().await.is_some() {}
        info!("Invalidation retry task stopped");
    })
}

async fn retry_job(invalidator: Arc<Invalidator>, mut job: InvalidationJob, policy: RetryPolicy) {
    while !job.is_done() {
        if job.attempts >= policy.max_attempts {
            error!(
                imei = %job.imei,
                attempts = job.attempts,
                cache_pending = job.cache_pending,
                publish_pending = job.publish_pending,
                "invalidation abandoned, cache may serve a stale record"
            );
            invalidator.stats().retry_finished(true);
            return;
        }
        tokio::time::sleep(policy.delay(job.attempts)).await;
        job = invalidator.apply(job).await;
    }

    info!(imei = %job.imei, attempts = job.attempts, "invalidation delivered on retry");
    invalidator.stats().retry_finished(false);
}
