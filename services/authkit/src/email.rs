//! Outbound email queue and delivery abstractions.
//!
//! Registration in production mode enqueues a verification message on a
//! bounded channel drained by a background worker. The worker hands each
//! message to an [`EmailSender`], retries failures with exponential backoff
//! and jitter, and logs terminal failures with full message context so
//! delivery problems are observable instead of silently dropped.
//!
//! Enqueuing never blocks the request path: a full queue drops the message
//! with an error log. The worker holds its own copy of each message and
//! shares no mutable state with request handlers.

use anyhow::Result;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub template: String,
    pub payload_json: String,
}

/// Email delivery abstraction used by the queue worker.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to trigger a retry.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            template = %message.template,
            payload = %message.payload_json,
            "email queue send stub"
        );
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EmailWorkerConfig {
    queue_capacity: usize,
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl EmailWorkerConfig {
    /// Default worker config: 64-message queue, 5 max attempts, and
    /// 5s->5m exponential backoff with jitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue_capacity: 64,
            max_attempts: 5,
            backoff_base: Duration::from_secs(5),
            backoff_max: Duration::from_secs(300),
        }
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_backoff_base_seconds(mut self, seconds: u64) -> Self {
        self.backoff_base = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_backoff_max_seconds(mut self, seconds: u64) -> Self {
        self.backoff_max = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn normalize(self) -> Self {
        let queue_capacity = self.queue_capacity.max(1);
        let max_attempts = self.max_attempts.max(1);
        let backoff_base = if self.backoff_base.is_zero() {
            Duration::from_secs(1)
        } else {
            self.backoff_base
        };
        let backoff_max = if self.backoff_max < backoff_base {
            backoff_base
        } else {
            self.backoff_max
        };
        Self {
            queue_capacity,
            max_attempts,
            backoff_base,
            backoff_max,
        }
    }

    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    #[must_use]
    pub const fn backoff_max(&self) -> Duration {
        self.backoff_max
    }
}

impl Default for EmailWorkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle for the outbound queue. Cheap to clone; safe to use from
/// any request task.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<EmailMessage>,
}

impl EmailQueue {
    /// Enqueue without blocking the request path. Drops and logs when the
    /// queue is full or the worker is gone; registration must not fail on
    /// notification problems.
    pub fn enqueue(&self, message: EmailMessage) {
        if let Err(err) = self.tx.try_send(message) {
            match &err {
                mpsc::error::TrySendError::Full(message) => {
                    error!(
                        to_email = %message.to_email,
                        template = %message.template,
                        "email queue full, dropping message"
                    );
                }
                mpsc::error::TrySendError::Closed(message) => {
                    error!(
                        to_email = %message.to_email,
                        template = %message.template,
                        "email queue closed, dropping message"
                    );
                }
            }
        }
    }
}

/// Spawn the background worker and return the queue handle feeding it.
pub fn spawn_notifier_worker(
    sender: Arc<dyn EmailSender>,
    config: EmailWorkerConfig,
) -> (EmailQueue, tokio::task::JoinHandle<()>) {
    let config = config.normalize();
    let (tx, mut rx) = mpsc::channel(config.queue_capacity());

    let handle = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            deliver_with_retry(sender.as_ref(), &message, &config).await;
        }
    });

    (EmailQueue { tx }, handle)
}

async fn deliver_with_retry(
    sender: &dyn EmailSender,
    message: &EmailMessage,
    config: &EmailWorkerConfig,
) {
    for attempt in 1..=config.max_attempts() {
        match sender.send(message) {
            Ok(()) => return,
            Err(err) if attempt >= config.max_attempts() => {
                // Terminal failure: keep the full message context so operators
                // can replay it by hand.
                error!(
                    to_email = %message.to_email,
                    template = %message.template,
                    payload = %message.payload_json,
                    attempts = attempt,
                    "email delivery failed permanently: {err}"
                );
                return;
            }
            Err(err) => {
                let delay = backoff_delay(attempt, config.backoff_base(), config.backoff_max());
                let retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                error!(
                    to_email = %message.to_email,
                    attempt,
                    retry_in_ms,
                    "email delivery failed, retrying: {err}"
                );
                sleep(delay).await;
            }
        }
    }
}

fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let shift = attempt.saturating_sub(1).min(31);
    let factor = 1u32 << shift;
    let delay = base.checked_mul(factor).unwrap_or(max);
    let capped = if delay > max { max } else { delay };
    jitter_delay(capped)
}

fn jitter_delay(delay: Duration) -> Duration {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    if delay_ms < 2 {
        return delay;
    }
    let half = delay_ms / 2;
    let jitter = rand::thread_rng().gen_range(0..=half);
    Duration::from_millis(half + jitter)
}
