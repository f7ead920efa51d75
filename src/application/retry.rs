use crate::application::worker::ProcessingWorker;
use crate::config::RetryPolicy;
use crate::domain::payout::{Outcome, PayoutId, PayoutStatus};
use crate::domain::ports::PayoutStoreRef;
use crate::error::PayoutError;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

/// Receives the final [`Outcome`] of a submitted payout job.
pub type OutcomeReceiver = oneshot::Receiver<Outcome>;

struct Job {
    id: PayoutId,
    attempt: u32,
    reply: oneshot::Sender<Outcome>,
}

/// Wraps the worker in a job queue with delayed redelivery.
///
/// `submit` pushes a job into the queue and hands back a oneshot result
/// channel. A transient settlement failure schedules a re-send of the
/// same job after the policy delay on a detached task, so a retry never
/// blocks the dispatcher or ties up the original invocation. When the
/// attempt budget is exhausted, the controller itself writes the terminal
/// `Failed` state with the last error's text; this is the one place
/// other than the worker that writes terminal state, because only the
/// controller knows retries are done. That finalization is best-effort:
/// if it fails, the failure is logged and not retried further.
pub struct PayoutProcessor {
    jobs: mpsc::UnboundedSender<Job>,
}

impl PayoutProcessor {
    /// Spawns the dispatcher task and returns the submission handle.
    pub fn spawn(worker: ProcessingWorker, store: PayoutStoreRef, policy: RetryPolicy) -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker = Arc::new(worker);
        let requeue = jobs.clone();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let worker = worker.clone();
                let store = store.clone();
                let requeue = requeue.clone();
                tokio::spawn(async move {
                    run_job(worker, store, requeue, policy, job).await;
                });
            }
        });

        Self { jobs }
    }

    /// Enqueues one processing run for `id`. The receiver resolves with
    /// the final outcome once processing (including any retries) ends.
    pub fn submit(&self, id: PayoutId) -> OutcomeReceiver {
        let (reply, receiver) = oneshot::channel();
        let job = Job {
            id,
            attempt: 0,
            reply,
        };
        if let Err(mpsc::error::SendError(job)) = self.jobs.send(job) {
            // Dispatcher gone; report rather than drop the request.
            error!(payout = %job.id, "job queue closed, payout not processed");
        }
        receiver
    }
}

async fn run_job(
    worker: Arc<ProcessingWorker>,
    store: PayoutStoreRef,
    requeue: mpsc::UnboundedSender<Job>,
    policy: RetryPolicy,
    job: Job,
) {
    let attempt_result = if job.attempt == 0 {
        worker.process(job.id).await
    } else {
        worker.resume(job.id).await
    };

    match attempt_result {
        Ok(outcome) => {
            let _ = job.reply.send(outcome);
        }
        Err(err) if err.is_transient() && job.attempt < policy.max_retries => {
            let attempt = job.attempt + 1;
            warn!(payout = %job.id, attempt, max = policy.max_retries, %err,
                "transient settlement failure, scheduling retry");
            let delay = policy.retry_delay();
            let redelivery = Job {
                id: job.id,
                attempt,
                reply: job.reply,
            };
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = requeue.send(redelivery);
            });
        }
        Err(err) => {
            // Retries exhausted, or the store itself failed. Either way
            // the caller gets a result and the record a terminal state.
            error!(payout = %job.id, attempts = job.attempt + 1, %err,
                "payout processing failed permanently");
            mark_failed(&store, job.id, &err).await;
            let _ = job.reply.send(Outcome::Failed);
        }
    }
}

/// Best-effort terminal write after retry exhaustion: load the record,
/// set `Failed` with the last error's description, persist. Its own
/// failure is only logged.
async fn mark_failed(store: &PayoutStoreRef, id: PayoutId, last_error: &PayoutError) {
    let result = async {
        let Some((mut record, _row_lock)) = store.acquire_exclusive(id).await? else {
            return Err(PayoutError::NotFound(id));
        };
        if record.status != PayoutStatus::Failed {
            record.fail(last_error.to_string())?;
            store.save(&record).await?;
        }
        Ok(())
    }
    .await;

    if let Err(finalize_err) = result {
        error!(payout = %id, %finalize_err, "could not mark payout as failed");
    }
}
