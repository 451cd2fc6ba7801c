//! Constant-pace load generator
//!
//! A pacer task emits one hit every `1s / rps` into a shared queue. A pool of
//! worker tasks pulls hits from it and sends the results downstream. When a
//! tick finds no idle worker, the pool grows by one, so the configured
//! worker count is a floor rather than a cap.
//!
//! Pacing stops once `sustain` has elapsed. Hits still queued at that point
//! are dropped, while requests already in flight run to completion, each
//! bounded by the per-request timeout. The shutdown signal aborts the
//! workers outright.

use shared::{process_debug, ProcessRole, ShutdownListener};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::core::metrics::AttackResult;
use crate::core::spec::AttackPlan;
use crate::error::StressorResult;

const RESULT_BUFFER: usize = 1024;

struct WorkerContext {
    client: reqwest::Client,
    plan: AttackPlan,
    hits: Mutex<mpsc::UnboundedReceiver<u64>>,
    results: mpsc::Sender<AttackResult>,
    idle: AtomicUsize,
    stopped: AtomicBool,
}

pub struct Attacker {
    client: reqwest::Client,
    plan: AttackPlan,
}

impl Attacker {
    pub fn new(plan: AttackPlan) -> StressorResult<Self> {
        let client = reqwest::Client::builder().timeout(plan.timeout).build()?;
        Ok(Self { client, plan })
    }

    /// Start the attack. The returned stream ends once the attack stopped
    /// and every worker is gone.
    pub fn attack(self, shutdown: ShutdownListener) -> mpsc::Receiver<AttackResult> {
        let (results_tx, results_rx) = mpsc::channel(RESULT_BUFFER);
        let (hits_tx, hits_rx) = mpsc::unbounded_channel();

        let context = Arc::new(WorkerContext {
            client: self.client,
            plan: self.plan,
            hits: Mutex::new(hits_rx),
            results: results_tx,
            idle: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        });

        tokio::spawn(drive(context, hits_tx, shutdown));
        results_rx
    }
}

async fn drive(context: Arc<WorkerContext>, hits: mpsc::UnboundedSender<u64>, shutdown: ShutdownListener) {
    let mut workers = JoinSet::new();
    for _ in 0..context.plan.workers {
        spawn_worker(&mut workers, &context);
    }

    let deadline = tokio::time::sleep(context.plan.sustain);
    tokio::pin!(deadline);
    let mut pacer = tokio::time::interval(context.plan.pace());
    let mut seq = 0u64;

    let interrupted = loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break true,
            _ = &mut deadline => break false,
            _ = pacer.tick() => {
                if context.idle.load(Ordering::Acquire) == 0 {
                    spawn_worker(&mut workers, &context);
                }
                if hits.send(seq).is_err() {
                    break false;
                }
                seq += 1;
            }
        }
    };

    process_debug!(
        ProcessRole::current(),
        hits = seq,
        workers = workers.len(),
        interrupted,
        "Attack stopped"
    );
    context.stopped.store(true, Ordering::Release);
    // dropping the last sender lets idle workers exit
    drop(hits);

    if interrupted {
        workers.abort_all();
        while workers.join_next().await.is_some() {}
        return;
    }

    // in-flight requests finish within the request timeout
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => {
                workers.abort_all();
                while workers.join_next().await.is_some() {}
                break;
            }
            joined = workers.join_next() => {
                if joined.is_none() {
                    break;
                }
            }
        }
    }
}

fn spawn_worker(workers: &mut JoinSet<()>, context: &Arc<WorkerContext>) {
    // counted as idle before it runs, so one tick cannot spawn twice for it
    context.idle.fetch_add(1, Ordering::AcqRel);
    workers.spawn(work(context.clone()));
}

async fn work(context: Arc<WorkerContext>) {
    loop {
        let hit = context.hits.lock().await.recv().await;
        context.idle.fetch_sub(1, Ordering::AcqRel);
        let Some(seq) = hit else { break };
        if context.stopped.load(Ordering::Acquire) {
            break;
        }

        let result = hit_target(&context, seq).await;
        if context.results.send(result).await.is_err() {
            break;
        }
        context.idle.fetch_add(1, Ordering::AcqRel);
    }
}

async fn hit_target(context: &WorkerContext, seq: u64) -> AttackResult {
    let started = Instant::now();
    let response = context
        .client
        .request(context.plan.method.clone(), context.plan.target.clone())
        .send()
        .await;

    let (code, bytes_in, error) = match response {
        Ok(response) => {
            let status = response.status();
            match response.bytes().await {
                Ok(body) => {
                    let error = if (200..400).contains(&status.as_u16()) {
                        None
                    } else {
                        Some(status.to_string())
                    };
                    (status.as_u16(), body.len() as u64, error)
                }
                Err(e) => (status.as_u16(), 0, Some(e.to_string())),
            }
        }
        Err(e) => (0, 0, Some(e.to_string())),
    };

    AttackResult {
        seq,
        code,
        started,
        latency: started.elapsed(),
        bytes_in,
        bytes_out: 0,
        error,
    }
}
