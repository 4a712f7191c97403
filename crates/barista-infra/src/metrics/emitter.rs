use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{MetricPoint, MetricSink};

type Batch = Vec<MetricPoint>;
type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Batch>>>;

/// Bounded queue in front of a fixed pool of delivery workers.
///
/// `emit` never blocks: when the queue is full the batch is dropped and a
/// warning is logged. `shutdown` stops intake, lets the workers drain whatever
/// is already queued, and returns once every worker has exited.
pub struct MetricsEmitter {
    tx: mpsc::Sender<Batch>,
    cancel: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    dropped: Arc<AtomicU64>,
}

impl MetricsEmitter {
    /// Spawn `workers` delivery tasks on the current runtime.
    pub fn start(sink: Arc<dyn MetricSink>, workers: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(rx));
        let cancel = CancellationToken::new();

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    rx.clone(),
                    sink.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::debug!(workers, queue_capacity, "Metrics emitter started");

        Self {
            tx,
            cancel,
            workers: Mutex::new(handles),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue a batch for delivery. Returns immediately.
    pub fn emit(&self, points: Vec<MetricPoint>) {
        if points.is_empty() {
            return;
        }
        match self.tx.try_send(points) {
            Ok(()) => {}
            Err(TrySendError::Full(batch)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    points = batch.len(),
                    metric = %batch[0].name,
                    "Metrics queue full, dropping batch"
                );
            }
            Err(TrySendError::Closed(batch)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    points = batch.len(),
                    "Metrics emitter shut down, dropping batch"
                );
            }
        }
    }

    /// Batches discarded because the queue was full or closed
    pub fn dropped_batches(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting batches and wait for queued ones to be delivered.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Metrics worker terminated abnormally");
            }
        }

        tracing::debug!(
            dropped_batches = self.dropped_batches(),
            "Metrics emitter drained"
        );
    }
}

async fn run_worker(
    worker_id: usize,
    rx: SharedReceiver,
    sink: Arc<dyn MetricSink>,
    cancel: CancellationToken,
) {
    loop {
        // Only one worker waits on the channel at a time; delivery happens
        // after the lock is released so sinks run concurrently.
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                batch = rx.recv() => batch,
                _ = cancel.cancelled() => {
                    // Closing keeps already-buffered batches receivable.
                    rx.close();
                    rx.recv().await
                }
            }
        };

        let Some(batch) = next else {
            break;
        };

        if let Err(e) = sink.publish(&batch).await {
            tracing::warn!(
                worker_id,
                error = %e,
                points = batch.len(),
                "Failed to publish metrics"
            );
        }
    }

    tracing::debug!(worker_id, "Metrics worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricUnit, MetricsError};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    #[derive(Default)]
    struct CountingSink {
        delivered: AtomicUsize,
    }

    #[async_trait]
    impl MetricSink for CountingSink {
        async fn publish(&self, batch: &[MetricPoint]) -> Result<(), MetricsError> {
            self.delivered.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails every other batch
    #[derive(Default)]
    struct FlakySink {
        calls: AtomicUsize,
        delivered: AtomicUsize,
    }

    #[async_trait]
    impl MetricSink for FlakySink {
        async fn publish(&self, batch: &[MetricPoint]) -> Result<(), MetricsError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                return Err(MetricsError::Sink("backend unavailable".to_string()));
            }
            self.delivered.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    /// Blocks until the test hands out permits
    struct GatedSink {
        gate: Arc<Semaphore>,
        delivered: AtomicUsize,
    }

    #[async_trait]
    impl MetricSink for GatedSink {
        async fn publish(&self, batch: &[MetricPoint]) -> Result<(), MetricsError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| MetricsError::Sink(e.to_string()))?;
            permit.forget();
            self.delivered.fetch_add(batch.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    fn point(i: usize) -> MetricPoint {
        MetricPoint::new(format!("m{}", i), 1.0, MetricUnit::Count)
    }

    #[tokio::test]
    async fn shutdown_drains_queued_batches() {
        let sink = Arc::new(CountingSink::default());
        let emitter = MetricsEmitter::start(sink.clone(), 3, 256);

        for i in 0..100 {
            emitter.emit(vec![point(i), point(i)]);
        }
        emitter.shutdown().await;

        assert_eq!(sink.delivered.load(Ordering::SeqCst), 200);
        assert_eq!(emitter.dropped_batches(), 0);
    }

    #[tokio::test]
    async fn emit_after_shutdown_is_dropped() {
        let sink = Arc::new(CountingSink::default());
        let emitter = MetricsEmitter::start(sink.clone(), 1, 8);
        emitter.shutdown().await;

        emitter.emit(vec![point(0)]);
        assert_eq!(emitter.dropped_batches(), 1);
        assert_eq!(sink.delivered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sink_errors_do_not_stop_delivery() {
        let sink = Arc::new(FlakySink::default());
        let emitter = MetricsEmitter::start(sink.clone(), 2, 64);

        for i in 0..10 {
            emitter.emit(vec![point(i)]);
        }
        emitter.shutdown().await;

        assert_eq!(sink.calls.load(Ordering::SeqCst), 10);
        assert_eq!(sink.delivered.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let gate = Arc::new(Semaphore::new(0));
        let sink = Arc::new(GatedSink {
            gate: gate.clone(),
            delivered: AtomicUsize::new(0),
        });
        let emitter = MetricsEmitter::start(sink.clone(), 1, 1);

        // One batch may sit in the worker, one in the queue; the rest overflow.
        for i in 0..10 {
            emitter.emit(vec![point(i)]);
        }
        assert!(emitter.dropped_batches() >= 8);

        gate.add_permits(10);
        emitter.shutdown().await;

        let delivered = sink.delivered.load(Ordering::SeqCst) as u64;
        assert_eq!(delivered + emitter.dropped_batches(), 10);
    }

    #[tokio::test]
    async fn empty_batches_are_ignored() {
        let sink = Arc::new(CountingSink::default());
        let emitter = MetricsEmitter::start(sink.clone(), 1, 1);
        emitter.emit(Vec::new());
        emitter.shutdown().await;
        assert_eq!(emitter.dropped_batches(), 0);
    }
}
