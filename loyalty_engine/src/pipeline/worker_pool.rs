use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;
use log::*;
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};

use crate::{
    accrual::AccrualTransport,
    pipeline::{
        queue::InFlight,
        Backpressure,
        OrderProcessor,
        OrderQueue,
        ProcessOutcome,
        QueueEntry,
    },
    traits::LoyaltyDatabase,
};

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The number of worker tasks, and so the maximum number of orders polled at once.
    pub workers: usize,
    /// The maximum number of orders waiting for a worker.
    pub queue_capacity: usize,
    pub backpressure: Backpressure,
    /// How long [`AccrualPipeline::shutdown`] waits for workers to drain the queue before aborting them.
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            backpressure: Backpressure::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every worker finished its current order and the queue was drained.
    Drained,
    /// The timeout expired and the remaining workers were aborted. Their orders will be re-driven.
    Aborted,
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<QueueEntry>>>;

/// A bounded queue feeding a fixed pool of worker tasks.
pub struct AccrualPipeline {
    queue: OrderQueue,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl AccrualPipeline {
    /// Spawns the worker tasks. Must be called from within a Tokio runtime.
    pub fn start<B, T>(config: PipelineConfig, processor: OrderProcessor<B, T>) -> Self
    where
        B: LoyaltyDatabase,
        T: AccrualTransport,
    {
        let capacity = config.queue_capacity.max(1);
        let (queue, receiver) = OrderQueue::bounded(capacity, config.backpressure);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let in_flight = queue.in_flight_set();
        let receiver: SharedReceiver = Arc::new(Mutex::new(receiver));
        let processor = Arc::new(processor);
        let workers = (0..config.workers.max(1))
            .map(|id| {
                let receiver = Arc::clone(&receiver);
                let processor = Arc::clone(&processor);
                let in_flight = in_flight.clone();
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(run_worker(id, receiver, processor, in_flight, shutdown_rx))
            })
            .collect::<Vec<_>>();
        info!(
            "🏭️ Accrual pipeline started with {} workers and a queue of {capacity} ({:?} mode)",
            workers.len(),
            config.backpressure
        );
        Self { queue, shutdown, workers, shutdown_timeout: config.shutdown_timeout }
    }

    /// A handle for submitting orders to the pipeline.
    pub fn queue(&self) -> OrderQueue {
        self.queue.clone()
    }

    /// Closes the queue to new orders, and gives the workers until the shutdown timeout to finish what has already
    /// been queued. Anything still running after that is aborted.
    pub async fn shutdown(self) -> ShutdownOutcome {
        info!("🏭️ Shutting down accrual pipeline. {} orders in flight", self.queue.in_flight());
        // Workers might all have exited already, in which case there is nobody to tell
        let _ = self.shutdown.send(true);
        let abort_handles = self.workers.iter().map(|w| w.abort_handle()).collect::<Vec<_>>();
        match tokio::time::timeout(self.shutdown_timeout, join_all(self.workers)).await {
            Ok(_) => {
                info!("🏭️ Accrual pipeline drained and stopped");
                ShutdownOutcome::Drained
            },
            Err(_) => {
                warn!(
                    "🏭️ Workers did not finish within {}s. Aborting. {} orders will have to be re-driven.",
                    self.shutdown_timeout.as_secs_f32(),
                    self.queue.in_flight()
                );
                abort_handles.iter().for_each(|h| h.abort());
                ShutdownOutcome::Aborted
            },
        }
    }
}

async fn run_worker<B, T>(
    id: usize,
    receiver: SharedReceiver,
    processor: Arc<OrderProcessor<B, T>>,
    in_flight: InFlight,
    mut shutdown: watch::Receiver<bool>,
) where
    B: LoyaltyDatabase,
    T: AccrualTransport,
{
    trace!("🏭️ Worker {id} started");
    loop {
        let entry = {
            let mut rx = receiver.lock().await;
            let stopping = *shutdown.borrow_and_update();
            if stopping {
                rx.close();
                rx.recv().await
            } else {
                tokio::select! {
                    entry = rx.recv() => entry,
                    _ = shutdown.changed() => {
                        rx.close();
                        rx.recv().await
                    },
                }
            }
        };
        let Some(entry) = entry else {
            break;
        };
        trace!("🏭️ Worker {id} picked up order #{}", entry.number);
        match processor.process(&entry).await {
            Ok(ProcessOutcome::Unresolved { attempts }) => {
                info!("🏭️ Order #{} is still pending after {attempts} attempts. Leaving it for re-drive.", entry.number)
            },
            Ok(_) => {},
            Err(e) => error!("🏭️ Could not process order #{}. It will be retried later. {e}", entry.number),
        }
        in_flight.remove(entry.order_id);
    }
    trace!("🏭️ Worker {id} stopped");
}
