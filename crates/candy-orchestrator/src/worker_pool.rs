use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context;
use anyhow::Result;
use anyhow::ensure;
use candy_contracts::DispatchRequest;
use candy_contracts::DispatchResponse;
use candy_dispatch_engine::Clock;
use candy_store::Store;
use flume::Receiver;
use flume::Sender;
use tracing::Level;
use tracing::event;

use crate::DispatchFailure;
use crate::Orchestrator;

pub type DispatchResult = Result<DispatchResponse, DispatchFailure>;

struct Job {
    request: DispatchRequest,
    reply: Sender<DispatchResult>,
}

/// A fixed set of threads all serving requests against one shared
/// `Orchestrator`. Dropping the pool closes the queue and waits for every
/// queued request to be answered.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn<S, C>(orchestrator: Arc<Orchestrator<S, C>>, number_of_workers: usize) -> Result<Self>
    where
        S: Store + 'static,
        C: Clock + 'static,
    {
        ensure!(number_of_workers > 0, "a worker pool needs at least one worker");

        let (sender, receiver): (Sender<Job>, Receiver<Job>) = flume::unbounded();

        let workers = (0..number_of_workers)
            .map(|worker_number| {
                let orchestrator = Arc::clone(&orchestrator);
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("candy-worker-{worker_number}"))
                    .spawn(move || run_worker(&orchestrator, &receiver))
                    .with_context(|| format!("could not spawn worker {worker_number}"))
            })
            .collect::<Result<Vec<_>>>()?;

        event!(Level::INFO, number_of_workers, "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queues a request. The answer arrives on the returned receiver once a
    /// worker has handled it.
    pub fn submit(&self, request: DispatchRequest) -> Result<Receiver<DispatchResult>> {
        let (reply, response) = flume::bounded(1);
        self.sender
            .as_ref()
            .context("worker pool is shut down")?
            .send(Job { request, reply })
            .context("every worker has stopped")?;
        Ok(response)
    }

    pub fn number_of_workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());

        for worker in self.workers.drain(..) {
            let thread_name = worker.thread().name().unwrap_or("unnamed").to_string();
            if worker.join().is_err() {
                event!(Level::ERROR, %thread_name, "worker panicked");
            }
        }
    }
}

fn run_worker<S: Store, C: Clock>(orchestrator: &Orchestrator<S, C>, receiver: &Receiver<Job>) {
    while let Ok(Job { request, reply }) = receiver.recv() {
        let result = orchestrator.handle(request);
        if reply.send(result).is_err() {
            event!(Level::DEBUG, "caller stopped waiting for a response");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use candy_configuration::SystemConfigurations;
    use candy_contracts::DispatchRequest;
    use candy_store::MemoryStore;

    use super::WorkerPool;
    use crate::Orchestrator;

    fn orchestrator() -> Arc<Orchestrator<MemoryStore>> {
        let system_configurations =
            SystemConfigurations::from_toml_str("[logging]\nlog_dir = \"./logs\"").unwrap();
        Arc::new(Orchestrator::new(
            Arc::new(arc_swap::ArcSwap::from_pointee(system_configurations)),
            MemoryStore::default(),
        ))
    }

    #[test]
    fn test_zero_workers_is_refused() {
        assert!(WorkerPool::spawn(orchestrator(), 0).is_err());
    }

    #[test]
    fn test_requests_are_answered() {
        let worker_pool = WorkerPool::spawn(orchestrator(), 2).unwrap();
        assert_eq!(worker_pool.number_of_workers(), 2);

        let response = worker_pool
            .submit(DispatchRequest::CourierStatus { courier_id: 1 })
            .unwrap()
            .recv()
            .unwrap();

        assert!(response.is_ok());
    }
}
