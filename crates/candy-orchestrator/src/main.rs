use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use candy_configuration::SystemConfigurations;
use candy_orchestrator::Orchestrator;
use candy_orchestrator::driver::serve_lines;
use candy_orchestrator::logging::setup_logging;
use candy_orchestrator::worker_pool::WorkerPool;
use candy_store::MemoryStore;
use tracing::Level;
use tracing::event;

/// Reads one JSON request per line from stdin and writes one JSON reply per
/// line to stdout. Replies come back in request order.
fn main() -> Result<()> {
    let system_configurations = SystemConfigurations::read_all_configs()?;

    let (_log_handles, _guard) = setup_logging(&system_configurations.load().logging)
        .context("logging could not be set up")?;

    let number_of_workers = system_configurations.load().workers.number_of_workers();

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&system_configurations),
        MemoryStore::default(),
    ));
    let worker_pool = WorkerPool::spawn(orchestrator, number_of_workers)?;

    serve_lines(
        &worker_pool,
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        number_of_workers,
    )?;

    event!(Level::INFO, "stdin closed, shutting down");
    Ok(())
}
