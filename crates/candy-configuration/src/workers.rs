use std::num::NonZeroUsize;
use std::thread;

use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerConfiguration {
    #[serde(default)]
    pub number_of_workers: Option<usize>,
    #[serde(default)]
    pub debug: bool,
}

impl WorkerConfiguration {
    /// Without an explicit count the pool uses every core twice over, plus
    /// one. A debug run keeps to a single worker.
    pub fn number_of_workers(&self) -> usize {
        if let Some(number_of_workers) = self.number_of_workers {
            return number_of_workers;
        }
        if self.debug {
            return 1;
        }

        let cpus = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        2 * cpus + 1
    }
}
