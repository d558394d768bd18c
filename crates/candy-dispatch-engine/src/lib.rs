pub mod allocator;
pub mod capability_matcher;
pub mod clock;
pub mod error;
pub mod reconciler;
pub mod registration;
pub mod status_tracker;

use candy_store::Store;

pub use self::allocator::Allocation;
pub use self::capability_matcher::is_eligible;
pub use self::clock::Clock;
pub use self::clock::SystemClock;
pub use self::error::DispatchError;
pub use self::error::ErrorKind;
pub use self::status_tracker::Completion;

/// Entry point for every matching, assignment, and completion operation.
/// The engine keeps no state of its own, everything lives in the `Store`, so
/// one engine can be shared by any number of request workers.
pub struct DispatchEngine<S, C = SystemClock>
{
    store: S,
    clock: C,
}

impl<S: Store> DispatchEngine<S>
{
    pub fn new(store: S) -> Self
    {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: Store, C: Clock> DispatchEngine<S, C>
{
    pub fn with_clock(store: S, clock: C) -> Self
    {
        Self { store, clock }
    }

    pub fn store(&self) -> &S
    {
        &self.store
    }
}
