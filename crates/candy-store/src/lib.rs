pub mod memory;

use std::sync::Arc;

use candy_delivery_environment::assignment::Assignment;
use candy_delivery_environment::courier_environment::Courier;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::courier_environment::CourierPatch;
use candy_delivery_environment::order::Order;
use candy_delivery_environment::order::OrderId;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

pub use self::memory::MemoryStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError
{
    #[error("order {0} already has an assignment")]
    Conflict(OrderId),
    #[error("courier {0} is not in the store")]
    MissingCourier(CourierId),
    #[error("order {0} is not in the store")]
    MissingOrder(OrderId),
    #[error("order {0} has no assignment")]
    MissingAssignment(OrderId),
    #[error("the assignment of order {0} is completed and cannot change")]
    AssignmentCompleted(OrderId),
    #[error("courier {0} is already in the store")]
    DuplicateCourier(CourierId),
    #[error("order {0} is already in the store")]
    DuplicateOrder(OrderId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of couriers, orders, and assignment rows. Every read and
/// write goes through a transaction: when `work` returns `Err`, or the
/// commit itself fails, none of its writes are applied. Transactions are
/// serializable.
pub trait Store: Send + Sync
{
    fn transaction<R, E, F>(&self, work: F) -> Result<R, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<R, E>,
        E: From<StoreError>;
}

impl<S: Store> Store for Arc<S>
{
    fn transaction<R, E, F>(&self, work: F) -> Result<R, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<R, E>,
        E: From<StoreError>,
    {
        (**self).transaction(work)
    }
}

/// The operations available inside a single transaction. Joined reads return
/// `(Order, Assignment)` pairs in ascending order id.
pub trait StoreTransaction
{
    fn get_courier(&self, courier_id: CourierId) -> Result<Option<Courier>, StoreError>;

    fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Fails with `MissingCourier` if the courier is unknown.
    fn update_courier(
        &mut self,
        courier_id: CourierId,
        patch: &CourierPatch,
    ) -> Result<Courier, StoreError>;

    fn insert_couriers(&mut self, couriers: Vec<Courier>) -> Result<(), StoreError>;

    fn insert_orders(&mut self, orders: Vec<Order>) -> Result<(), StoreError>;

    /// Orders without an assignment row.
    fn list_free_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// All rows or none. Fails with `Conflict` if any order already has a
    /// row.
    fn insert_assignments(&mut self, assignments: Vec<Assignment>) -> Result<(), StoreError>;

    /// All rows or none. Completed rows are refused with
    /// `AssignmentCompleted`.
    fn delete_assignments(&mut self, order_ids: &[OrderId]) -> Result<(), StoreError>;

    fn assignments_by_courier(
        &self,
        courier_id: CourierId,
    ) -> Result<Vec<(Order, Assignment)>, StoreError>;

    fn assignments_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<(Order, Assignment)>, StoreError>;

    fn set_completed(
        &mut self,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> Result<Assignment, StoreError>;
}
