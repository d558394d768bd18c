use candy_delivery_environment::assignment::Assignment;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::order::Order;
use candy_store::Store;
use chrono::DateTime;
use chrono::Utc;
use itertools::Itertools;
use serde::Serialize;
use tracing::Level;
use tracing::event;
use tracing::instrument;

use crate::Clock;
use crate::DispatchEngine;
use crate::DispatchError;
use crate::capability_matcher::is_eligible;

/// Orders handed to a courier by one `assign_free_orders` call, in ascending
/// order id. `assigned_at` is absent when nothing was assigned.
#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct Allocation
{
    pub courier_id: CourierId,
    pub orders: Vec<Order>,
    pub assigned_at: Option<DateTime<Utc>>,
}

impl Allocation
{
    pub fn is_empty(&self) -> bool
    {
        self.orders.is_empty()
    }
}

impl<S: Store, C: Clock> DispatchEngine<S, C>
{
    /// Assigns every free order the courier is eligible for. Reading the free
    /// orders and writing the assignment rows happen in one transaction, so
    /// concurrent calls never hand the same order to two couriers.
    #[instrument(level = "info", skip(self))]
    pub fn assign_free_orders(&self, courier_id: CourierId) -> Result<Allocation, DispatchError>
    {
        let allocation = self.store.transaction(|transaction| -> Result<_, DispatchError> {
            let courier = transaction
                .get_courier(courier_id)?
                .ok_or(DispatchError::CourierNotFound(courier_id))?;

            let orders = transaction
                .list_free_orders()?
                .into_iter()
                .filter(|order| is_eligible(&courier, order))
                .sorted_by_key(|order| order.id())
                .collect_vec();

            if orders.is_empty() {
                return Ok(Allocation {
                    courier_id,
                    orders,
                    assigned_at: None,
                });
            }

            let assigned_at = self.clock.now();
            transaction.insert_assignments(
                orders
                    .iter()
                    .map(|order| Assignment::new(order.id(), courier_id, assigned_at))
                    .collect(),
            )?;

            Ok(Allocation {
                courier_id,
                orders,
                assigned_at: Some(assigned_at),
            })
        })?;

        event!(
            Level::INFO,
            courier_id = %courier_id,
            number_of_orders = allocation.orders.len(),
            "allocated free orders"
        );
        Ok(allocation)
    }
}
