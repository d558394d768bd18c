use candy_delivery_environment::ValidationError;
use candy_delivery_environment::courier_environment::Courier;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::order::Order;
use candy_delivery_environment::order::OrderId;
use candy_store::Store;
use candy_store::StoreError;
use itertools::Itertools;
use tracing::Level;
use tracing::event;
use tracing::instrument;

use crate::Clock;
use crate::DispatchEngine;
use crate::DispatchError;

impl<S: Store, C: Clock> DispatchEngine<S, C>
{
    /// All couriers are stored or none is. An id that is already registered,
    /// or that appears twice in the batch, rejects the whole batch.
    #[instrument(level = "info", skip_all, fields(number_of_couriers = couriers.len()))]
    pub fn register_couriers(&self, couriers: Vec<Courier>) -> Result<Vec<CourierId>, DispatchError>
    {
        if let Some(courier_id) = couriers.iter().map(|courier| courier.id).duplicates().next() {
            return Err(ValidationError::DuplicateCourier(courier_id).into());
        }

        let courier_ids = couriers.iter().map(|courier| courier.id).collect_vec();
        self.store
            .transaction(|transaction| -> Result<_, DispatchError> {
                match transaction.insert_couriers(couriers) {
                    Err(StoreError::DuplicateCourier(courier_id)) => {
                        Err(ValidationError::DuplicateCourier(courier_id).into())
                    }
                    result => Ok(result?),
                }
            })?;

        event!(Level::INFO, ?courier_ids, "registered couriers");
        Ok(courier_ids)
    }

    /// New orders start out free.
    #[instrument(level = "info", skip_all, fields(number_of_orders = orders.len()))]
    pub fn register_orders(&self, orders: Vec<Order>) -> Result<Vec<OrderId>, DispatchError>
    {
        if let Some(order_id) = orders.iter().map(|order| order.id()).duplicates().next() {
            return Err(ValidationError::DuplicateOrder(order_id).into());
        }

        let order_ids = orders.iter().map(|order| order.id()).collect_vec();
        self.store
            .transaction(|transaction| -> Result<_, DispatchError> {
                match transaction.insert_orders(orders) {
                    Err(StoreError::DuplicateOrder(order_id)) => {
                        Err(ValidationError::DuplicateOrder(order_id).into())
                    }
                    result => Ok(result?),
                }
            })?;

        event!(Level::INFO, ?order_ids, "registered orders");
        Ok(order_ids)
    }
}
