use candy_delivery_environment::ValidationError;
use candy_delivery_environment::assignment::OrderTransition;
use candy_delivery_environment::courier_environment::Courier;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::courier_environment::CourierPatch;
use candy_delivery_environment::order::OrderId;
use candy_store::Store;
use candy_store::StoreError;
use tracing::Level;
use tracing::event;
use tracing::instrument;

use crate::Clock;
use crate::DispatchEngine;
use crate::DispatchError;
use crate::capability_matcher::Eligibility;

impl<S: Store, C: Clock> DispatchEngine<S, C>
{
    /// Stores the patched profile, then releases every uncompleted order the
    /// stored profile no longer covers. Widening a profile never assigns
    /// anything, that takes an explicit `assign_free_orders`.
    #[instrument(level = "info", skip(self))]
    pub fn apply_courier_update(
        &self,
        courier_id: CourierId,
        patch: &CourierPatch,
    ) -> Result<Courier, DispatchError>
    {
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch.into());
        }

        let courier = self
            .store
            .transaction(|transaction| -> Result<_, DispatchError> {
                match transaction.update_courier(courier_id, patch) {
                    Err(StoreError::MissingCourier(_)) => {
                        Err(DispatchError::CourierNotFound(courier_id))
                    }
                    result => Ok(result?),
                }
            })?;

        self.reconcile(courier_id)?;
        Ok(courier)
    }

    /// Releases the courier's uncompleted orders that its stored profile does
    /// not cover. Reading the rows and deleting them share one transaction,
    /// so an order completed in between is never released.
    #[instrument(level = "info", skip(self))]
    pub fn reconcile(&self, courier_id: CourierId) -> Result<Vec<OrderId>, DispatchError>
    {
        let released = self
            .store
            .transaction(|transaction| -> Result<_, DispatchError> {
                let courier = transaction
                    .get_courier(courier_id)?
                    .ok_or(DispatchError::CourierNotFound(courier_id))?;

                let mut released = Vec::new();
                for (order, assignment) in transaction.assignments_by_courier(courier_id)? {
                    if assignment.is_completed() {
                        continue;
                    }

                    let eligibility = Eligibility::evaluate(&courier.profile, &order);
                    if eligibility.is_eligible() {
                        continue;
                    }

                    assignment
                        .state()
                        .transition(OrderTransition::Release)
                        .map_err(|error| DispatchError::from_transition(order.id(), error))?;

                    event!(
                        Level::DEBUG,
                        order_id = %order.id(),
                        ?eligibility,
                        "order no longer covered by courier profile"
                    );
                    released.push(order.id());
                }

                if !released.is_empty() {
                    transaction.delete_assignments(&released)?;
                }
                Ok(released)
            })?;

        event!(
            Level::INFO,
            courier_id = %courier_id,
            number_of_released_orders = released.len(),
            "reconciled courier assignments"
        );
        Ok(released)
    }
}
