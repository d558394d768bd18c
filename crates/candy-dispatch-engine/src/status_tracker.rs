use candy_delivery_environment::ValidationError;
use candy_delivery_environment::assignment::Assignment;
use candy_delivery_environment::assignment::CourierStatus;
use candy_delivery_environment::assignment::OrderTransition;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::order::OrderId;
use candy_store::Store;
use candy_store::StoreError;
use candy_store::StoreTransaction;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use tracing::Level;
use tracing::event;
use tracing::instrument;

use crate::Clock;
use crate::DispatchEngine;
use crate::DispatchError;

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
pub struct Completion
{
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub completed_at: DateTime<Utc>,
}

impl<S: Store, C: Clock> DispatchEngine<S, C>
{
    /// Absent when the courier is unknown or was never assigned anything.
    #[instrument(level = "debug", skip(self))]
    pub fn courier_status(
        &self,
        courier_id: CourierId,
    ) -> Result<Option<CourierStatus>, DispatchError>
    {
        self.store
            .transaction(|transaction| -> Result<_, DispatchError> {
                let Some(courier) = transaction.get_courier(courier_id)? else {
                    return Ok(None);
                };

                let assignments = transaction.assignments_by_courier(courier_id)?;
                if assignments.is_empty() {
                    return Ok(None);
                }

                Ok(Some(CourierStatus {
                    courier,
                    assignments,
                }))
            })
    }

    /// Absent for free and unknown orders.
    #[instrument(level = "debug", skip(self))]
    pub fn order_status(&self, order_id: OrderId) -> Result<Option<CourierStatus>, DispatchError>
    {
        self.store
            .transaction(|transaction| -> Result<_, DispatchError> {
                let assignments = transaction.assignments_by_order(order_id)?;
                let Some((_, assignment)) = assignments.first() else {
                    return Ok(None);
                };

                let courier_id = assignment.courier_id;
                let courier = transaction
                    .get_courier(courier_id)?
                    .ok_or(StoreError::MissingCourier(courier_id))?;

                Ok(Some(CourierStatus {
                    courier,
                    assignments,
                }))
            })
    }

    /// Completing an order twice returns the first completion unchanged.
    #[instrument(level = "info", skip(self))]
    pub fn complete_order(
        &self,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> Result<Completion, DispatchError>
    {
        self.store
            .transaction(|transaction| -> Result<_, DispatchError> {
                let assignment = active_assignment(transaction, order_id)?
                    .ok_or(DispatchError::OrderNotAssigned(order_id))?;

                complete(transaction, assignment, completed_at)
            })
    }

    /// Like `complete_order`, but only the courier holding the order may
    /// complete it.
    #[instrument(level = "info", skip(self))]
    pub fn complete_order_for(
        &self,
        courier_id: CourierId,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> Result<Completion, DispatchError>
    {
        self.store
            .transaction(|transaction| -> Result<_, DispatchError> {
                if transaction.get_courier(courier_id)?.is_none() {
                    return Err(DispatchError::CourierNotFound(courier_id));
                }
                if transaction.get_order(order_id)?.is_none() {
                    return Err(DispatchError::OrderNotFound(order_id));
                }

                let assignment = active_assignment(transaction, order_id)?
                    .ok_or(DispatchError::OrderNotAssigned(order_id))?;

                if assignment.courier_id != courier_id {
                    return Err(DispatchError::OrderHeldByAnotherCourier {
                        order_id,
                        holder: assignment.courier_id,
                        requested: courier_id,
                    });
                }

                complete(transaction, assignment, completed_at)
            })
    }
}

fn active_assignment(
    transaction: &dyn StoreTransaction,
    order_id: OrderId,
) -> Result<Option<Assignment>, StoreError>
{
    Ok(transaction
        .assignments_by_order(order_id)?
        .into_iter()
        .next()
        .map(|(_, assignment)| assignment))
}

fn complete(
    transaction: &mut dyn StoreTransaction,
    assignment: Assignment,
    completed_at: DateTime<Utc>,
) -> Result<Completion, DispatchError>
{
    let order_id = assignment.order_id;

    if let Some(first_completed_at) = assignment.completed_at {
        event!(
            Level::DEBUG,
            order_id = %order_id,
            "order already completed, keeping the first completion"
        );
        return Ok(Completion {
            order_id,
            courier_id: assignment.courier_id,
            completed_at: first_completed_at,
        });
    }

    if completed_at < assignment.assigned_at {
        return Err(ValidationError::CompletedBeforeAssigned {
            order_id,
            assigned_at: assignment.assigned_at,
            completed_at,
        }
        .into());
    }

    assignment
        .state()
        .transition(OrderTransition::Complete)
        .map_err(|error| DispatchError::from_transition(order_id, error))?;

    let assignment = transaction.set_completed(order_id, completed_at)?;

    event!(
        Level::INFO,
        order_id = %order_id,
        courier_id = %assignment.courier_id,
        "order completed"
    );
    Ok(Completion {
        order_id,
        courier_id: assignment.courier_id,
        completed_at,
    })
}
