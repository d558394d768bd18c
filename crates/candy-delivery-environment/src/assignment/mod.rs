use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::courier_environment::Courier;
use crate::courier_environment::CourierId;
use crate::order::Order;
use crate::order::OrderId;

/// The row that ties an order to the courier holding it. An order without
/// a row is free.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Assignment
{
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Assignment
{
    pub fn new(order_id: OrderId, courier_id: CourierId, assigned_at: DateTime<Utc>) -> Self
    {
        Self {
            order_id,
            courier_id,
            assigned_at,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool
    {
        self.completed_at.is_some()
    }

    pub fn state(&self) -> OrderState
    {
        OrderState::of(Some(self))
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
pub enum OrderState
{
    Free,
    Held(CourierId),
    Completed(CourierId),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
pub enum OrderTransition
{
    Assign(CourierId),
    Complete,
    Release,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("an order that is {from} cannot {transition}")]
pub struct TransitionError
{
    pub from: OrderState,
    pub transition: OrderTransition,
}

impl OrderState
{
    pub fn of(assignment: Option<&Assignment>) -> Self
    {
        match assignment {
            None => OrderState::Free,
            Some(assignment) if assignment.is_completed() => {
                OrderState::Completed(assignment.courier_id)
            }
            Some(assignment) => OrderState::Held(assignment.courier_id),
        }
    }

    /// `Completed` is terminal, and a free order can only be assigned.
    pub fn transition(self, transition: OrderTransition) -> Result<OrderState, TransitionError>
    {
        match (self, transition) {
            (OrderState::Free, OrderTransition::Assign(courier_id)) => {
                Ok(OrderState::Held(courier_id))
            }
            (OrderState::Held(courier_id), OrderTransition::Complete) => {
                Ok(OrderState::Completed(courier_id))
            }
            (OrderState::Held(_), OrderTransition::Release) => Ok(OrderState::Free),
            (from, transition) => Err(TransitionError { from, transition }),
        }
    }
}

impl fmt::Display for OrderState
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            OrderState::Free => write!(f, "free"),
            OrderState::Held(courier_id) => write!(f, "held by courier {}", courier_id),
            OrderState::Completed(courier_id) => {
                write!(f, "completed by courier {}", courier_id)
            }
        }
    }
}

impl fmt::Display for OrderTransition
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            OrderTransition::Assign(courier_id) => write!(f, "be assigned to courier {}", courier_id),
            OrderTransition::Complete => write!(f, "be completed"),
            OrderTransition::Release => write!(f, "be released"),
        }
    }
}

/// A courier together with every order it holds or has completed.
#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct CourierStatus
{
    pub courier: Courier,
    pub assignments: Vec<(Order, Assignment)>,
}

impl CourierStatus
{
    pub fn uncompleted(&self) -> impl Iterator<Item = &(Order, Assignment)>
    {
        self.assignments
            .iter()
            .filter(|(_, assignment)| !assignment.is_completed())
    }
}

#[cfg(test)]
mod tests
{
    use chrono::Utc;

    use super::Assignment;
    use super::OrderState;
    use super::OrderTransition;
    use crate::courier_environment::CourierId;
    use crate::order::OrderId;

    #[test]
    fn test_order_life_cycle()
    {
        let courier_id = CourierId(1);

        let held = OrderState::Free
            .transition(OrderTransition::Assign(courier_id))
            .unwrap();
        assert_eq!(held, OrderState::Held(courier_id));

        assert_eq!(
            held.transition(OrderTransition::Release).unwrap(),
            OrderState::Free
        );

        let completed = held.transition(OrderTransition::Complete).unwrap();
        assert_eq!(completed, OrderState::Completed(courier_id));
    }

    #[test]
    fn test_completed_is_terminal()
    {
        let completed = OrderState::Completed(CourierId(1));

        for transition in [
            OrderTransition::Assign(CourierId(2)),
            OrderTransition::Complete,
            OrderTransition::Release,
        ] {
            let error = completed.transition(transition).unwrap_err();
            assert_eq!(error.from, completed);
        }
    }

    #[test]
    fn test_free_orders_cannot_be_completed_or_released()
    {
        assert!(OrderState::Free.transition(OrderTransition::Complete).is_err());
        assert!(OrderState::Free.transition(OrderTransition::Release).is_err());
    }

    #[test]
    fn test_held_orders_cannot_be_assigned_again()
    {
        let error = OrderState::Held(CourierId(1))
            .transition(OrderTransition::Assign(CourierId(2)))
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "an order that is held by courier 1 cannot be assigned to courier 2"
        );
    }

    #[test]
    fn test_state_of_assignment_row()
    {
        let mut assignment = Assignment::new(OrderId(10), CourierId(1), Utc::now());
        assert_eq!(assignment.state(), OrderState::Held(CourierId(1)));

        assignment.completed_at = Some(Utc::now());
        assert_eq!(assignment.state(), OrderState::Completed(CourierId(1)));

        assert_eq!(OrderState::of(None), OrderState::Free);
    }
}
