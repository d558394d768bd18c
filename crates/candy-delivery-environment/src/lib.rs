pub mod assignment;
pub mod courier_environment;
pub mod error;
pub mod order;
pub mod time_environment;

use std::collections::BTreeMap;
use std::fmt;

use assignment::Assignment;
use courier_environment::Courier;
use courier_environment::CourierId;
use order::Order;
use order::OrderId;

pub use self::error::ValidationError;

/// Every courier, order, and assignment row known to the system. Keying the
/// assignments by order makes "at most one row per order" structural.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct DeliveryEnvironment
{
    pub couriers: BTreeMap<CourierId, Courier>,
    pub orders: BTreeMap<OrderId, Order>,
    pub assignments: BTreeMap<OrderId, Assignment>,
}

#[derive(Default)]
pub struct DeliveryEnvironmentBuilder
{
    couriers: Option<Vec<Courier>>,
    orders: Option<Vec<Order>>,
    assignments: Option<Vec<Assignment>>,
}

impl DeliveryEnvironment
{
    pub fn builder() -> DeliveryEnvironmentBuilder
    {
        DeliveryEnvironmentBuilder::default()
    }

    pub fn is_free(&self, order_id: &OrderId) -> bool
    {
        !self.assignments.contains_key(order_id)
    }
}

impl DeliveryEnvironmentBuilder
{
    pub fn build(self) -> Result<DeliveryEnvironment, ValidationError>
    {
        let mut delivery_environment = DeliveryEnvironment::default();

        for courier in self.couriers.unwrap_or_default() {
            let courier_id = courier.id;
            if delivery_environment
                .couriers
                .insert(courier_id, courier)
                .is_some()
            {
                return Err(ValidationError::DuplicateCourier(courier_id));
            }
        }

        for order in self.orders.unwrap_or_default() {
            let order_id = order.id();
            if delivery_environment.orders.insert(order_id, order).is_some() {
                return Err(ValidationError::DuplicateOrder(order_id));
            }
        }

        for assignment in self.assignments.unwrap_or_default() {
            let order_id = assignment.order_id;
            if !delivery_environment.orders.contains_key(&order_id)
                || !delivery_environment
                    .couriers
                    .contains_key(&assignment.courier_id)
                || delivery_environment
                    .assignments
                    .insert(order_id, assignment)
                    .is_some()
            {
                return Err(ValidationError::DanglingAssignment(order_id));
            }
        }

        Ok(delivery_environment)
    }

    pub fn couriers(mut self, couriers: Vec<Courier>) -> Self
    {
        self.couriers = Some(couriers);
        self
    }

    pub fn orders(mut self, orders: Vec<Order>) -> Self
    {
        self.orders = Some(orders);
        self
    }

    pub fn assignments(mut self, assignments: Vec<Assignment>) -> Self
    {
        self.assignments = Some(assignments);
        self
    }
}

impl fmt::Display for DeliveryEnvironment
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let completed = self
            .assignments
            .values()
            .filter(|assignment| assignment.is_completed())
            .count();
        write!(
            f,
            "couriers: {}, orders: {} (free: {}, held: {}, completed: {})",
            self.couriers.len(),
            self.orders.len(),
            self.orders.len() - self.assignments.len(),
            self.assignments.len() - completed,
            completed,
        )
    }
}
