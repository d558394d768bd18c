use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use candy_delivery_environment::DeliveryEnvironment;
use candy_delivery_environment::assignment::Assignment;
use candy_delivery_environment::courier_environment::Courier;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::courier_environment::CourierPatch;
use candy_delivery_environment::order::Order;
use candy_delivery_environment::order::OrderId;
use chrono::DateTime;
use chrono::Utc;
use tracing::Level;
use tracing::event;

use crate::Store;
use crate::StoreError;
use crate::StoreTransaction;

/// Reference `Store` holding the whole `DeliveryEnvironment` behind one lock.
/// A transaction works on a copy taken under the lock and swaps it in on
/// commit, so transactions are trivially serializable.
#[derive(Debug, Default)]
pub struct MemoryStore
{
    delivery_environment: Mutex<DeliveryEnvironment>,
    fail_next_commit: AtomicBool,
}

impl MemoryStore
{
    pub fn new(delivery_environment: DeliveryEnvironment) -> Self
    {
        Self {
            delivery_environment: Mutex::new(delivery_environment),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Committed state at this instant.
    pub fn snapshot(&self) -> Result<DeliveryEnvironment, StoreError>
    {
        self.delivery_environment
            .lock()
            .map(|delivery_environment| delivery_environment.clone())
            .map_err(|_| StoreError::Unavailable("delivery environment lock poisoned".to_string()))
    }

    /// Makes the next commit fail with `StoreError::Unavailable` after its
    /// work has run.
    pub fn fail_next_commit(&self)
    {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

impl Store for MemoryStore
{
    fn transaction<R, E, F>(&self, work: F) -> Result<R, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut delivery_environment = self.delivery_environment.lock().map_err(|_| {
            StoreError::Unavailable("delivery environment lock poisoned".to_string())
        })?;

        let mut transaction = MemoryTransaction {
            working_copy: delivery_environment.clone(),
        };

        let result = work(&mut transaction)?;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            event!(Level::WARN, "injected commit failure, discarding transaction");
            return Err(StoreError::Unavailable("injected commit failure".to_string()).into());
        }

        *delivery_environment = transaction.working_copy;
        Ok(result)
    }
}

pub struct MemoryTransaction
{
    working_copy: DeliveryEnvironment,
}

impl MemoryTransaction
{
    fn join(&self, assignment: &Assignment) -> Result<(Order, Assignment), StoreError>
    {
        let order = self
            .working_copy
            .orders
            .get(&assignment.order_id)
            .ok_or(StoreError::MissingOrder(assignment.order_id))?;
        Ok((order.clone(), assignment.clone()))
    }
}

impl StoreTransaction for MemoryTransaction
{
    fn get_courier(&self, courier_id: CourierId) -> Result<Option<Courier>, StoreError>
    {
        Ok(self.working_copy.couriers.get(&courier_id).cloned())
    }

    fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>
    {
        Ok(self.working_copy.orders.get(&order_id).cloned())
    }

    fn update_courier(
        &mut self,
        courier_id: CourierId,
        patch: &CourierPatch,
    ) -> Result<Courier, StoreError>
    {
        let courier = self
            .working_copy
            .couriers
            .get_mut(&courier_id)
            .ok_or(StoreError::MissingCourier(courier_id))?;

        courier.profile = courier.profile.apply(patch);
        Ok(courier.clone())
    }

    fn insert_couriers(&mut self, couriers: Vec<Courier>) -> Result<(), StoreError>
    {
        let mut seen = BTreeSet::new();
        for courier in &couriers {
            if self.working_copy.couriers.contains_key(&courier.id) || !seen.insert(courier.id) {
                return Err(StoreError::DuplicateCourier(courier.id));
            }
        }

        self.working_copy
            .couriers
            .extend(couriers.into_iter().map(|courier| (courier.id, courier)));
        Ok(())
    }

    fn insert_orders(&mut self, orders: Vec<Order>) -> Result<(), StoreError>
    {
        let mut seen = BTreeSet::new();
        for order in &orders {
            if self.working_copy.orders.contains_key(&order.id()) || !seen.insert(order.id()) {
                return Err(StoreError::DuplicateOrder(order.id()));
            }
        }

        self.working_copy
            .orders
            .extend(orders.into_iter().map(|order| (order.id(), order)));
        Ok(())
    }

    fn list_free_orders(&self) -> Result<Vec<Order>, StoreError>
    {
        Ok(self
            .working_copy
            .orders
            .values()
            .filter(|order| self.working_copy.is_free(&order.id()))
            .cloned()
            .collect())
    }

    fn insert_assignments(&mut self, assignments: Vec<Assignment>) -> Result<(), StoreError>
    {
        let mut seen = BTreeSet::new();
        for assignment in &assignments {
            if !self.working_copy.orders.contains_key(&assignment.order_id) {
                return Err(StoreError::MissingOrder(assignment.order_id));
            }
            if !self
                .working_copy
                .couriers
                .contains_key(&assignment.courier_id)
            {
                return Err(StoreError::MissingCourier(assignment.courier_id));
            }
            if !self.working_copy.is_free(&assignment.order_id) || !seen.insert(assignment.order_id)
            {
                return Err(StoreError::Conflict(assignment.order_id));
            }
        }

        self.working_copy.assignments.extend(
            assignments
                .into_iter()
                .map(|assignment| (assignment.order_id, assignment)),
        );
        Ok(())
    }

    fn delete_assignments(&mut self, order_ids: &[OrderId]) -> Result<(), StoreError>
    {
        for order_id in order_ids {
            match self.working_copy.assignments.get(order_id) {
                None => return Err(StoreError::MissingAssignment(*order_id)),
                Some(assignment) if assignment.is_completed() => {
                    return Err(StoreError::AssignmentCompleted(*order_id));
                }
                Some(_) => (),
            }
        }

        for order_id in order_ids {
            self.working_copy.assignments.remove(order_id);
        }
        Ok(())
    }

    fn assignments_by_courier(
        &self,
        courier_id: CourierId,
    ) -> Result<Vec<(Order, Assignment)>, StoreError>
    {
        self.working_copy
            .assignments
            .values()
            .filter(|assignment| assignment.courier_id == courier_id)
            .map(|assignment| self.join(assignment))
            .collect()
    }

    fn assignments_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<(Order, Assignment)>, StoreError>
    {
        self.working_copy
            .assignments
            .get(&order_id)
            .map(|assignment| self.join(assignment))
            .into_iter()
            .collect()
    }

    fn set_completed(
        &mut self,
        order_id: OrderId,
        completed_at: DateTime<Utc>,
    ) -> Result<Assignment, StoreError>
    {
        let assignment = self
            .working_copy
            .assignments
            .get_mut(&order_id)
            .ok_or(StoreError::MissingAssignment(order_id))?;

        if assignment.is_completed() {
            return Err(StoreError::AssignmentCompleted(order_id));
        }

        assignment.completed_at = Some(completed_at);
        Ok(assignment.clone())
    }
}

#[cfg(test)]
mod tests
{
    use candy_delivery_environment::DeliveryEnvironment;
    use candy_delivery_environment::assignment::Assignment;
    use candy_delivery_environment::courier_environment::Courier;
    use candy_delivery_environment::courier_environment::CourierId;
    use candy_delivery_environment::courier_environment::RegionId;
    use candy_delivery_environment::courier_environment::courier_type::CourierType;
    use candy_delivery_environment::order::Order;
    use candy_delivery_environment::order::OrderId;
    use candy_delivery_environment::order::Weight;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::MemoryStore;
    use crate::Store;
    use crate::StoreError;

    fn order(id: u64) -> Order
    {
        Order::new(
            OrderId(id),
            Weight::new(dec!(2.5)).unwrap(),
            RegionId(1),
            vec!["10:00-12:00".parse().unwrap()],
        )
        .unwrap()
    }

    fn store() -> MemoryStore
    {
        let delivery_environment = DeliveryEnvironment::builder()
            .couriers(vec![
                Courier::new(
                    CourierId(1),
                    CourierType::Foot,
                    [RegionId(1)],
                    vec!["09:00-18:00".parse().unwrap()],
                ),
                Courier::new(
                    CourierId(2),
                    CourierType::Car,
                    [RegionId(1)],
                    vec!["09:00-18:00".parse().unwrap()],
                ),
            ])
            .orders(vec![order(10), order(11), order(12)])
            .build()
            .unwrap();
        MemoryStore::new(delivery_environment)
    }

    #[test]
    fn test_free_orders_exclude_assigned_ones()
    {
        let store = store();

        store
            .transaction(|transaction| {
                transaction
                    .insert_assignments(vec![Assignment::new(OrderId(11), CourierId(1), Utc::now())])
            })
            .unwrap();

        let free: Vec<OrderId> = store
            .transaction(|transaction| transaction.list_free_orders())
            .unwrap()
            .iter()
            .map(|order| order.id())
            .collect();
        assert_eq!(free, vec![OrderId(10), OrderId(12)]);
    }

    #[test]
    fn test_insert_assignments_is_all_or_nothing()
    {
        let store = store();
        let now = Utc::now();

        store
            .transaction(|transaction| {
                transaction.insert_assignments(vec![Assignment::new(OrderId(12), CourierId(1), now)])
            })
            .unwrap();

        let result = store.transaction(|transaction| {
            let conflict = transaction.insert_assignments(vec![
                Assignment::new(OrderId(10), CourierId(2), now),
                Assignment::new(OrderId(12), CourierId(2), now),
            ]);
            assert_eq!(conflict, Err(StoreError::Conflict(OrderId(12))));

            transaction.list_free_orders()
        });

        assert_eq!(result.unwrap().len(), 2);
    }

    #[test]
    fn test_failed_work_rolls_back()
    {
        let store = store();
        let before = store.snapshot().unwrap();

        let result: Result<(), StoreError> = store.transaction(|transaction| {
            transaction.insert_assignments(vec![Assignment::new(
                OrderId(10),
                CourierId(1),
                Utc::now(),
            )])?;
            Err(StoreError::Unavailable("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_injected_commit_failure_leaves_state_unchanged()
    {
        let store = store();
        let before = store.snapshot().unwrap();

        store.fail_next_commit();
        let result = store.transaction(|transaction| {
            transaction.insert_assignments(vec![Assignment::new(
                OrderId(10),
                CourierId(1),
                Utc::now(),
            )])
        });

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.snapshot().unwrap(), before);

        // Only the next commit fails.
        store
            .transaction(|transaction| {
                transaction.insert_assignments(vec![Assignment::new(
                    OrderId(10),
                    CourierId(1),
                    Utc::now(),
                )])
            })
            .unwrap();
    }

    #[test]
    fn test_completed_assignments_cannot_be_deleted()
    {
        let store = store();

        let result = store.transaction(|transaction| {
            transaction.insert_assignments(vec![
                Assignment::new(OrderId(10), CourierId(1), Utc::now()),
                Assignment::new(OrderId(11), CourierId(1), Utc::now()),
            ])?;
            transaction.set_completed(OrderId(10), Utc::now())?;
            transaction.delete_assignments(&[OrderId(11), OrderId(10)])
        });

        assert_eq!(result, Err(StoreError::AssignmentCompleted(OrderId(10))));
    }

    #[test]
    fn test_assignments_by_courier_joins_orders()
    {
        let store = store();

        let joined = store
            .transaction(|transaction| {
                transaction.insert_assignments(vec![
                    Assignment::new(OrderId(12), CourierId(2), Utc::now()),
                    Assignment::new(OrderId(10), CourierId(2), Utc::now()),
                    Assignment::new(OrderId(11), CourierId(1), Utc::now()),
                ])?;
                transaction.assignments_by_courier(CourierId(2))
            })
            .unwrap();

        let order_ids: Vec<OrderId> = joined.iter().map(|(order, _)| order.id()).collect();
        assert_eq!(order_ids, vec![OrderId(10), OrderId(12)]);
    }

    #[test]
    fn test_insert_rejects_duplicate_ids()
    {
        let store = store();

        let result = store.transaction(|transaction| transaction.insert_orders(vec![order(13), order(10)]));

        assert_eq!(result, Err(StoreError::DuplicateOrder(OrderId(10))));
        assert_eq!(store.snapshot().unwrap().orders.len(), 3);
    }
}
