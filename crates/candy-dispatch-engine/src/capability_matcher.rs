use candy_delivery_environment::courier_environment::Courier;
use candy_delivery_environment::courier_environment::CourierProfile;
use candy_delivery_environment::order::Order;
use itertools::Itertools;
use serde::Serialize;

/// The three independent conditions a courier profile has to meet to carry
/// an order. Kept apart so a rejection can be logged with its reason.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
pub struct Eligibility
{
    pub within_capacity: bool,
    pub in_region: bool,
    pub hours_overlap: bool,
}

impl Eligibility
{
    pub fn evaluate(profile: &CourierProfile, order: &Order) -> Self
    {
        Self {
            within_capacity: order.weight().kg() <= profile.capacity_kg(),
            in_region: profile.regions.contains(&order.region()),
            hours_overlap: profile
                .working_hours
                .iter()
                .cartesian_product(order.delivery_hours())
                .any(|(working_hours, delivery_hours)| working_hours.overlaps(delivery_hours)),
        }
    }

    pub fn is_eligible(&self) -> bool
    {
        self.within_capacity && self.in_region && self.hours_overlap
    }
}

pub fn is_eligible(courier: &Courier, order: &Order) -> bool
{
    profile_covers(&courier.profile, order)
}

/// Same as `is_eligible`, for a profile that is not stored yet.
pub fn profile_covers(profile: &CourierProfile, order: &Order) -> bool
{
    Eligibility::evaluate(profile, order).is_eligible()
}
