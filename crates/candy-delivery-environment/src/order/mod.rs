use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use crate::ValidationError;
use crate::courier_environment::RegionId;
use crate::time_environment::TimeSpan;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

const WEIGHT_SCALE: u32 = 2;

/// Order weight in kilograms, in (0, 50] at a resolution of 0.01 kg. Kept as
/// an exact decimal so capacity comparisons like `10.01 > 10` are decided
/// without rounding.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Weight(Decimal);

impl Weight
{
    pub fn new(kg: Decimal) -> Result<Self, ValidationError>
    {
        if kg <= Decimal::ZERO || kg > Decimal::new(50, 0) {
            return Err(ValidationError::WeightOutOfRange(kg));
        }
        if kg.normalize().scale() > WEIGHT_SCALE {
            return Err(ValidationError::WeightTooPrecise(kg));
        }
        Ok(Self(kg))
    }

    pub fn kg(&self) -> Decimal
    {
        self.0
    }
}

impl TryFrom<Decimal> for Weight
{
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error>
    {
        Weight::new(value)
    }
}

impl From<Weight> for Decimal
{
    fn from(value: Weight) -> Self
    {
        value.0
    }
}

impl fmt::Display for Weight
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} kg", self.0.normalize())
    }
}

/// Orders are immutable once created, so the fields are only readable.
#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct Order
{
    id: OrderId,
    weight: Weight,
    region: RegionId,
    delivery_hours: Vec<TimeSpan>,
}

impl Order
{
    pub fn new(
        id: OrderId,
        weight: Weight,
        region: RegionId,
        delivery_hours: Vec<TimeSpan>,
    ) -> Result<Self, ValidationError>
    {
        if delivery_hours.is_empty() {
            return Err(ValidationError::NoDeliveryHours(id));
        }
        Ok(Self {
            id,
            weight,
            region,
            delivery_hours,
        })
    }

    pub fn id(&self) -> OrderId
    {
        self.id
    }

    pub fn weight(&self) -> Weight
    {
        self.weight
    }

    pub fn region(&self) -> RegionId
    {
        self.region
    }

    pub fn delivery_hours(&self) -> &[TimeSpan]
    {
        &self.delivery_hours
    }
}

#[cfg(test)]
mod tests
{
    use rust_decimal_macros::dec;

    use super::Order;
    use super::OrderId;
    use super::Weight;
    use crate::ValidationError;
    use crate::courier_environment::RegionId;

    #[test]
    fn test_weight_bounds()
    {
        assert!(Weight::new(dec!(0.01)).is_ok());
        assert!(Weight::new(dec!(13.56)).is_ok());
        assert!(Weight::new(dec!(50)).is_ok());
        assert!(Weight::new(dec!(50.00)).is_ok());

        for kg in [dec!(0), dec!(-1), dec!(50.01), dec!(120)] {
            assert_eq!(Weight::new(kg), Err(ValidationError::WeightOutOfRange(kg)));
        }
    }

    #[test]
    fn test_weight_resolution()
    {
        assert_eq!(
            Weight::new(dec!(10.001)),
            Err(ValidationError::WeightTooPrecise(dec!(10.001)))
        );
        assert!(Weight::new(dec!(10.010)).is_ok());
    }

    #[test]
    fn test_order_requires_delivery_hours()
    {
        let weight = Weight::new(dec!(5)).unwrap();

        assert_eq!(
            Order::new(OrderId(3), weight, RegionId(11), vec![]),
            Err(ValidationError::NoDeliveryHours(OrderId(3)))
        );

        let order = Order::new(
            OrderId(3),
            weight,
            RegionId(11),
            vec!["12:10-14:56".parse().unwrap()],
        )
        .unwrap();
        assert_eq!(order.delivery_hours().len(), 1);
        assert_eq!(order.weight().kg(), dec!(5));
    }

    #[test]
    fn test_weight_deserialization_is_validated()
    {
        assert!(serde_json::from_str::<Weight>("\"13.56\"").is_ok());
        assert!(serde_json::from_str::<Weight>("\"51\"").is_err());
    }
}
