use std::collections::HashMap;
use std::sync::LazyLock;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumIter;
use strum::EnumString;
use strum::IntoEnumIterator;

use crate::ValidationError;

#[derive(
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Clone,
    Copy,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum CourierType
{
    Foot,
    Bike,
    Car,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct CourierTypeSpecification
{
    pub capacity_kg: Decimal,
    pub speed_coefficient: u32,
}

static COURIER_TYPE_TABLE: LazyLock<HashMap<CourierType, CourierTypeSpecification>> =
    LazyLock::new(|| {
        CourierType::iter()
            .map(|courier_type| {
                let (capacity_kg, speed_coefficient) = match courier_type {
                    CourierType::Foot => (10, 2),
                    CourierType::Bike => (15, 5),
                    CourierType::Car => (50, 9),
                };
                (
                    courier_type,
                    CourierTypeSpecification {
                        capacity_kg: Decimal::from(capacity_kg),
                        speed_coefficient,
                    },
                )
            })
            .collect()
    });

impl CourierType
{
    /// The table is filled from `CourierType::iter`, so every variant has an
    /// entry.
    pub fn specification(&self) -> &'static CourierTypeSpecification
    {
        &COURIER_TYPE_TABLE[self]
    }

    pub fn capacity_kg(&self) -> Decimal
    {
        self.specification().capacity_kg
    }

    /// Speed coefficient from the fixed courier type table. No dispatch rule
    /// reads it.
    pub fn speed_coefficient(&self) -> u32
    {
        self.specification().speed_coefficient
    }
}

impl TryFrom<String> for CourierType
{
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error>
    {
        value
            .parse()
            .map_err(|_| ValidationError::UnknownCourierType(value))
    }
}

impl From<CourierType> for String
{
    fn from(value: CourierType) -> Self
    {
        value.to_string()
    }
}
