use chrono::DateTime;
use chrono::NaiveTime;
use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::courier_environment::CourierId;
use crate::order::OrderId;

/// Malformed or inconsistent delivery data. Everything in here is a business
/// rule violation and never an infrastructure failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError
{
    #[error("time span '{0}' is not of the form HH:MM-HH:MM")]
    MalformedTimeSpan(String),
    #[error("time span start {start} has to be earlier than its stop {stop}")]
    StartNotBeforeStop { start: NaiveTime, stop: NaiveTime },
    #[error("unknown courier type '{0}'")]
    UnknownCourierType(String),
    #[error("{field} has to be a positive integer, got {value}")]
    NotPositive { field: &'static str, value: i64 },
    #[error("order weight '{0}' is not a decimal number")]
    MalformedWeight(String),
    #[error("order weight {0} kg is outside of (0, 50]")]
    WeightOutOfRange(Decimal),
    #[error("order weight {0} kg is finer than the 0.01 kg resolution")]
    WeightTooPrecise(Decimal),
    #[error("order {0} has no delivery hours")]
    NoDeliveryHours(OrderId),
    #[error("courier patch does not contain any field")]
    EmptyPatch,
    #[error(
        "order {order_id} cannot be completed at {completed_at}, it was assigned at {assigned_at}"
    )]
    CompletedBeforeAssigned {
        order_id: OrderId,
        assigned_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    #[error("courier {0} is already registered")]
    DuplicateCourier(CourierId),
    #[error("order {0} is already registered")]
    DuplicateOrder(OrderId),
    #[error("assignment of order {0} refers to an unknown courier or order")]
    DanglingAssignment(OrderId),
}

/// Wire formats carry signed integers, the data model only accepts positive
/// ones.
pub fn positive(field: &'static str, value: i64) -> Result<u64, ValidationError>
{
    if value > 0 {
        Ok(value as u64)
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}
