use std::str::FromStr;

use candy_delivery_environment::ValidationError;
use candy_delivery_environment::assignment::Assignment;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::courier_environment::RegionId;
use candy_delivery_environment::error::positive;
use candy_delivery_environment::order::Order;
use candy_delivery_environment::order::OrderId;
use candy_delivery_environment::order::Weight;
use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

use crate::GatewayError;
use crate::convert_batch;
use crate::couriers::IdItem;
use crate::couriers::time_spans;
use crate::format_timestamp;

/// `weight` stays a JSON number until it is read as an exact decimal, so
/// `0.01` is not routed through a binary float.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OrderItem {
    pub order_id: i64,
    pub weight: Number,
    pub region: i64,
    pub delivery_hours: Vec<String>,
}

impl TryFrom<OrderItem> for Order {
    type Error = ValidationError;

    fn try_from(item: OrderItem) -> Result<Self, Self::Error> {
        let order_id = OrderId(positive("order_id", item.order_id)?);
        let text = item.weight.to_string();
        let kg = Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| ValidationError::MalformedWeight(text))?;

        Order::new(
            order_id,
            Weight::new(kg)?,
            RegionId(positive("region", item.region)?),
            time_spans(item.delivery_hours)?,
        )
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OrdersPostRequest {
    pub data: Vec<Value>,
}

impl OrdersPostRequest {
    /// Rejects the whole batch if any item is invalid.
    pub fn into_orders(self) -> Result<Vec<Order>, GatewayError> {
        convert_batch::<OrderItem, Order>(self.data, "order_id").map_err(GatewayError::InvalidOrders)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrdersCreated {
    pub orders: Vec<IdItem>,
}

impl OrdersCreated {
    pub fn new(order_ids: impl IntoIterator<Item = OrderId>) -> Self {
        Self {
            orders: order_ids
                .into_iter()
                .map(|order_id| IdItem { id: order_id.0 })
                .collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AssignRequest {
    pub courier_id: i64,
}

impl AssignRequest {
    pub fn courier_id(&self) -> Result<CourierId, ValidationError> {
        positive("courier_id", self.courier_id).map(CourierId)
    }
}

/// `assign_time` is left out when no order was assigned.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AssignResponse {
    pub orders: Vec<IdItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign_time: Option<String>,
}

impl AssignResponse {
    pub fn new(
        order_ids: impl IntoIterator<Item = OrderId>,
        assigned_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            orders: order_ids
                .into_iter()
                .map(|order_id| IdItem { id: order_id.0 })
                .collect(),
            assign_time: assigned_at.as_ref().map(format_timestamp),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CompleteRequest {
    pub courier_id: i64,
    pub order_id: i64,
    pub complete_time: DateTime<Utc>,
}

impl CompleteRequest {
    pub fn validate(&self) -> Result<(CourierId, OrderId, DateTime<Utc>), ValidationError> {
        Ok((
            CourierId(positive("courier_id", self.courier_id)?),
            OrderId(positive("order_id", self.order_id)?),
            self.complete_time,
        ))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteResponse {
    pub order_id: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OrderStatusItem {
    pub order_id: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
    pub region: u64,
    pub delivery_hours: Vec<String>,
    pub assign_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_time: Option<String>,
}

impl OrderStatusItem {
    pub fn new(order: &Order, assignment: &Assignment) -> Self {
        Self {
            order_id: order.id().0,
            weight: order.weight().kg(),
            region: order.region().0,
            delivery_hours: order
                .delivery_hours()
                .iter()
                .map(ToString::to_string)
                .collect(),
            assign_time: format_timestamp(&assignment.assigned_at),
            complete_time: assignment.completed_at.as_ref().map(format_timestamp),
        }
    }
}
