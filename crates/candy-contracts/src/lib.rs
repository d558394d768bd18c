pub mod couriers;
pub mod orders;

use candy_delivery_environment::ValidationError;
use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::Level;
use tracing::event;

use self::couriers::CourierPatchRequest;
use self::couriers::CourierResponse;
use self::couriers::CourierStatusResponse;
use self::couriers::CouriersCreated;
use self::couriers::CouriersPostRequest;
use self::orders::AssignRequest;
use self::orders::AssignResponse;
use self::orders::CompleteRequest;
use self::orders::CompleteResponse;
use self::orders::OrdersCreated;
use self::orders::OrdersPostRequest;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "message_type")]
pub enum DispatchRequest {
    RegisterCouriers(CouriersPostRequest),
    RegisterOrders(OrdersPostRequest),
    UpdateCourier {
        courier_id: i64,
        patch: CourierPatchRequest,
    },
    AssignOrders(AssignRequest),
    CompleteOrder(CompleteRequest),
    CourierStatus {
        courier_id: i64,
    },
    OrderStatus {
        order_id: i64,
    },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "response_type", content = "body")]
pub enum DispatchResponse {
    CouriersCreated(CouriersCreated),
    OrdersCreated(OrdersCreated),
    CourierUpdated(CourierResponse),
    OrdersAssigned(AssignResponse),
    OrderCompleted(CompleteResponse),
    CourierStatus(Option<CourierStatusResponse>),
    OrderStatus(Option<CourierStatusResponse>),
}

impl DispatchRequest {
    pub fn message_type(&self) -> &'static str {
        match self {
            DispatchRequest::RegisterCouriers(_) => "RegisterCouriers",
            DispatchRequest::RegisterOrders(_) => "RegisterOrders",
            DispatchRequest::UpdateCourier { .. } => "UpdateCourier",
            DispatchRequest::AssignOrders(_) => "AssignOrders",
            DispatchRequest::CompleteOrder(_) => "CompleteOrder",
            DispatchRequest::CourierStatus { .. } => "CourierStatus",
            DispatchRequest::OrderStatus { .. } => "OrderStatus",
        }
    }
}

/// Input rejected before it reaches the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("request contains invalid couriers {0:?}")]
    InvalidCouriers(Vec<i64>),
    #[error("request contains invalid orders {0:?}")]
    InvalidOrders(Vec<i64>),
    #[error(transparent)]
    InvalidRequest(#[from] ValidationError),
}

impl GatewayError {
    /// The `{"validation_error": {"couriers": [{"id": 1}]}}` body listing every
    /// rejected batch item.
    pub fn validation_error_body(&self) -> Option<Value> {
        let (items, ids) = match self {
            GatewayError::InvalidCouriers(ids) => ("couriers", ids),
            GatewayError::InvalidOrders(ids) => ("orders", ids),
            GatewayError::InvalidRequest(_) => return None,
        };

        let mut validation_error = Map::new();
        validation_error.insert(
            items.to_string(),
            ids.iter().map(|id| json!({ "id": id })).collect(),
        );
        Some(json!({ "validation_error": validation_error }))
    }
}

/// `2021-01-10T09:32:14.420000Z`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Converts every item of a batch, or reports the id of every item that could
/// not be converted. Items without a readable id are reported as `-1`.
pub(crate) fn convert_batch<Item, T>(data: Vec<Value>, id_field: &str) -> Result<Vec<T>, Vec<i64>>
where
    Item: DeserializeOwned,
    T: TryFrom<Item, Error = ValidationError>,
{
    let mut converted = Vec::with_capacity(data.len());
    let mut invalid_ids = Vec::new();

    for value in data {
        let id = value.get(id_field).and_then(Value::as_i64).unwrap_or(-1);

        let result = serde_json::from_value::<Item>(value)
            .map_err(|error| error.to_string())
            .and_then(|item| T::try_from(item).map_err(|error| error.to_string()));

        match result {
            Ok(item) => converted.push(item),
            Err(reason) => {
                event!(Level::WARN, id, %reason, "rejected batch item");
                invalid_ids.push(id);
            }
        }
    }

    if invalid_ids.is_empty() {
        Ok(converted)
    } else {
        Err(invalid_ids)
    }
}
